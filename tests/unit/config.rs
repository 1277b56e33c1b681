use super::*;

#[test]
fn defaults_match_documented_values() {
    let cfg = PipelineConfig::default();
    assert_eq!(cfg.load_timeout(), Duration::from_secs(30));
    assert_eq!(cfg.refresh_hz, 60);
    assert_eq!(cfg.capture_fps, 30);
    assert_eq!(cfg.progress_interval_ms, 100);
    assert_eq!(cfg.progress_step, 10);
    assert_eq!(cfg.blur_overlay_alpha, 128);
    assert_eq!(cfg.ffmpeg.ffmpeg_bin, "ffmpeg");
    assert_eq!(cfg.logging.level, "info");
    assert!(!cfg.logging.json);
    cfg.validate().unwrap();
}

#[test]
fn partial_json_keeps_other_defaults() {
    let cfg: PipelineConfig =
        serde_json::from_str(r#"{"load_timeout_ms": 500, "logging": {"json": true}}"#).unwrap();
    assert_eq!(cfg.load_timeout_ms, 500);
    assert_eq!(cfg.capture_fps, 30);
    assert!(cfg.logging.json);
    assert_eq!(cfg.logging.level, "info");
}

#[test]
fn validate_rejects_zero_cadences_and_bad_step() {
    let mut cfg = PipelineConfig {
        refresh_hz: 0,
        ..PipelineConfig::default()
    };
    assert!(cfg.validate().is_err());

    cfg = PipelineConfig {
        progress_step: 0,
        ..PipelineConfig::default()
    };
    assert!(cfg.validate().is_err());

    cfg = PipelineConfig {
        progress_step: 101,
        ..PipelineConfig::default()
    };
    assert!(cfg.validate().is_err());

    cfg = PipelineConfig {
        load_timeout_ms: 0,
        ..PipelineConfig::default()
    };
    assert!(matches!(cfg.validate(), Err(BackdropError::Validation(_))));
}

#[test]
fn progress_rate_is_per_interval() {
    let cfg = PipelineConfig::default();
    let rate = cfg.progress_rate().unwrap();
    assert!((rate.as_f64() - 10.0).abs() < 1e-12);
}

#[test]
fn from_path_reports_missing_file_and_bad_json() {
    let dir = std::env::temp_dir().join(format!("backdrop-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let missing = dir.join("missing.json");
    assert!(matches!(
        PipelineConfig::from_path(&missing),
        Err(BackdropError::Other(_))
    ));

    let bad = dir.join("bad.json");
    std::fs::write(&bad, "{ not json").unwrap();
    assert!(matches!(
        PipelineConfig::from_path(&bad),
        Err(BackdropError::Serde(_))
    ));

    let good = dir.join("good.json");
    std::fs::write(&good, r#"{"capture_fps": 24}"#).unwrap();
    assert_eq!(PipelineConfig::from_path(&good).unwrap().capture_fps, 24);

    let _ = std::fs::remove_dir_all(&dir);
}
