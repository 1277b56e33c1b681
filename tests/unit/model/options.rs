use super::*;
use crate::model::background::blur_background;

#[test]
fn bitrate_table_is_exact() {
    assert_eq!(QualityTier::High.bitrate_bps(), 5_000_000);
    assert_eq!(QualityTier::Medium.bitrate_bps(), 2_500_000);
    assert_eq!(QualityTier::Low.bitrate_bps(), 1_000_000);
}

#[test]
fn resolution_dimensions_are_exact() {
    assert_eq!(Resolution::P480.dimensions(), (854, 480));
    assert_eq!(Resolution::P720.dimensions(), (1280, 720));
    assert_eq!(Resolution::P1080.dimensions(), (1920, 1080));
    for r in Resolution::ALL {
        assert_eq!(r.as_str().parse::<Resolution>().unwrap(), r);
    }
}

#[test]
fn parsing_is_case_insensitive_and_rejects_unknowns() {
    assert_eq!("HIGH".parse::<QualityTier>().unwrap(), QualityTier::High);
    assert_eq!("Mov".parse::<ExportFormat>().unwrap(), ExportFormat::Mov);
    assert!("ultra".parse::<QualityTier>().is_err());
    assert!("4k".parse::<Resolution>().is_err());
    assert!("avi".parse::<ExportFormat>().is_err());
}

#[test]
fn video_size_bounds() {
    assert!(VideoSize::new(49).is_err());
    assert!(VideoSize::new(91).is_err());
    assert_eq!(VideoSize::new(50).unwrap().percent(), 50);
    assert_eq!(VideoSize::default().percent(), 75);
    assert!((VideoSize::new(90).unwrap().fraction() - 0.9).abs() < 1e-12);
    assert!(serde_json::from_str::<VideoSize>("95").is_err());
}

#[test]
fn processing_options_defaults_and_setters() {
    let mut opts = ProcessingOptions::default();
    assert_eq!(opts.quality(), QualityTier::Medium);
    assert_eq!(opts.video_size().percent(), 75);
    assert!(opts.background().is_none());

    opts.set_background(Some(blur_background()));
    assert_eq!(opts.background().unwrap().id, "blur");
    opts.set_background(Some(BackgroundAsset::none()));
    assert!(opts.background().is_none());

    assert!(opts.set_video_size(40).is_err());
    assert_eq!(opts.video_size().percent(), 75);
    opts.set_video_size(60).unwrap();
    assert_eq!(opts.video_size().percent(), 60);
}

#[test]
fn export_defaults_and_filename() {
    let opts = ExportOptions::default();
    assert_eq!(opts.format, ExportFormat::Mp4);
    assert_eq!(opts.resolution, Resolution::P1080);
    assert_eq!(opts.download_filename(42), "backdrop-export-42.mp4");

    let json = serde_json::to_value(ExportOptions {
        format: ExportFormat::WebM,
        quality: QualityTier::Low,
        resolution: Resolution::P480,
    })
    .unwrap();
    assert_eq!(json["format"], "webm");
    assert_eq!(json["quality"], "low");
    assert_eq!(json["resolution"], "480p");
}

#[test]
fn gif_ignores_bitrate() {
    assert!(!ExportFormat::Gif.uses_bitrate());
    assert!(ExportFormat::Mp4.uses_bitrate());
    assert_eq!(ExportFormat::Gif.mime_type(), "image/gif");
}
