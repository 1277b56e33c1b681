use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
    assert!(Fps::new(30, 1).is_ok());
}

#[test]
fn fps_parse_ratio_handles_ffprobe_forms() {
    assert_eq!(Fps::parse_ratio("30000/1001"), Some(Fps { num: 30000, den: 1001 }));
    assert_eq!(Fps::parse_ratio("25"), Some(Fps { num: 25, den: 1 }));
    assert_eq!(Fps::parse_ratio("0/0"), None);
    assert_eq!(Fps::parse_ratio("abc"), None);
}

#[test]
fn fps_frame_math() {
    let fps = Fps::whole(30).unwrap();
    assert!((fps.frames_to_secs(45) - 1.5).abs() < 1e-12);
    assert_eq!(fps.secs_to_frames_ceil(10.0), 300);
    assert_eq!(fps.secs_to_frames_ceil(0.01), 1);
    assert_eq!(fps.secs_to_frames_ceil(0.0), 0);
}

#[test]
fn canvas_validation_and_helpers() {
    assert!(Canvas::new(0, 10).is_err());
    let c = Canvas::new(1280, 720).unwrap();
    assert!((c.aspect() - 16.0 / 9.0).abs() < 1e-12);
    assert_eq!(c.rect(), Rect::new(0.0, 0.0, 1280.0, 720.0));
    assert_eq!(c.rgba8_len(), 1280 * 720 * 4);
}
