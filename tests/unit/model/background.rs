use super::*;

#[test]
fn blur_amount_present_iff_blur() {
    let none = BackgroundAsset::none();
    let image = BackgroundAsset::image("beach", "Beach", "/tmp/beach.png").unwrap();
    let blur = blur_background();

    assert_eq!(none.blur_amount(), None);
    assert_eq!(image.blur_amount(), None);
    assert_eq!(blur.blur_amount(), Some(DEFAULT_BLUR_AMOUNT));

    assert_eq!(blur.url(), "");
    assert_eq!(none.url(), "");
    assert_eq!(image.url(), "/tmp/beach.png");
}

#[test]
fn only_image_backgrounds_need_a_fetch() {
    assert!(!BackgroundAsset::none().needs_fetch());
    assert!(!blur_background().needs_fetch());
    assert!(
        BackgroundAsset::image("x", "X", "file:///x.png")
            .unwrap()
            .needs_fetch()
    );
}

#[test]
fn constructors_validate_payload() {
    assert!(BackgroundAsset::image("x", "X", "  ").is_err());
    assert!(BackgroundAsset::blur("b", "B", MAX_BLUR_AMOUNT + 1).is_err());
    assert!(BackgroundAsset::blur("b", "B", 0).is_ok());
}

#[test]
fn serde_shape_uses_type_tag_and_blur_amount() {
    let json = serde_json::to_value(blur_background()).unwrap();
    assert_eq!(json["type"], "blur");
    assert_eq!(json["blurAmount"], 10);
    assert_eq!(json["id"], "blur");

    let parsed: BackgroundAsset = serde_json::from_str(
        r#"{"id":"office","name":"Office","type":"image","url":"https://example.com/o.jpg"}"#,
    )
    .unwrap();
    assert_eq!(parsed.variant_tag(), "image");
    assert_eq!(parsed.url(), "https://example.com/o.jpg");

    let bad = serde_json::from_str::<BackgroundAsset>(r#"{"id":"b","name":"B","type":"blur"}"#);
    assert!(bad.is_err());
}

#[test]
fn presets_cover_the_catalogue() {
    let presets = preset_backgrounds();
    assert_eq!(presets.len(), 10);
    assert!(presets.iter().all(|p| p.needs_fetch()));
    assert_eq!(find_preset("forest").unwrap().name, "Forest");
    assert_eq!(find_preset("blur").unwrap().blur_amount(), Some(10));
    assert_eq!(find_preset("none").unwrap().kind, BackgroundKind::None);
    assert!(find_preset("moon").is_none());
}

#[test]
fn custom_images_get_timestamped_ids() {
    let bg = BackgroundAsset::custom_image("me.png", "/tmp/me.png").unwrap();
    assert!(bg.id.starts_with("custom-"));
    assert_eq!(bg.name, "me.png");
}
