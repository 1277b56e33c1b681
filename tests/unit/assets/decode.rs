use std::io::Cursor;

use super::*;

fn png_bytes(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(w, h, px.repeat((w * h) as usize)).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let prepared = decode_image(&png_bytes(1, 1, [100, 50, 200, 128])).unwrap();
    assert_eq!(prepared.width, 1);
    assert_eq!(prepared.height, 1);
    assert_eq!(
        prepared.pixel(0, 0).unwrap(),
        [
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn decode_garbage_fails() {
    let err = decode_image(b"definitely not an image").unwrap_err();
    assert!(matches!(err, BackdropError::Other(_)));
}

#[test]
fn buffer_length_is_checked() {
    assert!(PreparedImage::from_rgba8_premul(2, 2, vec![0; 15]).is_err());
    assert!(PreparedImage::from_rgba8_premul(0, 2, vec![]).is_err());
    let img = PreparedImage::solid(3, 2, [1, 2, 3, 255]).unwrap();
    assert_eq!(img.rgba8_premul.len(), 24);
    assert_eq!(img.pixel(2, 1), Some([1, 2, 3, 255]));
    assert_eq!(img.pixel(3, 0), None);
    assert!((img.aspect() - 1.5).abs() < 1e-12);
}
