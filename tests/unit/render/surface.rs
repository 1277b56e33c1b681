use super::*;

fn canvas(w: u32, h: u32) -> Canvas {
    Canvas::new(w, h).unwrap()
}

#[test]
fn new_surface_is_transparent() {
    let s = CpuSurface::new(canvas(3, 2));
    assert_eq!(s.pixels().len(), 3 * 2 * 4);
    assert!(s.pixels().iter().all(|b| *b == 0));
    let snap = s.snapshot();
    assert!(snap.premultiplied);
    assert_eq!((snap.width, snap.height), (3, 2));
}

#[test]
fn clear_sets_every_pixel() {
    let mut s = CpuSurface::new(canvas(2, 2));
    s.clear([0, 0, 0, 255]);
    assert!(s.pixels().chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
}

#[test]
fn draw_image_scales_into_destination_only() {
    let mut s = CpuSurface::new(canvas(8, 8));
    let red = PreparedImage::solid(2, 2, [255, 0, 0, 255]).unwrap();
    s.draw_image(
        &red,
        Rect::new(0.0, 0.0, 2.0, 2.0),
        Rect::new(2.0, 2.0, 6.0, 6.0),
        DrawFilter::NONE,
    )
    .unwrap();

    let snap = s.snapshot();
    assert_eq!(snap.pixel(2, 2), Some([255, 0, 0, 255]));
    assert_eq!(snap.pixel(5, 5), Some([255, 0, 0, 255]));
    assert_eq!(snap.pixel(1, 1), Some([0, 0, 0, 0]));
    assert_eq!(snap.pixel(6, 6), Some([0, 0, 0, 0]));
}

#[test]
fn draw_image_clips_destination_outside_surface() {
    let mut s = CpuSurface::new(canvas(4, 4));
    let green = PreparedImage::solid(4, 4, [0, 255, 0, 255]).unwrap();
    s.draw_image(
        &green,
        Rect::new(0.0, 0.0, 4.0, 4.0),
        Rect::new(-2.0, -2.0, 2.0, 2.0),
        DrawFilter::NONE,
    )
    .unwrap();

    let snap = s.snapshot();
    assert_eq!(snap.pixel(0, 0), Some([0, 255, 0, 255]));
    assert_eq!(snap.pixel(1, 1), Some([0, 255, 0, 255]));
    assert_eq!(snap.pixel(2, 2), Some([0, 0, 0, 0]));
}

#[test]
fn draw_image_with_blur_keeps_flat_colour() {
    let mut s = CpuSurface::new(canvas(16, 16));
    let blue = PreparedImage::solid(8, 8, [0, 0, 255, 255]).unwrap();
    s.draw_image(
        &blue,
        Rect::new(0.0, 0.0, 8.0, 8.0),
        canvas(16, 16).rect(),
        DrawFilter::blur(10),
    )
    .unwrap();

    let snap = s.snapshot();
    assert_eq!(snap.pixel(0, 0), Some([0, 0, 255, 255]));
    assert_eq!(snap.pixel(15, 15), Some([0, 0, 255, 255]));
}

#[test]
fn fill_rect_blends_over_existing_pixels() {
    let mut s = CpuSurface::new(canvas(2, 1));
    s.clear([200, 200, 200, 255]);
    s.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), [0, 0, 0, 128])
        .unwrap();
    let snap = s.snapshot();
    assert_eq!(snap.pixel(0, 0), Some([100, 100, 100, 255]));
    assert_eq!(snap.pixel(1, 0), Some([200, 200, 200, 255]));
}

#[test]
fn empty_destination_draws_nothing() {
    let mut s = CpuSurface::new(canvas(2, 2));
    let white = PreparedImage::solid(1, 1, [255, 255, 255, 255]).unwrap();
    s.draw_image(
        &white,
        Rect::new(0.0, 0.0, 1.0, 1.0),
        Rect::new(1.0, 1.0, 1.0, 1.0),
        DrawFilter::NONE,
    )
    .unwrap();
    assert!(s.pixels().iter().all(|b| *b == 0));
}
