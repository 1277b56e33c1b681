use crate::foundation::error::{BackdropError, BackdropResult};
use crate::foundation::math::mul_div255_u8;

pub(crate) type PremulRgba8 = [u8; 4];

/// Porter-Duff source-over for premultiplied pixels.
pub(crate) fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }
    if src[3] == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255_u8(u16::from(dst[i]), inv));
    }
    out
}

/// Integer pixel rectangle, already clipped to a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PixelRect {
    pub(crate) x: u32,
    pub(crate) y: u32,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl PixelRect {
    /// Snap a floating-point rectangle to pixel edges and clip it to `bounds_w x bounds_h`.
    ///
    /// Returns `None` when nothing of the rectangle is visible.
    pub(crate) fn snap_clip(rect: kurbo::Rect, bounds_w: u32, bounds_h: u32) -> Option<Self> {
        let x0 = rect.x0.round().max(0.0);
        let y0 = rect.y0.round().max(0.0);
        let x1 = rect.x1.round().min(f64::from(bounds_w));
        let y1 = rect.y1.round().min(f64::from(bounds_h));
        if !(x1 > x0 && y1 > y0) {
            return None;
        }
        Some(Self {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}

/// Blend `src` (a `src_w x src_h` premultiplied buffer) over `dst` with its top-left at
/// `(dst_x, dst_y)`. Parts outside `dst` are dropped.
#[allow(clippy::too_many_arguments)]
pub(crate) fn over_region(
    dst: &mut [u8],
    dst_w: u32,
    dst_h: u32,
    src: &[u8],
    src_w: u32,
    src_h: u32,
    dst_x: u32,
    dst_y: u32,
) -> BackdropResult<()> {
    if dst.len() != (dst_w as usize) * (dst_h as usize) * 4
        || src.len() != (src_w as usize) * (src_h as usize) * 4
    {
        return Err(BackdropError::pipeline(
            "over_region expects buffers matching their dimensions",
        ));
    }

    let copy_w = src_w.min(dst_w.saturating_sub(dst_x)) as usize;
    let copy_h = src_h.min(dst_h.saturating_sub(dst_y)) as usize;
    for row in 0..copy_h {
        let s_off = row * src_w as usize * 4;
        let d_off = ((dst_y as usize + row) * dst_w as usize + dst_x as usize) * 4;
        let s_row = &src[s_off..s_off + copy_w * 4];
        let d_row = &mut dst[d_off..d_off + copy_w * 4];
        for (d, s) in d_row.chunks_exact_mut(4).zip(s_row.chunks_exact(4)) {
            let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
            d.copy_from_slice(&out);
        }
    }
    Ok(())
}

/// Blend a solid premultiplied colour over `rect` of `dst`.
pub(crate) fn fill_over(
    dst: &mut [u8],
    dst_w: u32,
    rect: PixelRect,
    color: PremulRgba8,
) -> BackdropResult<()> {
    if dst_w == 0 || !dst.len().is_multiple_of(dst_w as usize * 4) {
        return Err(BackdropError::pipeline("fill_over expects a whole number of rows"));
    }
    let dst_h = (dst.len() / (dst_w as usize * 4)) as u32;
    if rect.x + rect.width > dst_w || rect.y + rect.height > dst_h {
        return Err(BackdropError::pipeline("fill_over rect exceeds target"));
    }
    for y in rect.y..rect.y + rect.height {
        let start = ((y as usize) * (dst_w as usize) + rect.x as usize) * 4;
        let row = &mut dst[start..start + rect.width as usize * 4];
        for d in row.chunks_exact_mut(4) {
            let out = over([d[0], d[1], d[2], d[3]], color);
            d.copy_from_slice(&out);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
