use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::assets::decode::PreparedImage;
use crate::foundation::core::{Canvas, Rect};
use crate::foundation::error::{BackdropError, BackdropResult};
use crate::render::blur::{blur_rgba8_premul, kernel_radius_for_sigma};
use crate::render::composite::{PixelRect, fill_over, over_region};

/// One composited frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 bytes, row-major, tightly packed.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied by alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Per-draw filter applied to the source before it lands on the surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawFilter {
    /// Gaussian blur standard deviation in output pixels; `0` disables blurring.
    pub blur_amount: u32,
}

impl DrawFilter {
    /// No filtering.
    pub const NONE: Self = Self { blur_amount: 0 };

    /// Blur by `amount` pixels.
    pub fn blur(amount: u32) -> Self {
        Self {
            blur_amount: amount,
        }
    }
}

/// 2D drawing target the compositor paints into.
///
/// Colours are premultiplied RGBA8. Rectangles are in surface pixels with the origin at the
/// top-left corner.
pub trait Canvas2DSurface {
    /// Surface width in pixels.
    fn width(&self) -> u32;
    /// Surface height in pixels.
    fn height(&self) -> u32;
    /// Overwrite every pixel with `color`.
    fn clear(&mut self, color: [u8; 4]);
    /// Scale the `src` region of `image` into `dst`, filtered by `filter`, blending over what
    /// is already there.
    fn draw_image(
        &mut self,
        image: &PreparedImage,
        src: Rect,
        dst: Rect,
        filter: DrawFilter,
    ) -> BackdropResult<()>;
    /// Blend a solid colour over `rect`.
    fn fill_rect(&mut self, rect: Rect, color: [u8; 4]) -> BackdropResult<()>;
    /// Copy out the current contents.
    fn snapshot(&self) -> FrameRGBA;
}

/// Builds surfaces for a given canvas size.
pub trait SurfaceFactory: Send + Sync {
    /// A fresh, transparent surface of `canvas` size.
    fn create(&self, canvas: Canvas) -> BackdropResult<Box<dyn Canvas2DSurface>>;
}

impl<F> SurfaceFactory for F
where
    F: Fn(Canvas) -> BackdropResult<Box<dyn Canvas2DSurface>> + Send + Sync,
{
    fn create(&self, canvas: Canvas) -> BackdropResult<Box<dyn Canvas2DSurface>> {
        self(canvas)
    }
}

/// Default factory producing [`CpuSurface`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuSurfaceFactory;

impl SurfaceFactory for CpuSurfaceFactory {
    fn create(&self, canvas: Canvas) -> BackdropResult<Box<dyn Canvas2DSurface>> {
        Ok(Box::new(CpuSurface::new(canvas)))
    }
}

/// Heavy blurs run on a downscaled copy; this caps the reduction factor.
const MAX_BLUR_DOWNSCALE: u32 = 8;

/// Software surface backed by a premultiplied RGBA8 buffer.
#[derive(Clone, Debug)]
pub struct CpuSurface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl CpuSurface {
    /// A transparent surface of `canvas` size.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0u8; canvas.rgba8_len()],
        }
    }

    /// Raw premultiplied pixels.
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }
}

impl Canvas2DSurface for CpuSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self, color: [u8; 4]) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }

    fn draw_image(
        &mut self,
        image: &PreparedImage,
        src: Rect,
        dst: Rect,
        filter: DrawFilter,
    ) -> BackdropResult<()> {
        let Some(src_px) = PixelRect::snap_clip(src, image.width, image.height) else {
            return Ok(());
        };
        let dst_x0 = dst.x0.round();
        let dst_y0 = dst.y0.round();
        let out_w = (dst.x1.round() - dst_x0).max(0.0) as u32;
        let out_h = (dst.y1.round() - dst_y0).max(0.0) as u32;
        let Some(visible) = PixelRect::snap_clip(dst, self.width, self.height) else {
            return Ok(());
        };
        if out_w == 0 || out_h == 0 {
            return Ok(());
        }

        let cropped = crop_prepared(image, src_px)?;

        let scaled = if filter.blur_amount > 0 {
            scale_blurred(&cropped, out_w, out_h, filter.blur_amount)?
        } else if cropped.dimensions() == (out_w, out_h) {
            cropped
        } else {
            imageops::resize(&cropped, out_w, out_h, FilterType::Triangle)
        };

        // `visible` is the on-surface part of `dst`; cut the matching piece out of `scaled`.
        let off_x = (f64::from(visible.x) - dst_x0).max(0.0) as u32;
        let off_y = (f64::from(visible.y) - dst_y0).max(0.0) as u32;
        let piece_w = visible.width.min(out_w.saturating_sub(off_x));
        let piece_h = visible.height.min(out_h.saturating_sub(off_y));
        if piece_w == 0 || piece_h == 0 {
            return Ok(());
        }
        let piece = if (off_x, off_y, piece_w, piece_h) == (0, 0, out_w, out_h) {
            scaled
        } else {
            imageops::crop_imm(&scaled, off_x, off_y, piece_w, piece_h).to_image()
        };

        over_region(
            &mut self.data,
            self.width,
            self.height,
            piece.as_raw(),
            piece_w,
            piece_h,
            visible.x,
            visible.y,
        )
    }

    fn fill_rect(&mut self, rect: Rect, color: [u8; 4]) -> BackdropResult<()> {
        let Some(px) = PixelRect::snap_clip(rect, self.width, self.height) else {
            return Ok(());
        };
        fill_over(&mut self.data, self.width, px, color)
    }

    fn snapshot(&self) -> FrameRGBA {
        FrameRGBA {
            width: self.width,
            height: self.height,
            data: self.data.clone(),
            premultiplied: true,
        }
    }
}

fn crop_prepared(image: &PreparedImage, px: PixelRect) -> BackdropResult<RgbaImage> {
    let stride = image.width as usize * 4;
    let row_len = px.width as usize * 4;
    let mut out = Vec::with_capacity(row_len * px.height as usize);
    for y in px.y..px.y + px.height {
        let start = y as usize * stride + px.x as usize * 4;
        let row = image
            .rgba8_premul
            .get(start..start + row_len)
            .ok_or_else(|| BackdropError::pipeline("prepared image buffer does not match its size"))?;
        out.extend_from_slice(row);
    }
    RgbaImage::from_raw(px.width, px.height, out)
        .ok_or_else(|| BackdropError::pipeline("cropped buffer does not match its size"))
}

fn scale_blurred(src: &RgbaImage, out_w: u32, out_h: u32, amount: u32) -> BackdropResult<RgbaImage> {
    let factor = (amount / 4).clamp(1, MAX_BLUR_DOWNSCALE);
    let small_w = (out_w / factor).max(1);
    let small_h = (out_h / factor).max(1);
    let small = imageops::resize(src, small_w, small_h, FilterType::Triangle);

    let sigma = amount as f32 / factor as f32;
    let radius = kernel_radius_for_sigma(sigma);
    let blurred = blur_rgba8_premul(small.as_raw(), small_w, small_h, radius, sigma)?;
    let blurred = RgbaImage::from_raw(small_w, small_h, blurred)
        .ok_or_else(|| BackdropError::pipeline("blur output does not match its size"))?;

    if (small_w, small_h) == (out_w, out_h) {
        return Ok(blurred);
    }
    Ok(imageops::resize(&blurred, out_w, out_h, FilterType::Triangle))
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
