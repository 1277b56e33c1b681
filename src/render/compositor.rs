use crate::assets::decode::PreparedImage;
use crate::foundation::core::{Canvas, Rect};
use crate::foundation::error::{BackdropError, BackdropResult};
use crate::model::options::VideoSize;
use crate::render::surface::{Canvas2DSurface, DrawFilter};

/// Default darkening laid over a blurred background (50 % black).
pub const DEFAULT_BLUR_OVERLAY_ALPHA: u8 = 128;

/// Largest rectangle with the source's aspect ratio that fits inside `bounds`, centred.
///
/// Wider sources span the full width and get bars above and below; taller ones span the full
/// height and get bars on the sides.
pub fn fit_contain(src_w: u32, src_h: u32, bounds: Rect) -> Rect {
    let (bw, bh) = (bounds.width(), bounds.height());
    if src_w == 0 || src_h == 0 || bw <= 0.0 || bh <= 0.0 {
        return Rect::new(bounds.x0, bounds.y0, bounds.x0, bounds.y0);
    }
    let video_aspect = f64::from(src_w) / f64::from(src_h);
    let bounds_aspect = bw / bh;
    if video_aspect > bounds_aspect {
        let h = bw / video_aspect;
        let y0 = bounds.y0 + (bh - h) / 2.0;
        Rect::new(bounds.x0, y0, bounds.x1, y0 + h)
    } else {
        let w = bh * video_aspect;
        let x0 = bounds.x0 + (bw - w) / 2.0;
        Rect::new(x0, bounds.y0, x0 + w, bounds.y1)
    }
}

/// Region of a `src_w x src_h` source that, scaled up, fills a `dst_aspect` target with no bars.
///
/// The excess is cropped evenly from both sides.
pub fn cover_source_rect(src_w: u32, src_h: u32, dst_aspect: f64) -> Rect {
    let (sw, sh) = (f64::from(src_w), f64::from(src_h));
    if src_w == 0 || src_h == 0 || !dst_aspect.is_finite() || dst_aspect <= 0.0 {
        return Rect::new(0.0, 0.0, sw, sh);
    }
    let src_aspect = sw / sh;
    if src_aspect > dst_aspect {
        let w = sh * dst_aspect;
        let x0 = (sw - w) / 2.0;
        Rect::new(x0, 0.0, x0 + w, sh)
    } else {
        let h = sw / dst_aspect;
        let y0 = (sh - h) / 2.0;
        Rect::new(0.0, y0, sw, y0 + h)
    }
}

/// Where the live preview draws the video: a centred box `video_size` percent of the canvas,
/// with the video aspect-fit inside it.
pub fn preview_rect(canvas: Canvas, video_size: VideoSize, src_w: u32, src_h: u32) -> Rect {
    let f = video_size.fraction();
    let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
    let (bw, bh) = (cw * f, ch * f);
    let x0 = (cw - bw) / 2.0;
    let y0 = (ch - bh) / 2.0;
    fit_contain(src_w, src_h, Rect::new(x0, y0, x0 + bw, y0 + bh))
}

/// Background layer after any external picture has been loaded.
#[derive(Clone, Debug, PartialEq)]
pub enum PreparedBackground {
    /// Nothing behind the video.
    None,
    /// A decoded picture, drawn cover-fit.
    Image(PreparedImage),
    /// The video frame itself, cover-fit, blurred and darkened.
    Blur {
        /// Blur amount in pixels.
        amount: u32,
    },
}

/// Draws one output frame: background layer, then the aspect-fit video on top.
#[derive(Clone, Debug)]
pub struct FrameCompositor {
    canvas: Canvas,
    background: PreparedBackground,
    overlay_alpha: u8,
}

impl FrameCompositor {
    /// Compositor for a fixed output canvas.
    pub fn new(canvas: Canvas, background: PreparedBackground) -> Self {
        Self {
            canvas,
            background,
            overlay_alpha: DEFAULT_BLUR_OVERLAY_ALPHA,
        }
    }

    /// Override the blur darkening (0 disables it).
    pub fn with_overlay_alpha(mut self, alpha: u8) -> Self {
        self.overlay_alpha = alpha;
        self
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Background layer in use.
    pub fn background(&self) -> &PreparedBackground {
        &self.background
    }

    /// Where a `src_w x src_h` video lands on the output canvas.
    pub fn video_rect(&self, src_w: u32, src_h: u32) -> Rect {
        fit_contain(src_w, src_h, self.canvas.rect())
    }

    /// Paint `frame` onto `surface` and return the rectangle the video occupies.
    pub fn composite(
        &self,
        surface: &mut dyn Canvas2DSurface,
        frame: &PreparedImage,
    ) -> BackdropResult<Rect> {
        if surface.width() != self.canvas.width || surface.height() != self.canvas.height {
            return Err(BackdropError::pipeline(format!(
                "surface is {}x{}, compositor canvas is {}x{}",
                surface.width(),
                surface.height(),
                self.canvas.width,
                self.canvas.height
            )));
        }

        let full = self.canvas.rect();
        surface.clear([0, 0, 0, 0]);

        match &self.background {
            PreparedBackground::None => {}
            PreparedBackground::Image(image) => {
                let src = cover_source_rect(image.width, image.height, self.canvas.aspect());
                surface.draw_image(image, src, full, DrawFilter::NONE)?;
            }
            PreparedBackground::Blur { amount } => {
                let src = cover_source_rect(frame.width, frame.height, self.canvas.aspect());
                surface.draw_image(frame, src, full, DrawFilter::blur(*amount))?;
                if self.overlay_alpha > 0 {
                    surface.fill_rect(full, [0, 0, 0, self.overlay_alpha])?;
                }
            }
        }

        let dst = self.video_rect(frame.width, frame.height);
        let src = Rect::new(0.0, 0.0, f64::from(frame.width), f64::from(frame.height));
        surface.draw_image(frame, src, dst, DrawFilter::NONE)?;
        Ok(dst)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
