use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{BackdropError, BackdropResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Decoded raster ready for drawing: premultiplied RGBA8, tightly packed, row-major.
///
/// Pixel data is shared, so clones are cheap. Used for background pictures and decoded video
/// frames alike.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8 bytes.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Wrap premultiplied bytes, checking their length.
    pub fn from_rgba8_premul(width: u32, height: u32, data: Vec<u8>) -> BackdropResult<Self> {
        if width == 0 || height == 0 {
            return Err(BackdropError::validation("image width/height must be non-zero"));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| BackdropError::validation("image buffer size overflow"))?;
        if data.len() != expected {
            return Err(BackdropError::validation(format!(
                "image buffer is {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(data),
        })
    }

    /// Wrap straight-alpha bytes (as decoders and ffmpeg emit them).
    pub fn from_straight_rgba8(width: u32, height: u32, mut data: Vec<u8>) -> BackdropResult<Self> {
        premultiply_rgba8_in_place(&mut data);
        Self::from_rgba8_premul(width, height, data)
    }

    /// A single-colour image (premultiplied RGBA8).
    pub fn solid(width: u32, height: u32, rgba_premul: [u8; 4]) -> BackdropResult<Self> {
        let px = (width as usize).saturating_mul(height as usize);
        Self::from_rgba8_premul(width, height, rgba_premul.repeat(px))
    }

    /// Width divided by height.
    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// Premultiplied pixel at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.rgba8_premul.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Decode an encoded picture (PNG, JPEG, WebP, ...) into a [`PreparedImage`].
pub fn decode_image(bytes: &[u8]) -> BackdropResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    PreparedImage::from_straight_rgba8(width, height, rgba.into_raw())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
