use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::assets::validate::{guess_mime_type, validate_video_upload};
use crate::foundation::core::Fps;
use crate::foundation::error::{BackdropError, BackdropResult};

/// Metadata that becomes known once the underlying media has loaded.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VideoMetadata {
    /// Clip duration in seconds.
    pub duration_secs: f64,
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    /// Native frame rate, when the container reports one.
    pub fps: Option<Fps>,
}

impl VideoMetadata {
    /// Reject metadata the compositor cannot work with.
    pub fn validate(&self) -> BackdropResult<()> {
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(BackdropError::media_load(format!(
                "video duration must be a positive number of seconds, got {}",
                self.duration_secs
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(BackdropError::media_load(format!(
                "video dimensions must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Width divided by height.
    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// A user-supplied video.
///
/// Duration and natural size read as `0` until [`VideoAsset::record_metadata`] has been called.
/// After that they never change for the lifetime of the asset.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VideoAsset {
    /// Where the bytes live.
    pub source: PathBuf,
    /// Playable URL for the same bytes.
    pub url: String,
    /// Display name (the file name for uploads).
    pub name: String,
    /// Size of the source in bytes.
    pub byte_size: u64,
    /// MIME type, e.g. `video/mp4`.
    pub mime_type: String,
    /// Container format string derived from the MIME subtype.
    pub format: String,
    metadata: Option<VideoMetadata>,
}

impl VideoAsset {
    /// Describe a video whose metadata is not loaded yet.
    pub fn new(
        source: impl Into<PathBuf>,
        name: impl Into<String>,
        byte_size: u64,
        mime_type: impl Into<String>,
    ) -> Self {
        let source = source.into();
        let mime_type = mime_type.into();
        let format = mime_type
            .split_once('/')
            .map(|(_, sub)| sub)
            .filter(|sub| !sub.is_empty())
            .unwrap_or("mp4")
            .to_string();
        Self {
            url: file_url(&source),
            source,
            name: name.into(),
            byte_size,
            mime_type,
            format,
            metadata: None,
        }
    }

    /// Build an asset from a file on disk, applying upload validation.
    pub fn from_path(path: impl AsRef<Path>) -> BackdropResult<Self> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path)
            .with_context(|| format!("failed to stat video '{}'", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = guess_mime_type(path).unwrap_or("application/octet-stream");
        validate_video_upload(mime, meta.len())?;
        Ok(Self::new(path, name, meta.len(), mime))
    }

    /// Duration in seconds, `0.0` while unknown.
    pub fn duration_secs(&self) -> f64 {
        self.metadata.map_or(0.0, |m| m.duration_secs)
    }

    /// Natural width in pixels, `0` while unknown.
    pub fn width(&self) -> u32 {
        self.metadata.map_or(0, |m| m.width)
    }

    /// Natural height in pixels, `0` while unknown.
    pub fn height(&self) -> u32 {
        self.metadata.map_or(0, |m| m.height)
    }

    /// Loaded metadata, if any.
    pub fn metadata(&self) -> Option<&VideoMetadata> {
        self.metadata.as_ref()
    }

    /// Record metadata once it is known.
    ///
    /// Recording the same values again is a no-op; recording different values is rejected.
    pub fn record_metadata(&mut self, meta: VideoMetadata) -> BackdropResult<()> {
        meta.validate()?;
        match self.metadata {
            Some(existing) if existing == meta => Ok(()),
            Some(_) => Err(BackdropError::validation(format!(
                "metadata for '{}' is already recorded and cannot change",
                self.name
            ))),
            None => {
                self.metadata = Some(meta);
                Ok(())
            }
        }
    }
}

fn file_url(path: &Path) -> String {
    let abs = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", abs.display())
}

#[cfg(test)]
#[path = "../../tests/unit/model/media.rs"]
mod tests;
