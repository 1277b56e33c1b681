use std::str::FromStr;

use crate::foundation::core::Canvas;
use crate::foundation::error::{BackdropError, BackdropResult};
use crate::model::background::{BackgroundAsset, BackgroundKind};

/// Named encoding preset mapping to a target video bitrate.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// 1 Mbps.
    Low,
    /// 2.5 Mbps.
    #[default]
    Medium,
    /// 5 Mbps.
    High,
}

impl QualityTier {
    /// Target video bitrate in bits per second.
    pub fn bitrate_bps(self) -> u64 {
        match self {
            Self::High => 5_000_000,
            Self::Medium => 2_500_000,
            Self::Low => 1_000_000,
        }
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for QualityTier {
    type Err = BackdropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(BackdropError::validation(format!(
                "unknown quality '{other}' (expected low|medium|high)"
            ))),
        }
    }
}

/// Export resolution preset.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Resolution {
    /// 854x480.
    #[serde(rename = "480p")]
    P480,
    /// 1280x720.
    #[serde(rename = "720p")]
    P720,
    /// 1920x1080.
    #[default]
    #[serde(rename = "1080p")]
    P1080,
}

impl Resolution {
    /// Every preset, smallest first.
    pub const ALL: [Resolution; 3] = [Self::P480, Self::P720, Self::P1080];

    /// Pixel dimensions `(width, height)`.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Self::P480 => (854, 480),
            Self::P720 => (1280, 720),
            Self::P1080 => (1920, 1080),
        }
    }

    /// Output canvas for this preset.
    pub fn canvas(self) -> Canvas {
        let (width, height) = self.dimensions();
        Canvas { width, height }
    }

    /// Preset label, e.g. `720p`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::P480 => "480p",
            Self::P720 => "720p",
            Self::P1080 => "1080p",
        }
    }
}

impl FromStr for Resolution {
    type Err = BackdropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "480p" => Ok(Self::P480),
            "720p" => Ok(Self::P720),
            "1080p" => Ok(Self::P1080),
            other => Err(BackdropError::validation(format!(
                "unknown resolution '{other}' (expected 480p|720p|1080p)"
            ))),
        }
    }
}

/// Output container format.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// H.264 in fragmented MP4.
    #[default]
    Mp4,
    /// H.264 in fragmented QuickTime.
    Mov,
    /// Palette-quantised animated GIF.
    Gif,
    /// VP9 in WebM.
    #[serde(rename = "webm")]
    WebM,
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
            Self::Gif => "gif",
            Self::WebM => "webm",
        }
    }

    /// MIME type of produced artifacts.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Mov => "video/quicktime",
            Self::Gif => "image/gif",
            Self::WebM => "video/webm",
        }
    }

    /// Whether the encoder honours a target bitrate for this format.
    pub fn uses_bitrate(self) -> bool {
        !matches!(self, Self::Gif)
    }

    /// Whether frame dimensions must be even (4:2:0 chroma subsampling).
    pub fn requires_even_dimensions(self) -> bool {
        !matches!(self, Self::Gif)
    }
}

impl FromStr for ExportFormat {
    type Err = BackdropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4" => Ok(Self::Mp4),
            "mov" => Ok(Self::Mov),
            "gif" => Ok(Self::Gif),
            "webm" => Ok(Self::WebM),
            other => Err(BackdropError::validation(format!(
                "unknown format '{other}' (expected mp4|mov|gif|webm)"
            ))),
        }
    }
}

/// Percentage of the preview the video box occupies (50..=90).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct VideoSize(u8);

impl VideoSize {
    /// Smallest accepted percentage.
    pub const MIN: u8 = 50;
    /// Largest accepted percentage.
    pub const MAX: u8 = 90;

    /// Validate a percentage.
    pub fn new(percent: u8) -> BackdropResult<Self> {
        if !(Self::MIN..=Self::MAX).contains(&percent) {
            return Err(BackdropError::validation(format!(
                "videoSize must be within {}..={}, got {percent}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(percent))
    }

    /// The percentage.
    pub fn percent(self) -> u8 {
        self.0
    }

    /// The percentage as a fraction in `0.5..=0.9`.
    pub fn fraction(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl Default for VideoSize {
    fn default() -> Self {
        Self(75)
    }
}

impl TryFrom<u8> for VideoSize {
    type Error = BackdropError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl From<VideoSize> for u8 {
    fn from(v: VideoSize) -> Self {
        v.0
    }
}

/// The live compositing configuration owned by a session.
///
/// Fields change only through the setters, each of which validates its input.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingOptions {
    background: Option<BackgroundAsset>,
    quality: QualityTier,
    video_size: VideoSize,
}

impl ProcessingOptions {
    /// Selected background. `none` backgrounds are normalised to `None`.
    pub fn background(&self) -> Option<&BackgroundAsset> {
        self.background.as_ref()
    }

    /// Selected quality tier.
    pub fn quality(&self) -> QualityTier {
        self.quality
    }

    /// Selected video occupancy.
    pub fn video_size(&self) -> VideoSize {
        self.video_size
    }

    /// Swap the current background.
    pub fn set_background(&mut self, background: Option<BackgroundAsset>) {
        self.background = background.filter(|b| b.kind != BackgroundKind::None);
    }

    /// Change the quality tier.
    pub fn set_quality(&mut self, quality: QualityTier) {
        self.quality = quality;
    }

    /// Change the video occupancy percentage.
    pub fn set_video_size(&mut self, percent: u8) -> BackdropResult<()> {
        self.video_size = VideoSize::new(percent)?;
        Ok(())
    }
}

/// Output configuration for one export request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExportOptions {
    /// Container format.
    pub format: ExportFormat,
    /// Quality tier, which selects the bitrate.
    pub quality: QualityTier,
    /// Output resolution.
    pub resolution: Resolution,
}

impl ExportOptions {
    /// Suggested download filename, `backdrop-export-<unix_millis>.<ext>`.
    pub fn download_filename(&self, unix_millis: u128) -> String {
        format!(
            "backdrop-export-{unix_millis}.{}",
            self.format.extension()
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/options.rs"]
mod tests;
