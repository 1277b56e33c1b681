//! Pipeline tuning knobs.

use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;

use crate::foundation::core::Fps;
use crate::foundation::error::{BackdropError, BackdropResult};

/// Timing, encoder tool and logging settings for exports.
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Deadline for each external load (video metadata, background picture), in milliseconds.
    pub load_timeout_ms: u64,
    /// Frame pump cadence in Hz.
    pub refresh_hz: u32,
    /// Capture sampling rate in frames per second.
    pub capture_fps: u32,
    /// Progress polling cadence in milliseconds.
    pub progress_interval_ms: u32,
    /// Progress quantisation step in percent.
    pub progress_step: u8,
    /// Alpha of the black layer over blurred backgrounds.
    pub blur_overlay_alpha: u8,
    /// External tool locations.
    pub ffmpeg: FfmpegConfig,
    /// Logging setup for the binary.
    pub logging: LoggingConfig,
}

/// Where to find the ffmpeg tools.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FfmpegConfig {
    /// `ffmpeg` executable.
    pub ffmpeg_bin: String,
    /// `ffprobe` executable.
    pub ffprobe_bin: String,
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "backdrop=debug,warn").
    pub level: String,
    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            load_timeout_ms: 30_000,
            refresh_hz: 60,
            capture_fps: 30,
            progress_interval_ms: 100,
            progress_step: 10,
            blur_overlay_alpha: 128,
            ffmpeg: FfmpegConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON config file and validate it.
    pub fn from_path(path: &Path) -> BackdropResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings the scheduler cannot run with.
    pub fn validate(&self) -> BackdropResult<()> {
        if self.load_timeout_ms == 0 {
            return Err(BackdropError::validation("load_timeout_ms must be > 0"));
        }
        if self.refresh_hz == 0 {
            return Err(BackdropError::validation("refresh_hz must be > 0"));
        }
        if self.capture_fps == 0 {
            return Err(BackdropError::validation("capture_fps must be > 0"));
        }
        if self.progress_interval_ms == 0 {
            return Err(BackdropError::validation("progress_interval_ms must be > 0"));
        }
        if !(1..=100).contains(&self.progress_step) {
            return Err(BackdropError::validation(format!(
                "progress_step must be within 1..=100, got {}",
                self.progress_step
            )));
        }
        if self.ffmpeg.ffmpeg_bin.trim().is_empty() || self.ffmpeg.ffprobe_bin.trim().is_empty() {
            return Err(BackdropError::validation("ffmpeg tool paths must not be empty"));
        }
        Ok(())
    }

    /// Load timeout as a [`Duration`].
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    /// Frame pump cadence as a rate.
    pub fn refresh_rate(&self) -> BackdropResult<Fps> {
        Fps::whole(self.refresh_hz)
    }

    /// Capture sampling rate.
    pub fn capture_rate(&self) -> BackdropResult<Fps> {
        Fps::whole(self.capture_fps)
    }

    /// Progress polling cadence as a rate (`1000 / interval_ms` Hz).
    pub fn progress_rate(&self) -> BackdropResult<Fps> {
        Fps::new(1000, self.progress_interval_ms)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
