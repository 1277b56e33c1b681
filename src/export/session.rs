use crate::export::orchestrator::{ExportRequest, ExportResult, Exporter};
use crate::foundation::core::{Canvas, Rect};
use crate::foundation::error::{BackdropError, BackdropResult};
use crate::model::background::BackgroundAsset;
use crate::model::media::VideoAsset;
use crate::model::options::{ExportOptions, ProcessingOptions, QualityTier};
use crate::pipeline::cancel::CancelToken;
use crate::render::compositor::preview_rect;

/// Top-level state of one editing session: the loaded video, the live options and the most
/// recent export.
pub struct ExportSession {
    exporter: Exporter,
    options: ProcessingOptions,
    video: Option<VideoAsset>,
    last_result: Option<ExportResult>,
}

impl ExportSession {
    /// A session exporting through `exporter`.
    pub fn new(exporter: Exporter) -> Self {
        Self {
            exporter,
            options: ProcessingOptions::default(),
            video: None,
            last_result: None,
        }
    }

    /// The exporter, and through it the artifact store.
    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    /// Live compositing options.
    pub fn options(&self) -> &ProcessingOptions {
        &self.options
    }

    /// Loaded video, if any.
    pub fn video(&self) -> Option<&VideoAsset> {
        self.video.as_ref()
    }

    /// Result of the latest successful export.
    pub fn last_result(&self) -> Option<&ExportResult> {
        self.last_result.as_ref()
    }

    /// Replace the video. The previous export belongs to the old video and is released.
    pub fn load_video(&mut self, video: VideoAsset) {
        self.release_last_result();
        tracing::debug!(name = %video.name, "video loaded into session");
        self.video = Some(video);
    }

    /// Drop the video and anything exported from it.
    pub fn discard_video(&mut self) {
        self.release_last_result();
        self.video = None;
    }

    /// Swap the selected background.
    pub fn select_background(&mut self, background: Option<BackgroundAsset>) {
        self.options.set_background(background);
    }

    /// Change the quality tier.
    pub fn set_quality(&mut self, quality: QualityTier) {
        self.options.set_quality(quality);
    }

    /// Change the preview occupancy. Never affects exports.
    pub fn set_video_size(&mut self, percent: u8) -> BackdropResult<()> {
        self.options.set_video_size(percent)
    }

    /// Where the live preview draws the video on `canvas`, once metadata is known.
    pub fn preview_rect(&self, canvas: Canvas) -> Option<Rect> {
        let meta = self.video.as_ref()?.metadata()?;
        Some(preview_rect(
            canvas,
            self.options.video_size(),
            meta.width,
            meta.height,
        ))
    }

    /// Export options seeded from the session: its quality tier, default format and resolution.
    pub fn default_export_options(&self) -> ExportOptions {
        ExportOptions {
            quality: self.options.quality(),
            ..ExportOptions::default()
        }
    }

    /// The request an export with `options` would run. `options` is used as given.
    pub fn export_request(&self, options: ExportOptions) -> BackdropResult<ExportRequest> {
        let video = self
            .video
            .clone()
            .ok_or_else(|| BackdropError::validation("no video loaded"))?;
        Ok(ExportRequest {
            video,
            background: self.options.background().cloned(),
            options,
        })
    }

    /// Export the loaded video, releasing the previous artifact first.
    pub fn export(
        &mut self,
        options: ExportOptions,
        on_progress: &mut dyn FnMut(u8),
        cancel: &CancelToken,
    ) -> BackdropResult<ExportResult> {
        let request = self.export_request(options)?;
        self.release_last_result();

        let mut job = self.exporter.job(request);
        let result = job.run(on_progress, cancel)?;
        let loaded = job.request().video.metadata().copied();
        drop(job);

        if let (Some(meta), Some(video)) = (loaded, self.video.as_mut())
            && video.metadata().is_none()
        {
            video.record_metadata(meta)?;
        }
        self.last_result = Some(result.clone());
        Ok(result)
    }

    fn release_last_result(&mut self) {
        if let Some(prev) = self.last_result.take() {
            let released = self.exporter.store().revoke(&prev.url);
            tracing::debug!(url = %prev.url, released, "released previous export");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/session.rs"]
mod tests;
