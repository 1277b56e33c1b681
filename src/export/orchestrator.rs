use std::sync::Arc;
use std::time::Duration;

use crate::assets::loader::{ImageLoader, load_with_timeout};
use crate::config::PipelineConfig;
use crate::encode::artifact::{ArtifactStore, ArtifactUrl};
use crate::encode::capture::CaptureSink;
use crate::encode::encoder::{EncoderConfig, EncoderFactory};
use crate::export::progress::ProgressReporter;
use crate::foundation::error::{BackdropError, BackdropResult, ErrorKind};
use crate::model::background::{BackgroundAsset, BackgroundKind};
use crate::model::media::VideoAsset;
use crate::model::options::{ExportFormat, ExportOptions};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::pump::{FramePump, PumpStatus};
use crate::pipeline::schedule::{Schedule, TaskKind};
use crate::render::compositor::{FrameCompositor, PreparedBackground};
use crate::render::surface::{Canvas2DSurface, CpuSurfaceFactory, SurfaceFactory};
use crate::source::{FrameSource, Playhead, VideoLoader};

/// Everything one export needs from its caller.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportRequest {
    /// The clip to re-encode.
    pub video: VideoAsset,
    /// What goes behind it; `None` means no background layer.
    pub background: Option<BackgroundAsset>,
    /// Output format, quality and resolution.
    pub options: ExportOptions,
}

/// A finished export.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExportResult {
    /// Reference to the encoded artifact.
    pub url: ArtifactUrl,
    /// Terminal progress, always 100.
    pub progress: u8,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Target bitrate the encoder ran with.
    pub bitrate_bps: u64,
    /// Output container.
    pub format: ExportFormat,
    /// Frames captured into the artifact.
    pub frames: u64,
}

/// Where an export job is in its lifecycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportState {
    /// Not started.
    Idle,
    /// Opening the video and reading its metadata.
    Loading,
    /// Loading the background picture, if one is selected.
    LoadingBackground,
    /// Compositing and encoding; carries the last reported percentage.
    Exporting(u8),
    /// Done; the artifact is available under the reference.
    Complete(ArtifactUrl),
    /// Stopped on an error.
    Failed {
        /// Failure class.
        kind: ErrorKind,
        /// Human-readable cause.
        reason: String,
    },
}

impl ExportState {
    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete(_) | Self::Failed { .. })
    }

    /// Whether moving from `self` to `next` is a legal step.
    pub fn can_transition_to(&self, next: &ExportState) -> bool {
        use ExportState as S;
        match (self, next) {
            (s, S::Failed { .. }) => !s.is_terminal(),
            (S::Idle, S::Loading) => true,
            (S::Loading, S::LoadingBackground) => true,
            (S::LoadingBackground, S::Exporting(_)) => true,
            (S::Exporting(a), S::Exporting(b)) => b >= a,
            (S::Exporting(_), S::Complete(_)) => true,
            _ => false,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::LoadingBackground => "loading_background",
            Self::Exporting(_) => "exporting",
            Self::Complete(_) => "complete",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Runs exports with injected capabilities.
pub struct Exporter {
    videos: Arc<dyn VideoLoader>,
    images: Arc<dyn ImageLoader>,
    encoders: Arc<dyn EncoderFactory>,
    surfaces: Arc<dyn SurfaceFactory>,
    store: ArtifactStore,
    config: PipelineConfig,
}

impl Exporter {
    /// Exporter drawing on [`CpuSurface`](crate::CpuSurface)s with a fresh artifact store.
    pub fn new(
        videos: Arc<dyn VideoLoader>,
        images: Arc<dyn ImageLoader>,
        encoders: Arc<dyn EncoderFactory>,
        config: PipelineConfig,
    ) -> BackdropResult<Self> {
        config.validate()?;
        Ok(Self {
            videos,
            images,
            encoders,
            surfaces: Arc::new(CpuSurfaceFactory),
            store: ArtifactStore::new(),
            config,
        })
    }

    /// Use another drawing surface implementation.
    pub fn with_surface_factory(mut self, surfaces: Arc<dyn SurfaceFactory>) -> Self {
        self.surfaces = surfaces;
        self
    }

    /// Register artifacts in `store` instead of a private one.
    pub fn with_store(mut self, store: ArtifactStore) -> Self {
        self.store = store;
        self
    }

    /// Where finished artifacts are registered.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// A job for `request`, in the `Idle` state.
    pub fn job(&self, request: ExportRequest) -> ExportJob<'_> {
        ExportJob {
            exporter: self,
            request,
            state: ExportState::Idle,
        }
    }

    /// Run `request` to completion.
    pub fn export(
        &self,
        request: ExportRequest,
        on_progress: &mut dyn FnMut(u8),
        cancel: &CancelToken,
    ) -> BackdropResult<ExportResult> {
        self.job(request).run(on_progress, cancel)
    }
}

/// One export run and its state machine.
pub struct ExportJob<'a> {
    exporter: &'a Exporter,
    request: ExportRequest,
    state: ExportState,
}

impl ExportJob<'_> {
    /// Current state.
    pub fn state(&self) -> &ExportState {
        &self.state
    }

    /// The request being exported. Video metadata is filled in once loaded.
    pub fn request(&self) -> &ExportRequest {
        &self.request
    }

    /// Drive the export. Progress values are reported through `on_progress` in
    /// non-decreasing order, ending with 100 on success.
    ///
    /// Every failure, including cancellation, leaves the job in `Failed` and is returned to the
    /// caller; nothing falls back to the unprocessed video.
    pub fn run(
        &mut self,
        on_progress: &mut dyn FnMut(u8),
        cancel: &CancelToken,
    ) -> BackdropResult<ExportResult> {
        if self.state != ExportState::Idle {
            return Err(BackdropError::pipeline(format!(
                "export job already {}",
                self.state.name()
            )));
        }

        match self.run_stages(on_progress, cancel) {
            Ok(result) => {
                self.transition(ExportState::Complete(result.url.clone()))?;
                tracing::info!(
                    url = %result.url,
                    width = result.width,
                    height = result.height,
                    bitrate_bps = result.bitrate_bps,
                    format = ?result.format,
                    frames = result.frames,
                    "export complete"
                );
                Ok(result)
            }
            Err(err) => {
                tracing::error!(kind = ?err.kind(), error = %err, "export failed");
                self.state = ExportState::Failed {
                    kind: err.kind(),
                    reason: err.to_string(),
                };
                Err(err)
            }
        }
    }

    fn transition(&mut self, next: ExportState) -> BackdropResult<()> {
        if !self.state.can_transition_to(&next) {
            return Err(BackdropError::pipeline(format!(
                "illegal export transition {} -> {}",
                self.state.name(),
                next.name()
            )));
        }
        tracing::debug!(from = self.state.name(), to = next.name(), "export state");
        self.state = next;
        Ok(())
    }

    fn run_stages(
        &mut self,
        on_progress: &mut dyn FnMut(u8),
        cancel: &CancelToken,
    ) -> BackdropResult<ExportResult> {
        let exporter = self.exporter;
        let cfg = &exporter.config;
        let options = self.request.options;
        tracing::info!(
            video = %self.request.video.name,
            background = self.request.background.as_ref().map_or("none", |b| b.variant_tag()),
            resolution = options.resolution.as_str(),
            quality = options.quality.as_str(),
            format = ?options.format,
            "export started"
        );

        self.transition(ExportState::Loading)?;
        let source = self.load_video(cancel)?;

        self.transition(ExportState::LoadingBackground)?;
        let background = self.load_background(cancel)?;

        let canvas = options.resolution.canvas();
        let enc_cfg = EncoderConfig {
            width: canvas.width,
            height: canvas.height,
            fps: cfg.capture_rate()?,
            bitrate_bps: options.quality.bitrate_bps(),
            format: options.format,
        };
        let duration_secs = source.metadata().duration_secs;
        let mut surface = exporter.surfaces.create(canvas)?;
        let compositor =
            FrameCompositor::new(canvas, background).with_overlay_alpha(cfg.blur_overlay_alpha);
        let mut pump = FramePump::new(Playhead::new(source), compositor);
        let mut schedule = Schedule::new(
            duration_secs,
            cfg.refresh_rate()?,
            cfg.capture_rate()?,
            cfg.progress_rate()?,
        );
        let mut progress = ProgressReporter::new(schedule.capture_total(), cfg.progress_step);
        let mut sink = CaptureSink::start(exporter.encoders.create()?, enc_cfg)?;

        if let Some(p) = progress.start() {
            self.transition(ExportState::Exporting(p))?;
            on_progress(p);
        }

        let driven = self.drive(
            &mut schedule,
            &mut pump,
            surface.as_mut(),
            &mut sink,
            &mut progress,
            on_progress,
            cancel,
        );
        if let Err(err) = driven {
            sink.abort();
            return Err(err);
        }
        if pump.frames_drawn() == 0 {
            sink.abort();
            return Err(BackdropError::pipeline(format!(
                "video '{}' produced no frames",
                self.request.video.name
            )));
        }
        if let Err(err) = cancel.check() {
            sink.abort();
            return Err(err);
        }

        let artifact = sink.finish()?;
        let frames = artifact.frames;
        let (width, height, bitrate_bps, format) =
            (artifact.width, artifact.height, artifact.bitrate_bps, artifact.format);
        let url = exporter.store.mint(artifact);

        if let Some(p) = progress.complete() {
            self.transition(ExportState::Exporting(p))?;
            on_progress(p);
        }

        Ok(ExportResult {
            url,
            progress: 100,
            width,
            height,
            bitrate_bps,
            format,
            frames,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn drive(
        &mut self,
        schedule: &mut Schedule,
        pump: &mut FramePump,
        surface: &mut dyn Canvas2DSurface,
        sink: &mut CaptureSink,
        progress: &mut ProgressReporter,
        on_progress: &mut dyn FnMut(u8),
        cancel: &CancelToken,
    ) -> BackdropResult<()> {
        while let Some(task) = schedule.next() {
            cancel.check()?;
            match task.kind {
                TaskKind::Draw => {
                    if pump.step(surface, task.at_secs())? == PumpStatus::Ended {
                        tracing::debug!(
                            at_secs = task.at_secs(),
                            frames = pump.frames_drawn(),
                            "playback ended"
                        );
                        schedule.stop_drawing();
                    }
                }
                TaskKind::Capture => sink.sample(surface)?,
                TaskKind::Progress => {
                    if let Some(p) = progress.observe(sink.frames_captured()) {
                        self.transition(ExportState::Exporting(p))?;
                        on_progress(p);
                    }
                }
            }
        }
        Ok(())
    }

    fn load_video(&mut self, cancel: &CancelToken) -> BackdropResult<Box<dyn FrameSource>> {
        let loader = Arc::clone(&self.exporter.videos);
        let video = self.request.video.clone();
        let source = load_with_timeout(
            "video",
            self.exporter.config.load_timeout(),
            cancel,
            move || loader.open(&video),
        )?;

        let meta = *source.metadata();
        meta.validate()?;
        if self.request.video.metadata().is_none() {
            self.request.video.record_metadata(meta)?;
        }
        tracing::debug!(
            duration_secs = meta.duration_secs,
            width = meta.width,
            height = meta.height,
            "video metadata loaded"
        );
        Ok(source)
    }

    fn load_background(&self, cancel: &CancelToken) -> BackdropResult<PreparedBackground> {
        prepare_background(
            self.request.background.as_ref(),
            Arc::clone(&self.exporter.images),
            self.exporter.config.load_timeout(),
            cancel,
        )
    }
}

/// Resolve a background into what the compositor draws.
///
/// Image backgrounds are fetched through `images` under `timeout`; the other kinds need no IO.
pub fn prepare_background(
    background: Option<&BackgroundAsset>,
    images: Arc<dyn ImageLoader>,
    timeout: Duration,
    cancel: &CancelToken,
) -> BackdropResult<PreparedBackground> {
    match background.map(|b| &b.kind) {
        None | Some(BackgroundKind::None) => Ok(PreparedBackground::None),
        Some(BackgroundKind::Blur { blur_amount }) => Ok(PreparedBackground::Blur {
            amount: *blur_amount,
        }),
        Some(BackgroundKind::Image { url }) => {
            let url = url.clone();
            let image = load_with_timeout("background", timeout, cancel, move || images.load(&url))?;
            tracing::debug!(
                width = image.width,
                height = image.height,
                "background image loaded"
            );
            Ok(PreparedBackground::Image(image))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/orchestrator.rs"]
mod tests;
