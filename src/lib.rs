//! Backdrop composites a video over a background and re-encodes the result.
//!
//! The export pipeline is built from injected capabilities so every stage can be swapped out:
//!
//! - a [`VideoLoader`] opens a [`FrameSource`] of decoded frames
//! - an [`ImageLoader`] fetches background pictures
//! - a [`SurfaceFactory`] provides the [`Canvas2DSurface`] the [`FrameCompositor`] draws on
//! - an [`EncoderFactory`] provides the [`StreamEncoder`] the [`CaptureSink`] feeds
//!
//! An [`Exporter`] wires them together and runs one [`ExportJob`] per request on a virtual
//! clock, reporting progress and ending in either an [`ExportResult`] or a typed error.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod config;
mod encode;
mod export;
mod foundation;
mod logging;
mod model;
mod pipeline;
mod render;
mod source;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, Point, Rect, Size};
pub use crate::foundation::error::{BackdropError, BackdropResult, ErrorKind};

pub use crate::assets::decode::{PreparedImage, decode_image};
pub use crate::assets::loader::{FsImageLoader, ImageLoader, load_with_timeout};
pub use crate::assets::validate::{
    MAX_IMAGE_BYTES, MAX_VIDEO_BYTES, guess_mime_type, validate_background_upload,
    validate_video_upload,
};
pub use crate::config::{FfmpegConfig, LoggingConfig, PipelineConfig};
pub use crate::encode::artifact::{Artifact, ArtifactStore, ArtifactUrl};
pub use crate::encode::capture::CaptureSink;
pub use crate::encode::encoder::{
    EncodedChunk, EncoderConfig, EncoderFactory, EncoderLog, InMemoryEncoder, StreamEncoder,
};
#[cfg(feature = "media-ffmpeg")]
pub use crate::encode::ffmpeg::{FfmpegEncoderFactory, FfmpegStreamEncoder};
pub use crate::export::orchestrator::{
    ExportJob, ExportRequest, ExportResult, ExportState, Exporter, prepare_background,
};
pub use crate::export::progress::ProgressReporter;
pub use crate::export::session::ExportSession;
pub use crate::logging::init_logging;
pub use crate::model::background::{
    BackgroundAsset, BackgroundKind, DEFAULT_BLUR_AMOUNT, MAX_BLUR_AMOUNT, blur_background,
    find_preset, preset_backgrounds,
};
pub use crate::model::media::{VideoAsset, VideoMetadata};
pub use crate::model::options::{
    ExportFormat, ExportOptions, ProcessingOptions, QualityTier, Resolution, VideoSize,
};
pub use crate::pipeline::cancel::CancelToken;
pub use crate::pipeline::pump::{FramePump, PumpStatus};
pub use crate::pipeline::schedule::{Schedule, ScheduledTask, TaskKind, Ticker};
pub use crate::render::compositor::{
    DEFAULT_BLUR_OVERLAY_ALPHA, FrameCompositor, PreparedBackground, cover_source_rect,
    fit_contain, preview_rect,
};
pub use crate::render::surface::{
    Canvas2DSurface, CpuSurface, CpuSurfaceFactory, DrawFilter, FrameRGBA, SurfaceFactory,
};
#[cfg(feature = "media-ffmpeg")]
pub use crate::source::ffmpeg::{FfmpegFrameSource, FfmpegVideoLoader, is_tool_on_path, probe_video};
pub use crate::source::{FrameSource, Playhead, VideoFrame, VideoLoader};
