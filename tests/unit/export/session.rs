use std::sync::Arc;

use super::*;
use crate::assets::decode::PreparedImage;
use crate::assets::loader::ImageLoader;
use crate::config::PipelineConfig;
use crate::encode::encoder::{InMemoryEncoder, StreamEncoder};
use crate::foundation::core::{Fps, FrameIndex};
use crate::model::media::VideoMetadata;
use crate::model::options::{ExportFormat, Resolution};
use crate::source::{FrameSource, VideoFrame, VideoLoader};

struct Flat {
    meta: VideoMetadata,
    next: u64,
}

impl FrameSource for Flat {
    fn metadata(&self) -> &VideoMetadata {
        &self.meta
    }

    fn next_frame(&mut self) -> BackdropResult<Option<VideoFrame>> {
        let fps = 10u64;
        if self.next as f64 / fps as f64 >= self.meta.duration_secs {
            return Ok(None);
        }
        let i = self.next;
        self.next += 1;
        Ok(Some(VideoFrame {
            index: FrameIndex(i),
            timestamp_secs: i as f64 / fps as f64,
            image: PreparedImage::solid(self.meta.width, self.meta.height, [90, 90, 90, 255])?,
        }))
    }
}

struct FlatLoader;

impl VideoLoader for FlatLoader {
    fn open(&self, _video: &VideoAsset) -> BackdropResult<Box<dyn FrameSource>> {
        Ok(Box::new(Flat {
            meta: VideoMetadata {
                duration_secs: 0.5,
                width: 16,
                height: 9,
                fps: Some(Fps::whole(10)?),
            },
            next: 0,
        }))
    }
}

struct NoImages;

impl ImageLoader for NoImages {
    fn load(&self, url: &str) -> BackdropResult<PreparedImage> {
        Err(BackdropError::media_load(format!("unexpected fetch of {url}")))
    }
}

fn session() -> ExportSession {
    let encoders = || -> BackdropResult<Box<dyn StreamEncoder>> {
        Ok(Box::new(InMemoryEncoder::default()))
    };
    let exporter = Exporter::new(
        Arc::new(FlatLoader),
        Arc::new(NoImages),
        Arc::new(encoders),
        PipelineConfig::default(),
    )
    .unwrap();
    ExportSession::new(exporter)
}

fn options() -> ExportOptions {
    ExportOptions {
        format: ExportFormat::WebM,
        quality: QualityTier::High,
        resolution: Resolution::P480,
    }
}

#[test]
fn export_without_video_is_a_validation_error() {
    let mut s = session();
    let err = s
        .export(options(), &mut |_| {}, &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, BackdropError::Validation(_)));
}

#[test]
fn requested_quality_is_used_as_given() {
    let mut s = session();
    s.load_video(VideoAsset::new("clip.mp4", "clip.mp4", 10, "video/mp4"));
    s.set_quality(QualityTier::Low);
    let req = s.export_request(options()).unwrap();
    assert_eq!(req.options.quality, QualityTier::High);
    assert_eq!(req.options.format, ExportFormat::WebM);
    assert!(req.background.is_none());
}

#[test]
fn export_bitrate_follows_the_requested_quality() {
    let mut s = session();
    s.load_video(VideoAsset::new("clip.mp4", "clip.mp4", 10, "video/mp4"));
    assert_eq!(s.options().quality(), QualityTier::Medium);

    let result = s.export(options(), &mut |_| {}, &CancelToken::new()).unwrap();
    assert_eq!(result.bitrate_bps, 5_000_000);
}

#[test]
fn default_export_options_carry_the_session_quality() {
    let mut s = session();
    s.set_quality(QualityTier::Low);
    let opts = s.default_export_options();
    assert_eq!(opts.quality, QualityTier::Low);
    assert_eq!(opts.format, ExportFormat::Mp4);
    assert_eq!(opts.resolution, Resolution::P1080);
}

#[test]
fn new_export_releases_the_previous_artifact() {
    let mut s = session();
    s.load_video(VideoAsset::new("clip.mp4", "clip.mp4", 10, "video/mp4"));

    let first = s.export(options(), &mut |_| {}, &CancelToken::new()).unwrap();
    assert!(s.exporter().store().resolve(&first.url).is_some());
    assert_eq!(s.video().map(|v| v.width()), Some(16));

    let second = s.export(options(), &mut |_| {}, &CancelToken::new()).unwrap();
    assert_ne!(first.url, second.url);
    assert!(s.exporter().store().resolve(&first.url).is_none());
    assert!(s.exporter().store().resolve(&second.url).is_some());
    assert_eq!(s.last_result(), Some(&second));

    s.discard_video();
    assert!(s.exporter().store().is_empty());
    assert!(s.last_result().is_none());
}

#[test]
fn video_size_only_moves_the_preview() {
    let mut s = session();
    let mut video = VideoAsset::new("clip.mp4", "clip.mp4", 10, "video/mp4");
    video
        .record_metadata(VideoMetadata {
            duration_secs: 1.0,
            width: 100,
            height: 100,
            fps: None,
        })
        .unwrap();
    s.load_video(video);

    let canvas = Canvas::new(1000, 1000).unwrap();
    let before = s.export_request(options()).unwrap();
    let at_75 = s.preview_rect(canvas).unwrap();

    s.set_video_size(50).unwrap();
    let at_50 = s.preview_rect(canvas).unwrap();
    assert!(at_50.width() < at_75.width());
    assert_eq!(s.export_request(options()).unwrap(), before);
    assert!(s.last_result().is_none());
    assert!(s.exporter().store().is_empty());

    assert!(s.set_video_size(95).is_err());
    assert_eq!(s.options().video_size().percent(), 50);
}
