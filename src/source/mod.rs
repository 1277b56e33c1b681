#[cfg(feature = "media-ffmpeg")]
pub(crate) mod ffmpeg;

use crate::assets::decode::PreparedImage;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{BackdropError, BackdropResult};
use crate::model::media::{VideoAsset, VideoMetadata};

/// Frame duration assumed when neither metadata nor the stream says otherwise.
const FALLBACK_FRAME_SECS: f64 = 1.0 / 30.0;

/// One decoded video frame.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoFrame {
    /// Position in decode order, starting at 0.
    pub index: FrameIndex,
    /// Presentation time in seconds from the start of the clip.
    pub timestamp_secs: f64,
    /// Pixels.
    pub image: PreparedImage,
}

/// Produces successive decoded frames of one video, in presentation order.
pub trait FrameSource: Send {
    /// Clip metadata, known once the source is open.
    fn metadata(&self) -> &VideoMetadata;

    /// The next frame, or `None` once the clip is exhausted.
    fn next_frame(&mut self) -> BackdropResult<Option<VideoFrame>>;
}

/// Opens a [`FrameSource`] for a video. Each call yields an independent handle.
pub trait VideoLoader: Send + Sync {
    /// Open `video` and read its metadata.
    fn open(&self, video: &VideoAsset) -> BackdropResult<Box<dyn FrameSource>>;
}

/// Tracks which frame is on screen as playback time advances.
///
/// Decodes forward only, never seeks: the frame shown at `t` is the last one whose timestamp is
/// at or before `t`.
pub struct Playhead {
    source: Box<dyn FrameSource>,
    current: Option<VideoFrame>,
    pending: Option<VideoFrame>,
    exhausted: bool,
    frame_secs: f64,
}

impl Playhead {
    /// Start at the beginning of `source`.
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        let frame_secs = source
            .metadata()
            .fps
            .map(|fps| fps.frame_duration_secs())
            .unwrap_or(FALLBACK_FRAME_SECS);
        Self {
            source,
            current: None,
            pending: None,
            exhausted: false,
            frame_secs,
        }
    }

    /// Metadata of the underlying source.
    pub fn metadata(&self) -> &VideoMetadata {
        self.source.metadata()
    }

    /// Decode up to time `t` (seconds) and return the frame on screen then.
    ///
    /// `None` before the first frame is due. Going back in time keeps the current frame.
    pub fn advance_to(&mut self, t: f64) -> BackdropResult<Option<&VideoFrame>> {
        loop {
            if self.pending.is_none() && !self.exhausted {
                self.pending = self.source.next_frame()?;
                match &self.pending {
                    None => self.exhausted = true,
                    Some(next) => self.check_order(next)?,
                }
            }
            match &self.pending {
                Some(next) if next.timestamp_secs <= t => {
                    if let Some(cur) = &self.current {
                        let gap = next.timestamp_secs - cur.timestamp_secs;
                        if gap > 0.0 {
                            self.frame_secs = gap;
                        }
                    }
                    self.current = self.pending.take();
                }
                _ => break,
            }
        }
        Ok(self.current.as_ref())
    }

    /// Whether playback has run past the last frame at time `t`.
    pub fn ended_at(&self, t: f64) -> bool {
        if !self.exhausted || self.pending.is_some() {
            return false;
        }
        match &self.current {
            Some(last) => t >= last.timestamp_secs + self.frame_secs,
            None => true,
        }
    }

    fn check_order(&self, next: &VideoFrame) -> BackdropResult<()> {
        if let Some(cur) = &self.current
            && (next.index <= cur.index || next.timestamp_secs < cur.timestamp_secs)
        {
            return Err(BackdropError::pipeline(format!(
                "frame source went backwards: frame {} at {:.3}s after frame {} at {:.3}s",
                next.index.0, next.timestamp_secs, cur.index.0, cur.timestamp_secs
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/playhead.rs"]
mod tests;
