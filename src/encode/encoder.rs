use std::sync::{Arc, Mutex, PoisonError};

use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{BackdropError, BackdropResult};
use crate::foundation::math::Fnv1a64;
use crate::model::options::ExportFormat;
use crate::render::surface::FrameRGBA;

/// Encoder settings for one export run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EncoderConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Nominal frame rate of the captured stream.
    pub fps: Fps,
    /// Target bitrate in bits per second.
    pub bitrate_bps: u64,
    /// Output container.
    pub format: ExportFormat,
}

impl EncoderConfig {
    /// Reject settings no encoder can honour.
    pub fn validate(&self) -> BackdropResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(BackdropError::encoding("encode width/height must be non-zero"));
        }
        if self.bitrate_bps == 0 {
            return Err(BackdropError::encoding("encode bitrate must be non-zero"));
        }
        if self.format.requires_even_dimensions()
            && (!self.width.is_multiple_of(2) || !self.height.is_multiple_of(2))
        {
            return Err(BackdropError::encoding(format!(
                "{}x{} is not encodable as {:?}: width/height must be even",
                self.width, self.height, self.format
            )));
        }
        Ok(())
    }

    /// Bytes in one RGBA8 frame.
    pub fn frame_len(&self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

/// A slice of encoded output, in stream order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedChunk {
    /// Position in the chunk sequence, starting at 0.
    pub seq: u64,
    /// Container bytes.
    pub bytes: Vec<u8>,
}

/// Turns captured frames into an encoded media stream.
///
/// Calls arrive as `begin`, any number of `push_frame`/`poll_chunks`, then `finish` (or
/// `abort`).
pub trait StreamEncoder: Send {
    /// Prepare for a stream described by `cfg`.
    fn begin(&mut self, cfg: &EncoderConfig) -> BackdropResult<()>;
    /// Append one frame. `frame` matches the configured size.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> BackdropResult<()>;
    /// Chunks that became ready since the last poll.
    fn poll_chunks(&mut self) -> BackdropResult<Vec<EncodedChunk>>;
    /// Flush and return every remaining chunk.
    fn finish(&mut self) -> BackdropResult<Vec<EncodedChunk>>;
    /// Drop any in-flight work. The encoder is unusable afterwards.
    fn abort(&mut self) {}
}

/// Creates a fresh encoder for each export run.
pub trait EncoderFactory: Send + Sync {
    /// A new, not yet begun encoder.
    fn create(&self) -> BackdropResult<Box<dyn StreamEncoder>>;
}

impl<F> EncoderFactory for F
where
    F: Fn() -> BackdropResult<Box<dyn StreamEncoder>> + Send + Sync,
{
    fn create(&self) -> BackdropResult<Box<dyn StreamEncoder>> {
        self()
    }
}

/// What an [`InMemoryEncoder`] was asked to do.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EncoderLog {
    /// Configuration passed to `begin`.
    pub config: Option<EncoderConfig>,
    /// Size of every pushed frame, in order.
    pub frame_sizes: Vec<(u32, u32)>,
    /// Whether `finish` completed.
    pub finished: bool,
    /// Whether `abort` was called.
    pub aborted: bool,
}

/// Deterministic encoder that keeps everything in memory.
///
/// Emits one chunk per `frames_per_chunk` frames; each frame contributes an 8-byte digest of its
/// pixels. The first chunk starts with a small header naming the format.
#[derive(Debug)]
pub struct InMemoryEncoder {
    frames_per_chunk: u64,
    log: Arc<Mutex<EncoderLog>>,
    pending: Vec<u8>,
    pending_frames: u64,
    ready: Vec<EncodedChunk>,
    next_seq: u64,
    cfg: Option<EncoderConfig>,
}

impl Default for InMemoryEncoder {
    fn default() -> Self {
        Self::new(3)
    }
}

impl InMemoryEncoder {
    /// Encoder cutting a chunk every `frames_per_chunk` frames (at least one).
    pub fn new(frames_per_chunk: u64) -> Self {
        Self {
            frames_per_chunk: frames_per_chunk.max(1),
            log: Arc::new(Mutex::new(EncoderLog::default())),
            pending: Vec::new(),
            pending_frames: 0,
            ready: Vec::new(),
            next_seq: 0,
            cfg: None,
        }
    }

    /// Shared view of the calls made so far; stays valid after the encoder is consumed.
    pub fn log(&self) -> Arc<Mutex<EncoderLog>> {
        Arc::clone(&self.log)
    }

    fn with_log(&self, f: impl FnOnce(&mut EncoderLog)) {
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut log);
    }

    fn cut_chunk(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        self.ready.push(EncodedChunk {
            seq: self.next_seq,
            bytes: std::mem::take(&mut self.pending),
        });
        self.next_seq += 1;
        self.pending_frames = 0;
    }
}

impl StreamEncoder for InMemoryEncoder {
    fn begin(&mut self, cfg: &EncoderConfig) -> BackdropResult<()> {
        cfg.validate()?;
        if self.cfg.is_some() {
            return Err(BackdropError::encoding("encoder already started"));
        }
        self.cfg = Some(*cfg);
        self.pending
            .extend_from_slice(format!("BDRP{}", cfg.format.extension()).as_bytes());
        self.with_log(|log| log.config = Some(*cfg));
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, frame: &FrameRGBA) -> BackdropResult<()> {
        let Some(cfg) = self.cfg else {
            return Err(BackdropError::encoding("push_frame before begin"));
        };
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(BackdropError::encoding(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }

        let mut h = Fnv1a64::new_default();
        h.write_bytes(&frame.data);
        self.pending.extend_from_slice(&h.finish().to_le_bytes());
        self.pending_frames += 1;
        self.with_log(|log| log.frame_sizes.push((frame.width, frame.height)));

        if self.pending_frames >= self.frames_per_chunk {
            self.cut_chunk();
        }
        Ok(())
    }

    fn poll_chunks(&mut self) -> BackdropResult<Vec<EncodedChunk>> {
        Ok(std::mem::take(&mut self.ready))
    }

    fn finish(&mut self) -> BackdropResult<Vec<EncodedChunk>> {
        if self.cfg.is_none() {
            return Err(BackdropError::encoding("finish before begin"));
        }
        self.cut_chunk();
        self.with_log(|log| log.finished = true);
        Ok(std::mem::take(&mut self.ready))
    }

    fn abort(&mut self) {
        self.pending.clear();
        self.ready.clear();
        self.with_log(|log| log.aborted = true);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/encoder.rs"]
mod tests;
