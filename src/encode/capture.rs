use crate::encode::artifact::Artifact;
use crate::encode::encoder::{EncodedChunk, EncoderConfig, StreamEncoder};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{BackdropError, BackdropResult};
use crate::render::surface::Canvas2DSurface;

/// Samples a surface into a [`StreamEncoder`] and collects the encoded chunks.
pub struct CaptureSink {
    encoder: Box<dyn StreamEncoder>,
    cfg: EncoderConfig,
    chunks: Vec<EncodedChunk>,
    frames: u64,
}

impl CaptureSink {
    /// Begin recording with `encoder`.
    pub fn start(mut encoder: Box<dyn StreamEncoder>, cfg: EncoderConfig) -> BackdropResult<Self> {
        cfg.validate()?;
        encoder.begin(&cfg)?;
        tracing::debug!(
            width = cfg.width,
            height = cfg.height,
            bitrate_bps = cfg.bitrate_bps,
            format = ?cfg.format,
            "capture started"
        );
        Ok(Self {
            encoder,
            cfg,
            chunks: Vec::new(),
            frames: 0,
        })
    }

    /// Grab the surface as it is now and hand it to the encoder.
    pub fn sample(&mut self, surface: &dyn Canvas2DSurface) -> BackdropResult<()> {
        let frame = surface.snapshot();
        if frame.width != self.cfg.width || frame.height != self.cfg.height {
            return Err(BackdropError::pipeline(format!(
                "captured surface is {}x{}, recording is {}x{}",
                frame.width, frame.height, self.cfg.width, self.cfg.height
            )));
        }
        self.encoder.push_frame(FrameIndex(self.frames), &frame)?;
        self.frames += 1;

        let ready = self.encoder.poll_chunks()?;
        self.accept(ready)
    }

    /// Frames handed to the encoder so far.
    pub fn frames_captured(&self) -> u64 {
        self.frames
    }

    /// Chunks collected so far.
    pub fn chunks_collected(&self) -> usize {
        self.chunks.len()
    }

    /// Stop recording and join every chunk into one artifact.
    pub fn finish(mut self) -> BackdropResult<Artifact> {
        let rest = self.encoder.finish()?;
        self.accept(rest)?;

        let total: usize = self.chunks.iter().map(|c| c.bytes.len()).sum();
        let mut bytes = Vec::with_capacity(total);
        for chunk in &self.chunks {
            bytes.extend_from_slice(&chunk.bytes);
        }
        if bytes.is_empty() {
            return Err(BackdropError::encoding("encoder produced no output"));
        }

        tracing::debug!(
            chunks = self.chunks.len(),
            bytes = bytes.len(),
            frames = self.frames,
            "capture finished"
        );
        Ok(Artifact {
            bytes,
            mime_type: self.cfg.format.mime_type().to_string(),
            format: self.cfg.format,
            width: self.cfg.width,
            height: self.cfg.height,
            bitrate_bps: self.cfg.bitrate_bps,
            frames: self.frames,
        })
    }

    /// Stop recording and discard everything.
    pub fn abort(mut self) {
        self.encoder.abort();
        tracing::debug!(frames = self.frames, "capture aborted");
    }

    fn accept(&mut self, ready: Vec<EncodedChunk>) -> BackdropResult<()> {
        for chunk in ready {
            let expected = self.chunks.last().map_or(0, |c| c.seq + 1);
            if chunk.seq != expected {
                return Err(BackdropError::encoding(format!(
                    "encoder emitted chunk {} where {expected} was expected",
                    chunk.seq
                )));
            }
            tracing::trace!(seq = chunk.seq, len = chunk.bytes.len(), "chunk");
            self.chunks.push(chunk);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/capture.rs"]
mod tests;
