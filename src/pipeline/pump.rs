use crate::foundation::core::FrameIndex;
use crate::foundation::error::BackdropResult;
use crate::render::compositor::FrameCompositor;
use crate::render::surface::Canvas2DSurface;
use crate::source::Playhead;

/// Outcome of one pump step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PumpStatus {
    /// A newly decoded frame was composited.
    Drew(FrameIndex),
    /// The frame on screen has not changed since the last draw, or none is due yet.
    Held,
    /// Playback has reached its end; no further draws are needed.
    Ended,
}

/// Step function driving the compositor from playback time.
pub struct FramePump {
    playhead: Playhead,
    compositor: FrameCompositor,
    last_drawn: Option<FrameIndex>,
    frames_drawn: u64,
}

impl FramePump {
    /// Pump composing frames from `playhead` with `compositor`.
    pub fn new(playhead: Playhead, compositor: FrameCompositor) -> Self {
        Self {
            playhead,
            compositor,
            last_drawn: None,
            frames_drawn: 0,
        }
    }

    /// Composite whatever frame is on screen at `t_secs` onto `surface`.
    pub fn step(
        &mut self,
        surface: &mut dyn Canvas2DSurface,
        t_secs: f64,
    ) -> BackdropResult<PumpStatus> {
        let current = self.playhead.advance_to(t_secs)?;
        let Some(frame) = current else {
            if self.playhead.ended_at(t_secs) {
                return Ok(PumpStatus::Ended);
            }
            return Ok(PumpStatus::Held);
        };
        if self.last_drawn == Some(frame.index) {
            if self.playhead.ended_at(t_secs) {
                return Ok(PumpStatus::Ended);
            }
            return Ok(PumpStatus::Held);
        }

        let index = frame.index;
        self.compositor.composite(surface, &frame.image)?;
        self.last_drawn = Some(index);
        self.frames_drawn += 1;
        tracing::trace!(frame = index.0, t_secs, "composited frame");
        Ok(PumpStatus::Drew(index))
    }

    /// Distinct source frames composited so far.
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// The compositor in use.
    pub fn compositor(&self) -> &FrameCompositor {
        &self.compositor
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/pump.rs"]
mod tests;
