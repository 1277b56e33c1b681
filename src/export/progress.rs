/// Turns captured-frame counts into coarse, monotonic percentages.
///
/// Values are quantised down to `step`, stay below 100 until [`ProgressReporter::complete`], and
/// are only emitted when they change.
#[derive(Clone, Debug)]
pub struct ProgressReporter {
    expected: u64,
    step: u8,
    last: Option<u8>,
}

impl ProgressReporter {
    /// Reporter for `expected` frames. A zero `step` is treated as 1.
    pub fn new(expected: u64, step: u8) -> Self {
        Self {
            expected,
            step: step.clamp(1, 100),
            last: None,
        }
    }

    /// The opening value, 0.
    pub fn start(&mut self) -> Option<u8> {
        self.emit(0)
    }

    /// Progress after `done` frames, if it moved.
    pub fn observe(&mut self, done: u64) -> Option<u8> {
        if self.expected == 0 {
            return None;
        }
        let raw = (u128::from(done) * 100 / u128::from(self.expected)).min(99) as u8;
        let quantised = raw - raw % self.step;
        self.emit(quantised)
    }

    /// The closing value, 100.
    pub fn complete(&mut self) -> Option<u8> {
        self.emit(100)
    }

    /// Last emitted value.
    pub fn last(&self) -> Option<u8> {
        self.last
    }

    fn emit(&mut self, pct: u8) -> Option<u8> {
        if self.last.is_some_and(|last| pct <= last) {
            return None;
        }
        self.last = Some(pct);
        Some(pct)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/progress.rs"]
mod tests;
