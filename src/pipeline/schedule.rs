use crate::foundation::core::Fps;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Tick instants (nanoseconds) at a fixed rate over `[0, end_ns)`.
///
/// Tick `i` lands at `floor(i / rate)`, so long runs do not drift.
#[derive(Clone, Debug)]
pub struct Ticker {
    rate: Fps,
    next: u64,
    end_ns: u64,
}

impl Ticker {
    /// Ticks at `rate` until `end_ns`.
    pub fn new(rate: Fps, end_ns: u64) -> Self {
        Self {
            rate,
            next: 0,
            end_ns,
        }
    }

    fn at(&self, i: u64) -> u64 {
        let ns = u128::from(i) * NANOS_PER_SEC * u128::from(self.rate.den) / u128::from(self.rate.num);
        u64::try_from(ns).unwrap_or(u64::MAX)
    }

    /// Instant of the next tick without consuming it.
    pub fn peek(&self) -> Option<u64> {
        let at = self.at(self.next);
        (at < self.end_ns).then_some(at)
    }

    /// Total number of ticks this ticker yields from the start.
    pub fn total(&self) -> u64 {
        if self.end_ns == 0 {
            return 0;
        }
        // Smallest i with at(i) >= end_ns.
        let n = (u128::from(self.end_ns) * u128::from(self.rate.num))
            .div_ceil(NANOS_PER_SEC * u128::from(self.rate.den));
        u64::try_from(n).unwrap_or(u64::MAX)
    }
}

impl Iterator for Ticker {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let at = self.peek()?;
        self.next += 1;
        Some(at)
    }
}

/// What a scheduled task does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskKind {
    /// Composite the current video frame onto the surface.
    Draw,
    /// Sample the surface into the encoder.
    Capture,
    /// Poll and report progress.
    Progress,
}

/// One task due at a virtual-clock instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledTask {
    /// Due time in nanoseconds from the start of playback.
    pub at_ns: u64,
    /// What to run.
    pub kind: TaskKind,
}

impl ScheduledTask {
    /// Due time in seconds.
    pub fn at_secs(&self) -> f64 {
        self.at_ns as f64 / NANOS_PER_SEC as f64
    }
}

/// Interleaves the draw, capture and progress cadences on one virtual clock.
///
/// Tasks come out in time order; simultaneous tasks come out as Draw, Capture, Progress. The
/// stream ends at the clip duration.
#[derive(Clone, Debug)]
pub struct Schedule {
    draw: Ticker,
    capture: Ticker,
    progress: Ticker,
    drawing: bool,
}

impl Schedule {
    /// Schedule for a clip of `duration_secs`.
    pub fn new(duration_secs: f64, refresh: Fps, capture: Fps, progress: Fps) -> Self {
        let end_ns = secs_to_ns(duration_secs);
        Self {
            draw: Ticker::new(refresh, end_ns),
            capture: Ticker::new(capture, end_ns),
            progress: Ticker::new(progress, end_ns),
            drawing: true,
        }
    }

    /// Number of capture ticks over the whole clip.
    pub fn capture_total(&self) -> u64 {
        self.capture.total()
    }

    /// Stop issuing draw tasks (playback paused or ended).
    pub fn stop_drawing(&mut self) {
        self.drawing = false;
    }

    /// Whether draw tasks are still being issued.
    pub fn is_drawing(&self) -> bool {
        self.drawing
    }
}

impl Iterator for Schedule {
    type Item = ScheduledTask;

    fn next(&mut self) -> Option<ScheduledTask> {
        let draw = if self.drawing { self.draw.peek() } else { None };
        let candidates = [
            (draw, TaskKind::Draw),
            (self.capture.peek(), TaskKind::Capture),
            (self.progress.peek(), TaskKind::Progress),
        ];
        let (at_ns, kind) = candidates
            .into_iter()
            .filter_map(|(at, kind)| at.map(|at| (at, kind)))
            .min()?;
        match kind {
            TaskKind::Draw => self.draw.next(),
            TaskKind::Capture => self.capture.next(),
            TaskKind::Progress => self.progress.next(),
        };
        Some(ScheduledTask { at_ns, kind })
    }
}

/// Seconds to whole nanoseconds, clamped at zero.
pub fn secs_to_ns(secs: f64) -> u64 {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    (secs * NANOS_PER_SEC as f64).round() as u64
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/schedule.rs"]
mod tests;
