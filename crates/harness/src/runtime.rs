use std::time::{Duration, Instant};

use crate::types::HarnessConfig;

/// Default step used by offscreen captures when none is configured.
pub const DEFAULT_FIXED_DELTA: Duration = Duration::from_nanos(16_666_667);

/// Abstraction over where per-frame delta times come from.
pub trait TimeSource {
    /// Forgets any previous sample so the next delta starts at zero.
    fn reset(&mut self);
    /// Seconds elapsed since the previous call.
    fn delta(&mut self) -> f32;
}

pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

/// Wall-clock deltas. The first sample after construction or reset is 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    last: Option<Instant>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimeSource for SystemClock {
    fn reset(&mut self) {
        self.last = None;
    }

    fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let delta = self
            .last
            .map(|last| now.saturating_duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last = Some(now);
        delta
    }
}

/// Reports the same delta every frame; used for deterministic captures.
#[derive(Debug, Clone, Copy)]
pub struct FixedStep {
    step: Duration,
}

impl FixedStep {
    pub fn new(step: Duration) -> Self {
        Self { step }
    }
}

impl TimeSource for FixedStep {
    fn reset(&mut self) {}

    fn delta(&mut self) -> f32 {
        self.step.as_secs_f32()
    }
}

/// Selects the time source the runner should use for `config`.
pub fn time_source_for(config: &HarnessConfig) -> BoxedTimeSource {
    match config.fixed_delta {
        Some(step) => Box::new(FixedStep::new(step)),
        None => Box::new(SystemClock::new()),
    }
}

/// Paces redraws when an FPS cap is configured.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    interval: Option<Duration>,
    last_frame: Option<Instant>,
}

impl FrameScheduler {
    /// Caps that are zero, negative or not finite disable pacing.
    pub fn new(target_fps: Option<f32>) -> Self {
        let interval = target_fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps)));
        Self {
            interval,
            last_frame: None,
        }
    }

    pub fn ready_for_frame(&self, now: Instant) -> bool {
        match (self.interval, self.last_frame) {
            (Some(interval), Some(last)) => now.saturating_duration_since(last) >= interval,
            _ => true,
        }
    }

    pub fn mark_rendered(&mut self, now: Instant) {
        self.last_frame = Some(now);
    }

    /// When the next frame becomes due, if pacing is active.
    pub fn next_deadline(&self) -> Option<Instant> {
        let interval = self.interval?;
        self.last_frame.map(|last| last + interval)
    }

    pub fn reset(&mut self) {
        self.last_frame = None;
    }
}
