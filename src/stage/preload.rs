//! Buffering monitor deciding when a preloaded instance may start playing.
//!
//! ```text
//!  load() ──► Priming ──first sample──► Sampling ──► Resolved
//!                                          │  ▲          ▲
//!                                          └──┘          │
//!                                     complete | stalled | outrunning
//! ```
//!
//! The monitor holds no timers itself. When the loaded percentage changes it
//! hands out a new watchdog generation; the host arms a timer for it and
//! reports back through [`PreloadMonitor::on_watchdog`]. Firings from older
//! generations are ignored.

use dioxus::logger::tracing::debug;

/// Percentage meaning "fully buffered".
const COMPLETE_PERCENT: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloadPhase {
    Priming,
    Sampling,
    Resolved,
}

/// Why buffering was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveReason {
    /// Everything is buffered.
    Complete,
    /// Buffering stopped moving; accept what is there.
    Stalled,
    /// Buffering grows faster than playback would consume it.
    Outrunning,
}

/// One buffering progress observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSample {
    pub buffered_end: f64,
    pub duration: f64,
    /// Wall clock at the time of the sample, in seconds.
    pub now: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BufferState {
    pub loaded_percent: f64,
    /// `-1` until the first sample so that sample always counts as a change.
    pub previous_loaded_percent: f64,
    pub buffer_edge_seconds: f64,
    pub last_sample_wall_clock_seconds: Option<f64>,
    pub resolved: bool,
}

impl Default for BufferState {
    fn default() -> Self {
        Self {
            loaded_percent: 0.0,
            previous_loaded_percent: -1.0,
            buffer_edge_seconds: 0.0,
            last_sample_wall_clock_seconds: None,
            resolved: false,
        }
    }
}

/// Result of feeding one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreloadStep {
    /// Arm a fresh watchdog with this generation.
    pub arm_watchdog: Option<u64>,
    pub resolved: Option<ResolveReason>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreloadMonitor {
    phase: PreloadPhase,
    buffer: BufferState,
    watchdog_generation: u64,
    watchdog_percent: Option<f64>,
}

impl Default for PreloadMonitor {
    fn default() -> Self {
        Self::start()
    }
}

impl PreloadMonitor {
    /// A monitor for an element whose `load()` was just invoked.
    pub fn start() -> Self {
        Self {
            phase: PreloadPhase::Priming,
            buffer: BufferState::default(),
            watchdog_generation: 0,
            watchdog_percent: None,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> PreloadPhase {
        self.phase
    }

    #[cfg(test)]
    pub fn buffer(&self) -> &BufferState {
        &self.buffer
    }

    pub fn is_resolved(&self) -> bool {
        self.phase == PreloadPhase::Resolved
    }

    /// Watchdog generation currently armed, if any.
    #[cfg(test)]
    pub fn watchdog_generation(&self) -> Option<u64> {
        self.watchdog_percent.map(|_| self.watchdog_generation)
    }

    pub fn on_progress(&mut self, sample: ProgressSample) -> PreloadStep {
        let mut step = PreloadStep::default();
        if self.is_resolved()
            || sample.duration.is_nan()
            || sample.duration <= 0.0
            || !sample.buffered_end.is_finite()
        {
            return step;
        }

        let raw = (sample.buffered_end / sample.duration) * COMPLETE_PERCENT;
        let percent = raw
            .clamp(0.0, COMPLETE_PERCENT)
            .max(self.buffer.loaded_percent);

        if self.phase == PreloadPhase::Priming {
            self.phase = PreloadPhase::Sampling;
        }

        if percent != self.buffer.previous_loaded_percent {
            self.watchdog_generation += 1;
            self.watchdog_percent = Some(percent);
            step.arm_watchdog = Some(self.watchdog_generation);
        }

        self.buffer.loaded_percent = percent;
        self.buffer.previous_loaded_percent = percent;
        debug!(percent, "preload sample");

        if percent >= COMPLETE_PERCENT {
            step.arm_watchdog = None;
            step.resolved = Some(self.resolve(ResolveReason::Complete));
            return step;
        }

        // Two-sample comparison: buffered growth since the previous sample
        // against wall clock elapsed over the same span.
        if let Some(last) = self.buffer.last_sample_wall_clock_seconds {
            let elapsed = sample.now - last;
            let growth = sample.buffered_end - self.buffer.buffer_edge_seconds;
            if growth > 0.0 && growth >= elapsed {
                step.arm_watchdog = None;
                step.resolved = Some(self.resolve(ResolveReason::Outrunning));
                return step;
            }
        }

        self.buffer.last_sample_wall_clock_seconds = Some(sample.now);
        self.buffer.buffer_edge_seconds = sample.buffered_end;
        step
    }

    /// Handle the stuck watchdog firing. Stale generations are ignored.
    pub fn on_watchdog(&mut self, generation: u64) -> Option<ResolveReason> {
        if self.is_resolved() || generation != self.watchdog_generation {
            return None;
        }
        let armed_at = self.watchdog_percent?;
        let current = self.buffer.loaded_percent;
        if armed_at == current && current != COMPLETE_PERCENT {
            return Some(self.resolve(ResolveReason::Stalled));
        }
        None
    }

    fn resolve(&mut self, reason: ResolveReason) -> ResolveReason {
        self.phase = PreloadPhase::Resolved;
        self.buffer.loaded_percent = COMPLETE_PERCENT;
        self.buffer.resolved = true;
        self.watchdog_percent = None;
        debug!(?reason, "preload resolved");
        reason
    }
}
