//! Fixed-cadence playback clock.
//!
//! The host calls in once per rendered frame with whatever wall-clock time
//! elapsed. The clock turns that into at most one advance signal per host
//! tick, spaced by a fixed interval, so playback speed does not depend on the
//! render rate.
//!
//! # Accumulator Semantics
//!
//! ```text
//! accumulate(dt):    acc += dt
//! advance_check():   acc >= interval  =>  signal, index += 1, acc = 0
//! ```
//!
//! The accumulator resets to zero, not to the remainder. Overshoot within a
//! host tick is dropped, so a slow render loop plays back slower rather than
//! skipping frames. Time is kept as `Duration` (integer nanoseconds) so equal
//! chunks of an interval sum exactly.

use std::time::Duration;

/// Position of playback handed to players on each advance.
///
/// Built by the controller from the clock state before the index moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCursor {
    /// Frame to apply on this advance
    pub index: u32,

    /// Frame the following advance will apply (None once playback stops)
    pub next: Option<u32>,

    /// Fixed tick interval
    pub interval: Duration,
}

impl FrameCursor {
    pub fn new(index: u32, next: Option<u32>, interval: Duration) -> Self {
        Self { index, next, interval }
    }

    /// Simulated timestamp of this frame (`index * interval`).
    pub fn time_seconds(&self) -> f64 {
        self.index as f64 * self.interval.as_secs_f64()
    }
}

/// Accumulates host time against a fixed interval.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    /// Time accumulated since the last advance
    accumulated: Duration,

    /// Fixed interval between advances
    interval: Duration,

    /// Frame the next advance will apply
    index: u32,

    /// Playback bound, enforced by the caller
    total_frames: u32,
}

impl PlaybackClock {
    /// Creates a clock at frame 0 with an empty accumulator.
    pub fn new(interval: Duration, total_frames: u32) -> Self {
        Self {
            accumulated: Duration::ZERO,
            interval,
            index: 0,
            total_frames,
        }
    }

    /// Adds host-supplied elapsed time.
    pub fn accumulate(&mut self, delta: Duration) {
        self.accumulated = self.accumulated.saturating_add(delta);
    }

    /// Emits an advance signal if a full interval has accumulated.
    ///
    /// On signal the index moves forward by one and the accumulator is reset
    /// to zero. The index may reach `total_frames` here; the caller decides
    /// whether to loop or stop.
    pub fn advance_check(&mut self) -> bool {
        if self.accumulated < self.interval {
            return false;
        }
        self.accumulated = Duration::ZERO;
        self.index = self.index.saturating_add(1);
        true
    }

    /// `accumulate` then `advance_check`.
    pub fn tick(&mut self, delta: Duration) -> bool {
        self.accumulate(delta);
        self.advance_check()
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Moves the frame index (loop restart or hold).
    pub fn set_index(&mut self, index: u32) {
        self.index = index;
    }

    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn accumulated(&self) -> Duration {
        self.accumulated
    }

    /// Returns true once the index has run into the bound.
    pub fn at_bound(&self) -> bool {
        self.index >= self.total_frames
    }

    /// Back to frame 0 with an empty accumulator.
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.index = 0;
    }
}
