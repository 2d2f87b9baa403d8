//! Rate gates for the session loop.
//!
//! Two independent gates drive a running machine: one at the configured
//! instruction rate and one at a fixed 60 Hz for the timer registers. A gate
//! fires when the elapsed time since its last fire exceeds its interval, and
//! firing advances the reference by exactly one interval rather than to
//! "now". A stalled loop therefore catches up one interval per poll instead
//! of compounding drift or replaying a burst of steps.

use std::time::Instant;

pub const MICROS_PER_SECOND: u64 = 1_000_000;
/// Rate at which the delay and sound registers count down.
pub const TIMER_HZ: u64 = 60;
/// Default instruction rate.
pub const DEFAULT_TICKS_PER_SECOND: u64 = 1000;

/// A monotonic microsecond counter.
pub trait Clock {
    fn now_us(&self) -> u64;
}

/// The wall clock, measured from construction.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> SystemClock {
        SystemClock {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_us(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}

/// One periodic gate: a target interval and the timestamp of the last fire.
pub struct Ticker {
    interval_us: u64,
    last_fire_us: u64,
}

impl Ticker {
    pub fn new(interval_us: u64, now_us: u64) -> Ticker {
        Ticker {
            interval_us,
            last_fire_us: now_us,
        }
    }

    /// A gate firing `hz` times per second. Zero is clamped to one so a
    /// nonsense rate cannot divide by zero.
    pub fn from_hz(hz: u64, now_us: u64) -> Ticker {
        Ticker::new(MICROS_PER_SECOND / hz.max(1), now_us)
    }

    /// Fire at most once. Firing moves the reference forward by one
    /// interval, so backlog is worked off across subsequent polls.
    pub fn poll(&mut self, now_us: u64) -> bool {
        if now_us.saturating_sub(self.last_fire_us) > self.interval_us {
            self.last_fire_us += self.interval_us;
            return true;
        }
        false
    }
}
