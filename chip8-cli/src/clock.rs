//! Frame clock.
use std::{
    thread,
    time::{Duration, Instant},
};

/// Number of nanoseconds in a second
const NANOS_IN_SECOND: u64 = 1_000_000_000;

/// Clock frequency, in hertz (per second)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Hz(pub u64);

impl From<Hz> for Duration {
    fn from(freq: Hz) -> Self {
        if freq.0 == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(NANOS_IN_SECOND / freq.0)
        }
    }
}

/// Timer to pace the host loop to a fixed frame rate.
///
/// Time spent outside of [`Clock::wait`] counts towards the current
/// frame, so the frame's work is included in its budget.
pub struct Clock {
    start: Instant,
    interval: Duration,
}

impl Clock {
    /// Creates a new clock with the current time as internal state.
    ///
    /// A frequency of zero disables pacing.
    pub fn new(freq: Hz) -> Self {
        Self {
            start: Instant::now(),
            interval: freq.into(),
        }
    }

    /// Set the clock state back to zero.
    pub fn reset(&mut self) {
        self.start = Instant::now()
    }

    /// Block the current thread until the next frame.
    pub fn wait(&mut self) {
        if self.interval.is_zero() {
            return;
        }

        loop {
            let elapsed = self.start.elapsed();
            if elapsed < self.interval {
                // Sleep does not have enough resolution, and causes
                // the clock to run at 30 FPS.
                //
                // Spinning a loop causes high CPU usage and fan madness.
                //
                // Yielding in a loop is the best alternative.
                thread::yield_now();
            } else {
                // Reset back to zero, rather than trying to catch up.
                //
                // If the process was suspended, and a large amount of
                // time has elapsed until it is resumed, it should simply
                // continue at the next frame running at its usual speed.
                self.reset();
                return;
            }
        }
    }
}
