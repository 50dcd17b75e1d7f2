use std::time::{Duration, Instant};

/// Utility for keeping track of how long each phase of a generation run takes.
pub struct Timer {
    start_time: Instant,
}

impl Timer {
    /// Create a new `Timer`.
    pub fn now() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    /// Reset internal timer to now.
    pub fn reset(&mut self) {
        self.start_time = Instant::now();
    }

    /// Return the time elapsed since the last reset, and reset the timer,
    /// so consecutive phases can be timed back to back.
    pub fn lap(&mut self) -> Duration {
        let elapsed = self.start_time.elapsed();
        self.reset();
        elapsed
    }
}
