//! A hand-advanced `Clock` so frame-loop and dispatcher tests can control
//! wall-clock time deterministically instead of racing a real one.

use layerkit_foundation::{Clock, Duration, TimePoint};
use std::cell::Cell;

/// Starts at `TimePoint::from_seconds(0.0)` and only moves when `advance` or
/// `set` is called.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<TimePoint>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self { now: Cell::new(TimePoint::from_seconds(0.0)) }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, at: TimePoint) {
        self.now.set(at);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimePoint {
        self.now.get()
    }
}
