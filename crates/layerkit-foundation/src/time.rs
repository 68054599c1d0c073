//! Time points and durations. `TimePoint` is deliberately opaque about its
//! origin: the root converts host-supplied absolute frame times into
//! relative ones (see `layerkit_core::root`), and every internal computation
//! only ever subtracts two `TimePoint`s or adds a `Duration`. This keeps the
//! whole runtime drivable by a synthetic clock in tests.

use std::ops::{Add, Sub};

/// Seconds with microsecond-precision arithmetic (stored as `f64` seconds).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Duration {
    seconds: f64,
}

impl Duration {
    pub const ZERO: Duration = Duration { seconds: 0.0 };

    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    pub fn from_millis(millis: f64) -> Self {
        Self {
            seconds: millis / 1000.0,
        }
    }

    pub fn seconds(self) -> f64 {
        self.seconds
    }

    /// Integer-millisecond query, used by the touch-refresh and frame-warning
    /// thresholds which are specified in whole milliseconds.
    pub fn milliseconds(self) -> i64 {
        (self.seconds * 1000.0) as i64
    }
}

impl Add for Duration {
    type Output = Duration;
    fn add(self, rhs: Duration) -> Duration {
        Duration::from_seconds(self.seconds + rhs.seconds)
    }
}

impl Sub for Duration {
    type Output = Duration;
    fn sub(self, rhs: Duration) -> Duration {
        Duration::from_seconds(self.seconds - rhs.seconds)
    }
}

/// A point on some monotonic timeline whose origin is defined by the caller.
/// The frame loop treats the first absolute frame time it observes as a
/// local zero and reports every subsequent `TimePoint` relative to it.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct TimePoint {
    seconds: f64,
}

impl TimePoint {
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    pub fn seconds(self) -> f64 {
        self.seconds
    }
}

impl Sub for TimePoint {
    type Output = Duration;
    fn sub(self, rhs: TimePoint) -> Duration {
        Duration::from_seconds(self.seconds - rhs.seconds)
    }
}

impl Add<Duration> for TimePoint {
    type Output = TimePoint;
    fn add(self, rhs: Duration) -> TimePoint {
        TimePoint::from_seconds(self.seconds + rhs.seconds())
    }
}

/// Source of monotonic time for whatever is driving the root. Kept as a
/// trait so tests can supply a hand-advanced clock instead of a real one.
pub trait Clock {
    fn now(&self) -> TimePoint;
}

#[cfg(feature = "std-time")]
pub use std_time::SystemClock;

#[cfg(feature = "std-time")]
mod std_time {
    use super::{Clock, TimePoint};
    use instant::Instant;

    /// Wall-clock source built on the `instant` crate, which resolves to
    /// `std::time::Instant` on native targets and to `performance.now()` on
    /// wasm32 — the same crate `compose-app-shell` uses for its frame clock.
    pub struct SystemClock {
        origin: Instant,
    }

    impl SystemClock {
        pub fn new() -> Self {
            Self {
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
        fn now(&self) -> TimePoint {
            TimePoint::from_seconds(self.origin.elapsed().as_secs_f64())
        }
    }
}
