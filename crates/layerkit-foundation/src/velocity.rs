//! Impulse-based velocity tracking for fling gestures.
//!
//! Distinct from a least-squares velocity estimator: this is a port of the
//! kinetic-energy / impulse method used by the scroll recognizer's pair of
//! axis trackers, ported from `Utils/VelocityTracker.cpp`.

use crate::time::TimePoint;
use std::collections::VecDeque;

/// Maximum number of retained samples; the oldest is dropped once exceeded.
const MOMENT_HISTORY: usize = 10;

/// `sqrt(2)` as the literal constant the original source hardcodes, rather
/// than `std::f64::consts::SQRT_2`, to keep the algorithm bit-for-bit
/// faithful to the reference implementation.
const APPROX_SQRT_2: f64 = 1.41421356237;

#[derive(Debug, Clone, Copy)]
struct Moment {
    time: TimePoint,
    sample: f64,
}

/// A bounded sliding window of `(time, scalar)` samples with an
/// impulse-velocity estimator.
#[derive(Debug, Clone, Default)]
pub struct VelocityTracker {
    /// Newest sample at the front, oldest at the back.
    moments: VecDeque<Moment>,
}

impl VelocityTracker {
    pub fn new() -> Self {
        Self {
            moments: VecDeque::with_capacity(MOMENT_HISTORY),
        }
    }

    /// Pushes a new sample at the front, evicting the oldest once the window
    /// exceeds `MOMENT_HISTORY`.
    pub fn add_sample(&mut self, time: TimePoint, sample: f64) {
        self.moments.push_front(Moment { time, sample });
        if self.moments.len() > MOMENT_HISTORY {
            self.moments.pop_back();
        }
    }

    pub fn clear(&mut self) {
        self.moments.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.moments.is_empty()
    }

    /// Computes the impulse-based velocity in units/second.
    pub fn compute_velocity(&self) -> f64 {
        match self.moments.len() {
            0 | 1 => 0.0,
            2 => {
                // moments[0] is newest (s0), moments[1] is the older sample (s1).
                let s0 = self.moments[0];
                let s1 = self.moments[1];
                let dt = (s1.time - s0.time).seconds();
                if dt == 0.0 {
                    0.0
                } else {
                    (s1.sample - s0.sample) / dt
                }
            }
            _ => {
                // Walk oldest -> newest accumulating "work", the kinetic-energy
                // impulse method from the original VelocityTracker::computeImpulseVelocity.
                let mut work = 0.0f64;
                let mut first_pair = true;

                // self.moments is newest-first; iterate pairs (current, next) where
                // `next` is one step newer than `current`, i.e. walk from the back
                // (oldest) toward the front (newest).
                let len = self.moments.len();
                for i in (1..len).rev() {
                    let current = self.moments[i];
                    let next = self.moments[i - 1];

                    if current.time == next.time {
                        continue;
                    }

                    let dt = (current.time - next.time).seconds();
                    let v_prev = kinetic_energy_to_velocity(work);
                    let v_curr = (current.sample - next.sample) / dt;
                    work += (v_curr - v_prev) * v_curr.abs();

                    if first_pair {
                        work *= 0.5;
                        first_pair = false;
                    }
                }

                kinetic_energy_to_velocity(work)
            }
        }
    }
}

/// `sign(w) * sqrt(|w|) * sqrt(2)`.
fn kinetic_energy_to_velocity(w: f64) -> f64 {
    w.signum() * w.abs().sqrt() * APPROX_SQRT_2
}
