//! Tunable gesture parameters, passed through a host's `resources` bundle.

use crate::geometry::Scalar;
use crate::time::Duration;

/// Recognized gesture tuning knobs. Defaults match
/// `Touches/GesturesConfiguration.cpp` in the original source exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GesturesConfiguration {
    pub long_press_timeout: Duration,
    /// Also the tap family's `pressTimeout`.
    pub double_tap_timeout: Duration,
    /// Also the long-press and tap-family shift tolerance.
    pub drag_touch_slop: Scalar,
    /// Used by hit-testing of text links (outside this crate's scope, kept
    /// for parity with the host-facing configuration surface).
    pub touch_tolerance: Scalar,
    /// Dimensionless; consumed by host animators, not by this crate.
    pub scroll_friction: Scalar,
    /// When true, the dispatcher emits structured debug lines describing
    /// capture, update, conflict resolution and cancellation via `log::debug!`.
    pub debug_gestures: bool,
}

impl Default for GesturesConfiguration {
    fn default() -> Self {
        Self {
            long_press_timeout: Duration::from_seconds(0.25),
            double_tap_timeout: Duration::from_seconds(0.25),
            drag_touch_slop: 10.0,
            touch_tolerance: 5.0,
            scroll_friction: 0.015,
            debug_gestures: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let cfg = GesturesConfiguration::default();
        assert_eq!(cfg.long_press_timeout.seconds(), 0.25);
        assert_eq!(cfg.double_tap_timeout.seconds(), 0.25);
        assert_eq!(cfg.drag_touch_slop, 10.0);
        assert_eq!(cfg.touch_tolerance, 5.0);
        assert_eq!(cfg.scroll_friction, 0.015);
        assert!(!cfg.debug_gestures);
    }
}
