//! Deterministic clock and gesture-sequence harness for layerkit's test
//! suites: drives `LayerRoot`s on a hand-advanced timeline instead of a real
//! one, and scripts multi-step touch interactions.

pub mod assertions;
pub mod clock;
pub mod gestures;

pub use assertions::{assert_approx_eq, assert_point_approx_eq, assert_rect_approx_eq};
pub use clock::ManualClock;
pub use gestures::{GestureSequencePlayer, GestureStep};

pub mod prelude {
    pub use crate::assertions::{assert_approx_eq, assert_point_approx_eq, assert_rect_approx_eq};
    pub use crate::clock::ManualClock;
    pub use crate::gestures::{GestureSequencePlayer, GestureStep};
}
