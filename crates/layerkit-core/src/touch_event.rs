//! The immutable touch/wheel event delivered to the dispatcher.

use layerkit_foundation::{Duration, Point, TimePoint, Vector};
use smallvec::SmallVec;

/// Opaque handle identifying whatever delivered an event (a platform pointer
/// id, a test fixture tag, ...). The core never inspects it.
pub type EventSource = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEventType {
    Down,
    Moved,
    Idle,
    Up,
    Wheel,
    None,
    PointerDown,
    PointerUp,
}

impl TouchEventType {
    /// Whether the last observed event of this type represents ongoing
    /// interaction (used by `refresh_touches` to decide between a synthetic
    /// `Idle` vs. `None`).
    pub fn is_interaction(self) -> bool {
        matches!(
            self,
            TouchEventType::Down
                | TouchEventType::Moved
                | TouchEventType::Idle
                | TouchEventType::PointerDown
                | TouchEventType::PointerUp
        )
    }
}

/// At least two pointer locations are reserved inline, matching the
/// original's `SmallVector<Point, 2>` for `pointerLocations`.
pub type PointerLocations = SmallVec<[Point; 2]>;

/// An immutable touch or wheel event. `with_location` is the only mutator,
/// and it returns a copy.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    pub event_type: TouchEventType,
    pub location_in_window: Point,
    pub location: Point,
    pub direction: Vector,
    pub pointer_count: usize,
    pub action_index: usize,
    pub pointer_locations: PointerLocations,
    pub time: TimePoint,
    pub offset_since_source: Duration,
    pub source: EventSource,
}

impl TouchEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        event_type: TouchEventType,
        location_in_window: Point,
        location: Point,
        direction: Vector,
        pointer_count: usize,
        action_index: usize,
        pointer_locations: PointerLocations,
        time: TimePoint,
        offset_since_source: Duration,
        source: EventSource,
    ) -> Self {
        Self {
            event_type,
            location_in_window,
            location,
            direction,
            pointer_count,
            action_index,
            pointer_locations,
            time,
            offset_since_source,
            source,
        }
    }

    /// Returns a copy with `location` replaced; every other field (including
    /// `location_in_window`) is preserved.
    pub fn with_location(&self, location: Point) -> TouchEvent {
        TouchEvent {
            location,
            ..self.clone()
        }
    }
}
