//! A scripted touch-sequence player: feeds a list of commands into a
//! `LayerRoot` at synthetic, steadily advancing times, the way a human
//! finger's down/move/up stream would arrive from a real digitizer.

use layerkit_core::{DispatchError, EventSource, LayerRoot, PointerLocations, TouchEvent, TouchEventType};
use layerkit_foundation::{Duration, Point, TimePoint, Vector};

/// One step of a scripted interaction.
#[derive(Debug, Clone, Copy)]
pub enum GestureStep {
    Down { at: Point },
    Move { to: Point },
    Up { at: Point },
    Wait { for_duration: Duration },
}

/// Replays a `GestureStep` sequence against a `LayerRoot` on a single
/// synthetic pointer source, advancing its own clock by a fixed tick
/// between steps unless a `Wait` asks for more.
pub struct GestureSequencePlayer {
    root: LayerRoot,
    source: EventSource,
    time: TimePoint,
    tick: Duration,
    last_location: Point,
}

impl GestureSequencePlayer {
    pub fn new(root: LayerRoot, source: EventSource) -> Self {
        Self {
            root,
            source,
            time: TimePoint::from_seconds(0.0),
            tick: Duration::from_millis(16.0),
            last_location: Point::ZERO,
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Plays every step in order, returning the first dispatch error
    /// encountered (if any); a caller scripting contention deliberately
    /// (e.g. to exercise `DispatchError::AlreadyDispatching`) can inspect it.
    pub fn play(&mut self, steps: &[GestureStep]) -> Result<(), DispatchError> {
        for step in steps {
            self.play_one(*step)?;
        }
        Ok(())
    }

    fn play_one(&mut self, step: GestureStep) -> Result<(), DispatchError> {
        match step {
            GestureStep::Wait { for_duration } => {
                self.time = self.time + for_duration;
                Ok(())
            }
            GestureStep::Down { at } => self.dispatch(TouchEventType::Down, at),
            GestureStep::Move { to } => self.dispatch(TouchEventType::Moved, to),
            GestureStep::Up { at } => self.dispatch(TouchEventType::Up, at),
        }
    }

    fn dispatch(&mut self, event_type: TouchEventType, location: Point) -> Result<(), DispatchError> {
        self.time = self.time + self.tick;
        self.last_location = location;
        let event = TouchEvent::new(
            event_type,
            location,
            location,
            Vector::ZERO,
            1,
            0,
            PointerLocations::from_elem(location, 1),
            self.time,
            Duration::ZERO,
            self.source,
        );
        self.root.dispatch_touch_event(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use layerkit_core::{GestureTypes, RootResources};
    use layerkit_foundation::{GesturesConfiguration, Rect, Size};
    use std::rc::Rc;

    fn root_with_default_resources() -> LayerRoot {
        let root = LayerRoot::new(RootResources {
            gestures_configuration: GesturesConfiguration::default(),
            initial_scale: 1.0,
            clock: Rc::new(ManualClock::new()),
        });
        root.set_size(Size::new(200.0, 200.0), 1.0);
        root
    }

    #[test]
    fn a_tap_sequence_resolves_through_down_and_up() {
        use layerkit_core::{Recognizer, RecognizerKind, RecognizerState, TapData};
        use std::cell::RefCell;

        let root = root_with_default_resources();
        let content = root.content_layer();
        content.set_frame(Rect::make_xywh(0.0, 0.0, 200.0, 200.0));

        let resolved = Rc::new(RefCell::new(false));
        let resolved_clone = resolved.clone();
        let mut tap_data = TapData::new(1, Duration::from_seconds(0.5), 10.0);
        tap_data.listener = Some(Box::new(move |state, _point| {
            if state == RecognizerState::Ended {
                *resolved_clone.borrow_mut() = true;
            }
        }));
        content.add_gesture_recognizer(Rc::new(RefCell::new(Recognizer::new(RecognizerKind::Tap(tap_data)))));

        let mut player = GestureSequencePlayer::new(root, 1);
        player
            .play(&[
                GestureStep::Down { at: Point::new(100.0, 100.0) },
                GestureStep::Up { at: Point::new(100.0, 100.0) },
            ])
            .unwrap();

        assert!(*resolved.borrow());
    }

    #[test]
    fn gesture_types_for_event_helper_is_reachable_from_the_player_s_root() {
        let root = root_with_default_resources();
        let probe = TouchEvent::new(
            TouchEventType::Down,
            Point::new(10.0, 10.0),
            Point::new(10.0, 10.0),
            Vector::ZERO,
            1,
            0,
            PointerLocations::from_elem(Point::new(10.0, 10.0), 1),
            TimePoint::from_seconds(0.0),
            Duration::ZERO,
            1,
        );
        let types: GestureTypes = root.gesture_types_for_event(&probe);
        assert!(!types.has_tap && !types.has_drag && !types.has_scroll);
    }
}
