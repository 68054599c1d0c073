use super::*;
use crate::touch_event::{PointerLocations, TouchEventType};
use layerkit_foundation::{Duration, Point, TimePoint, Vector};
use std::cell::RefCell;
use std::rc::Rc;

fn event(event_type: TouchEventType, location: Point, time_seconds: f64, pointer_count: usize) -> TouchEvent {
    TouchEvent::new(
        event_type,
        location,
        location,
        Vector::ZERO,
        pointer_count,
        0,
        PointerLocations::from_elem(location, 1),
        TimePoint::from_seconds(time_seconds),
        Duration::ZERO,
        0,
    )
}

#[test]
fn tap_recognizes_a_single_down_up_within_tolerance() {
    let mut recognizer = Recognizer::new(RecognizerKind::Tap(TapData::new(1, Duration::from_seconds(0.5), 10.0)));
    recognizer.update(&event(TouchEventType::Down, Point::new(0.0, 0.0), 0.0, 1));
    assert_eq!(recognizer.state(), RecognizerState::Possible);
    recognizer.update(&event(TouchEventType::Up, Point::new(1.0, 0.0), 0.1, 1));
    assert_eq!(recognizer.state(), RecognizerState::Began);
}

#[test]
fn tap_fails_when_shift_exceeds_tolerance() {
    let mut recognizer = Recognizer::new(RecognizerKind::Tap(TapData::new(1, Duration::from_seconds(0.5), 10.0)));
    recognizer.update(&event(TouchEventType::Down, Point::new(0.0, 0.0), 0.0, 1));
    recognizer.update(&event(TouchEventType::Up, Point::new(50.0, 0.0), 0.1, 1));
    assert_eq!(recognizer.state(), RecognizerState::Failed);
}

#[test]
fn tap_fails_when_press_timeout_elapses() {
    let mut recognizer = Recognizer::new(RecognizerKind::Tap(TapData::new(1, Duration::from_seconds(0.25), 10.0)));
    recognizer.update(&event(TouchEventType::Down, Point::ZERO, 0.0, 1));
    recognizer.update(&event(TouchEventType::Up, Point::ZERO, 1.0, 1));
    assert_eq!(recognizer.state(), RecognizerState::Failed);
}

#[test]
fn long_press_begins_after_the_timeout_without_moving() {
    let mut recognizer = Recognizer::new(RecognizerKind::LongPress(LongPressData::new(
        Duration::from_seconds(0.3),
        10.0,
    )));
    recognizer.update(&event(TouchEventType::Down, Point::ZERO, 0.0, 1));
    recognizer.update(&event(TouchEventType::Idle, Point::ZERO, 0.1, 1));
    assert_eq!(recognizer.state(), RecognizerState::Possible);
    recognizer.update(&event(TouchEventType::Idle, Point::ZERO, 0.35, 1));
    assert_eq!(recognizer.state(), RecognizerState::Began);
}

#[test]
fn long_press_fails_when_the_finger_drifts_too_far() {
    let mut recognizer = Recognizer::new(RecognizerKind::LongPress(LongPressData::new(
        Duration::from_seconds(0.3),
        10.0,
    )));
    recognizer.update(&event(TouchEventType::Down, Point::ZERO, 0.0, 1));
    recognizer.update(&event(TouchEventType::Moved, Point::new(40.0, 0.0), 0.1, 1));
    assert_eq!(recognizer.state(), RecognizerState::Failed);
}

#[test]
fn drag_reports_offset_relative_to_the_point_where_it_began() {
    let reports = Rc::new(RefCell::new(Vec::new()));
    let reports_clone = reports.clone();
    let mut data = DragData::new(10.0);
    data.listener = Some(Box::new(move |state, move_event| {
        reports_clone.borrow_mut().push((state, move_event.offset));
    }));
    let mut recognizer = Recognizer::new(RecognizerKind::Drag(data));

    recognizer.update(&event(TouchEventType::Down, Point::ZERO, 0.0, 1));
    assert_eq!(recognizer.state(), RecognizerState::Possible);
    recognizer.update(&event(TouchEventType::Moved, Point::new(20.0, 0.0), 0.1, 1));
    assert_eq!(recognizer.state(), RecognizerState::Began);
    recognizer.update(&event(TouchEventType::Moved, Point::new(30.0, 0.0), 0.2, 1));
    assert_eq!(recognizer.state(), RecognizerState::Changed);

    let report = reports.borrow();
    let changed = report
        .iter()
        .rev()
        .find(|(state, _)| *state == RecognizerState::Changed)
        .expect("a Changed report should have been emitted");
    assert!((changed.1.dx - 10.0).abs() < 1e-9);
}

#[test]
fn drag_ends_when_the_pointer_lifts() {
    let mut recognizer = Recognizer::new(RecognizerKind::Drag(DragData::new(10.0)));
    recognizer.update(&event(TouchEventType::Down, Point::ZERO, 0.0, 1));
    recognizer.update(&event(TouchEventType::Moved, Point::new(20.0, 0.0), 0.1, 1));
    recognizer.update(&event(TouchEventType::Up, Point::new(25.0, 0.0), 0.2, 1));
    assert_eq!(recognizer.state(), RecognizerState::Ended);
}

#[test]
fn pinch_reports_scale_relative_to_the_starting_span() {
    let reports = Rc::new(RefCell::new(Vec::new()));
    let reports_clone = reports.clone();
    let mut data = PinchData::new();
    data.listener = Some(Box::new(move |state, pinch_event| {
        reports_clone.borrow_mut().push((state, pinch_event.scale));
    }));
    let mut recognizer = Recognizer::new(RecognizerKind::Pinch(data));

    let mut first = event(TouchEventType::Down, Point::ZERO, 0.0, 2);
    first.direction = Vector::new(100.0, 0.0);
    recognizer.update(&first);
    assert_eq!(recognizer.state(), RecognizerState::Began);

    let mut second = event(TouchEventType::Moved, Point::ZERO, 0.1, 2);
    second.direction = Vector::new(200.0, 0.0);
    recognizer.update(&second);
    recognizer.process();

    let report = reports.borrow();
    let changed = report.iter().find(|(state, _)| *state == RecognizerState::Changed).unwrap();
    assert!((changed.1 - 2.0).abs() < 1e-9);
}

#[test]
fn rotate_reports_the_angle_swept_since_the_gesture_began() {
    let reports = Rc::new(RefCell::new(Vec::new()));
    let reports_clone = reports.clone();
    let mut data = RotateData::new();
    data.listener = Some(Box::new(move |state, rotate_event| {
        reports_clone.borrow_mut().push((state, rotate_event.rotation));
    }));
    let mut recognizer = Recognizer::new(RecognizerKind::Rotate(data));

    let mut first = event(TouchEventType::Down, Point::ZERO, 0.0, 2);
    first.direction = Vector::new(0.0, 1.0);
    recognizer.update(&first);
    assert_eq!(recognizer.state(), RecognizerState::Began);

    let mut second = event(TouchEventType::Moved, Point::ZERO, 0.1, 2);
    second.direction = Vector::new(-1.0, 0.0);
    recognizer.update(&second);
    recognizer.process();

    let report = reports.borrow();
    let changed = report.iter().find(|(state, _)| *state == RecognizerState::Changed).unwrap();
    assert!((changed.1 - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
}

#[test]
fn rotate_carries_its_net_rotation_across_a_finger_lift_and_relift() {
    let reports = Rc::new(RefCell::new(Vec::new()));
    let reports_clone = reports.clone();
    let mut data = RotateData::new();
    data.listener = Some(Box::new(move |state, rotate_event| {
        reports_clone.borrow_mut().push((state, rotate_event.rotation));
    }));
    let mut recognizer = Recognizer::new(RecognizerKind::Rotate(data));

    let mut first = event(TouchEventType::Down, Point::ZERO, 0.0, 2);
    first.direction = Vector::new(0.0, 1.0);
    recognizer.update(&first);

    let mut second = event(TouchEventType::Moved, Point::ZERO, 0.1, 2);
    second.direction = Vector::new(-1.0, 0.0);
    recognizer.update(&second);
    recognizer.process();

    // One finger lifts: pointer count drops below two, which folds the
    // angle swept so far into `net_rotation` before anything resets.
    let mut lift = event(TouchEventType::PointerUp, Point::ZERO, 0.2, 1);
    lift.direction = Vector::new(-1.0, 0.0);
    recognizer.update(&lift);
    assert_eq!(recognizer.state(), RecognizerState::Changed);
    recognizer.process();

    // A second finger returns and starts a fresh angle baseline; the
    // net_rotation folded in above should still be carried forward.
    let mut relift = event(TouchEventType::PointerDown, Point::ZERO, 0.3, 2);
    relift.direction = Vector::new(-1.0, 0.0);
    recognizer.update(&relift);
    assert_eq!(recognizer.state(), RecognizerState::Changed);
    recognizer.process();

    let report = reports.borrow();
    let rotations: Vec<f64> = report.iter().map(|(_, rotation)| *rotation).collect();
    // After the lift, `net_rotation` has absorbed the quarter turn swept by
    // the first two fingers, so both the lift and the relift report it.
    assert!((rotations[rotations.len() - 2] - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    assert!((rotations[rotations.len() - 1] - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
}

#[test]
fn wheel_type_name_is_reported_as_drag() {
    let recognizer = Recognizer::new(RecognizerKind::Wheel(WheelData::new()));
    assert_eq!(recognizer.type_name(), "drag");
}

#[test]
fn wheel_begins_on_a_wheel_event_and_ends_immediately_after_processing() {
    let reports = Rc::new(RefCell::new(Vec::new()));
    let reports_clone = reports.clone();
    let mut data = WheelData::new();
    data.listener = Some(Box::new(move |location, direction| {
        reports_clone.borrow_mut().push((location, direction));
    }));
    let mut recognizer = Recognizer::new(RecognizerKind::Wheel(data));

    let mut wheel_event = event(TouchEventType::Wheel, Point::new(5.0, 8.0), 0.0, 0);
    wheel_event.direction = Vector::new(0.0, -12.0);
    recognizer.update(&wheel_event);
    assert_eq!(recognizer.state(), RecognizerState::Began);

    recognizer.process();
    assert_eq!(recognizer.state(), RecognizerState::Ended);

    let recorded = reports.borrow();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].0, Point::new(5.0, 8.0));
    assert_eq!(recorded[0].1, Vector::new(0.0, -12.0));
}

#[test]
fn wheel_fails_on_any_non_wheel_event() {
    let mut recognizer = Recognizer::new(RecognizerKind::Wheel(WheelData::new()));
    recognizer.update(&event(TouchEventType::Idle, Point::ZERO, 0.0, 0));
    assert_eq!(recognizer.state(), RecognizerState::Failed);
}

#[test]
fn cancel_emits_a_synthetic_ended_once_for_a_processed_active_recognizer() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let calls_clone = calls.clone();
    let mut data = TapData::new(1, Duration::from_seconds(0.5), 10.0);
    data.listener = Some(Box::new(move |state, _point| calls_clone.borrow_mut().push(state)));
    let mut recognizer = Recognizer::new(RecognizerKind::Tap(data));

    recognizer.update(&event(TouchEventType::Down, Point::ZERO, 0.0, 1));
    recognizer.update(&event(TouchEventType::Up, Point::ZERO, 0.1, 1));
    recognizer.process();
    recognizer.cancel();

    assert_eq!(recognizer.state(), RecognizerState::Possible);
    assert!(!recognizer.was_processed());
    assert_eq!(*calls.borrow(), vec![RecognizerState::Began, RecognizerState::Ended]);
}

#[test]
fn drag_and_pinch_can_recognize_simultaneously_but_two_drags_cannot() {
    let drag = Recognizer::new(RecognizerKind::Drag(DragData::new(10.0)));
    let pinch = Recognizer::new(RecognizerKind::Pinch(PinchData::new()));
    let other_drag = Recognizer::new(RecognizerKind::Drag(DragData::new(10.0)));

    assert!(drag.is_compatible_with(&pinch));
    assert!(!drag.is_compatible_with(&other_drag));
    assert!(drag.requires_failure_of(&other_drag));
    assert!(!drag.requires_failure_of(&pinch));
}
