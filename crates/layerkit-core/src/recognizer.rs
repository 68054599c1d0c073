//! The gesture recognizer family: a shared finite state machine plus a
//! per-kind variant carrying subtype-specific data, per the "sum type with a
//! shared record and a variant" design called out for this recognizer
//! hierarchy.

use crate::layer::{Layer, WeakLayer};
use crate::touch_event::{TouchEvent, TouchEventType};
use layerkit_foundation::{Duration, Point, Scalar, TimePoint, Vector, VelocityTracker};

/// `scroll`'s emitted velocity snaps to zero below this magnitude.
const SCROLL_VELOCITY_THRESHOLD: Scalar = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognizerState {
    Possible,
    Failed,
    Began,
    Changed,
    Ended,
}

impl RecognizerState {
    pub fn is_active(self) -> bool {
        matches!(
            self,
            RecognizerState::Began | RecognizerState::Changed | RecognizerState::Ended
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecognizerKindTag {
    Tap,
    LongPress,
    Touch,
    Drag,
    Scroll,
    Pinch,
    Rotate,
    Wheel,
}

/// The payload reported to drag/scroll listeners, and embedded in the
/// pinch/rotate payloads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveEvent {
    pub location: Point,
    pub offset: Vector,
    pub velocity: Vector,
    pub time: TimePoint,
    pub pointer_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchEvent {
    pub base: MoveEvent,
    pub scale: Scalar,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotateEvent {
    pub base: MoveEvent,
    pub rotation: Scalar,
}

pub type TapListener = Box<dyn FnMut(RecognizerState, Point)>;
pub type TouchSlotListener = Box<dyn FnMut(Point)>;
pub type MoveListener = Box<dyn FnMut(RecognizerState, MoveEvent)>;
pub type PinchListener = Box<dyn FnMut(RecognizerState, PinchEvent)>;
pub type RotateListener = Box<dyn FnMut(RecognizerState, RotateEvent)>;
pub type WheelListener = Box<dyn FnMut(Point, Vector)>;
pub type ShouldBeginListener = Box<dyn FnMut() -> bool>;

// ---------------------------------------------------------------------
// Tap family
// ---------------------------------------------------------------------

pub struct TapData {
    pub number_of_taps_required: usize,
    pub press_timeout: Duration,
    pub tap_shift_tolerance: Scalar,
    events: Vec<TouchEvent>,
    pub listener: Option<TapListener>,
}

impl TapData {
    pub fn new(number_of_taps_required: usize, press_timeout: Duration, tap_shift_tolerance: Scalar) -> Self {
        Self {
            number_of_taps_required,
            press_timeout,
            tap_shift_tolerance,
            events: Vec::new(),
            listener: None,
        }
    }
}

fn tap_on_update(data: &mut TapData, state: &mut RecognizerState, event: &TouchEvent) {
    if let Some(first) = data.events.first() {
        if first.location_in_window.distance_to(event.location_in_window) > data.tap_shift_tolerance {
            *state = RecognizerState::Failed;
            return;
        }
        if (event.time - first.time).seconds() > data.press_timeout.seconds() {
            *state = RecognizerState::Failed;
            return;
        }
    }

    match event.event_type {
        TouchEventType::Down => data.events.push(event.clone()),
        TouchEventType::Up => {
            if data.events.len() == data.number_of_taps_required {
                *state = RecognizerState::Began;
            }
        }
        TouchEventType::None => {
            if data.events.is_empty() || data.events.len() >= data.number_of_taps_required {
                *state = RecognizerState::Failed;
            }
        }
        _ => {}
    }

    if data.events.len() > data.number_of_taps_required {
        *state = RecognizerState::Failed;
    }
}

// ---------------------------------------------------------------------
// Long press
// ---------------------------------------------------------------------

pub struct LongPressData {
    pub long_press_timeout: Duration,
    pub long_press_shift_tolerance: Scalar,
    start_event: Option<TouchEvent>,
    pub listener: Option<TapListener>,
}

impl LongPressData {
    pub fn new(long_press_timeout: Duration, long_press_shift_tolerance: Scalar) -> Self {
        Self {
            long_press_timeout,
            long_press_shift_tolerance,
            start_event: None,
            listener: None,
        }
    }
}

fn long_press_on_update(data: &mut LongPressData, state: &mut RecognizerState, event: &TouchEvent) {
    match event.event_type {
        TouchEventType::Down => {
            if data.start_event.is_some() {
                *state = RecognizerState::Failed;
            } else {
                data.start_event = Some(event.clone());
            }
        }
        TouchEventType::Moved
        | TouchEventType::Idle
        | TouchEventType::PointerUp
        | TouchEventType::PointerDown => {
            if state.is_active() {
                *state = RecognizerState::Changed;
            } else if let Some(start) = &data.start_event {
                if start.location_in_window.distance_to(event.location_in_window)
                    > data.long_press_shift_tolerance
                {
                    *state = RecognizerState::Failed;
                } else if (event.time - start.time).seconds() >= data.long_press_timeout.seconds() {
                    *state = RecognizerState::Began;
                }
            }
        }
        TouchEventType::Up => {
            *state = if state.is_active() {
                RecognizerState::Ended
            } else {
                RecognizerState::Failed
            };
        }
        TouchEventType::Wheel | TouchEventType::None => {
            *state = RecognizerState::Failed;
        }
    }
}

// ---------------------------------------------------------------------
// Touch (continuous while held)
// ---------------------------------------------------------------------

pub struct TouchData {
    pub on_touch_delay_duration: Duration,
    start_event: Option<TouchEvent>,
    pub on_start: Option<TouchSlotListener>,
    pub on_end: Option<TouchSlotListener>,
    pub on_touch: Option<TouchSlotListener>,
}

impl TouchData {
    pub fn new(on_touch_delay_duration: Duration) -> Self {
        Self {
            on_touch_delay_duration,
            start_event: None,
            on_start: None,
            on_end: None,
            on_touch: None,
        }
    }
}

fn touch_on_update(data: &mut TouchData, state: &mut RecognizerState, event: &TouchEvent) {
    match event.event_type {
        TouchEventType::Down => {
            data.start_event = Some(event.clone());
            if data.on_touch_delay_duration.seconds() == 0.0 {
                *state = RecognizerState::Began;
            }
        }
        TouchEventType::Wheel => {}
        TouchEventType::Idle => {
            if !state.is_active() {
                if let Some(start) = &data.start_event {
                    if (event.time - start.time).seconds() >= data.on_touch_delay_duration.seconds() {
                        *state = RecognizerState::Began;
                    }
                }
            }
        }
        TouchEventType::Moved | TouchEventType::PointerUp | TouchEventType::PointerDown => {
            if state.is_active() {
                *state = RecognizerState::Changed;
            } else if let Some(start) = &data.start_event {
                if (event.time - start.time).seconds() >= data.on_touch_delay_duration.seconds() {
                    *state = RecognizerState::Began;
                }
            }
        }
        TouchEventType::Up => *state = RecognizerState::Ended,
        TouchEventType::None => *state = RecognizerState::Failed,
    }
}

// ---------------------------------------------------------------------
// Move-gesture template (drag / scroll / pinch / rotate)
// ---------------------------------------------------------------------

#[derive(Default, Clone)]
struct MoveGestureState {
    start_event: Option<TouchEvent>,
    last_event: Option<TouchEvent>,
    current_event: Option<TouchEvent>,
}

fn default_velocity(last: &TouchEvent, current: &TouchEvent) -> Vector {
    let dt = (current.time - last.time).seconds();
    if dt == 0.0 {
        Vector::ZERO
    } else {
        (current.location_in_window - last.location_in_window) / dt
    }
}

fn make_move_event(start: &TouchEvent, last: &TouchEvent, current: &TouchEvent) -> MoveEvent {
    MoveEvent {
        location: current.location,
        offset: current.location_in_window - start.location_in_window,
        velocity: default_velocity(last, current),
        time: current.time,
        pointer_count: current.pointer_count,
    }
}

trait MoveHooks {
    fn should_start_move(&self, move_state: &MoveGestureState, event: &TouchEvent) -> bool;
    fn should_continue_move(&self, move_state: &MoveGestureState, event: &TouchEvent) -> bool;
    fn did_start_move(&mut self, move_state: &MoveGestureState, event: &TouchEvent);
    fn did_continue_move(&mut self, move_state: &MoveGestureState, event: &TouchEvent);
    fn on_pointer_change(&mut self, move_state: &mut MoveGestureState, state: &mut RecognizerState, event: &TouchEvent);
    fn on_end(&mut self, move_state: &MoveGestureState, event: &TouchEvent);
}

/// The shared 80% of drag/scroll/pinch/rotate: initialize move state on the
/// first event, fail on `None`/`Wheel`, dispatch active-vs-not-active
/// handling to the five hooks, then shift `(start,last,current)` forward.
fn move_update<H: MoveHooks>(
    hooks: &mut H,
    move_state: &mut MoveGestureState,
    state: &mut RecognizerState,
    event: &TouchEvent,
) {
    if move_state.current_event.is_none() {
        move_state.start_event = Some(event.clone());
        move_state.last_event = Some(event.clone());
        move_state.current_event = Some(event.clone());
    }

    match event.event_type {
        TouchEventType::None | TouchEventType::Wheel => {
            *state = RecognizerState::Failed;
        }
        _ if state.is_active() => match event.event_type {
            TouchEventType::PointerUp | TouchEventType::PointerDown => {
                hooks.on_pointer_change(move_state, state, event);
            }
            TouchEventType::Up => {
                *state = RecognizerState::Ended;
                hooks.on_end(move_state, event);
            }
            _ => {
                if !hooks.should_continue_move(move_state, event) {
                    *state = RecognizerState::Ended;
                    hooks.on_end(move_state, event);
                } else {
                    hooks.did_continue_move(move_state, event);
                }
            }
        },
        _ => {
            if hooks.should_start_move(move_state, event) {
                *state = RecognizerState::Began;
                move_state.start_event = Some(event.clone());
                move_state.last_event = Some(event.clone());
                move_state.current_event = Some(event.clone());
                hooks.did_start_move(move_state, event);
            } else if event.event_type == TouchEventType::Up {
                *state = RecognizerState::Failed;
            }
        }
    }

    move_state.last_event = move_state.current_event.clone();
    move_state.current_event = Some(event.clone());
}

// --- Drag ---------------------------------------------------------------

pub struct DragData {
    pub drag_touch_slop: Scalar,
    move_state: MoveGestureState,
    /// Set once a hook has delivered the listener callback for the event
    /// currently being dispatched, so `Recognizer::process` (which runs
    /// right after `update` in the same cycle) knows not to deliver it a
    /// second time. Consumed (and cleared) by `process`; left `false` when
    /// `process` is invoked on its own, e.g. `cancel`'s synthetic `Ended`.
    emitted_this_cycle: bool,
    pub listener: Option<MoveListener>,
}

impl DragData {
    pub fn new(drag_touch_slop: Scalar) -> Self {
        Self {
            drag_touch_slop,
            move_state: MoveGestureState::default(),
            emitted_this_cycle: false,
            listener: None,
        }
    }
}

impl MoveHooks for DragData {
    fn should_start_move(&self, move_state: &MoveGestureState, event: &TouchEvent) -> bool {
        let start = move_state.start_event.as_ref().unwrap_or(event);
        start.location_in_window.distance_to(event.location_in_window) >= self.drag_touch_slop
            || event.pointer_count > 1
    }

    fn should_continue_move(&self, _move_state: &MoveGestureState, event: &TouchEvent) -> bool {
        event.pointer_count > 0
    }

    fn did_start_move(&mut self, move_state: &MoveGestureState, event: &TouchEvent) {
        emit_drag_like(&mut self.listener, move_state, event, RecognizerState::Began);
        self.emitted_this_cycle = true;
    }

    fn did_continue_move(&mut self, move_state: &MoveGestureState, event: &TouchEvent) {
        emit_drag_like(&mut self.listener, move_state, event, RecognizerState::Changed);
        self.emitted_this_cycle = true;
    }

    fn on_pointer_change(
        &mut self,
        move_state: &mut MoveGestureState,
        state: &mut RecognizerState,
        event: &TouchEvent,
    ) {
        *state = RecognizerState::Changed;
        emit_drag_like(&mut self.listener, move_state, event, RecognizerState::Changed);
        self.emitted_this_cycle = true;
    }

    fn on_end(&mut self, move_state: &MoveGestureState, event: &TouchEvent) {
        emit_drag_like(&mut self.listener, move_state, event, RecognizerState::Ended);
        self.emitted_this_cycle = true;
    }
}

fn emit_drag_like(
    listener: &mut Option<MoveListener>,
    move_state: &MoveGestureState,
    event: &TouchEvent,
    state: RecognizerState,
) {
    if let Some(listener) = listener.as_mut() {
        let start = move_state.start_event.as_ref().unwrap_or(event);
        let last = move_state.current_event.as_ref().unwrap_or(event);
        listener(state, make_move_event(start, last, event));
    }
}

// --- Scroll ---------------------------------------------------------------

pub struct ScrollData {
    pub drag_touch_slop: Scalar,
    pub is_horizontal: bool,
    pub animating_scroll: bool,
    move_state: MoveGestureState,
    horizontal_tracker: VelocityTracker,
    vertical_tracker: VelocityTracker,
    emitted_this_cycle: bool,
    pub listener: Option<MoveListener>,
}

impl ScrollData {
    pub fn new(drag_touch_slop: Scalar, is_horizontal: bool) -> Self {
        Self {
            drag_touch_slop,
            is_horizontal,
            animating_scroll: false,
            move_state: MoveGestureState::default(),
            horizontal_tracker: VelocityTracker::new(),
            vertical_tracker: VelocityTracker::new(),
            emitted_this_cycle: false,
            listener: None,
        }
    }

    fn sample(&mut self, event: &TouchEvent) {
        self.horizontal_tracker
            .add_sample(event.time, event.location_in_window.x);
        self.vertical_tracker
            .add_sample(event.time, event.location_in_window.y);
    }

    fn emit(&mut self, move_state: &MoveGestureState, event: &TouchEvent, state: RecognizerState) {
        let Some(start) = move_state.start_event.as_ref() else {
            return;
        };
        let vx = self.horizontal_tracker.compute_velocity();
        let vy = self.vertical_tracker.compute_velocity();
        let mut velocity = Vector::new(-vx, -vy);
        if velocity.length() < SCROLL_VELOCITY_THRESHOLD {
            velocity = Vector::ZERO;
        }
        if let Some(listener) = self.listener.as_mut() {
            listener(
                state,
                MoveEvent {
                    location: event.location,
                    offset: event.location_in_window - start.location_in_window,
                    velocity,
                    time: event.time,
                    pointer_count: event.pointer_count,
                },
            );
        }
    }
}

impl MoveHooks for ScrollData {
    fn should_start_move(&self, move_state: &MoveGestureState, event: &TouchEvent) -> bool {
        if self.animating_scroll {
            return true;
        }
        let start = move_state.start_event.as_ref().unwrap_or(event);
        let dx = (event.location_in_window.x - start.location_in_window.x).abs();
        let dy = (event.location_in_window.y - start.location_in_window.y).abs();
        let distance = start.location_in_window.distance_to(event.location_in_window);
        let dominant_is_horizontal = dx >= dy;
        distance >= self.drag_touch_slop && dominant_is_horizontal == self.is_horizontal
    }

    fn should_continue_move(&self, move_state: &MoveGestureState, event: &TouchEvent) -> bool {
        let expected = move_state
            .start_event
            .as_ref()
            .map(|e| e.pointer_count)
            .unwrap_or(event.pointer_count);
        event.pointer_count == expected
    }

    fn did_start_move(&mut self, move_state: &MoveGestureState, event: &TouchEvent) {
        self.horizontal_tracker.clear();
        self.vertical_tracker.clear();
        self.sample(event);
        self.emit(move_state, event, RecognizerState::Began);
        self.emitted_this_cycle = true;
    }

    fn did_continue_move(&mut self, move_state: &MoveGestureState, event: &TouchEvent) {
        self.sample(event);
        self.emit(move_state, event, RecognizerState::Changed);
        self.emitted_this_cycle = true;
    }

    fn on_pointer_change(
        &mut self,
        move_state: &mut MoveGestureState,
        state: &mut RecognizerState,
        event: &TouchEvent,
    ) {
        *state = RecognizerState::Changed;
        self.sample(event);
        self.emit(move_state, event, RecognizerState::Changed);
        self.emitted_this_cycle = true;
    }

    fn on_end(&mut self, move_state: &MoveGestureState, event: &TouchEvent) {
        self.emit(move_state, event, RecognizerState::Ended);
        self.emitted_this_cycle = true;
    }
}

// --- Pinch ---------------------------------------------------------------

pub struct PinchData {
    net_scale: Scalar,
    move_state: MoveGestureState,
    emitted_this_cycle: bool,
    pub listener: Option<PinchListener>,
}

impl PinchData {
    pub fn new() -> Self {
        Self {
            net_scale: 1.0,
            move_state: MoveGestureState::default(),
            emitted_this_cycle: false,
            listener: None,
        }
    }

    fn current_scale(&self, move_state: &MoveGestureState, event: &TouchEvent) -> Scalar {
        let start_len = move_state
            .start_event
            .as_ref()
            .map(|e| e.direction.length())
            .unwrap_or(0.0);
        if event.pointer_count >= 2 && start_len > 0.0 {
            (event.direction.length() / start_len) * self.net_scale
        } else {
            self.net_scale
        }
    }

    fn emit(&mut self, move_state: &MoveGestureState, event: &TouchEvent, state: RecognizerState) {
        let scale = self.current_scale(move_state, event);
        if let Some(listener) = self.listener.as_mut() {
            let start = move_state.start_event.as_ref().unwrap_or(event);
            let last = move_state.current_event.as_ref().unwrap_or(event);
            listener(
                state,
                PinchEvent {
                    base: make_move_event(start, last, event),
                    scale,
                },
            );
        }
    }

    pub fn reset(&mut self) {
        self.net_scale = 1.0;
    }
}

impl Default for PinchData {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveHooks for PinchData {
    fn should_start_move(&self, _move_state: &MoveGestureState, event: &TouchEvent) -> bool {
        event.pointer_count > 1
    }

    fn should_continue_move(&self, _move_state: &MoveGestureState, event: &TouchEvent) -> bool {
        event.pointer_count > 0
    }

    fn did_start_move(&mut self, move_state: &MoveGestureState, event: &TouchEvent) {
        self.emit(move_state, event, RecognizerState::Began);
        self.emitted_this_cycle = true;
    }

    fn did_continue_move(&mut self, move_state: &MoveGestureState, event: &TouchEvent) {
        self.emit(move_state, event, RecognizerState::Changed);
        self.emitted_this_cycle = true;
    }

    fn on_pointer_change(
        &mut self,
        move_state: &mut MoveGestureState,
        state: &mut RecognizerState,
        event: &TouchEvent,
    ) {
        let prior_count = move_state
            .current_event
            .as_ref()
            .map(|e| e.pointer_count)
            .unwrap_or(event.pointer_count);

        if prior_count >= 2 && event.pointer_count < 2 {
            self.net_scale = self.current_scale(move_state, move_state.current_event.as_ref().unwrap());
        } else if prior_count < 2 && event.pointer_count >= 2 {
            move_state.start_event = Some(event.clone());
        }

        *state = RecognizerState::Changed;
        self.emit(move_state, event, RecognizerState::Changed);
        self.emitted_this_cycle = true;
    }

    fn on_end(&mut self, move_state: &MoveGestureState, event: &TouchEvent) {
        self.emit(move_state, event, RecognizerState::Ended);
        self.emitted_this_cycle = true;
    }
}

// --- Rotate ---------------------------------------------------------------

pub struct RotateData {
    net_rotation: Scalar,
    move_state: MoveGestureState,
    emitted_this_cycle: bool,
    pub listener: Option<RotateListener>,
}

impl RotateData {
    pub fn new() -> Self {
        Self {
            net_rotation: 0.0,
            move_state: MoveGestureState::default(),
            emitted_this_cycle: false,
            listener: None,
        }
    }

    fn angle_of(direction: Vector) -> Scalar {
        -direction.dx.atan2(direction.dy)
    }

    fn current_rotation(&self, move_state: &MoveGestureState, event: &TouchEvent) -> Scalar {
        if event.pointer_count >= 2 {
            if let Some(start) = move_state.start_event.as_ref() {
                let start_angle = Self::angle_of(start.direction);
                let current_angle = Self::angle_of(event.direction);
                return (current_angle - start_angle) + self.net_rotation;
            }
        }
        self.net_rotation
    }

    fn emit(&mut self, move_state: &MoveGestureState, event: &TouchEvent, state: RecognizerState) {
        let rotation = self.current_rotation(move_state, event);
        if let Some(listener) = self.listener.as_mut() {
            let start = move_state.start_event.as_ref().unwrap_or(event);
            let last = move_state.current_event.as_ref().unwrap_or(event);
            listener(
                state,
                RotateEvent {
                    base: make_move_event(start, last, event),
                    rotation,
                },
            );
        }
    }

    pub fn reset(&mut self) {
        self.net_rotation = 0.0;
    }
}

impl Default for RotateData {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveHooks for RotateData {
    fn should_start_move(&self, _move_state: &MoveGestureState, event: &TouchEvent) -> bool {
        event.pointer_count > 1
    }

    fn should_continue_move(&self, _move_state: &MoveGestureState, event: &TouchEvent) -> bool {
        event.pointer_count > 0
    }

    fn did_start_move(&mut self, move_state: &MoveGestureState, event: &TouchEvent) {
        self.emit(move_state, event, RecognizerState::Began);
        self.emitted_this_cycle = true;
    }

    fn did_continue_move(&mut self, move_state: &MoveGestureState, event: &TouchEvent) {
        self.emit(move_state, event, RecognizerState::Changed);
        self.emitted_this_cycle = true;
    }

    fn on_pointer_change(
        &mut self,
        move_state: &mut MoveGestureState,
        state: &mut RecognizerState,
        event: &TouchEvent,
    ) {
        let prior_count = move_state
            .current_event
            .as_ref()
            .map(|e| e.pointer_count)
            .unwrap_or(event.pointer_count);

        if prior_count >= 2 && event.pointer_count < 2 {
            self.net_rotation = self.current_rotation(move_state, move_state.current_event.as_ref().unwrap());
        } else if prior_count < 2 && event.pointer_count >= 2 {
            move_state.start_event = Some(event.clone());
        }

        *state = RecognizerState::Changed;
        self.emit(move_state, event, RecognizerState::Changed);
        self.emitted_this_cycle = true;
    }

    fn on_end(&mut self, move_state: &MoveGestureState, event: &TouchEvent) {
        self.emit(move_state, event, RecognizerState::Ended);
        self.emitted_this_cycle = true;
    }
}

// --- Wheel ---------------------------------------------------------------

pub struct WheelData {
    pub listener: Option<WheelListener>,
}

impl WheelData {
    pub fn new() -> Self {
        Self { listener: None }
    }
}

impl Default for WheelData {
    fn default() -> Self {
        Self::new()
    }
}

fn wheel_on_update(state: &mut RecognizerState, event: &TouchEvent) {
    *state = match event.event_type {
        TouchEventType::Wheel => RecognizerState::Began,
        _ => RecognizerState::Failed,
    };
}

// ---------------------------------------------------------------------
// The recognizer itself
// ---------------------------------------------------------------------

pub enum RecognizerKind {
    Tap(TapData),
    LongPress(LongPressData),
    Touch(TouchData),
    Drag(DragData),
    Scroll(ScrollData),
    Pinch(PinchData),
    Rotate(RotateData),
    Wheel(WheelData),
}

/// A gesture recognizer: the common state-machine fields plus a
/// subtype-carrying variant. See module docs for the rationale.
pub struct Recognizer {
    layer: Option<WeakLayer>,
    last_event: Option<TouchEvent>,
    was_processed: bool,
    pub should_cancel_other_gestures_on_start: bool,
    pub should_process_before_other_gestures: bool,
    state: RecognizerState,
    should_begin_listener: Option<ShouldBeginListener>,
    kind: RecognizerKind,
}

impl Recognizer {
    pub fn new(kind: RecognizerKind) -> Self {
        Self {
            layer: None,
            last_event: None,
            was_processed: false,
            should_cancel_other_gestures_on_start: false,
            should_process_before_other_gestures: false,
            state: RecognizerState::Possible,
            should_begin_listener: None,
            kind,
        }
    }

    pub fn state(&self) -> RecognizerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn last_event(&self) -> Option<&TouchEvent> {
        self.last_event.as_ref()
    }

    pub fn was_processed(&self) -> bool {
        self.was_processed
    }

    pub fn set_layer(&mut self, layer: Option<WeakLayer>) {
        self.layer = layer;
    }

    pub fn layer(&self) -> Option<Layer> {
        self.layer.as_ref().and_then(Layer::upgrade)
    }

    pub fn set_should_begin_listener(&mut self, listener: Option<ShouldBeginListener>) {
        self.should_begin_listener = listener;
    }

    pub fn kind(&self) -> &RecognizerKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut RecognizerKind {
        &mut self.kind
    }

    pub fn kind_tag(&self) -> RecognizerKindTag {
        match &self.kind {
            RecognizerKind::Tap(_) => RecognizerKindTag::Tap,
            RecognizerKind::LongPress(_) => RecognizerKindTag::LongPress,
            RecognizerKind::Touch(_) => RecognizerKindTag::Touch,
            RecognizerKind::Drag(_) => RecognizerKindTag::Drag,
            RecognizerKind::Scroll(_) => RecognizerKindTag::Scroll,
            RecognizerKind::Pinch(_) => RecognizerKindTag::Pinch,
            RecognizerKind::Rotate(_) => RecognizerKindTag::Rotate,
            RecognizerKind::Wheel(_) => RecognizerKindTag::Wheel,
        }
    }

    /// Name used by `debugGestures` tracing. The wheel variant returns
    /// `"drag"`: a naming quirk carried over from an earlier revision that
    /// explicitly declines to fix (see `DESIGN.md`).
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            RecognizerKind::Tap(_) => "tap",
            RecognizerKind::LongPress(_) => "longPress",
            RecognizerKind::Touch(_) => "touch",
            RecognizerKind::Drag(_) => "drag",
            RecognizerKind::Scroll(_) => "scroll",
            RecognizerKind::Pinch(_) => "pinch",
            RecognizerKind::Rotate(_) => "rotate",
            RecognizerKind::Wheel(_) => "drag",
        }
    }

    pub fn to_debug_string(&self) -> String {
        format!("{}[{:?}]", self.type_name(), self.state)
    }

    fn should_begin(&mut self) -> bool {
        match self.should_begin_listener.as_mut() {
            Some(listener) => listener(),
            None => true,
        }
    }

    /// Advances the state machine for a single dispatched event, already
    /// localized into this recognizer's layer coordinate space.
    pub fn update(&mut self, event: &TouchEvent) {
        if self.state == RecognizerState::Began {
            self.transition_to_state(RecognizerState::Changed);
        }
        let state_before_update = self.state;

        match &mut self.kind {
            RecognizerKind::Tap(data) => tap_on_update(data, &mut self.state, event),
            RecognizerKind::LongPress(data) => long_press_on_update(data, &mut self.state, event),
            RecognizerKind::Touch(data) => touch_on_update(data, &mut self.state, event),
            RecognizerKind::Drag(data) => {
                let mut move_state = std::mem::take(&mut data.move_state);
                move_update(data, &mut move_state, &mut self.state, event);
                data.move_state = move_state;
            }
            RecognizerKind::Scroll(data) => {
                let mut move_state = std::mem::take(&mut data.move_state);
                move_update(data, &mut move_state, &mut self.state, event);
                data.move_state = move_state;
            }
            RecognizerKind::Pinch(data) => {
                let mut move_state = std::mem::take(&mut data.move_state);
                move_update(data, &mut move_state, &mut self.state, event);
                data.move_state = move_state;
            }
            RecognizerKind::Rotate(data) => {
                let mut move_state = std::mem::take(&mut data.move_state);
                move_update(data, &mut move_state, &mut self.state, event);
                data.move_state = move_state;
            }
            RecognizerKind::Wheel(_) => wheel_on_update(&mut self.state, event),
        }

        if self.state.is_active() {
            self.last_event = Some(event.clone());
        }

        if state_before_update == RecognizerState::Possible && self.state.is_active() && !self.should_begin() {
            self.state = RecognizerState::Failed;
        }
    }

    /// Called by the dispatcher's start-resolution once a recognizer is
    /// allowed to begin. Tap has no "changed" phase: it jumps straight to
    /// `Ended` so a single `process()` call delivers the whole gesture.
    pub fn on_started(&mut self) {
        if let RecognizerKind::Tap(_) = &self.kind {
            self.state = RecognizerState::Ended;
        }
    }

    pub fn process(&mut self) {
        self.was_processed = true;
        let state = self.state;
        match &mut self.kind {
            RecognizerKind::Tap(data) => {
                if let (Some(listener), Some(event)) = (data.listener.as_mut(), self.last_event.as_ref()) {
                    listener(state, event.location);
                }
            }
            RecognizerKind::LongPress(data) => {
                if let (Some(listener), Some(event)) = (data.listener.as_mut(), self.last_event.as_ref()) {
                    listener(state, event.location);
                }
            }
            RecognizerKind::Touch(data) => {
                if let Some(event) = self.last_event.as_ref() {
                    if state == RecognizerState::Began {
                        if let Some(cb) = data.on_start.as_mut() {
                            cb(event.location);
                        }
                    }
                    if state == RecognizerState::Ended {
                        if let Some(cb) = data.on_end.as_mut() {
                            cb(event.location);
                        }
                    }
                    if event.event_type != TouchEventType::Idle {
                        if let Some(cb) = data.on_touch.as_mut() {
                            cb(event.location);
                        }
                    }
                }
            }
            // The hooks driven from `update` (`did_start_move`, `did_continue_move`,
            // `on_pointer_change`, `on_end`) already deliver the listener callback
            // for whatever event this cycle is processing, before `process` ever
            // runs. So `process` only has work left to do when no hook fired this
            // cycle — that only happens for a synthetic `Ended` delivered via
            // `cancel`, which sets the state and calls `process` directly.
            RecognizerKind::Drag(data) => {
                if data.emitted_this_cycle {
                    data.emitted_this_cycle = false;
                } else if let Some(event) = self.last_event.clone() {
                    emit_drag_like(&mut data.listener, &data.move_state, &event, state);
                }
            }
            RecognizerKind::Scroll(data) => {
                if data.emitted_this_cycle {
                    data.emitted_this_cycle = false;
                } else if let Some(event) = self.last_event.clone() {
                    let move_state = data.move_state.clone();
                    data.emit(&move_state, &event, state);
                }
            }
            RecognizerKind::Pinch(data) => {
                if data.emitted_this_cycle {
                    data.emitted_this_cycle = false;
                } else if let Some(event) = self.last_event.clone() {
                    let move_state = data.move_state.clone();
                    data.emit(&move_state, &event, state);
                }
            }
            RecognizerKind::Rotate(data) => {
                if data.emitted_this_cycle {
                    data.emitted_this_cycle = false;
                } else if let Some(event) = self.last_event.clone() {
                    let move_state = data.move_state.clone();
                    data.emit(&move_state, &event, state);
                }
            }
            RecognizerKind::Wheel(data) => {
                if let (Some(listener), Some(event)) = (data.listener.as_mut(), self.last_event.as_ref()) {
                    listener(event.location, event.direction);
                }
                self.state = RecognizerState::Ended;
            }
        }
    }

    pub fn transition_to_state(&mut self, state: RecognizerState) {
        self.state = state;
    }

    /// Emits a synthetic `Ended` (if the recognizer had already been
    /// processed and hadn't reached `Ended`), then fully resets.
    pub fn cancel(&mut self) {
        if self.was_processed && self.state != RecognizerState::Ended {
            self.state = RecognizerState::Ended;
            self.process();
        }
        self.was_processed = false;
        self.state = RecognizerState::Possible;
        self.last_event = None;
        self.on_reset();
    }

    fn on_reset(&mut self) {
        match &mut self.kind {
            RecognizerKind::LongPress(data) => data.start_event = None,
            RecognizerKind::Touch(data) => data.start_event = None,
            RecognizerKind::Drag(data) => {
                data.move_state = MoveGestureState::default();
                data.emitted_this_cycle = false;
            }
            RecognizerKind::Scroll(data) => {
                data.move_state = MoveGestureState::default();
                data.horizontal_tracker.clear();
                data.vertical_tracker.clear();
                data.emitted_this_cycle = false;
            }
            RecognizerKind::Pinch(data) => {
                data.move_state = MoveGestureState::default();
                data.reset();
                data.emitted_this_cycle = false;
            }
            RecognizerKind::Rotate(data) => {
                data.move_state = MoveGestureState::default();
                data.reset();
                data.emitted_this_cycle = false;
            }
            RecognizerKind::Tap(data) => data.events.clear(),
            RecognizerKind::Wheel(_) => {}
        }
    }

    /// Two recognizers are compatible (may both start) iff
    /// either side's `can_recognize_simultaneously` returns true.
    pub fn is_compatible_with(&self, other: &Recognizer) -> bool {
        self.can_recognize_simultaneously(other) || other.can_recognize_simultaneously(self)
    }

    pub fn requires_failure_of(&self, other: &Recognizer) -> bool {
        match &self.kind {
            RecognizerKind::Tap(_) => matches!(other.kind, RecognizerKind::Tap(_)),
            RecognizerKind::Drag(_) => matches!(other.kind, RecognizerKind::Drag(_)),
            RecognizerKind::Pinch(_) => matches!(other.kind, RecognizerKind::Pinch(_)),
            RecognizerKind::Rotate(_) => matches!(other.kind, RecognizerKind::Rotate(_)),
            _ => false,
        }
    }

    pub fn can_recognize_simultaneously(&self, other: &Recognizer) -> bool {
        match &self.kind {
            RecognizerKind::Touch(_) => true,
            RecognizerKind::Wheel(_) => true,
            RecognizerKind::Drag(_) => {
                matches!(other.kind, RecognizerKind::Pinch(_) | RecognizerKind::Rotate(_))
            }
            RecognizerKind::Pinch(_) => {
                matches!(other.kind, RecognizerKind::Drag(_) | RecognizerKind::Rotate(_))
            }
            RecognizerKind::Rotate(_) => {
                matches!(other.kind, RecognizerKind::Drag(_) | RecognizerKind::Pinch(_))
            }
            _ => false,
        }
    }
}

impl Default for MoveGestureState {
    fn default() -> Self {
        Self {
            start_event: None,
            last_event: None,
            current_event: None,
        }
    }
}

#[cfg(test)]
#[path = "tests/recognizer_tests.rs"]
mod tests;
