//! The frame loop: owns the content layer tree, the touch dispatcher and
//! the deferred-event queue, and is the sole implementor of `LayerHost`.

use crate::boundary::{Compositor, CompositorPlaneList, DisplayList, DrawMetrics, DrawableSurfaceCanvas, SinglePlaneCompositor};
use crate::dispatcher::{GestureTypes, TouchDispatcher};
use crate::error::DispatchError;
use crate::layer::{Layer, LayerHost};
use crate::touch_event::{TouchEvent, TouchEventType};
use layerkit_foundation::{
    Clock, Duration, EventCallback, EventId, EventQueue, EventQueueError, GesturesConfiguration, Rect, Scalar, Size,
    TimePoint,
};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// The minimum elapsed time since the dispatcher's last event before
/// `refresh_touches` will synthesize another one (`TOUCH_REFRESH_MS`).
const TOUCH_REFRESH_MS: f64 = 10.0;

/// How the content layer's frame tracks the root's own size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentLayerSizingMode {
    /// The content layer is sized to `size_that_fits(root_size)`.
    MinSize,
    /// The content layer always exactly fills the root.
    MatchSize,
}

/// Shared, host-supplied tuning: gesture thresholds, the device scale used
/// when rasterizing, and the wall-clock source for the frame-slowness
/// diagnostic (kept separate from the simulated frame timeline so tests can
/// drive one without perturbing the other).
pub struct RootResources {
    pub gestures_configuration: GesturesConfiguration,
    pub initial_scale: Scalar,
    pub clock: Rc<dyn Clock>,
}

/// Notified of the two events a host's frame loop cares about: that there is
/// work pending and a `process_frame` should be scheduled, and that a frame
/// was actually drawn and can be submitted to a renderer.
pub trait LayerRootListener {
    fn needs_process_frame(&mut self);
    fn on_did_draw(&mut self, root: &LayerRoot, display_list: &DisplayList, planes: &CompositorPlaneList);
}

struct LayerRootInner {
    content_layer: Layer,
    resources: RootResources,
    dispatcher: TouchDispatcher,
    /// Kept as its own `Rc` (rather than a bare field) so `process_frame` can
    /// clone a handle to it, drop its borrow of `LayerRootInner`, and flush
    /// it without holding any lock across the callbacks it runs. Those
    /// callbacks can then freely call back into `enqueue_event`/`cancel_event`
    /// (or anything else on `self`) without a re-borrow panic, and a
    /// callback enqueuing a follow-up during its own flush lands on the
    /// same live queue instead of a swapped-out placeholder.
    event_queue: Rc<EventQueue>,
    listener: Option<Box<dyn LayerRootListener>>,
    next_layer_id: u64,
    size: Size,
    scale: Scalar,
    sizing_mode: ContentLayerSizingMode,
    initial_absolute_frame_time: Option<TimePoint>,
    last_absolute_frame_time: Option<TimePoint>,
    is_dispatching: bool,
    destroyed: bool,
    needs_layout: bool,
    needs_display: bool,
    did_enqueue_frame: bool,
    processing_frame: bool,
    last_drawn_frame: Option<DisplayList>,
    compositor: Box<dyn Compositor>,
}

/// Implements the frame-request gate: only the
/// transition from "nothing pending" to "something pending" notifies the
/// host, and never while a frame is already enqueued, already being
/// processed, or after the root is destroyed.
fn enqueue_frame_on(inner_cell: &RefCell<LayerRootInner>) {
    let should_notify = {
        let mut inner = inner_cell.borrow_mut();
        if inner.did_enqueue_frame || inner.processing_frame || inner.destroyed {
            false
        } else {
            inner.did_enqueue_frame = true;
            true
        }
    };
    if should_notify {
        if let Some(listener) = inner_cell.borrow_mut().listener.as_mut() {
            listener.needs_process_frame();
        }
    }
}

impl LayerHost for RefCell<LayerRootInner> {
    fn request_layout(&self) {
        self.borrow_mut().needs_layout = true;
        enqueue_frame_on(self);
    }

    fn set_child_needs_display(&self) {
        self.borrow_mut().needs_display = true;
        enqueue_frame_on(self);
    }

    fn request_focus(&self) {
        log::trace!("layer requested focus; this host has no platform focus integration");
    }

    fn allocate_layer_id(&self) -> u64 {
        let mut inner = self.borrow_mut();
        let id = inner.next_layer_id;
        inner.next_layer_id += 1;
        id
    }
}

/// The retained-tree root: a cheaply cloneable handle shared between a host
/// application and whatever drives its frame loop.
#[derive(Clone)]
pub struct LayerRoot(Rc<RefCell<LayerRootInner>>);

impl LayerRoot {
    pub fn new(resources: RootResources) -> Self {
        let scale = resources.initial_scale;
        let inner = Rc::new(RefCell::new(LayerRootInner {
            content_layer: Layer::new(),
            resources,
            dispatcher: TouchDispatcher::new(),
            event_queue: Rc::new(EventQueue::default()),
            listener: None,
            next_layer_id: 1,
            size: Size::make_empty(),
            scale,
            sizing_mode: ContentLayerSizingMode::MatchSize,
            initial_absolute_frame_time: None,
            last_absolute_frame_time: None,
            is_dispatching: false,
            destroyed: false,
            needs_layout: true,
            needs_display: true,
            did_enqueue_frame: false,
            processing_frame: false,
            last_drawn_frame: None,
            compositor: Box::new(SinglePlaneCompositor),
        }));

        let content_layer = inner.borrow().content_layer.clone();
        let weak_host: Weak<dyn LayerHost> = Rc::downgrade(&inner);
        content_layer.set_host(Some(weak_host));

        LayerRoot(inner)
    }

    pub fn content_layer(&self) -> Layer {
        self.0.borrow().content_layer.clone()
    }

    pub fn set_listener(&self, listener: Option<Box<dyn LayerRootListener>>) {
        self.0.borrow_mut().listener = listener;
    }

    pub fn set_sizing_mode(&self, mode: ContentLayerSizingMode) {
        self.0.borrow_mut().sizing_mode = mode;
        self.apply_sizing();
    }

    pub fn size(&self) -> Size {
        self.0.borrow().size
    }

    pub fn scale(&self) -> Scalar {
        self.0.borrow().scale
    }

    /// Updates the root's size and device scale. A size change marks layout
    /// dirty; a scale change marks display dirty. Either one calls
    /// the frame-request gate, and `layout_if_needed` runs
    /// synchronously before this returns.
    pub fn set_size(&self, size: Size, scale: Scalar) {
        let mut changed = false;
        {
            let mut inner = self.0.borrow_mut();
            if inner.size != size {
                inner.size = size;
                inner.needs_layout = true;
                changed = true;
            }
            if inner.scale != scale {
                inner.scale = scale;
                inner.needs_display = true;
                changed = true;
            }
        }
        self.apply_sizing();
        self.content_layer().layout_if_needed();
        if changed {
            self.enqueue_frame();
        }
    }

    /// Replaces the content layer: cancels every in-flight gesture (they were
    /// captured against the old tree), notifies the old content layer of its
    /// parent loss, adopts the new one, and requests layout and display.
    pub fn set_content_layer(&self, layer: Layer, sizing_mode: ContentLayerSizingMode) {
        let old_content = {
            let mut inner = self.0.borrow_mut();
            inner.dispatcher.cancel_all_gestures();
            let old = inner.content_layer.clone();
            inner.content_layer = layer.clone();
            inner.sizing_mode = sizing_mode;
            inner.needs_display = true;
            inner.needs_layout = true;
            old
        };
        old_content.on_parent_changed(None);

        let weak_host: Weak<dyn LayerHost> = Rc::downgrade(&self.0);
        layer.set_host(Some(weak_host));

        self.apply_sizing();
        self.enqueue_frame();
    }

    fn apply_sizing(&self) {
        let (content_layer, size, mode) = {
            let inner = self.0.borrow();
            (inner.content_layer.clone(), inner.size, inner.sizing_mode)
        };
        let frame = match mode {
            ContentLayerSizingMode::MatchSize => Rect::make_xywh(0.0, 0.0, size.width, size.height),
            ContentLayerSizingMode::MinSize => {
                let fit = content_layer.size_that_fits(size);
                Rect::make_xywh(0.0, 0.0, fit.width, fit.height)
            }
        };
        content_layer.set_frame(frame);
    }

    fn enqueue_frame(&self) {
        enqueue_frame_on(&self.0);
    }

    /// Converts a host-supplied absolute time into this root's relative
    /// timeline, latching the first observed absolute time as the origin.
    fn relative_time(&self, absolute_time: TimePoint) -> TimePoint {
        let mut inner = self.0.borrow_mut();
        let origin = *inner.initial_absolute_frame_time.get_or_insert(absolute_time);
        TimePoint::from_seconds((absolute_time - origin).seconds())
    }

    /// Runs one full frame: layout (if dirty), touch refresh,
    /// deferred-event flush, draw (if dirty), then re-enqueues itself if
    /// there's still work pending. Logs via `log::warn!` if the whole pass
    /// takes 100ms or more, measured on the host's real wall clock
    /// (`RootResources::clock`), independent of the simulated frame timeline
    /// `absolute_time` drives.
    pub fn process_frame(&self, absolute_time: TimePoint) {
        if self.0.borrow().destroyed {
            return;
        }
        self.0.borrow_mut().processing_frame = true;

        let wall_start = self.0.borrow().resources.clock.now();
        let frame_time = self.relative_time(absolute_time);
        self.0.borrow_mut().last_absolute_frame_time = Some(absolute_time);

        if self.0.borrow().needs_layout {
            self.apply_sizing();
            self.content_layer().layout_if_needed();
            self.0.borrow_mut().needs_layout = false;
        }

        let _ = self.refresh_touches(absolute_time);

        let queue = self.0.borrow().event_queue.clone();
        queue.flush(frame_time);

        let drawn = if self.0.borrow().needs_display {
            let (display_list, planes, metrics) = self.draw_frame(absolute_time);
            self.0.borrow_mut().needs_display = false;
            self.0.borrow_mut().last_drawn_frame = Some(display_list.clone());
            if metrics.draw_cache_miss > 0 {
                log::trace!(
                    "process_frame draw: {} of {} visited layers had no cached content",
                    metrics.draw_cache_miss,
                    metrics.visited_layers
                );
            }
            Some((display_list, planes))
        } else {
            None
        };

        self.0.borrow_mut().did_enqueue_frame = false;
        self.0.borrow_mut().processing_frame = false;

        if let Some((display_list, planes)) = drawn {
            let mut listener = self.0.borrow_mut().listener.take();
            if let Some(listener) = listener.as_mut() {
                listener.on_did_draw(self, &display_list, &planes);
            }
            self.0.borrow_mut().listener = listener;
        }

        let elapsed = self.0.borrow().resources.clock.now() - wall_start;
        if elapsed.milliseconds() >= 100 {
            log::warn!("process_frame took {}ms, exceeding the 100ms budget", elapsed.milliseconds());
        }

        if self.needs_process_frame() {
            self.enqueue_frame();
        }
    }

    /// Whether layout, display, a due event, an enqueued-but-unprocessed
    /// frame, or a live gesture is pending — a host should schedule
    /// `process_frame` if this returns true. The full five-term disjunction
    /// below.
    pub fn needs_process_frame(&self) -> bool {
        let inner = self.0.borrow();
        inner.did_enqueue_frame
            || inner.needs_display
            || inner.needs_layout
            || !inner.event_queue.is_empty()
            || !inner.dispatcher.is_empty()
    }

    fn draw_frame(&self, time: TimePoint) -> (DisplayList, CompositorPlaneList, DrawMetrics) {
        let content_layer = self.content_layer();
        let size = self.0.borrow().size;
        let mut display_list = DisplayList::new(size, time);
        let mut metrics = DrawMetrics::default();
        content_layer.draw(&mut display_list, &mut metrics);
        let planes = self.0.borrow_mut().compositor.compose(&display_list);
        (display_list, planes, metrics)
    }

    /// Draws into a host-owned surface using the last frame time recorded by
    /// `process_frame`, scaled by the root's current device scale.
    pub fn draw_in_canvas(&self, canvas: &mut dyn DrawableSurfaceCanvas) {
        let time = self
            .0
            .borrow()
            .last_absolute_frame_time
            .unwrap_or(TimePoint::from_seconds(0.0));
        let (display_list, _planes, metrics) = self.draw_frame(time);
        self.0.borrow_mut().needs_display = false;
        let scale = self.0.borrow().scale;
        canvas.clear();
        canvas.draw_display_list(&display_list, scale, scale);
        if metrics.draw_cache_miss > 0 {
            log::trace!("draw_in_canvas: {} layers had no cached content", metrics.draw_cache_miss);
        }
    }

    /// Routes `event` through the dispatcher. The dispatcher is swapped out
    /// of `LayerRootInner` for the duration of the call (and `is_dispatching`
    /// set) so a recognizer listener that re-enters the root — say, by
    /// reading `content_layer()` and mutating a frame — never collides with
    /// this borrow. If the dispatcher is still non-empty afterward (an
    /// ongoing gesture), a new frame is requested so it keeps getting driven.
    pub fn dispatch_touch_event(&self, event: TouchEvent) -> Result<(), DispatchError> {
        {
            let mut inner = self.0.borrow_mut();
            if inner.destroyed {
                return Err(DispatchError::RootDestroyed);
            }
            if inner.is_dispatching {
                return Err(DispatchError::AlreadyDispatching);
            }
            inner.is_dispatching = true;
        }

        let (root_layer, debug_gestures) = {
            let inner = self.0.borrow();
            (inner.content_layer.clone(), inner.resources.gestures_configuration.debug_gestures)
        };
        if debug_gestures {
            log::debug!(
                "dispatch_touch_event: {:?} at {:?} (source {})",
                event.event_type,
                event.location,
                event.source
            );
        }

        let mut dispatcher = std::mem::take(&mut self.0.borrow_mut().dispatcher);
        dispatcher.dispatch(&root_layer, &event);
        let dispatcher_is_empty = dispatcher.is_empty();

        {
            let mut inner = self.0.borrow_mut();
            inner.dispatcher = dispatcher;
            inner.is_dispatching = false;
        }

        if !dispatcher_is_empty {
            self.enqueue_frame();
        }

        Ok(())
    }

    /// Re-synthesizes the dispatcher's last event as an `Idle` (or `None`,
    /// if the last event wasn't itself an interaction) once at least
    /// `kTouchRefreshMs` has passed since it arrived, without the pointer
    /// itself having moved. Used to let duration-gated recognizers
    /// (long-press, the touch-while-held family) advance even when a host's
    /// frame loop would otherwise only dispatch events on genuine pointer
    /// activity. Returns whether a synthetic event was actually dispatched.
    pub fn refresh_touches(&self, absolute_time: TimePoint) -> Result<bool, DispatchError> {
        let frame_time = self.relative_time(absolute_time);
        let last = {
            let inner = self.0.borrow();
            if inner.dispatcher.is_empty() {
                return Ok(false);
            }
            inner.dispatcher.last_event().cloned()
        };
        let Some(last) = last else {
            return Ok(false);
        };

        let offset = frame_time - last.time;
        if offset < Duration::from_millis(TOUCH_REFRESH_MS) {
            return Ok(false);
        }

        let synthetic_type = if last.event_type.is_interaction() {
            TouchEventType::Idle
        } else {
            TouchEventType::None
        };
        let synthetic = TouchEvent {
            event_type: synthetic_type,
            time: frame_time,
            offset_since_source: last.offset_since_source + offset,
            ..last
        };
        self.dispatch_touch_event(synthetic)?;
        Ok(true)
    }

    /// What gesture kinds a pointer-down at `event`'s location would
    /// currently be captured by, without actually capturing it.
    pub fn gesture_types_for_event(&self, event: &TouchEvent) -> GestureTypes {
        let inner = self.0.borrow();
        inner.dispatcher.gesture_types_for_event(&inner.content_layer, event)
    }

    pub fn enqueue_event(&self, after: Duration, callback: EventCallback) -> Result<EventId, EventQueueError> {
        let queue = self.0.borrow().event_queue.clone();
        let id = queue.enqueue(after, callback)?;
        self.enqueue_frame();
        Ok(id)
    }

    pub fn cancel_event(&self, id: EventId) -> bool {
        let queue = self.0.borrow().event_queue.clone();
        queue.cancel(id)
    }

    /// Tears the root down: cancels every in-flight gesture, drops queued
    /// events, and detaches the listener. Further dispatch calls fail with
    /// `DispatchError::RootDestroyed`.
    pub fn destroy(&self) {
        let mut dispatcher = {
            let mut inner = self.0.borrow_mut();
            inner.destroyed = true;
            std::mem::take(&mut inner.dispatcher)
        };
        dispatcher.cancel_all_gestures();

        let mut inner = self.0.borrow_mut();
        inner.event_queue.clear();
        inner.listener = None;
    }
}

#[cfg(test)]
#[path = "tests/root_tests.rs"]
mod tests;
