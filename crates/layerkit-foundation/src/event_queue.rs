//! Time-ordered deferred callback dispatch with id-based cancellation that
//! is safe to call from inside a callback currently being flushed.

use crate::time::{Duration, TimePoint};
use std::cell::{Cell, RefCell};
use std::fmt;

/// Opaque handle returned by `enqueue`, usable with `cancel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(u32);

/// A callback scheduled for later delivery.
pub type EventCallback = Box<dyn FnOnce()>;

/// Raised when the monotonically increasing id counter wraps around. This
/// should never happen in practice (u32::MAX enqueues within one root's
/// lifetime) but the source treats it as a logic error rather than silently
/// reusing ids, so this crate surfaces it the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventQueueError;

impl fmt::Display for EventQueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event queue id sequence exhausted")
    }
}

impl std::error::Error for EventQueueError {}

struct PendingEvent {
    id: EventId,
    due: TimePoint,
    sequence: u32,
    callback: EventCallback,
}

/// A sorted set of not-yet-due callbacks plus a FIFO of callbacks currently
/// being flushed.
///
/// Every field is independently interior-mutable rather than the whole
/// struct sitting behind one outer lock. That is deliberate: a callback
/// invoked from `flush` runs with no borrow of `EventQueue` held across the
/// call, so it can turn around and call `enqueue`/`cancel` on this very
/// queue (to schedule a follow-up, or cancel a sibling still waiting in the
/// processing FIFO) without either panicking on a re-borrow or having its
/// mutation silently discarded once `flush` returns. `cancel` searches
/// `pending` first, then `processing`, so a callback can cancel a peer
/// that hasn't run yet without a race against the drain that moved it there.
pub struct EventQueue {
    pending: RefCell<Vec<PendingEvent>>,
    processing: RefCell<Vec<PendingEvent>>,
    last_time: Cell<TimePoint>,
    next_id: Cell<u32>,
    sequence: Cell<u32>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(TimePoint::default())
    }
}

impl EventQueue {
    pub fn new(initial_time: TimePoint) -> Self {
        Self {
            pending: RefCell::new(Vec::new()),
            processing: RefCell::new(Vec::new()),
            last_time: Cell::new(initial_time),
            next_id: Cell::new(0),
            sequence: Cell::new(0),
        }
    }

    fn allocate_id(&self) -> Result<EventId, EventQueueError> {
        let next = self.next_id.get();
        if next == u32::MAX {
            return Err(EventQueueError);
        }
        self.next_id.set(next + 1);
        Ok(EventId(next))
    }

    /// Schedules `callback` to run at `last_time + after`.
    pub fn enqueue(&self, after: Duration, callback: EventCallback) -> Result<EventId, EventQueueError> {
        self.enqueue_at(self.last_time.get() + after, callback)
    }

    /// Schedules `callback` to run at `due`. If `due` is already in the
    /// past relative to `last_time`, the callback still runs on the *next*
    /// `flush`, never synchronously from this call.
    pub fn enqueue_at(&self, due: TimePoint, callback: EventCallback) -> Result<EventId, EventQueueError> {
        let id = self.allocate_id()?;
        let sequence = self.sequence.get();
        self.sequence.set(sequence.wrapping_add(1));
        self.insert_sorted(PendingEvent {
            id,
            due,
            sequence,
            callback,
        });
        Ok(id)
    }

    fn insert_sorted(&self, event: PendingEvent) {
        let mut pending = self.pending.borrow_mut();
        let pos = pending.partition_point(|e| (e.due, e.sequence) <= (event.due, event.sequence));
        pending.insert(pos, event);
    }

    /// Removes a pending or in-flight event by id. Returns `true` if found.
    pub fn cancel(&self, id: EventId) -> bool {
        if let Some(pos) = self.pending.borrow().iter().position(|e| e.id == id) {
            self.pending.borrow_mut().remove(pos);
            return true;
        }
        if let Some(pos) = self.processing.borrow().iter().position(|e| e.id == id) {
            self.processing.borrow_mut().remove(pos);
            return true;
        }
        false
    }

    /// Moves every event due at or before `now` into the processing FIFO (in
    /// due-time order, ties broken by insertion order), then invokes each in
    /// turn. `last_time` advances to `now` once flushing completes.
    ///
    /// No borrow of `self.pending`/`self.processing` is held while a
    /// callback runs: each iteration borrows just long enough to pop the
    /// next due callback off the front, drops that borrow, then calls it.
    pub fn flush(&self, now: TimePoint) {
        {
            let mut pending = self.pending.borrow_mut();
            let split = pending.partition_point(|e| e.due <= now);
            let due: Vec<PendingEvent> = pending.drain(..split).collect();
            self.processing.borrow_mut().extend(due);
        }

        loop {
            let next = {
                let mut processing = self.processing.borrow_mut();
                if processing.is_empty() {
                    break;
                }
                processing.remove(0)
            };
            (next.callback)();
        }

        self.last_time.set(now);
    }

    pub fn clear(&self) {
        self.pending.borrow_mut().clear();
        self.processing.borrow_mut().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty() && self.processing.borrow().is_empty()
    }

    pub fn last_time(&self) -> TimePoint {
        self.last_time.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn t(seconds: f64) -> TimePoint {
        TimePoint::from_seconds(seconds)
    }

    #[test]
    fn flush_runs_due_events_in_time_order_regardless_of_insertion_order() {
        let q = EventQueue::new(t(0.0));
        let log = Rc::new(RefCell::new(Vec::new()));

        let log2 = log.clone();
        q.enqueue_at(t(2.0), Box::new(move || log2.borrow_mut().push(2)))
            .unwrap();
        let log3 = log.clone();
        q.enqueue_at(t(1.0), Box::new(move || log3.borrow_mut().push(1)))
            .unwrap();

        q.flush(t(5.0));
        assert_eq!(*log.borrow(), vec![1, 2]);
    }

    #[test]
    fn equal_due_times_run_in_insertion_order() {
        let q = EventQueue::new(t(0.0));
        let log = Rc::new(RefCell::new(Vec::new()));

        for i in 0..3 {
            let log = log.clone();
            q.enqueue_at(t(1.0), Box::new(move || log.borrow_mut().push(i)))
                .unwrap();
        }

        q.flush(t(1.0));
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn cancel_removes_pending_event() {
        let q = EventQueue::new(t(0.0));
        let ran = Rc::new(RefCell::new(false));
        let ran2 = ran.clone();
        let id = q
            .enqueue_at(t(1.0), Box::new(move || *ran2.borrow_mut() = true))
            .unwrap();

        assert!(q.cancel(id));
        q.flush(t(2.0));
        assert!(!*ran.borrow());
    }

    #[test]
    fn callback_cancels_a_sibling_still_waiting_in_the_processing_fifo() {
        // Both due at the same time; `a` runs first (earlier sequence) and,
        // from inside its own callback, cancels `b` before `b` gets a
        // chance to run. This only works if `cancel` can reach `b` while it
        // is sitting in the processing FIFO and `flush` isn't holding an
        // exclusive borrow across the callback invocation.
        let q = Rc::new(EventQueue::new(t(0.0)));
        let ran_b = Rc::new(RefCell::new(false));

        let b_id = Rc::new(RefCell::new(None::<EventId>));

        let q_for_a = q.clone();
        let b_id_for_a = b_id.clone();
        q.enqueue_at(
            t(1.0),
            Box::new(move || {
                let id = b_id_for_a.borrow().expect("b enqueued before flush");
                q_for_a.cancel(id);
            }),
        )
        .unwrap();

        let ran_b_for_b = ran_b.clone();
        let id_b = q
            .enqueue_at(t(1.0), Box::new(move || *ran_b_for_b.borrow_mut() = true))
            .unwrap();
        *b_id.borrow_mut() = Some(id_b);

        q.flush(t(1.0));
        assert!(!*ran_b.borrow());
    }

    #[test]
    fn callback_enqueuing_a_followup_is_not_lost() {
        let q = Rc::new(EventQueue::new(t(0.0)));
        let followup_ran = Rc::new(RefCell::new(false));

        let q_for_cb = q.clone();
        let followup_for_cb = followup_ran.clone();
        q.enqueue_at(
            t(1.0),
            Box::new(move || {
                q_for_cb
                    .enqueue_at(t(1.0), Box::new(move || *followup_for_cb.borrow_mut() = true))
                    .unwrap();
            }),
        )
        .unwrap();

        q.flush(t(1.0));
        // Due immediately, but scheduled mid-flush: must not run until the
        // *next* flush.
        assert!(!*followup_ran.borrow());

        q.flush(t(2.0));
        assert!(*followup_ran.borrow());
    }

    #[test]
    fn enqueue_due_in_the_past_runs_on_next_flush_not_synchronously() {
        let q = EventQueue::new(t(5.0));
        let ran = Rc::new(RefCell::new(false));
        let ran2 = ran.clone();
        q.enqueue_at(t(0.0), Box::new(move || *ran2.borrow_mut() = true))
            .unwrap();
        // Enqueuing never runs synchronously.
        assert!(!*ran.borrow());
        q.flush(t(5.0));
        assert!(*ran.borrow());
    }

    #[test]
    fn clear_drops_pending_and_processing() {
        let q = EventQueue::new(t(0.0));
        q.enqueue_at(t(1.0), Box::new(|| {})).unwrap();
        q.clear();
        assert!(q.is_empty());
    }
}
