//! The touch/gesture arbiter: hit-tests a tree of layers, routes events to
//! the recognizers attached along the hit path, and arbitrates which of the
//! recognizers that want to begin are actually allowed to.

use crate::layer::Layer;
use crate::recognizer::{Recognizer, RecognizerKindTag, RecognizerState};
use crate::touch_event::{TouchEvent, TouchEventType};
use layerkit_foundation::Point;
use rustc_hash::FxHashSet;
use std::cell::RefCell;
use std::rc::Rc;

type RecognizerHandle = Rc<RefCell<Recognizer>>;

fn recognizer_key(recognizer: &RecognizerHandle) -> usize {
    Rc::as_ptr(recognizer) as usize
}

/// What kinds of gesture a pointer-down would currently be captured by,
/// without actually capturing it. Used by hosts deciding whether to let an
/// event fall through to a platform scroll view, for instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GestureTypes {
    pub has_tap: bool,
    pub has_scroll: bool,
    pub has_drag: bool,
}

/// Walks the tree under `root` depth-first, children-first (topmost child
/// visited before its older siblings), and returns every layer whose
/// `hit_test` succeeds for `point_in_root`, nearest-descendant first.
///
/// Siblings occlude one another: once a child's subtree produces a hit, its
/// older siblings at the same level are never tested. A sibling with
/// `touchEnabled = false` fails its own `hit_test` and so is simply skipped,
/// letting the point fall through to whatever is beneath it.
fn hit_test_path(root: &Layer, point_in_root: Point) -> Vec<Layer> {
    let mut hits = Vec::new();
    hit_test_recursive(root, point_in_root, &mut hits);
    hits
}

fn hit_test_recursive(layer: &Layer, point_in_parent: Point, hits: &mut Vec<Layer>) {
    if !layer.hit_test(point_in_parent) {
        return;
    }
    let local = layer.convert_point_from_parent(point_in_parent);
    for child in layer.children().into_iter().rev() {
        let before = hits.len();
        hit_test_recursive(&child, local, hits);
        if hits.len() > before {
            break;
        }
    }
    hits.push(layer.clone());
}

/// Routes events to recognizers and owns the two lists a live pointer
/// sequence needs: `captured` (every recognizer currently in play) and
/// `pending_start` (the subset of those waiting on start-resolution,
/// possibly deferred across more than one dispatch cycle — this is the
/// persistent list, not a per-call scratch value, which is what lets a
/// recognizer requiring another's failure wait out a whole extra tap
/// before winning or losing).
#[derive(Default)]
pub struct TouchDispatcher {
    captured: Vec<RecognizerHandle>,
    pending_start: Vec<RecognizerHandle>,
    last_event: Option<TouchEvent>,
}

impl TouchDispatcher {
    pub fn new() -> Self {
        Self {
            captured: Vec::new(),
            pending_start: Vec::new(),
            last_event: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.captured.is_empty() && self.pending_start.is_empty()
    }

    /// The most recent event this dispatcher was handed, if any. Drives
    /// `LayerRoot::refresh_touches`'s decision of whether there is a live
    /// pointer to re-synthesize and what its last-known timing was.
    pub fn last_event(&self) -> Option<&TouchEvent> {
        self.last_event.as_ref()
    }

    /// Non-mutating: what recognizer kinds would be captured for `event` if
    /// it were dispatched right now.
    pub fn get_gesture_candidates_for_event(&self, root: &Layer, event: &TouchEvent) -> Vec<RecognizerHandle> {
        let mut seen = FxHashSet::default();
        for existing in &self.captured {
            seen.insert(recognizer_key(existing));
        }
        let mut candidates = Vec::new();
        for layer in hit_test_path(root, event.location) {
            for recognizer in layer.recognizers() {
                if seen.insert(recognizer_key(&recognizer)) {
                    candidates.push(recognizer);
                }
            }
        }
        candidates
    }

    pub fn gesture_types_for_event(&self, root: &Layer, event: &TouchEvent) -> GestureTypes {
        let mut types = GestureTypes::default();
        for recognizer in self.get_gesture_candidates_for_event(root, event) {
            match recognizer.borrow().kind_tag() {
                RecognizerKindTag::Tap | RecognizerKindTag::LongPress => types.has_tap = true,
                RecognizerKindTag::Scroll => types.has_scroll = true,
                RecognizerKindTag::Drag => types.has_drag = true,
                _ => {}
            }
        }
        types
    }

    /// Hit-tests a fresh pointer-down (or a wheel event, which has no down
    /// phase of its own) and folds newly discovered recognizers into the
    /// captured set. Recognizers with `should_process_before_other_gestures`
    /// are inserted ahead of whatever is already captured so start
    /// resolution sees them first.
    fn capture(&mut self, root: &Layer, event: &TouchEvent) {
        if !matches!(
            event.event_type,
            TouchEventType::Down | TouchEventType::PointerDown | TouchEventType::Wheel
        ) {
            return;
        }

        let mut seen: FxHashSet<usize> = self.captured.iter().map(recognizer_key).collect();
        let mut front_len = self
            .captured
            .iter()
            .take_while(|r| r.borrow().should_process_before_other_gestures)
            .count();
        for layer in hit_test_path(root, event.location) {
            for recognizer in layer.recognizers() {
                if !seen.insert(recognizer_key(&recognizer)) {
                    continue;
                }
                if recognizer.borrow().should_process_before_other_gestures {
                    self.captured.insert(front_len, recognizer);
                    front_len += 1;
                } else {
                    self.captured.push(recognizer);
                }
            }
        }
    }

    /// Feeds `event` (localized into each captured recognizer's own layer
    /// space) to every captured recognizer that isn't already waiting on
    /// start resolution. Recognizers whose layer is gone, or whose
    /// localization path is no longer reachable from `root`, are cancelled
    /// and dropped. Anything that just transitioned into a begin-worthy
    /// state this round (`Began`, or a `Possible -> Ended` jump as `tap`
    /// makes) is appended to `pending_start`.
    fn update(&mut self, root: &Layer, event: &TouchEvent) {
        let mut still_captured = Vec::with_capacity(self.captured.len());

        for recognizer in std::mem::take(&mut self.captured) {
            if self.pending_start.iter().any(|p| Rc::ptr_eq(p, &recognizer)) {
                still_captured.push(recognizer);
                continue;
            }

            let Some(layer) = recognizer.borrow().layer() else {
                recognizer.borrow_mut().cancel();
                continue;
            };

            let Some(local_point) = root.convert_point_to_layer(event.location, &layer) else {
                recognizer.borrow_mut().cancel();
                continue;
            };

            let localized = event.with_location(local_point);
            let state_before = recognizer.borrow().state();
            recognizer.borrow_mut().update(&localized);
            let state_after = recognizer.borrow().state();

            if state_after == RecognizerState::Failed {
                // `cancel` only emits a synthetic `Ended` when the recognizer was
                // already processed; either way it resets state back to `Possible`
                // so the recognizer is usable again on the next gesture.
                recognizer.borrow_mut().cancel();
                continue;
            }

            if state_after == RecognizerState::Began
                || (state_before == RecognizerState::Possible && state_after == RecognizerState::Ended)
            {
                self.pending_start.push(recognizer.clone());
            }

            still_captured.push(recognizer);
        }

        self.captured = still_captured;
    }

    /// Arbitrates `pending_start`, back to front (deepest candidate first).
    ///
    /// - Scan strictly-earlier pending peers for a conflict (incompatible
    ///   recognizers per `is_compatible_with`). If an earlier peer requires
    ///   the candidate's failure, that peer loses outright — since the
    ///   candidate is trying to start rather than fail, the peer's own
    ///   precondition can never be met, so it is cancelled and dropped from
    ///   both lists and the scan continues looking for further conflicts.
    ///   Otherwise (the candidate requires the peer's failure, or neither
    ///   side does and they're just incompatible) the candidate cannot
    ///   start yet and is left pending untouched for a future cycle.
    /// - If the candidate survives that, scan the full captured list: any
    ///   incompatible peer that is genuinely active (`Changed`/`Ended`)
    ///   blocks the candidate from starting; any incompatible peer that is
    ///   still `Possible` and whose failure the candidate requires instead
    ///   defers the candidate (left pending, untouched, to be retried next
    ///   cycle).
    /// - Otherwise the candidate is resolved this round: removed from
    ///   `pending_start`, and either started (`on_started`, cancelling every
    ///   later candidate in the captured list if it asks to) or cancelled.
    fn resolve_start(&mut self) {
        let order: Vec<RecognizerHandle> = self.pending_start.clone();
        let mut index = order.len();

        while index > 0 {
            index -= 1;
            let candidate = order[index].clone();
            if !self.pending_start.iter().any(|r| Rc::ptr_eq(r, &candidate)) {
                // Already resolved earlier in this pass, as some other
                // candidate's loser.
                continue;
            }

            let mut should_start = true;
            loop {
                let candidate_pos = self
                    .pending_start
                    .iter()
                    .position(|r| Rc::ptr_eq(r, &candidate))
                    .expect("candidate still pending");
                let conflict = self.pending_start[..candidate_pos]
                    .iter()
                    .enumerate()
                    .find(|(_, peer)| !candidate.borrow().is_compatible_with(&peer.borrow()))
                    .map(|(i, peer)| (i, peer.clone()));

                let Some((peer_index, peer)) = conflict else { break };
                if peer.borrow().requires_failure_of(&candidate.borrow()) {
                    peer.borrow_mut().cancel();
                    self.pending_start.remove(peer_index);
                    self.captured.retain(|r| !Rc::ptr_eq(r, &peer));
                    continue;
                }
                should_start = false;
                break;
            }

            if !should_start {
                continue;
            }

            let mut blocked = false;
            let mut deferred = false;
            for peer in self.captured.clone() {
                if Rc::ptr_eq(&peer, &candidate) {
                    continue;
                }
                if candidate.borrow().is_compatible_with(&peer.borrow()) {
                    continue;
                }
                let peer_state = peer.borrow().state();
                if matches!(peer_state, RecognizerState::Changed | RecognizerState::Ended) {
                    blocked = true;
                    break;
                }
                if peer_state == RecognizerState::Possible && candidate.borrow().requires_failure_of(&peer.borrow()) {
                    deferred = true;
                    break;
                }
            }

            if deferred {
                continue;
            }

            self.pending_start.retain(|r| !Rc::ptr_eq(r, &candidate));

            if blocked {
                candidate.borrow_mut().cancel();
                continue;
            }

            let should_cancel_others = candidate.borrow().should_cancel_other_gestures_on_start;
            candidate.borrow_mut().on_started();
            if should_cancel_others {
                if let Some(candidate_pos) = self.captured.iter().position(|r| Rc::ptr_eq(r, &candidate)) {
                    for other in self.captured[candidate_pos + 1..].to_vec() {
                        other.borrow_mut().cancel();
                    }
                }
            }
        }

        self.captured.retain(|r| r.borrow().state() != RecognizerState::Failed);
    }

    /// Runs `process()` on every captured recognizer that isn't waiting on
    /// start resolution and is active, auto-cancelling (and dropping) any
    /// that reach `Ended` afterward.
    fn process(&mut self) {
        for recognizer in &self.captured {
            if self.pending_start.iter().any(|p| Rc::ptr_eq(p, recognizer)) {
                continue;
            }
            if recognizer.borrow().is_active() {
                recognizer.borrow_mut().process();
            }
        }

        let mut still_captured = Vec::with_capacity(self.captured.len());
        for recognizer in std::mem::take(&mut self.captured) {
            if self.pending_start.iter().any(|p| Rc::ptr_eq(p, &recognizer)) {
                still_captured.push(recognizer);
                continue;
            }
            if recognizer.borrow().state() == RecognizerState::Ended {
                recognizer.borrow_mut().cancel();
            } else {
                still_captured.push(recognizer);
            }
        }
        self.captured = still_captured;
    }

    /// The full capture/update/start-resolution/processing pipeline for one
    /// event.
    pub fn dispatch(&mut self, root: &Layer, event: &TouchEvent) {
        self.last_event = Some(event.clone());
        self.capture(root, event);
        self.update(root, event);
        self.resolve_start();
        self.process();
    }

    /// Forces every captured recognizer to a synthetic end and clears both
    /// the captured and pending-start sets, e.g. when the root is destroyed
    /// or focus is lost.
    pub fn cancel_all_gestures(&mut self) {
        self.pending_start.clear();
        for recognizer in std::mem::take(&mut self.captured) {
            recognizer.borrow_mut().cancel();
        }
    }
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
