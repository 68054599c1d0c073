//! Programmer-error class: conditions the core refuses to
//! service rather than silently no-oping. Call sites log these and degrade
//! to the "falsy result, no listener invocation" contract; they never
//! propagate as panics.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// `dispatch_touch_event` was called while a dispatch was already in
    /// flight on this root.
    AlreadyDispatching,
    /// The root has been destroyed; further input is ignored.
    RootDestroyed,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::AlreadyDispatching => {
                write!(f, "dispatch_touch_event called re-entrantly")
            }
            DispatchError::RootDestroyed => write!(f, "layer root is destroyed"),
        }
    }
}

impl std::error::Error for DispatchError {}
