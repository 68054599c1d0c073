//! Geometry, time, velocity tracking and deferred-event primitives shared
//! by the layer tree and gesture runtime in `layerkit-core`.

pub mod config;
pub mod event_queue;
pub mod geometry;
pub mod time;
pub mod velocity;

pub use config::GesturesConfiguration;
pub use event_queue::{EventCallback, EventId, EventQueue, EventQueueError};
pub use geometry::{sanitize_scalar_from_scale, GeometryError, Matrix, Point, Rect, Scalar, Size, Vector};
pub use time::{Clock, Duration, TimePoint};
pub use velocity::VelocityTracker;
