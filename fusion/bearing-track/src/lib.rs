//! The tracking coordinator: camera registry, angle-to-bearing conversion,
//! solver invocation, and single-track lifecycle bookkeeping.

mod coordinator;
mod registry;
mod track;

pub use coordinator::TrackingCoordinator;
pub use registry::CameraRegistry;
pub use track::{Track, TRACK_DEGRADED, TRACK_NEW, TRACK_VALID};
