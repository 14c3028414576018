//! Strategy seams consulted by the tracker.
//!
//! Bitrate decisions and start-position choices live outside the tracker; it
//! only asks and obeys.

use std::sync::Arc;

use crate::representation::{AdaptationSet, Representation};

/// Picks which representation to read next.
///
/// Implementations usually also implement
/// [`TrackerEventListener`](crate::events::TrackerEventListener) and register
/// with the tracker at construction so they can observe buffering telemetry.
pub trait AdaptationLogic: Send + Sync {
    /// Preferred representation for `set`, given the one currently being
    /// read (`None` before playback starts).
    fn next_representation(
        &self,
        set: &AdaptationSet,
        current: Option<&Arc<dyn Representation>>,
    ) -> Option<Arc<dyn Representation>>;
}

/// Chooses where playback starts within a representation.
pub trait BufferingLogic: Send + Sync {
    fn start_segment_number(&self, rep: &Arc<dyn Representation>) -> u64;
}
