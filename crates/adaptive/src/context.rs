//! Shared tracker context and processing telemetry.
//!
//! The context is cloned into the tracker at construction and threaded through
//! the opaque collaborator calls (`run_local_updates`, `to_chunk`) as the
//! shared-resources handle. Statistics are telemetry only; no control flow
//! reads them.

use std::sync::Arc;

use parking_lot::Mutex;

/// Counters collected while a track is being pulled.
#[derive(Debug, Default, Clone)]
pub struct TrackerStatistics {
    /// Init chunks delivered
    pub init_chunks: usize,
    /// Index chunks delivered
    pub index_chunks: usize,
    /// Media chunks delivered
    pub media_chunks: usize,
    /// Representation switches that actually happened
    pub representation_switches: usize,
    /// Segment-numbering gaps observed
    pub segment_gaps: usize,
    /// Explicit media discontinuities observed
    pub discontinuities: usize,
    /// Chunks that went through format probing
    pub format_probes: usize,
}

/// Shared context for one tracked stream.
#[derive(Debug, Clone)]
pub struct TrackerContext {
    /// Name of the stream being tracked, used as a log prefix
    pub name: String,
    /// Runtime statistics for this stream
    pub statistics: Arc<Mutex<TrackerStatistics>>,
}

impl TrackerContext {
    pub fn new() -> Self {
        Self {
            name: "DefaultStream".to_string(),
            statistics: Arc::new(Mutex::new(TrackerStatistics::default())),
        }
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::new()
        }
    }

    /// Copy of the current statistics, for external polling.
    pub fn snapshot(&self) -> TrackerStatistics {
        self.statistics.lock().clone()
    }
}

impl Default for TrackerContext {
    fn default() -> Self {
        Self::new()
    }
}
