//! Synchronization references, keyed by discontinuity sequence.
//!
//! When the media timeline restarts, demuxers need a stable anchor to line
//! elementary streams back up. The store maps each discontinuity sequence to
//! the times of the first chunk seen for it.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::timeline::{MediaTime, SegmentTimes};

/// Timing anchor for one discontinuity sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReference {
    pub sequence: u64,
    pub times: SegmentTimes,
}

/// Key/value store of synchronization references.
pub trait SynchronizationStore: Send + Sync {
    /// Look up the reference for `sequence`. When nothing is stored yet, the
    /// store may derive a reference anchored at `fallback_time` without
    /// persisting it.
    fn reference(&self, sequence: u64, fallback_time: MediaTime) -> Option<SyncReference>;

    /// Record (or refresh) the reference times for `sequence`.
    fn add_reference(&self, sequence: u64, times: SegmentTimes);
}

/// Default in-memory store.
#[derive(Default)]
pub struct InMemorySyncStore {
    references: RwLock<HashMap<u64, SegmentTimes>>,
}

impl InMemorySyncStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SynchronizationStore for InMemorySyncStore {
    fn reference(&self, sequence: u64, fallback_time: MediaTime) -> Option<SyncReference> {
        if let Some(times) = self.references.read().get(&sequence) {
            return Some(SyncReference {
                sequence,
                times: *times,
            });
        }
        Some(SyncReference {
            sequence,
            times: SegmentTimes {
                start: fallback_time,
                duration: MediaTime::ZERO,
                display: fallback_time,
            },
        })
    }

    fn add_reference(&self, sequence: u64, times: SegmentTimes) {
        self.references.write().insert(sequence, times);
    }
}
