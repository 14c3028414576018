//! # Adaptive
//!
//! Segment tracker core for adaptive (HLS/DASH) streaming playback.
//!
//! For a single media track, the tracker walks a sequence of media segments
//! drawn from one of several interchangeable encodings ("representations"),
//! lets an external adaptation policy pick which encoding to read next,
//! emits probed chunks to a downstream demuxer, and broadcasts lifecycle
//! events (switches, discontinuities, format changes, gaps, buffering
//! telemetry) to subscribers.
//!
//! The crate contains no I/O of its own: playlist parsing, HTTP, demuxing
//! and bitrate decisions all live behind the trait seams in
//! [`representation`], [`chunk`] and [`logic`].

pub mod chunk;
pub mod context;
pub mod events;
pub mod format;
pub mod logic;
pub mod position;
pub mod probe;
pub mod queue;
pub mod representation;
pub mod sync_refs;
pub mod timeline;
pub mod tracker;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-exports for easier access
pub use chunk::{ChunkError, ChunkLoader, MemoryChunk, SegmentChunk};
pub use context::{TrackerContext, TrackerStatistics};
pub use events::{EventDispatcher, RepresentationHandle, TrackerEvent, TrackerEventListener};
pub use format::{StreamFormat, detect_format, format_from_mime};
pub use logic::{AdaptationLogic, BufferingLogic};
pub use position::Position;
pub use probe::{PROBE_PREFIX_LEN, ProbeableChunk};
pub use queue::{ChunkEntry, ChunkQueue};
pub use representation::{AdaptationSet, MediaSegmentRef, Representation, Segment};
pub use sync_refs::{InMemorySyncStore, SyncReference, SynchronizationStore};
pub use timeline::{MediaTime, PlaybackRange, SegmentTimes, StreamRole};
pub use tracker::SegmentTracker;
