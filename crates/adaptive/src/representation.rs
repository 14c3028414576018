//! Contract between the tracker and the playlist-owned representation graph.
//!
//! The tracker treats a representation as opaque: it never parses manifests
//! and never looks inside segments. Everything it needs (numbering,
//! translation across encodings, live-window freshness, timing) is expressed
//! through the [`Representation`] trait. Handles are `Arc`s because the
//! playlist graph outlives the tracker; identity is [`Representation::id`],
//! never pointer identity.

use std::sync::Arc;
use std::time::Duration;

use crate::chunk::{ChunkError, ChunkLoader, SegmentChunk};
use crate::context::TrackerContext;
use crate::format::StreamFormat;
use crate::timeline::{MediaTime, PlaybackRange, StreamRole};

/// One addressable media unit of a representation.
pub trait Segment: Send + Sync {
    /// Materialise the segment into a readable chunk.
    ///
    /// May block on I/O through `loader`; the tracker maps failures to a
    /// no-progress pull.
    fn to_chunk(
        &self,
        context: &TrackerContext,
        loader: &dyn ChunkLoader,
        number: u64,
        rep: &Arc<dyn Representation>,
    ) -> Result<Box<dyn SegmentChunk>, ChunkError>;

    /// Wall-clock display time of the segment, when the playlist carries one.
    fn display_time(&self) -> MediaTime {
        MediaTime::ZERO
    }
}

/// A data segment resolved for a requested number.
///
/// `number` may differ from the requested one when the representation skipped
/// to the earliest addressable segment of a live window; `gap` reports that
/// skip.
pub struct MediaSegmentRef {
    pub segment: Arc<dyn Segment>,
    pub number: u64,
    pub gap: bool,
}

/// One encoding of a track, owned by the playlist.
pub trait Representation: Send + Sync {
    /// Stable identifier within the adaptation set.
    fn id(&self) -> &str;

    /// Declared format of the representation, `Unknown` when the playlist
    /// does not say.
    fn stream_format(&self) -> StreamFormat {
        StreamFormat::Unknown
    }

    /// Codec description strings for UI layers.
    fn codecs(&self) -> Vec<String> {
        Vec::new()
    }

    fn is_live(&self) -> bool {
        false
    }

    /// Offset added to timeline starts to obtain playback timestamps.
    fn timestamp_offset(&self) -> MediaTime {
        MediaTime::ZERO
    }

    /// Whether the representation must be refreshed before answering
    /// questions about `number`.
    fn needs_update(&self, number: Option<u64>) -> bool {
        let _ = number;
        false
    }

    /// Refresh local playlist state. Returns whether anything changed.
    /// May block on I/O.
    fn run_local_updates(&self, context: &TrackerContext) -> bool {
        let _ = context;
        false
    }

    /// Schedule the next refresh epoch after an update attempt for `number`.
    fn schedule_next_update(&self, number: Option<u64>, did_update: bool) {
        let _ = (number, did_update);
    }

    /// A live representation whose playlist can no longer be refreshed.
    fn can_no_longer_update(&self) -> bool {
        false
    }

    /// Translate a segment number of `from` into this representation's
    /// numbering. `None` when the timelines cannot be lined up.
    fn translate_segment_number(&self, number: u64, from: &Arc<dyn Representation>) -> Option<u64>;

    /// Time between segment `number` and the live edge. Zero means the
    /// segment has fallen out of the live window.
    fn min_ahead_time(&self, number: u64) -> Duration;

    /// Resolve the data segment for `number`, possibly adjusting it forward.
    fn next_media_segment(&self, number: u64) -> Option<MediaSegmentRef>;

    /// Representation-global header segment, if the format needs one.
    fn init_segment(&self) -> Option<Arc<dyn Segment>> {
        None
    }

    /// Whether an index segment must be emitted between init and media.
    fn needs_index(&self) -> bool {
        false
    }

    fn index_segment(&self) -> Option<Arc<dyn Segment>> {
        None
    }

    /// Map a playback time to a segment number.
    fn segment_number_for_time(&self, time: MediaTime) -> Option<u64> {
        let _ = time;
        None
    }

    /// Timeline start and duration of segment `number`.
    fn playback_time_duration(&self, number: u64) -> Option<(MediaTime, MediaTime)> {
        let _ = number;
        None
    }

    /// Addressable playback range of the representation.
    fn media_playback_range(&self) -> Option<PlaybackRange> {
        None
    }
}

/// A group of interchangeable encodings of one logical track.
pub struct AdaptationSet {
    id: u64,
    role: StreamRole,
    segment_aligned: bool,
    representations: Vec<Arc<dyn Representation>>,
}

impl AdaptationSet {
    pub fn new(id: u64, role: StreamRole, segment_aligned: bool) -> Self {
        Self {
            id,
            role,
            segment_aligned,
            representations: Vec::new(),
        }
    }

    pub fn with_representation(mut self, rep: Arc<dyn Representation>) -> Self {
        self.representations.push(rep);
        self
    }

    pub fn push_representation(&mut self, rep: Arc<dyn Representation>) {
        self.representations.push(rep);
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn role(&self) -> StreamRole {
        self.role
    }

    /// Whether segment numbers are aligned across representations, the
    /// precondition for seamless switching.
    pub fn is_segment_aligned(&self) -> bool {
        self.segment_aligned
    }

    pub fn representations(&self) -> &[Arc<dyn Representation>] {
        &self.representations
    }
}
