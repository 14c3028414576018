//! Common fakes and helpers for tracker tests.
//!
//! Everything here is scriptable through interior mutability so tests can
//! reconfigure collaborators mid-scenario without rebuilding the tracker.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::chunk::{ChunkError, ChunkLoader, MemoryChunk, SegmentChunk};
use crate::context::TrackerContext;
use crate::events::{TrackerEvent, TrackerEventListener};
use crate::format::StreamFormat;
use crate::logic::{AdaptationLogic, BufferingLogic};
use crate::representation::{AdaptationSet, MediaSegmentRef, Representation, Segment};
use crate::timeline::{MediaTime, PlaybackRange};

/// Macro to initialize tracing for tests
///
/// Usage:
/// - `init_test_tracing!()` - uses DEBUG level (default)
/// - `init_test_tracing!(INFO)` - uses specified level
#[macro_export]
macro_rules! init_test_tracing {
    () => {
        init_test_tracing!(DEBUG);
    };
    ($level:ident) => {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::$level)
            .with_test_writer()
            .try_init();
    };
}

pub use crate::init_test_tracing;

/// A TS-looking payload (sync bytes at 0 and 188) for probe tests.
pub fn ts_bytes() -> Bytes {
    let mut data = vec![0u8; 2 * 188];
    data[0] = 0x47;
    data[188] = 0x47;
    Bytes::from(data)
}

/// Where a fake segment takes its bytes from.
enum SegmentSource {
    Inline(Bytes),
    Uri(String),
}

/// Scripted segment. Builders cover payload, display time, discontinuity
/// metadata, content type, and forced materialisation failure.
pub struct FakeSegment {
    source: SegmentSource,
    display: MediaTime,
    fail: bool,
    discontinuity: Option<u64>,
    content_type: Option<String>,
    format: StreamFormat,
}

impl FakeSegment {
    pub fn inline(data: impl Into<Bytes>) -> Self {
        Self {
            source: SegmentSource::Inline(data.into()),
            display: MediaTime::ZERO,
            fail: false,
            discontinuity: None,
            content_type: None,
            format: StreamFormat::Unknown,
        }
    }

    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            source: SegmentSource::Uri(uri.into()),
            display: MediaTime::ZERO,
            fail: false,
            discontinuity: None,
            content_type: None,
            format: StreamFormat::Unknown,
        }
    }

    pub fn failing() -> Self {
        let mut segment = Self::inline(Bytes::new());
        segment.fail = true;
        segment
    }

    pub fn with_display_time(mut self, display: MediaTime) -> Self {
        self.display = display;
        self
    }

    pub fn with_discontinuity(mut self, sequence: u64) -> Self {
        self.discontinuity = Some(sequence);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_format(mut self, format: StreamFormat) -> Self {
        self.format = format;
        self
    }
}

impl Segment for FakeSegment {
    fn to_chunk(
        &self,
        _context: &TrackerContext,
        loader: &dyn ChunkLoader,
        _number: u64,
        _rep: &Arc<dyn Representation>,
    ) -> Result<Box<dyn SegmentChunk>, ChunkError> {
        if self.fail {
            return Err(ChunkError::Internal("scripted failure".to_string()));
        }
        let data = match &self.source {
            SegmentSource::Inline(bytes) => bytes.clone(),
            SegmentSource::Uri(uri) => loader.fetch(uri, None)?,
        };
        let mut chunk = MemoryChunk::new(data).with_format(self.format);
        if let Some(sequence) = self.discontinuity {
            chunk = chunk.with_discontinuity(sequence);
        }
        if let Some(content_type) = &self.content_type {
            chunk = chunk.with_content_type(content_type.clone());
        }
        Ok(Box::new(chunk))
    }

    fn display_time(&self) -> MediaTime {
        self.display
    }
}

/// Scripted representation.
pub struct FakeRepresentation {
    id: String,
    format: Mutex<StreamFormat>,
    codecs: Mutex<Vec<String>>,
    live: AtomicBool,
    timestamp_offset: Mutex<MediaTime>,
    segment_duration: Mutex<MediaTime>,
    init: Mutex<Option<Arc<dyn Segment>>>,
    needs_index: AtomicBool,
    index: Mutex<Option<Arc<dyn Segment>>>,
    media: Mutex<BTreeMap<u64, Arc<dyn Segment>>>,
    translations: Mutex<HashMap<u64, u64>>,
    pending_translations: Mutex<HashMap<u64, u64>>,
    needs_update: AtomicBool,
    update_result: AtomicBool,
    pub update_runs: AtomicUsize,
    pub scheduled_updates: Mutex<Vec<(Option<u64>, bool)>>,
    can_no_longer_update: AtomicBool,
    min_ahead_overrides: Mutex<HashMap<u64, Duration>>,
    default_min_ahead: Mutex<Duration>,
    time_to_number: Mutex<HashMap<i64, u64>>,
    playback_range: Mutex<Option<PlaybackRange>>,
}

impl FakeRepresentation {
    pub fn new(id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            format: Mutex::new(StreamFormat::Unknown),
            codecs: Mutex::new(Vec::new()),
            live: AtomicBool::new(false),
            timestamp_offset: Mutex::new(MediaTime::ZERO),
            segment_duration: Mutex::new(MediaTime::ZERO),
            init: Mutex::new(None),
            needs_index: AtomicBool::new(false),
            index: Mutex::new(None),
            media: Mutex::new(BTreeMap::new()),
            translations: Mutex::new(HashMap::new()),
            pending_translations: Mutex::new(HashMap::new()),
            needs_update: AtomicBool::new(false),
            update_result: AtomicBool::new(true),
            update_runs: AtomicUsize::new(0),
            scheduled_updates: Mutex::new(Vec::new()),
            can_no_longer_update: AtomicBool::new(false),
            min_ahead_overrides: Mutex::new(HashMap::new()),
            default_min_ahead: Mutex::new(Duration::from_secs(30)),
            time_to_number: Mutex::new(HashMap::new()),
            playback_range: Mutex::new(None),
        })
    }

    /// A bare representation handle, for tests that only need identity.
    pub fn named(id: impl Into<String>) -> Arc<dyn Representation> {
        Self::new(id)
    }

    pub fn set_format(&self, format: StreamFormat) {
        *self.format.lock() = format;
    }

    pub fn set_codecs(&self, codecs: Vec<String>) {
        *self.codecs.lock() = codecs;
    }

    pub fn set_live(&self, live: bool) {
        self.live.store(live, Ordering::SeqCst);
    }

    pub fn set_timestamp_offset(&self, offset: MediaTime) {
        *self.timestamp_offset.lock() = offset;
    }

    /// Segment timeline: start of segment `n` is `n * duration`.
    pub fn set_segment_duration(&self, duration: MediaTime) {
        *self.segment_duration.lock() = duration;
    }

    pub fn set_init(&self, segment: FakeSegment) {
        *self.init.lock() = Some(Arc::new(segment));
    }

    pub fn set_index(&self, segment: FakeSegment) {
        self.needs_index.store(true, Ordering::SeqCst);
        *self.index.lock() = Some(Arc::new(segment));
    }

    pub fn add_media(&self, number: u64, segment: FakeSegment) {
        self.media.lock().insert(number, Arc::new(segment));
    }

    pub fn set_translation(&self, from: u64, to: u64) {
        self.translations.lock().insert(from, to);
    }

    /// Translation that only becomes visible after `run_local_updates`.
    pub fn set_pending_translation(&self, from: u64, to: u64) {
        self.pending_translations.lock().insert(from, to);
    }

    pub fn set_needs_update(&self, needs: bool) {
        self.needs_update.store(needs, Ordering::SeqCst);
    }

    pub fn set_update_result(&self, result: bool) {
        self.update_result.store(result, Ordering::SeqCst);
    }

    pub fn set_can_no_longer_update(&self, value: bool) {
        self.can_no_longer_update.store(value, Ordering::SeqCst);
    }

    pub fn set_min_ahead(&self, number: u64, ahead: Duration) {
        self.min_ahead_overrides.lock().insert(number, ahead);
    }

    pub fn map_time(&self, time: MediaTime, number: u64) {
        self.time_to_number.lock().insert(time.as_micros(), number);
    }

    pub fn set_playback_range(&self, range: PlaybackRange) {
        *self.playback_range.lock() = Some(range);
    }
}

impl Representation for FakeRepresentation {
    fn id(&self) -> &str {
        &self.id
    }

    fn stream_format(&self) -> StreamFormat {
        *self.format.lock()
    }

    fn codecs(&self) -> Vec<String> {
        self.codecs.lock().clone()
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn timestamp_offset(&self) -> MediaTime {
        *self.timestamp_offset.lock()
    }

    fn needs_update(&self, _number: Option<u64>) -> bool {
        self.needs_update.load(Ordering::SeqCst)
    }

    fn run_local_updates(&self, _context: &TrackerContext) -> bool {
        self.update_runs.fetch_add(1, Ordering::SeqCst);
        let result = self.update_result.load(Ordering::SeqCst);
        if result {
            self.needs_update.store(false, Ordering::SeqCst);
            let pending: Vec<(u64, u64)> = self.pending_translations.lock().drain().collect();
            self.translations.lock().extend(pending);
        }
        result
    }

    fn schedule_next_update(&self, number: Option<u64>, did_update: bool) {
        self.scheduled_updates.lock().push((number, did_update));
    }

    fn can_no_longer_update(&self) -> bool {
        self.can_no_longer_update.load(Ordering::SeqCst)
    }

    fn translate_segment_number(&self, number: u64, _from: &Arc<dyn Representation>) -> Option<u64> {
        self.translations.lock().get(&number).copied()
    }

    fn min_ahead_time(&self, number: u64) -> Duration {
        self.min_ahead_overrides
            .lock()
            .get(&number)
            .copied()
            .unwrap_or(*self.default_min_ahead.lock())
    }

    fn next_media_segment(&self, number: u64) -> Option<MediaSegmentRef> {
        let media = self.media.lock();
        let (found, segment) = media.range(number..).next()?;
        Some(MediaSegmentRef {
            segment: segment.clone(),
            number: *found,
            gap: *found != number,
        })
    }

    fn init_segment(&self) -> Option<Arc<dyn Segment>> {
        self.init.lock().clone()
    }

    fn needs_index(&self) -> bool {
        self.needs_index.load(Ordering::SeqCst)
    }

    fn index_segment(&self) -> Option<Arc<dyn Segment>> {
        self.index.lock().clone()
    }

    fn segment_number_for_time(&self, time: MediaTime) -> Option<u64> {
        self.time_to_number.lock().get(&time.as_micros()).copied()
    }

    fn playback_time_duration(&self, number: u64) -> Option<(MediaTime, MediaTime)> {
        let duration = *self.segment_duration.lock();
        if duration.is_zero() {
            return None;
        }
        let start = MediaTime::from_micros(number as i64 * duration.as_micros());
        Some((start, duration))
    }

    fn media_playback_range(&self) -> Option<PlaybackRange> {
        *self.playback_range.lock()
    }
}

/// Adaptation policy that sticks with the current representation unless a
/// preference is scripted.
#[derive(Default)]
pub struct FakeAdaptationLogic {
    preferred: Mutex<Option<Arc<dyn Representation>>>,
}

impl FakeAdaptationLogic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefer(&self, rep: Arc<dyn Representation>) {
        *self.preferred.lock() = Some(rep);
    }
}

impl AdaptationLogic for FakeAdaptationLogic {
    fn next_representation(
        &self,
        set: &AdaptationSet,
        current: Option<&Arc<dyn Representation>>,
    ) -> Option<Arc<dyn Representation>> {
        if let Some(preferred) = self.preferred.lock().clone() {
            return Some(preferred);
        }
        current
            .cloned()
            .or_else(|| set.representations().first().cloned())
    }
}

pub struct FakeBufferingLogic {
    start: AtomicU64,
}

impl FakeBufferingLogic {
    pub fn new(start: u64) -> Self {
        Self {
            start: AtomicU64::new(start),
        }
    }
}

impl BufferingLogic for FakeBufferingLogic {
    fn start_segment_number(&self, _rep: &Arc<dyn Representation>) -> u64 {
        self.start.load(Ordering::SeqCst)
    }
}

/// Loader serving scripted URIs from memory.
#[derive(Default)]
pub struct FakeLoader {
    resources: Mutex<HashMap<String, Bytes>>,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, uri: impl Into<String>, data: impl Into<Bytes>) {
        self.resources.lock().insert(uri.into(), data.into());
    }
}

impl ChunkLoader for FakeLoader {
    fn fetch(&self, uri: &str, _range: Option<(u64, Option<u64>)>) -> Result<Bytes, ChunkError> {
        self.resources
            .lock()
            .get(uri)
            .cloned()
            .ok_or_else(|| ChunkError::NotFound(uri.to_string()))
    }
}

/// Listener recording every event it receives.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<TrackerEvent>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TrackerEvent> {
        self.events.lock().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|e| e.kind()).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl TrackerEventListener for RecordingListener {
    fn on_tracker_event(&self, event: &TrackerEvent) {
        self.events.lock().push(event.clone());
    }
}
