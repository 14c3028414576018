//! Segment tracker.
//!
//! Advances one adaptation set through its segment sequence, one chunk per
//! pull. Each media segment is emitted in up to three phases (init segment,
//! index segment, media data); the tracker switches representations on
//! adaptation-policy decisions at segment boundaries, refreshes live
//! playlists on demand, probes unknown stream formats, and broadcasts
//! lifecycle events to its listeners.
//!
//! A tracker instance is owned and driven by one stream thread; operations
//! are non-reentrant and never spawn tasks. Blocking only happens inside the
//! opaque collaborator calls (`to_chunk`, `run_local_updates`).

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::chunk::{ChunkLoader, SegmentChunk};
use crate::context::TrackerContext;
use crate::events::{EventDispatcher, TrackerEvent, TrackerEventListener};
use crate::format::{StreamFormat, format_from_mime};
use crate::logic::{AdaptationLogic, BufferingLogic};
use crate::position::{Position, SEGMENT_NUMBER_UNSET};
use crate::probe::ProbeableChunk;
use crate::queue::{ChunkEntry, ChunkQueue};
use crate::representation::{AdaptationSet, Representation, Segment};
use crate::sync_refs::{SyncReference, SynchronizationStore};
use crate::timeline::{MediaTime, PlaybackRange, SegmentTimes, StreamRole};

pub struct SegmentTracker {
    context: TrackerContext,
    adaptation_set: Arc<AdaptationSet>,
    adaptation: Arc<dyn AdaptationLogic>,
    buffering: Arc<dyn BufferingLogic>,
    sync_store: Arc<dyn SynchronizationStore>,
    current: Position,
    next: Position,
    initializing: bool,
    format: StreamFormat,
    queue: ChunkQueue,
    events: EventDispatcher,
}

impl SegmentTracker {
    pub fn new(
        context: TrackerContext,
        adaptation_set: Arc<AdaptationSet>,
        adaptation: Arc<dyn AdaptationLogic>,
        buffering: Arc<dyn BufferingLogic>,
        sync_store: Arc<dyn SynchronizationStore>,
    ) -> Self {
        Self {
            context,
            adaptation_set,
            adaptation,
            buffering,
            sync_store,
            current: Position::invalid(),
            next: Position::invalid(),
            initializing: true,
            format: StreamFormat::Unknown,
            queue: ChunkQueue::new(),
            events: EventDispatcher::new(),
        }
    }

    pub fn register_listener(&mut self, listener: Arc<dyn TrackerEventListener>) {
        self.events.register(&listener);
    }

    /// Position of the chunk the next pull will return.
    pub fn next_position(&self) -> &Position {
        &self.next
    }

    /// Position of the last chunk actually returned.
    pub fn current_position(&self) -> &Position {
        &self.current
    }

    pub fn stream_role(&self) -> StreamRole {
        self.adaptation_set.role()
    }

    pub fn current_format(&self) -> StreamFormat {
        if self.format != StreamFormat::Unknown {
            return self.format;
        }
        self.active_representation()
            .map(|rep| rep.stream_format())
            .unwrap_or(StreamFormat::Unknown)
    }

    pub fn codecs(&self) -> Vec<String> {
        self.active_representation()
            .map(|rep| rep.codecs())
            .unwrap_or_default()
    }

    pub fn media_playback_range(&self) -> Option<PlaybackRange> {
        self.active_representation()
            .and_then(|rep| rep.media_playback_range())
    }

    /// Time left between the reading position and the live edge.
    ///
    /// The start number is `current`'s only once playback has begun; before
    /// that the buffering policy's start segment stands in.
    pub fn min_ahead_time(&self) -> Duration {
        let Some(rep) = self.active_representation() else {
            return Duration::ZERO;
        };
        let number = if self.current.is_valid() {
            self.current.number
        } else {
            self.buffering.start_segment_number(&rep)
        };
        if number == SEGMENT_NUMBER_UNSET {
            return Duration::ZERO;
        }
        rep.min_ahead_time(number)
    }

    /// Whether more data can be buffered right now. Always true for
    /// non-live content; live content must still be inside the window.
    pub fn buffering_available(&self) -> bool {
        let live = self
            .active_representation()
            .map(|rep| rep.is_live())
            .unwrap_or(false);
        if live {
            !self.min_ahead_time().is_zero()
        } else {
            true
        }
    }

    pub fn synchronization_reference(
        &self,
        sequence: u64,
        time: MediaTime,
    ) -> Option<SyncReference> {
        self.sync_store.reference(sequence, time)
    }

    pub fn update_synchronization_reference(&self, sequence: u64, times: SegmentTimes) {
        self.sync_store.add_reference(sequence, times);
    }

    pub fn notify_buffering_state(&self, enabled: bool) {
        self.events.notify(&TrackerEvent::BufferingStateUpdate {
            id: self.adaptation_set.id(),
            enabled,
        });
    }

    pub fn notify_buffering_level(
        &self,
        minimum: MediaTime,
        maximum: MediaTime,
        current: MediaTime,
        target: MediaTime,
    ) {
        self.events.notify(&TrackerEvent::BufferingLevelChange {
            id: self.adaptation_set.id(),
            minimum,
            maximum,
            current,
            target,
        });
    }

    /// Playback time of the next (or current) position, if resolvable.
    pub fn playback_time(&self, of_next: bool) -> Option<MediaTime> {
        let pos = if of_next { &self.next } else { &self.current };
        if !pos.is_valid() {
            return None;
        }
        let rep = pos.rep.as_ref()?;
        let (start, _duration) = rep.playback_time_duration(pos.number)?;
        Some(start + rep.timestamp_offset())
    }

    /// Ensure `next` points somewhere. Idempotent once a start position is
    /// set.
    pub fn set_start_position(&mut self) -> bool {
        if self.next.is_valid() {
            return true;
        }
        match self.start_position() {
            Some(pos) => {
                debug!("{} start position {:?}", self.context.name, pos);
                self.next = pos;
                true
            }
            None => false,
        }
    }

    /// Move the cursor to `pos`, flushing any prepared chunk.
    pub fn set_position(&mut self, pos: Position, restarted: bool) {
        if restarted {
            self.initializing = true;
        }
        self.current = Position::invalid();
        self.next = pos;
        self.queue.flush();
        self.events.notify(&TrackerEvent::PositionChange {
            resume_time: self.playback_time(true),
        });
    }

    /// Seek to `time`. With `try_only` the mapping is verified but the
    /// cursor does not move.
    pub fn set_position_by_time(&mut self, time: MediaTime, restarted: bool, try_only: bool) -> bool {
        let rep = if self.current.is_valid() {
            self.current.rep.clone()
        } else {
            self.adaptation_set.representations().first().cloned()
        };
        let Some(rep) = rep else {
            return false;
        };

        if !self.refresh_representation(&rep, self.current.number()) {
            warn!(
                "{} could not refresh representation {} for seek",
                self.context.name,
                rep.id()
            );
            return false;
        }

        let Some(number) = rep.segment_number_for_time(time) else {
            debug!(
                "{} no segment at {} in representation {}",
                self.context.name,
                time,
                rep.id()
            );
            return false;
        };

        if !try_only {
            self.set_position(Position::new(rep, number), restarted);
        }
        true
    }

    /// Refresh the selected representation if its playlist went stale.
    pub fn update_selected(&mut self) {
        let Some(rep) = self.current.rep.clone() else {
            return;
        };
        if !rep.needs_update(self.next.number()) {
            return;
        }
        if rep.can_no_longer_update() {
            warn!(
                "{} representation {} can no longer be refreshed",
                self.context.name,
                rep.id()
            );
            self.events
                .notify(&TrackerEvent::RepresentationUpdateFailed { rep });
            return;
        }
        let updated = rep.run_local_updates(&self.context);
        rep.schedule_next_update(self.next.number(), updated);
        if updated {
            self.events
                .notify(&TrackerEvent::RepresentationUpdated { rep });
        }
    }

    /// Return the tracker to its post-construction state.
    pub fn reset(&mut self) {
        self.events.notify(&TrackerEvent::RepresentationSwitch {
            prev: self.current.rep.clone(),
            next: None,
        });
        self.current = Position::invalid();
        self.next = Position::invalid();
        self.initializing = true;
        self.format = StreamFormat::Unknown;
        self.queue.flush();
    }

    /// Pull the next chunk for the demuxer.
    ///
    /// Returns `None` when no start position is set, no segment is available
    /// yet, or the stream format turned out unsupported. The caller retries
    /// on its next tick.
    pub fn next_chunk(
        &mut self,
        switch_allowed: bool,
        loader: &dyn ChunkLoader,
    ) -> Option<Box<dyn SegmentChunk>> {
        if !self.next.is_valid() {
            return None;
        }

        if self.queue.is_empty() {
            let entry = self.prepare_chunk(switch_allowed, self.next.clone(), loader);
            // An invalid entry marks the end of deliverable data.
            self.queue.push(entry);
        }

        let (mut b_gap, b_switched, b_discontinuity, sequence, head_pos, times) = {
            let head = self.queue.front()?;
            if !head.is_valid() {
                self.queue.pop();
                return None;
            }
            let chunk_discontinuity = head
                .chunk
                .as_ref()
                .map(|c| c.discontinuity())
                .unwrap_or(false);
            (
                head.position.number != self.next.number,
                head.position.rep_id() != self.next.rep_id() || !self.current.is_valid(),
                // The number check keeps init/index phases of one media
                // segment from re-announcing the same discontinuity.
                chunk_discontinuity
                    && self.current.is_valid()
                    && self.current.number != self.next.number,
                head.chunk
                    .as_ref()
                    .map(|c| c.discontinuity_sequence())
                    .unwrap_or(0),
                head.position.clone(),
                head.times,
            )
        };

        if b_switched {
            info!(
                "{} switching representation {:?} -> {:?}",
                self.context.name,
                self.current.rep_id(),
                head_pos.rep_id()
            );
            self.events.notify(&TrackerEvent::RepresentationSwitch {
                prev: self.current.rep.clone(),
                next: head_pos.rep.clone(),
            });
            self.initializing = true;
            self.context.statistics.lock().representation_switches += 1;
        }

        self.next = head_pos.clone();
        self.current = head_pos.clone();

        // A previously unsupported stream stays unsupported; no demuxer can
        // be created for it.
        if self.format == StreamFormat::Unsupported {
            return None;
        }

        let entry = self.queue.pop()?;
        let chunk = entry.chunk?;

        let chunk: Box<dyn SegmentChunk> = if chunk.stream_format() == StreamFormat::Unknown {
            let mut probed = ProbeableChunk::new(chunk);
            let mut resolved = probed.probe_format();
            if resolved == StreamFormat::Unknown {
                resolved = probed
                    .content_type()
                    .map(format_from_mime)
                    .unwrap_or(StreamFormat::Unknown);
            }
            self.context.statistics.lock().format_probes += 1;
            debug!("{} probed stream format: {resolved}", self.context.name);
            probed.set_stream_format(resolved);
            Box::new(probed)
        } else {
            chunk
        };

        let resolved = chunk.stream_format();
        if resolved == StreamFormat::Unsupported {
            warn!(
                "{} unsupported stream format, stopping delivery",
                self.context.name
            );
            self.format = resolved;
            return None;
        }
        if resolved != self.format && resolved != StreamFormat::Unknown {
            info!("{} stream format changed to {resolved}", self.context.name);
            self.format = resolved;
            self.events
                .notify(&TrackerEvent::FormatChange { format: resolved });
        }

        if self.initializing {
            // The first chunk after a (re)start is never a gap.
            b_gap = false;
            self.initializing = false;
        }

        if b_gap {
            info!(
                "{} segment gap, adjusted to {}",
                self.context.name, head_pos.number
            );
            self.context.statistics.lock().segment_gaps += 1;
            self.events.notify(&TrackerEvent::SegmentGap);
        }
        if b_discontinuity {
            debug!(
                "{} discontinuity sequence {} at segment {}",
                self.context.name, sequence, head_pos.number
            );
            self.context.statistics.lock().discontinuities += 1;
            self.events
                .notify(&TrackerEvent::Discontinuity { sequence });
        }
        self.events.notify(&TrackerEvent::SegmentChange {
            adaptation_set_id: self.adaptation_set.id(),
            sequence,
            times,
        });

        {
            let mut stats = self.context.statistics.lock();
            if head_pos.in_init_phase() {
                stats.init_chunks += 1;
            } else if head_pos.in_index_phase() {
                stats.index_chunks += 1;
            } else {
                stats.media_chunks += 1;
            }
        }

        if !b_gap {
            self.next.increment();
        }
        // On a gap the adjusted number already reflects the skip.

        Some(chunk)
    }

    /// Build the next deliverable chunk starting from `pos`.
    fn prepare_chunk(
        &mut self,
        switch_allowed: bool,
        mut pos: Position,
        loader: &dyn ChunkLoader,
    ) -> ChunkEntry {
        if !pos.is_valid() {
            match self.start_position() {
                Some(start) => pos = start,
                None => return ChunkEntry::invalid(),
            }
        }

        // Representation switches only happen on aligned sets and only once
        // the current media segment is fully announced.
        let can_switch = switch_allowed
            && self.adaptation_set.is_segment_aligned()
            && pos.init_sent
            && pos.index_sent;
        if can_switch
            && let Some(cur_rep) = pos.rep.clone()
            && let Some(next_rep) = self
                .adaptation
                .next_representation(&self.adaptation_set, Some(&cur_rep))
            && next_rep.id() != cur_rep.id()
        {
            let mut translated = next_rep.translate_segment_number(pos.number, &cur_rep);
            self.refresh_representation(&next_rep, translated);
            if translated.is_none() {
                // The refresh may have made the timelines line up.
                translated = next_rep.translate_segment_number(pos.number, &cur_rep);
            }
            match translated {
                Some(number) if next_rep.min_ahead_time(number).is_zero() => {
                    debug!(
                        "{} not switching to {}, segment {} is past the live window",
                        self.context.name,
                        next_rep.id(),
                        number
                    );
                }
                Some(number) => {
                    pos = Position::new(next_rep, number);
                }
                None => {
                    warn!(
                        "{} could not translate segment {} from {} into {}",
                        self.context.name,
                        pos.number,
                        cur_rep.id(),
                        next_rep.id()
                    );
                }
            }
        }

        let Some(rep) = pos.rep.clone() else {
            return ChunkEntry::invalid();
        };

        let Some(media) = rep.next_media_segment(pos.number) else {
            debug!(
                "{} no media segment at {} in representation {}",
                self.context.name,
                pos.number,
                rep.id()
            );
            return ChunkEntry::invalid();
        };
        if media.gap {
            debug!(
                "{} segment {} unavailable, representation skipped to {}",
                self.context.name, pos.number, media.number
            );
        }
        pos.number = media.number;

        let mut segment: Option<Arc<dyn Segment>> = None;
        if !pos.init_sent {
            segment = rep.init_segment();
            if segment.is_none() {
                pos.increment();
            }
        }
        if segment.is_none() && !pos.index_sent {
            if rep.needs_index() {
                segment = rep.index_segment();
            }
            if segment.is_none() {
                pos.increment();
            }
        }
        let data_segment = media.segment;
        let segment = segment.unwrap_or_else(|| data_segment.clone());

        let chunk = match segment.to_chunk(&self.context, loader, pos.number, &rep) {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(
                    "{} failed to materialise segment {} of {}: {e}",
                    self.context.name,
                    pos.number,
                    rep.id()
                );
                return ChunkEntry::invalid();
            }
        };

        let mut times = SegmentTimes::default();
        if let Some((start, duration)) = rep.playback_time_duration(pos.number) {
            times.start = start + rep.timestamp_offset();
            times.duration = duration;
        }
        // Display time always comes from the data segment, whatever phase
        // was materialised.
        times.display = data_segment.display_time();

        ChunkEntry::new(chunk, pos, times)
    }

    /// Ask the policies for a position to start playback from.
    fn start_position(&mut self) -> Option<Position> {
        let rep = self
            .adaptation
            .next_representation(&self.adaptation_set, None)?;
        self.refresh_representation(&rep, None);
        let number = self.buffering.start_segment_number(&rep);
        if number == SEGMENT_NUMBER_UNSET {
            return None;
        }
        Some(Position::new(rep, number))
    }

    /// Bring a representation up to date before asking it about `number`.
    /// Returns false only when an update was needed and failed.
    fn refresh_representation(&self, rep: &Arc<dyn Representation>, number: Option<u64>) -> bool {
        if !rep.needs_update(number) {
            return true;
        }
        debug!(
            "{} refreshing representation {}",
            self.context.name,
            rep.id()
        );
        let updated = rep.run_local_updates(&self.context);
        rep.schedule_next_update(number, updated);
        if updated {
            self.events
                .notify(&TrackerEvent::RepresentationUpdated { rep: rep.clone() });
        }
        updated
    }

    fn active_representation(&self) -> Option<Arc<dyn Representation>> {
        self.current
            .rep
            .clone()
            .or_else(|| self.next.rep.clone())
            .or_else(|| self.adaptation_set.representations().first().cloned())
    }
}
