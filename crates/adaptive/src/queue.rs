//! Prepared-chunk lookahead queue.
//!
//! The queue conceptually holds a single prepared entry ahead of the consumer.
//! It owns each enqueued chunk until the chunk is returned to the caller or
//! the queue is flushed.

use std::collections::VecDeque;

use crate::chunk::SegmentChunk;
use crate::position::Position;
use crate::timeline::SegmentTimes;

/// A prepared chunk with its position and timing metadata.
///
/// Valid iff a chunk is present and the position is valid; an invalid entry
/// marks the end of deliverable data.
pub struct ChunkEntry {
    pub(crate) chunk: Option<Box<dyn SegmentChunk>>,
    pub(crate) position: Position,
    pub(crate) times: SegmentTimes,
}

impl ChunkEntry {
    pub fn invalid() -> Self {
        Self {
            chunk: None,
            position: Position::invalid(),
            times: SegmentTimes::default(),
        }
    }

    pub fn new(chunk: Box<dyn SegmentChunk>, position: Position, times: SegmentTimes) -> Self {
        Self {
            chunk: Some(chunk),
            position,
            times,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.chunk.is_some() && self.position.is_valid()
    }
}

#[derive(Default)]
pub struct ChunkQueue {
    entries: VecDeque<ChunkEntry>,
}

impl ChunkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: ChunkEntry) {
        self.entries.push_back(entry);
    }

    pub fn front(&self) -> Option<&ChunkEntry> {
        self.entries.front()
    }

    pub fn pop(&mut self) -> Option<ChunkEntry> {
        self.entries.pop_front()
    }

    /// Drop all queued entries, releasing any unconsumed chunks.
    pub fn flush(&mut self) {
        self.entries.clear();
    }
}
