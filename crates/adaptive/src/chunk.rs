//! Chunk seams.
//!
//! A [`SegmentChunk`] is the byte-bearing object handed to the downstream
//! demuxer; a [`ChunkLoader`] is the connection-manager abstraction that
//! materialises chunks. The tracker never fetches bytes itself, it only
//! threads the loader through to the segment being materialised.

use std::sync::Arc;

use bytes::{Buf, Bytes};

use crate::format::StreamFormat;

/// Error surfaced by chunk loading and reading.
#[derive(Debug, thiserror::Error, Clone)]
pub enum ChunkError {
    #[error("network error: {0}")]
    Network(String),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: Arc<std::io::Error>,
    },
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

// Manual impl because of the Arc wrapping.
impl From<std::io::Error> for ChunkError {
    fn from(err: std::io::Error) -> Self {
        ChunkError::Io {
            source: Arc::new(err),
        }
    }
}

/// A materialised media chunk, consumed by the demuxer through `read`.
pub trait SegmentChunk: Send {
    /// Format of the bytes this chunk carries, `Unknown` until probed.
    fn stream_format(&self) -> StreamFormat;

    /// Record the resolved format on the chunk.
    fn set_stream_format(&mut self, format: StreamFormat);

    /// Whether the media timeline restarts at this chunk.
    fn discontinuity(&self) -> bool {
        false
    }

    /// Discontinuity sequence the chunk belongs to.
    fn discontinuity_sequence(&self) -> u64 {
        0
    }

    /// MIME content type reported by the transport, if any.
    fn content_type(&self) -> Option<&str> {
        None
    }

    /// Read up to `buf.len()` bytes into `buf`. `Ok(0)` is end of chunk.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ChunkError>;
}

/// Connection-manager seam: opens a segment resource and returns its bytes.
///
/// Implementations own the HTTP/connection details; the tracker only passes
/// the loader through to [`Segment::to_chunk`](crate::representation::Segment).
pub trait ChunkLoader: Send + Sync {
    /// Fetch `uri`, optionally restricted to a byte range `(start, end)`.
    fn fetch(&self, uri: &str, range: Option<(u64, Option<u64>)>) -> Result<Bytes, ChunkError>;
}

/// Chunk over bytes already in memory.
#[derive(Debug, Clone)]
pub struct MemoryChunk {
    data: Bytes,
    format: StreamFormat,
    discontinuity: bool,
    discontinuity_sequence: u64,
    content_type: Option<String>,
}

impl MemoryChunk {
    pub fn new(data: Bytes) -> Self {
        MemoryChunk {
            data,
            format: StreamFormat::Unknown,
            discontinuity: false,
            discontinuity_sequence: 0,
            content_type: None,
        }
    }

    pub fn with_format(mut self, format: StreamFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_discontinuity(mut self, sequence: u64) -> Self {
        self.discontinuity = true;
        self.discontinuity_sequence = sequence;
        self
    }

    pub fn with_discontinuity_sequence(mut self, sequence: u64) -> Self {
        self.discontinuity_sequence = sequence;
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Bytes not yet consumed by `read`.
    pub fn remaining(&self) -> usize {
        self.data.remaining()
    }
}

impl SegmentChunk for MemoryChunk {
    fn stream_format(&self) -> StreamFormat {
        self.format
    }

    fn set_stream_format(&mut self, format: StreamFormat) {
        self.format = format;
    }

    fn discontinuity(&self) -> bool {
        self.discontinuity
    }

    fn discontinuity_sequence(&self) -> u64 {
        self.discontinuity_sequence
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ChunkError> {
        let n = buf.len().min(self.data.remaining());
        self.data.copy_to_slice(&mut buf[..n]);
        Ok(n)
    }
}
