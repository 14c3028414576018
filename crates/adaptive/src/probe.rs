//! Probeable chunk wrapper.
//!
//! Format probing must not consume bytes the demuxer still needs, so the
//! wrapper buffers the peeked prefix and transparently replays it before
//! forwarding further reads to the wrapped chunk.

use bytes::BytesMut;
use tracing::warn;

use crate::chunk::{ChunkError, SegmentChunk};
use crate::format::{StreamFormat, detect_format};

/// How far probing may look into a chunk. Enough for every magic-byte check,
/// including the second TS sync byte at offset 188.
pub const PROBE_PREFIX_LEN: usize = 4096;

const READ_STEP: usize = 1024;

pub struct ProbeableChunk {
    inner: Box<dyn SegmentChunk>,
    replay: BytesMut,
}

impl ProbeableChunk {
    pub fn new(inner: Box<dyn SegmentChunk>) -> Self {
        Self {
            inner,
            replay: BytesMut::new(),
        }
    }

    /// Buffer up to `limit` bytes from the wrapped chunk without consuming
    /// them; later `read` calls see the same bytes again.
    pub fn peek(&mut self, limit: usize) -> Result<&[u8], ChunkError> {
        let mut step = [0u8; READ_STEP];
        while self.replay.len() < limit {
            let wanted = (limit - self.replay.len()).min(READ_STEP);
            let n = self.inner.read(&mut step[..wanted])?;
            if n == 0 {
                break;
            }
            self.replay.extend_from_slice(&step[..n]);
        }
        let end = self.replay.len().min(limit);
        Ok(&self.replay[..end])
    }

    /// Resolve the stream format from the peeked prefix.
    pub fn probe_format(&mut self) -> StreamFormat {
        match self.peek(PROBE_PREFIX_LEN) {
            Ok(prefix) => detect_format(prefix),
            Err(e) => {
                warn!("probe read failed: {e}");
                StreamFormat::Unknown
            }
        }
    }
}

impl SegmentChunk for ProbeableChunk {
    fn stream_format(&self) -> StreamFormat {
        self.inner.stream_format()
    }

    fn set_stream_format(&mut self, format: StreamFormat) {
        self.inner.set_stream_format(format);
    }

    fn discontinuity(&self) -> bool {
        self.inner.discontinuity()
    }

    fn discontinuity_sequence(&self) -> u64 {
        self.inner.discontinuity_sequence()
    }

    fn content_type(&self) -> Option<&str> {
        self.inner.content_type()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ChunkError> {
        if !self.replay.is_empty() {
            let n = buf.len().min(self.replay.len());
            let drained = self.replay.split_to(n);
            buf[..n].copy_from_slice(&drained);
            return Ok(n);
        }
        self.inner.read(buf)
    }
}
