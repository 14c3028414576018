//! Playback cursor over one representation's segment numbering.
//!
//! A position advances through three phases per media segment: init segment,
//! index segment, media data. The position is the sole authority on the
//! current phase; it never consults the representation.

use std::fmt;
use std::sync::Arc;

use crate::representation::Representation;

/// Sentinel stored for "no segment number". Exposed as `None` at API edges.
pub(crate) const SEGMENT_NUMBER_UNSET: u64 = u64::MAX;

#[derive(Clone)]
pub struct Position {
    pub(crate) rep: Option<Arc<dyn Representation>>,
    pub(crate) number: u64,
    pub(crate) init_sent: bool,
    pub(crate) index_sent: bool,
}

impl Position {
    /// A position pointing nowhere.
    pub fn invalid() -> Self {
        Self {
            rep: None,
            number: SEGMENT_NUMBER_UNSET,
            init_sent: false,
            index_sent: false,
        }
    }

    /// A fresh position on `rep` at `number`, with nothing emitted yet.
    pub fn new(rep: Arc<dyn Representation>, number: u64) -> Self {
        Self {
            rep: Some(rep),
            number,
            init_sent: false,
            index_sent: false,
        }
    }

    /// A tentative position carrying only a representation. Invalid until a
    /// segment number is assigned.
    pub fn with_representation(rep: Arc<dyn Representation>) -> Self {
        Self {
            rep: Some(rep),
            number: SEGMENT_NUMBER_UNSET,
            init_sent: false,
            index_sent: false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.rep.is_some() && self.number != SEGMENT_NUMBER_UNSET
    }

    pub fn number(&self) -> Option<u64> {
        (self.number != SEGMENT_NUMBER_UNSET).then_some(self.number)
    }

    pub fn representation(&self) -> Option<&Arc<dyn Representation>> {
        self.rep.as_ref()
    }

    pub(crate) fn rep_id(&self) -> Option<&str> {
        self.rep.as_deref().map(|r| r.id())
    }

    pub fn in_init_phase(&self) -> bool {
        self.is_valid() && !self.init_sent
    }

    pub fn in_index_phase(&self) -> bool {
        self.is_valid() && self.init_sent && !self.index_sent
    }

    pub fn in_media_phase(&self) -> bool {
        self.is_valid() && self.init_sent && self.index_sent
    }

    /// Advance exactly one phase. In media phase the segment number moves and
    /// the phase flags stay set; on an invalid position this is a no-op.
    pub fn increment(&mut self) {
        if !self.is_valid() {
            return;
        }
        if !self.init_sent {
            self.init_sent = true;
        } else if !self.index_sent {
            self.index_sent = true;
        } else {
            self.number += 1;
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::invalid()
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Position")
            .field("rep", &self.rep_id())
            .field("number", &self.number())
            .field("init_sent", &self.init_sent)
            .field("index_sent", &self.index_sent)
            .finish()
    }
}
