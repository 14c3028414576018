//! Tracker lifecycle events and their synchronous fan-out.
//!
//! Events are the only way downstream components learn about structural
//! changes: representation switches, discontinuities, format changes, gaps,
//! buffering telemetry. Delivery is synchronous and in registration order;
//! the relative ordering of events emitted by a single pull is part of the
//! tracker contract, so the dispatch must never be deferred to a queue.

use std::fmt;
use std::sync::{Arc, Weak};

use tracing::trace;

use crate::format::StreamFormat;
use crate::representation::Representation;
use crate::timeline::{MediaTime, SegmentTimes};

/// Non-owning handle to a representation, valid for the duration of dispatch.
pub type RepresentationHandle = Arc<dyn Representation>;

#[derive(Clone)]
pub enum TrackerEvent {
    /// The media timeline restarts with the chunk just delivered.
    Discontinuity { sequence: u64 },
    /// Segment numbers were skipped (live window moved past them).
    SegmentGap,
    /// The tracker moved from `prev` to `next`. Either side may be absent
    /// (start of playback, reset).
    RepresentationSwitch {
        prev: Option<RepresentationHandle>,
        next: Option<RepresentationHandle>,
    },
    /// A local playlist refresh changed the representation's state.
    RepresentationUpdated { rep: RepresentationHandle },
    /// A live representation can no longer be refreshed.
    RepresentationUpdateFailed { rep: RepresentationHandle },
    /// The probed stream format differs from the previous one.
    FormatChange { format: StreamFormat },
    /// A chunk was delivered, with its timing metadata.
    SegmentChange {
        adaptation_set_id: u64,
        sequence: u64,
        times: SegmentTimes,
    },
    /// Downstream buffering was enabled or disabled.
    BufferingStateUpdate { id: u64, enabled: bool },
    /// Downstream buffer level moved.
    BufferingLevelChange {
        id: u64,
        minimum: MediaTime,
        maximum: MediaTime,
        current: MediaTime,
        target: MediaTime,
    },
    /// The playback cursor was repositioned.
    PositionChange { resume_time: Option<MediaTime> },
}

impl TrackerEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            TrackerEvent::Discontinuity { .. } => "discontinuity",
            TrackerEvent::SegmentGap => "segment_gap",
            TrackerEvent::RepresentationSwitch { .. } => "representation_switch",
            TrackerEvent::RepresentationUpdated { .. } => "representation_updated",
            TrackerEvent::RepresentationUpdateFailed { .. } => "representation_update_failed",
            TrackerEvent::FormatChange { .. } => "format_change",
            TrackerEvent::SegmentChange { .. } => "segment_change",
            TrackerEvent::BufferingStateUpdate { .. } => "buffering_state_update",
            TrackerEvent::BufferingLevelChange { .. } => "buffering_level_change",
            TrackerEvent::PositionChange { .. } => "position_change",
        }
    }
}

impl fmt::Debug for TrackerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = |rep: &Option<RepresentationHandle>| {
            rep.as_ref().map(|r| r.id().to_string())
        };
        match self {
            TrackerEvent::Discontinuity { sequence } => f
                .debug_struct("Discontinuity")
                .field("sequence", sequence)
                .finish(),
            TrackerEvent::SegmentGap => write!(f, "SegmentGap"),
            TrackerEvent::RepresentationSwitch { prev, next } => f
                .debug_struct("RepresentationSwitch")
                .field("prev", &id(prev))
                .field("next", &id(next))
                .finish(),
            TrackerEvent::RepresentationUpdated { rep } => f
                .debug_struct("RepresentationUpdated")
                .field("rep", &rep.id())
                .finish(),
            TrackerEvent::RepresentationUpdateFailed { rep } => f
                .debug_struct("RepresentationUpdateFailed")
                .field("rep", &rep.id())
                .finish(),
            TrackerEvent::FormatChange { format } => f
                .debug_struct("FormatChange")
                .field("format", format)
                .finish(),
            TrackerEvent::SegmentChange {
                adaptation_set_id,
                sequence,
                times,
            } => f
                .debug_struct("SegmentChange")
                .field("adaptation_set_id", adaptation_set_id)
                .field("sequence", sequence)
                .field("times", times)
                .finish(),
            TrackerEvent::BufferingStateUpdate { id, enabled } => f
                .debug_struct("BufferingStateUpdate")
                .field("id", id)
                .field("enabled", enabled)
                .finish(),
            TrackerEvent::BufferingLevelChange {
                id,
                minimum,
                maximum,
                current,
                target,
            } => f
                .debug_struct("BufferingLevelChange")
                .field("id", id)
                .field("minimum", minimum)
                .field("maximum", maximum)
                .field("current", current)
                .field("target", target)
                .finish(),
            TrackerEvent::PositionChange { resume_time } => f
                .debug_struct("PositionChange")
                .field("resume_time", resume_time)
                .finish(),
        }
    }
}

/// Receives tracker events synchronously.
///
/// The event reference is valid only for the duration of the call. Listeners
/// must not call mutating tracker operations from inside the callback.
pub trait TrackerEventListener: Send + Sync {
    fn on_tracker_event(&self, event: &TrackerEvent);
}

/// Ordered fan-out to non-owning listener handles.
///
/// Listeners that have been dropped are skipped during dispatch and pruned on
/// the next registration.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: Vec<Weak<dyn TrackerEventListener>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: &Arc<dyn TrackerEventListener>) {
        self.listeners.retain(|weak| weak.strong_count() > 0);
        self.listeners.push(Arc::downgrade(listener));
    }

    /// Deliver `event` to every live listener, in registration order.
    pub fn notify(&self, event: &TrackerEvent) {
        trace!(event = event.kind(), "dispatching tracker event");
        for weak in &self.listeners {
            if let Some(listener) = weak.upgrade() {
                listener.on_tracker_event(event);
            }
        }
    }
}
