//! Time and track vocabulary shared across the tracker.

use std::fmt::Display;
use std::ops::{Add, AddAssign, Sub};
use std::time::Duration;

/// A media timestamp or span, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct MediaTime(i64);

impl MediaTime {
    pub const ZERO: MediaTime = MediaTime(0);

    #[inline]
    pub const fn from_micros(micros: i64) -> Self {
        MediaTime(micros)
    }

    #[inline]
    pub const fn from_millis(millis: i64) -> Self {
        MediaTime(millis * 1_000)
    }

    #[inline]
    pub const fn from_secs(secs: i64) -> Self {
        MediaTime(secs * 1_000_000)
    }

    #[inline]
    pub const fn as_micros(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Convert to a `Duration`, clamping negative values to zero.
    #[inline]
    pub fn as_duration(self) -> Duration {
        Duration::from_micros(self.0.max(0) as u64)
    }
}

impl Add for MediaTime {
    type Output = MediaTime;

    fn add(self, rhs: MediaTime) -> MediaTime {
        MediaTime(self.0 + rhs.0)
    }
}

impl AddAssign for MediaTime {
    fn add_assign(&mut self, rhs: MediaTime) {
        self.0 += rhs.0;
    }
}

impl Sub for MediaTime {
    type Output = MediaTime;

    fn sub(self, rhs: MediaTime) -> MediaTime {
        MediaTime(self.0 - rhs.0)
    }
}

impl Display for MediaTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}s", self.0 as f64 / 1_000_000.0)
    }
}

/// Timing metadata attached to a prepared chunk and carried by segment events.
///
/// `start` and `duration` come from the representation's timeline; `display`
/// always comes from the data segment itself, whichever phase the chunk
/// belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SegmentTimes {
    pub start: MediaTime,
    pub duration: MediaTime,
    pub display: MediaTime,
}

/// Addressable playback range of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackRange {
    pub start: MediaTime,
    pub end: MediaTime,
    pub length: MediaTime,
}

/// The kind of track an adaptation set carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamRole {
    Video,
    Audio,
    Subtitles,
}

impl Display for StreamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamRole::Video => write!(f, "video"),
            StreamRole::Audio => write!(f, "audio"),
            StreamRole::Subtitles => write!(f, "subtitles"),
        }
    }
}
