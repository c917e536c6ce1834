//! Time-slot arithmetic.
//!
//! All scheduling logic in the workspace shares the half-open interval
//! semantics defined here: a slot covers `[start, end)`, and two slots
//! overlap iff `start < other.end && end > other.start`.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::{Duration, OffsetDateTime};

/// A half-open time interval `[start, end)` with `end` strictly after `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
}

impl TimeSlot {
    /// Creates a slot, rejecting empty or inverted intervals.
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self> {
        if end <= start {
            return Err(CoreError::invalid_time_range(start, end));
        }
        Ok(Self { start, end })
    }

    /// Creates a slot of `duration_minutes` starting at `start`.
    ///
    /// The duration must be positive; zero-length slots are rejected.
    pub fn from_start(start: OffsetDateTime, duration_minutes: u32) -> Result<Self> {
        if duration_minutes == 0 {
            return Err(CoreError::InvalidDuration(duration_minutes));
        }
        Ok(Self {
            start,
            end: start + Duration::minutes(i64::from(duration_minutes)),
        })
    }

    /// Half-open overlap predicate.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Whether `other` lies entirely within this slot.
    pub fn contains(&self, other: &TimeSlot) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether the instant falls inside the slot (start inclusive, end exclusive).
    pub fn contains_instant(&self, instant: OffsetDateTime) -> bool {
        self.start <= instant && instant < self.end
    }

    /// The slot widened by `minutes` on both sides.
    ///
    /// Used to apply the configured appointment buffer when testing
    /// candidate slots against booked intervals.
    pub fn padded(&self, minutes: u32) -> TimeSlot {
        let pad = Duration::minutes(i64::from(minutes));
        TimeSlot {
            start: self.start - pad,
            end: self.end + pad,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {})", self.start, self.end)
    }
}

/// Current UTC instant.
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Rounds an instant down to the previous `step_minutes` boundary of its day,
/// dropping seconds and sub-second precision.
pub fn round_down_to_step(instant: OffsetDateTime, step_minutes: u32) -> OffsetDateTime {
    let step = i64::from(step_minutes.max(1));
    let minutes_into_day = i64::from(instant.hour()) * 60 + i64::from(instant.minute());
    let remainder = minutes_into_day % step;
    instant
        - Duration::minutes(remainder)
        - Duration::seconds(i64::from(instant.second()))
        - Duration::nanoseconds(i64::from(instant.nanosecond()))
}
