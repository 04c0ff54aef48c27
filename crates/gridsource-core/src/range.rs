//! Query time ranges.
//!
//! A range selects every point strictly after `after` and up to and
//! including `until`, i.e. `(after, until]`. Readers must honor this
//! boundary convention; [`crate::TimeSeries::slice`] applies it.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Half-open-on-the-left time interval `(after, until]` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    /// Exclusive lower bound.
    #[serde(rename = "$gt")]
    pub after: DateTime<Utc>,
    /// Inclusive upper bound.
    #[serde(rename = "$lte")]
    pub until: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(after: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self { after, until }
    }

    /// Build a range from epoch milliseconds. Returns `None` when either
    /// bound is outside chrono's representable range.
    pub fn from_millis(after_ms: i64, until_ms: i64) -> Option<Self> {
        Some(Self {
            after: DateTime::from_timestamp_millis(after_ms)?,
            until: DateTime::from_timestamp_millis(until_ms)?,
        })
    }

    /// Whether `ts` falls inside `(after, until]`.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts > self.after && ts <= self.until
    }

    pub fn is_empty(&self) -> bool {
        self.after >= self.until
    }
}
