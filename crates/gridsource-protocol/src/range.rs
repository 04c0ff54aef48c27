//! Wire time-range parsing.
//!
//! `/query` and `/annotations` send ISO-like timestamps, `/panels` sends
//! epoch milliseconds. Both end up as the same `(after, until]` range.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use gridsource_core::TimeRange;

use crate::error::{ProtocolError, ProtocolResult};
use crate::wire::RawRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeUnit {
    Iso,
    EpochMillis,
}

/// Zone-less layouts, taken as UTC.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

pub fn parse_wire_range(raw: &RawRange, unit: RangeUnit) -> ProtocolResult<TimeRange> {
    Ok(TimeRange::new(
        parse_instant(&raw.from, unit)?,
        parse_instant(&raw.to, unit)?,
    ))
}

pub fn parse_instant(raw: &str, unit: RangeUnit) -> ProtocolResult<DateTime<Utc>> {
    let value = raw.trim();
    let parsed = match unit {
        RangeUnit::Iso => parse_iso(value),
        RangeUnit::EpochMillis => value
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis),
    };
    parsed.ok_or_else(|| ProtocolError::MalformedTimestamp {
        value: raw.to_string(),
        expected: match unit {
            RangeUnit::Iso => "an ISO 8601 timestamp",
            RangeUnit::EpochMillis => "epoch milliseconds",
        },
    })
}

fn parse_iso(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
