// crates/correlate-core/src/time.rs
// ============================================================================
// Module: Correlate Timestamps
// Description: ISO-8601 timestamp parsing, formatting, and window math.
// Purpose: Give every component in the engine one shared timestamp type
//          instead of passing raw strings and re-parsing them repeatedly.
// Dependencies: chrono, serde
// ============================================================================

//! ## Overview
//! Records carry timestamps as arbitrary strings under a field name drawn
//! from `timestamp_field_patterns` (spec.md §4.1). This module turns those
//! strings into a canonical [`RecordTimestamp`] once, at extraction time, so
//! every downstream component (the anchor clusterer, the pre-filters, the
//! match builder) works against a single parsed representation.

use std::fmt;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::TimeZone;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Formats tried in order against a candidate timestamp string, covering
/// the common shapes feather timestamp columns use.
const PARSE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y",
];

/// A parsed, UTC-normalized timestamp.
///
/// # Invariants
/// - Always expressed in UTC; callers must not assume the source record
///   carried timezone information (none of `PARSE_FORMATS` do).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordTimestamp(DateTime<Utc>);

impl RecordTimestamp {
    /// Wraps an already-resolved UTC instant.
    #[must_use]
    pub const fn from_utc(value: DateTime<Utc>) -> Self {
        Self(value)
    }

    /// Parses a raw field value against the known timestamp formats,
    /// also accepting RFC 3339 directly (the common case for already
    /// well-formed ISO-8601 strings).
    ///
    /// Returns `None` rather than an error: an unparseable timestamp is a
    /// data condition, not a failure (spec.md §7) — the caller routes the
    /// record to the no-timestamp anchor.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(Self(parsed.with_timezone(&Utc)));
        }
        for format in PARSE_FORMATS {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Some(Self(Utc.from_utc_datetime(&parsed)));
            }
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
                let Some(start_of_day) = date.and_hms_opt(0, 0, 0) else {
                    continue;
                };
                return Some(Self(Utc.from_utc_datetime(&start_of_day)));
            }
        }
        None
    }

    /// Renders the timestamp as an ISO-8601 string (spec.md §3, Anchor).
    #[must_use]
    pub fn to_iso8601(self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
    }

    /// Renders the timestamp in the compact `yyyymmdd_HHMMSS` form used by
    /// generated run names (spec.md §6.3).
    #[must_use]
    pub fn to_compact_timestamp(self) -> String {
        self.0.format("%Y%m%d_%H%M%S").to_string()
    }

    /// Returns the underlying UTC instant.
    #[must_use]
    pub const fn as_utc(self) -> DateTime<Utc> {
        self.0
    }

    /// Absolute difference between two timestamps, in whole minutes
    /// (rounded to the nearest minute).
    #[must_use]
    pub fn abs_diff_minutes(self, other: Self) -> i64 {
        let seconds = self.0.signed_duration_since(other.0).num_seconds().abs();
        (seconds + 30) / 60
    }
}

impl fmt::Display for RecordTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

#[cfg(test)]
mod tests {
    use super::RecordTimestamp;

    #[test]
    fn parses_naive_iso_timestamp() {
        let ts = RecordTimestamp::parse("2024-01-01T10:00:00").expect("parseable");
        assert_eq!(ts.to_iso8601(), "2024-01-01T10:00:00");
    }

    #[test]
    fn parses_date_only() {
        let ts = RecordTimestamp::parse("2024-02-01").expect("parseable");
        assert_eq!(ts.to_iso8601(), "2024-02-01T00:00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(RecordTimestamp::parse("not-a-timestamp").is_none());
        assert!(RecordTimestamp::parse("").is_none());
    }

    #[test]
    fn to_compact_timestamp_has_no_separators() {
        let ts = RecordTimestamp::parse("2024-03-07T09:05:02").expect("parseable");
        assert_eq!(ts.to_compact_timestamp(), "20240307_090502");
    }

    #[test]
    fn abs_diff_minutes_is_symmetric() {
        let a = RecordTimestamp::parse("2024-01-01T10:00:00").expect("parseable");
        let b = RecordTimestamp::parse("2024-01-01T10:02:00").expect("parseable");
        assert_eq!(a.abs_diff_minutes(b), 2);
        assert_eq!(b.abs_diff_minutes(a), 2);
    }
}
