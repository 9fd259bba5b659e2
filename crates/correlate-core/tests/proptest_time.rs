// crates/correlate-core/tests/proptest_time.rs
// ============================================================================
// Module: Timestamp Property-Based Tests
// Description: Property tests for RecordTimestamp parsing and arithmetic.
// Purpose: Detect panics and invariant violations across wide input ranges.
// ============================================================================

//! Property-based tests for [`RecordTimestamp`] invariants.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use chrono::DateTime;
use chrono::Utc;
use correlate_core::RecordTimestamp;
use proptest::prelude::*;

proptest! {
    #[test]
    fn to_iso8601_round_trips_through_parse(seconds in 0_i64..4_102_444_800_i64) {
        let Some(instant) = DateTime::<Utc>::from_timestamp(seconds, 0) else {
            return Ok(());
        };
        let ts = RecordTimestamp::from_utc(instant);
        let rendered = ts.to_iso8601();
        let reparsed = RecordTimestamp::parse(&rendered);
        prop_assert_eq!(reparsed, Some(ts));
    }

    #[test]
    fn abs_diff_minutes_is_symmetric(a_seconds in 0_i64..4_102_444_800_i64, b_seconds in 0_i64..4_102_444_800_i64) {
        let (Some(a_instant), Some(b_instant)) = (DateTime::<Utc>::from_timestamp(a_seconds, 0), DateTime::<Utc>::from_timestamp(b_seconds, 0)) else {
            return Ok(());
        };
        let a = RecordTimestamp::from_utc(a_instant);
        let b = RecordTimestamp::from_utc(b_instant);
        prop_assert_eq!(a.abs_diff_minutes(b), b.abs_diff_minutes(a));
    }

    #[test]
    fn abs_diff_minutes_is_zero_for_equal_timestamps(seconds in 0_i64..4_102_444_800_i64) {
        let Some(instant) = DateTime::<Utc>::from_timestamp(seconds, 0) else {
            return Ok(());
        };
        let ts = RecordTimestamp::from_utc(instant);
        prop_assert_eq!(ts.abs_diff_minutes(ts), 0);
    }

    #[test]
    fn parse_never_panics_on_arbitrary_strings(raw in ".{0,64}") {
        let _ = RecordTimestamp::parse(&raw);
    }
}
