// crates/correlate-engine/tests/proptest_scoring.rs
// ============================================================================
// Module: Scoring Property-Based Tests
// Description: Property tests for the simple fallback scorer's invariants.
// Purpose: Detect panics and out-of-range scores across wide input ranges.
// ============================================================================

//! Property-based tests for [`SimpleFallbackScorer`] invariants.

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

use std::collections::BTreeMap;

use correlate_core::ConfidenceCategory;
use correlate_core::FeatherId;
use correlate_core::Match;
use correlate_core::MatchId;
use correlate_core::RecordTimestamp;
use correlate_engine::SimpleFallbackScorer;
use correlate_engine::score_with_fallback;
use proptest::prelude::*;

fn sample_match(feather_count: usize) -> Match {
    let ts = RecordTimestamp::parse("2024-01-01T00:00:00").expect("parseable");
    let mut feather_records = BTreeMap::new();
    for index in 0..feather_count {
        feather_records.insert(FeatherId::new(format!("f{index}")), Vec::new());
    }
    Match {
        match_id: MatchId::new("m1"),
        timestamp: ts,
        anchor_start: ts,
        anchor_end: ts,
        anchor_record_count: feather_count,
        anchor_feather_id: FeatherId::new("f0"),
        anchor_artifact_type: "prefetch".to_string(),
        feather_records,
        feather_count,
        time_spread_seconds: 0,
        match_score: 0.0,
        confidence_score: 0.0,
        confidence_category: ConfidenceCategory::Minimal,
        weighted_score: None,
        score_breakdown: None,
        matched_application: String::new(),
        matched_file_path: String::new(),
        sub_identities: Vec::new(),
        has_sub_identities: false,
        sub_identity_count: 0,
        is_duplicate: false,
        duplicate_info: None,
        semantic_data: None,
    }
}

proptest! {
    #[test]
    fn fallback_score_is_always_in_unit_range(feather_count in 0_usize..64, wing_total_feathers in 0_usize..64) {
        let feather_count = feather_count.min(wing_total_feathers);
        let mut built_match = sample_match(feather_count);
        score_with_fallback(&SimpleFallbackScorer, &mut built_match, wing_total_feathers);
        prop_assert!((0.0..=1.0).contains(&built_match.match_score));
        prop_assert!((0.0..=1.0).contains(&built_match.confidence_score));
    }

    #[test]
    fn fallback_score_is_monotonic_in_feather_count(wing_total_feathers in 1_usize..32, a in 0_usize..32, b in 0_usize..32) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let mut low_match = sample_match(low.min(wing_total_feathers));
        let mut high_match = sample_match(high.min(wing_total_feathers));
        score_with_fallback(&SimpleFallbackScorer, &mut low_match, wing_total_feathers);
        score_with_fallback(&SimpleFallbackScorer, &mut high_match, wing_total_feathers);
        prop_assert!(low_match.match_score <= high_match.match_score);
    }

    #[test]
    fn zero_wing_total_always_scores_half(feather_count in 0_usize..64) {
        let mut built_match = sample_match(feather_count);
        score_with_fallback(&SimpleFallbackScorer, &mut built_match, 0);
        prop_assert!((built_match.match_score - 0.5).abs() < f64::EPSILON);
    }
}
