// crates/correlate-engine/src/scoring.rs
// ============================================================================
// Module: Scoring
// Description: Pluggable match scoring with a simple feather-coverage
//              fallback.
// Purpose: Implement spec.md §4.6's ScoreConfigManager contract as a Rust
//          trait with a default fallback implementation.
// Dependencies: correlate-core
// ============================================================================

//! ## Overview
//! [`ScoreConfigManager`] is the seam a host application plugs a real
//! scoring backend into (spec.md §4.6); `correlate-engine` ships only
//! [`SimpleFallbackScorer`], which implements the exact fallback formula
//! spec.md §4.6 specifies and is always available. Scoring errors are
//! logged and never fatal (spec.md §4.6) — `score` returns `WeightedScore`
//! directly rather than a `Result`, since every implementation is expected
//! to recover internally and fall back rather than propagate.

use correlate_core::Match;
use correlate_core::ScoreContribution;
use correlate_core::WeightedScore;
use tracing::warn;

/// A pluggable scoring backend (spec.md §4.6).
///
/// Implementations must never panic; a scoring failure should be logged
/// and degrade to a conservative score rather than propagate.
pub trait ScoreConfigManager: Send + Sync {
    /// Computes a weighted score for `built_match` within `wing_total_feathers`.
    fn compute_score(&self, built_match: &Match, wing_total_feathers: usize) -> WeightedScore;
}

/// The always-available fallback scorer (spec.md §4.6):
/// `score = feather_count / total_feathers` (`0.5` if `total_feathers == 0`),
/// banded into a human-readable interpretation by coverage percentage.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleFallbackScorer;

impl ScoreConfigManager for SimpleFallbackScorer {
    fn compute_score(&self, built_match: &Match, wing_total_feathers: usize) -> WeightedScore {
        let score = if wing_total_feathers == 0 {
            0.5
        } else {
            #[expect(
                clippy::cast_precision_loss,
                reason = "feather counts are small; precision loss is immaterial to a [0,1] score"
            )]
            {
                built_match.feather_count as f64 / wing_total_feathers as f64
            }
        };
        let interpretation = interpret_simple(score).to_string();
        let breakdown = built_match
            .feather_records
            .keys()
            .map(|feather_id| ScoreContribution {
                feather_id: feather_id.clone(),
                weight: 1.0,
                raw_value: 1.0,
            })
            .collect();
        WeightedScore { score, interpretation, breakdown, scoring_mode: "simple_count".to_string() }
    }
}

/// Bands a `[0, 1]` coverage ratio into the simple-scorer's interpretation
/// labels (spec.md §4.6): `>=80%` Strong Match, `>=50%` Good Match,
/// `>=25%` Partial Match, else Weak Match.
fn interpret_simple(score: f64) -> &'static str {
    if score >= 0.8 {
        "Strong Match"
    } else if score >= 0.5 {
        "Good Match"
    } else if score >= 0.25 {
        "Partial Match"
    } else {
        "Weak Match"
    }
}

/// Applies `manager` to `built_match`, logging and falling back to
/// [`SimpleFallbackScorer`] behavior on any out-of-range result
/// (spec.md §4.6, "Scoring errors are logged, never fatal").
pub fn score_with_fallback(
    manager: &dyn ScoreConfigManager,
    built_match: &mut Match,
    wing_total_feathers: usize,
) {
    let weighted = manager.compute_score(built_match, wing_total_feathers);
    if !(0.0..=1.0).contains(&weighted.score) {
        warn!(score = weighted.score, "scoring backend returned an out-of-range score; using fallback");
        let fallback = SimpleFallbackScorer.compute_score(built_match, wing_total_feathers);
        built_match.match_score = fallback.score;
        built_match.confidence_score = fallback.score;
        built_match.confidence_category = correlate_core::ConfidenceCategory::from_score(fallback.score);
        built_match.weighted_score = Some(fallback);
        return;
    }
    built_match.match_score = weighted.score;
    built_match.confidence_score = weighted.score;
    built_match.confidence_category = correlate_core::ConfidenceCategory::from_score(weighted.score);
    built_match.score_breakdown = Some(weighted.breakdown.clone());
    built_match.weighted_score = Some(weighted);
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use correlate_core::ConfidenceCategory;
    use correlate_core::FeatherId;
    use correlate_core::MatchId;
    use correlate_core::RecordTimestamp;

    use super::SimpleFallbackScorer;
    use super::score_with_fallback;
    use correlate_core::Match;

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

    #[test]
    fn full_coverage_scores_one() {
        let mut built_match = sample_match(2);
        score_with_fallback(&SimpleFallbackScorer, &mut built_match, 2);
        assert!((built_match.match_score - 1.0).abs() < f64::EPSILON);
        assert_eq!(built_match.confidence_category, ConfidenceCategory::Critical);
    }

    #[test]
    fn zero_total_feathers_scores_half() {
        let mut built_match = sample_match(1);
        score_with_fallback(&SimpleFallbackScorer, &mut built_match, 0);
        assert!((built_match.match_score - 0.5).abs() < f64::EPSILON);
    }
}
