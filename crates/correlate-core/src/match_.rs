// crates/correlate-core/src/match_.rs
// ============================================================================
// Module: Correlate Matches
// Description: The externally visible correlation unit.
// Purpose: Hold every field spec.md §3 names for a Match, plus the scoring
//          and semantic-enrichment data attached to it in later phases.
// Dependencies: correlate-core::{ids, record, time}
// ============================================================================

//! ## Overview
//! A [`Match`] is 1-to-1 with a row in the `matches` table (spec.md §6.3).
//! It is built once by the Match Builder (`match_score`/`semantic_data`
//! start at their phase-one defaults) and is later updated in place by the
//! Identity-Semantic Post-Phase, which only ever touches `semantic_data`.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::ids::FeatherId;
use crate::ids::MatchId;
use crate::record::Record;
use crate::time::RecordTimestamp;

/// The qualitative confidence band a numeric score falls into
/// (spec.md §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceCategory {
    /// Highest confidence band.
    Critical,
    /// High confidence band.
    High,
    /// Medium confidence band.
    Medium,
    /// Low confidence band.
    Low,
    /// Lowest confidence band.
    Minimal,
}

impl ConfidenceCategory {
    /// Buckets a `[0, 1]` score into a confidence category using the
    /// fallback thresholds (spec.md §4.6): `>=0.8` Critical, `>=0.6` High,
    /// `>=0.4` Medium, `>=0.2` Low, else Minimal.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::Critical
        } else if score >= 0.6 {
            Self::High
        } else if score >= 0.4 {
            Self::Medium
        } else if score >= 0.2 {
            Self::Low
        } else {
            Self::Minimal
        }
    }
}

/// A per-feather contribution entry in a match's score breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreContribution {
    /// Feather that contributed this entry.
    pub feather_id: FeatherId,
    /// Weight assigned to this feather's contribution.
    pub weight: f64,
    /// Raw contribution value before weighting.
    pub raw_value: f64,
}

/// A weighted score produced by a pluggable scoring backend (spec.md
/// §4.6), as opposed to the simple feather-coverage fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedScore {
    /// Final weighted score in `[0, 1]`.
    pub score: f64,
    /// Human-readable interpretation of the score.
    pub interpretation: String,
    /// Per-feather contribution breakdown.
    pub breakdown: Vec<ScoreContribution>,
    /// Identifier of the scoring mode that produced this score.
    pub scoring_mode: String,
}

/// Semantic enrichment attached to a match field by the post-phase
/// (spec.md §4.10).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticMapping {
    /// Human-readable semantic meaning of the technical value.
    pub semantic_value: String,
    /// Raw technical value the mapping was derived from.
    pub technical_value: String,
    /// Description of what the mapping represents.
    pub description: String,
    /// Category the mapping rule belongs to.
    pub category: String,
    /// Confidence of the semantic rule that produced this mapping.
    pub confidence: f64,
    /// Name of the rule that produced this mapping.
    pub rule_name: String,
    /// Feather the mapped field was read from.
    pub feather_id: FeatherId,
}

/// Bookkeeping metadata attached alongside a match's semantic mappings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticMetadata {
    /// Number of mapping rules applied to this match.
    pub mappings_applied: usize,
    /// Total number of candidate mappings considered.
    pub mappings_count: usize,
    /// Engine type terminology this data was produced under.
    pub engine_type: String,
    /// Set when a per-match semantic failure occurred (spec.md §4.10 step
    /// 4); the match row is still retained.
    pub error: Option<String>,
}

/// The consolidated semantic enrichment for one match (spec.md §4.10
/// step 2). `None` until the post-phase runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticData {
    /// Mappings keyed by `<feather_id>.<field>`.
    pub mappings: BTreeMap<String, SemanticMapping>,
    /// Bookkeeping metadata for this semantic pass.
    pub metadata: SemanticMetadata,
}

/// Reserved duplicate-tracking metadata (spec.md §3: `is_duplicate`,
/// `duplicate_info`). Never populated by the correlation or semantic
/// phases; present for schema/forward-compatibility only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicateInfo {
    /// Match id this row is considered a duplicate of.
    pub duplicate_of: Option<MatchId>,
    /// Reason the duplicate determination was made.
    pub reason: Option<String>,
}

/// The externally visible correlation unit (spec.md §3, Match).
///
/// # Invariants
/// - `keys(feather_records) == {_feather_id values among contributing
///   rows}` and `feather_records.len() == feather_count`.
/// - Every per-feather list is duplicate-free under
///   `hash(ts, name, path, feather_id)`.
/// - `0 <= match_score <= 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Globally unique match identifier.
    pub match_id: MatchId,
    /// Anchor start time, used as the match's display timestamp.
    pub timestamp: RecordTimestamp,
    /// Start of the anchor's time range.
    pub anchor_start: RecordTimestamp,
    /// End of the anchor's time range.
    pub anchor_end: RecordTimestamp,
    /// Number of records in the source anchor (before per-feather dedup).
    pub anchor_record_count: usize,
    /// First feather id encountered while grouping anchor records
    /// (spec.md §9 Open Question; resolved in DESIGN.md).
    pub anchor_feather_id: FeatherId,
    /// Artifact type label for the anchor's originating feather.
    pub anchor_artifact_type: String,
    /// Deduplicated contributing records, grouped by feather.
    pub feather_records: BTreeMap<FeatherId, Vec<Record>>,
    /// Number of distinct feathers in `feather_records`.
    pub feather_count: usize,
    /// Always `0` for the identity engine (spec.md §3, §9); reserved for
    /// the sibling time-window engine.
    pub time_spread_seconds: u64,
    /// Normalized match score in `[0, 1]`.
    pub match_score: f64,
    /// Confidence score derived from `match_score` (defaults to
    /// `match_score` itself when no scoring plugin overrides it).
    pub confidence_score: f64,
    /// Qualitative confidence band for `confidence_score`.
    pub confidence_category: ConfidenceCategory,
    /// Optional weighted score from a pluggable scoring backend.
    pub weighted_score: Option<WeightedScore>,
    /// Optional per-feather score breakdown (simple-scoring fallback).
    pub score_breakdown: Option<Vec<ScoreContribution>>,
    /// Display name of the matched application/identity.
    pub matched_application: String,
    /// Display file path of the matched identity.
    pub matched_file_path: String,
    /// Sub-identity variants copied from the source identity.
    pub sub_identities: Vec<crate::identity::SubIdentity>,
    /// `true` if `sub_identities` is non-empty.
    pub has_sub_identities: bool,
    /// Number of sub-identity variants.
    pub sub_identity_count: usize,
    /// Reserved duplicate-tracking fields.
    pub is_duplicate: bool,
    /// Reserved duplicate-tracking detail.
    pub duplicate_info: Option<DuplicateInfo>,
    /// Semantic enrichment; `None` until the post-phase runs.
    pub semantic_data: Option<SemanticData>,
}

impl Match {
    /// Number of distinct feathers contributing to this match.
    #[must_use]
    pub fn feather_ids(&self) -> impl Iterator<Item = &FeatherId> {
        self.feather_records.keys()
    }
}
