// crates/correlate-engine/src/semantic.rs
// ============================================================================
// Module: Identity-Semantic Post-Phase
// Description: Decorates completed matches with semantic mappings after
//              correlation has fully reached 100%.
// Purpose: Implement spec.md §4.10: batched re-reads, once-per-identity
//          rule application, in-place updates, per-match error isolation.
// Dependencies: correlate-core, correlate-store-sqlite
// ============================================================================

//! ## Overview
//! The post-phase only ever runs after the writer for a result has closed
//! (spec.md §5: "never simultaneously"), so it takes a fresh read-only
//! [`rusqlite::Connection`] rather than reusing the writer's. Matches are
//! paged in batches of [`SEMANTIC_BATCH_SIZE`], grouped by identity
//! (`matched_application`/`matched_file_path`), and each distinct identity
//! is run through a [`SemanticRuleEngine`] once; every match sharing that
//! identity receives the same consolidated [`SemanticData`].

use std::collections::BTreeMap;
use std::collections::HashMap;

use correlate_core::EngineType;
use correlate_core::ResultId;
use correlate_core::SemanticData;
use correlate_core::SemanticMapping;
use correlate_core::SemanticMetadata;
use correlate_store_sqlite::SemanticPhaseRow;
use correlate_store_sqlite::StoreError;
use correlate_store_sqlite::apply_semantic_update;
use correlate_store_sqlite::fetch_semantic_phase_page;
use rusqlite::Connection;
use tracing::error;
use tracing::info;
use tracing::warn;

/// Matches are paged at most this many at a time (spec.md §4.10 step 1).
pub const SEMANTIC_BATCH_SIZE: u32 = 10_000;

/// A pluggable source of semantic mappings for one identity
/// (`matched_application`, `matched_file_path`) pair. A host application
/// is expected to back this with a real rule set; `correlate-engine`
/// ships no implementation, mirroring [`crate::scoring::ScoreConfigManager`]'s
/// seam for a pluggable scoring backend.
pub trait SemanticRuleEngine: Send + Sync {
    /// Produces the semantic mappings for `matched_application` /
    /// `matched_file_path`, keyed by `<feather_id>.<field>`
    /// (spec.md §4.10 step 2).
    ///
    /// # Errors
    ///
    /// Returns an error message if the identity could not be mapped; the
    /// caller records it as a sentinel rather than failing the match.
    fn map_identity(
        &self,
        matched_application: &str,
        matched_file_path: &str,
    ) -> Result<BTreeMap<String, SemanticMapping>, String>;
}

/// The always-available default rule engine: maps nothing. A host
/// application supplies a real [`SemanticRuleEngine`]; this exists so the
/// post-phase always has something to run against, mirroring
/// [`crate::scoring::SimpleFallbackScorer`]'s role for scoring.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSemanticRuleEngine;

impl SemanticRuleEngine for NoOpSemanticRuleEngine {
    fn map_identity(&self, _matched_application: &str, _matched_file_path: &str) -> Result<BTreeMap<String, SemanticMapping>, String> {
        Ok(BTreeMap::new())
    }
}

/// Summary counters for one post-phase run, returned to the caller for
/// logging (spec.md §4.10).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SemanticPhaseSummary {
    /// Matches updated with a semantic mapping.
    pub matches_updated: u64,
    /// Distinct identities the rule engine was invoked for.
    pub identities_mapped: u64,
    /// Matches that recorded an error sentinel instead of a mapping.
    pub matches_failed: u64,
}

/// Runs the semantic post-phase over every match in `result_id`
/// (spec.md §4.10).
///
/// Precondition: the writer for this result has already closed
/// (spec.md §5). A per-match mapping failure is recorded as an error
/// sentinel on that match and does not stop the phase; only a failure to
/// read the next page at all aborts it, returning whatever was
/// accomplished so far alongside the error (spec.md §4.10 step 5).
pub fn run_semantic_phase(
    connection: &Connection,
    result_id: ResultId,
    engine_type: EngineType,
    rule_engine: &dyn SemanticRuleEngine,
) -> (SemanticPhaseSummary, Option<StoreError>) {
    let mut summary = SemanticPhaseSummary::default();
    let mut identity_cache: HashMap<(String, String), SemanticData> = HashMap::new();
    let mut after_rowid: i64 = 0;

    loop {
        let page = match fetch_semantic_phase_page(connection, result_id, after_rowid, SEMANTIC_BATCH_SIZE) {
            Ok(page) => page,
            Err(err) => {
                error!(result_id = result_id.get(), error = %err, "semantic post-phase aborted while reading a page");
                return (summary, Some(err));
            }
        };
        if page.is_empty() {
            break;
        }

        for (rowid, row) in &page {
            after_rowid = *rowid;
            apply_one_match(connection, row, engine_type, rule_engine, &mut identity_cache, &mut summary);
        }
    }

    summary.identities_mapped = u64::try_from(identity_cache.len()).unwrap_or(u64::MAX);
    info!(
        result_id = result_id.get(),
        matches_updated = summary.matches_updated,
        identities_mapped = summary.identities_mapped,
        matches_failed = summary.matches_failed,
        "semantic post-phase complete"
    );
    (summary, None)
}

/// Maps and writes back semantic data for one match row, consulting
/// `identity_cache` so each distinct identity is only run through
/// `rule_engine` once (spec.md §4.10 step 2).
fn apply_one_match(
    connection: &Connection,
    row: &SemanticPhaseRow,
    engine_type: EngineType,
    rule_engine: &dyn SemanticRuleEngine,
    identity_cache: &mut HashMap<(String, String), SemanticData>,
    summary: &mut SemanticPhaseSummary,
) {
    let identity_key = (row.matched_application.clone(), row.matched_file_path.clone());
    let semantic_data = identity_cache.entry(identity_key).or_insert_with(|| {
        build_semantic_data(rule_engine, &row.matched_application, &row.matched_file_path, engine_type)
    });

    if semantic_data.metadata.error.is_some() {
        summary.matches_failed += 1;
    }

    if let Err(err) = apply_semantic_update(connection, &row.match_id, semantic_data) {
        warn!(match_id = %row.match_id, error = %err, "failed to persist semantic data for match; leaving it unmapped");
        return;
    }
    summary.matches_updated += 1;
}

/// Invokes `rule_engine` for one identity, folding a mapping failure into
/// the error sentinel spec.md §4.10 step 4 describes rather than
/// propagating it.
fn build_semantic_data(
    rule_engine: &dyn SemanticRuleEngine,
    matched_application: &str,
    matched_file_path: &str,
    engine_type: EngineType,
) -> SemanticData {
    let label = engine_type_label(engine_type).to_string();
    match rule_engine.map_identity(matched_application, matched_file_path) {
        Ok(mappings) => {
            let mappings_count = mappings.len();
            SemanticData {
                mappings,
                metadata: SemanticMetadata { mappings_applied: mappings_count, mappings_count, engine_type: label, error: None },
            }
        }
        Err(message) => {
            warn!(matched_application, matched_file_path, error = %message, "semantic mapping failed for identity");
            SemanticData {
                mappings: BTreeMap::new(),
                metadata: SemanticMetadata { mappings_applied: 0, mappings_count: 0, engine_type: label, error: Some(message) },
            }
        }
    }
}

/// The engine-type label stored on semantic metadata, matching
/// [`correlate_store_sqlite`]'s `executions.engine_type` column labels.
const fn engine_type_label(engine_type: EngineType) -> &'static str {
    match engine_type {
        EngineType::Identity => "identity",
        EngineType::TimeWindow => "time_window",
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use correlate_core::SemanticMapping;

    use super::SemanticRuleEngine;
    use super::build_semantic_data;

    struct AlwaysOneMapping;

    impl SemanticRuleEngine for AlwaysOneMapping {
        fn map_identity(
            &self,
            matched_application: &str,
            _matched_file_path: &str,
        ) -> Result<BTreeMap<String, SemanticMapping>, String> {
            let mut mappings = BTreeMap::new();
            mappings.insert(
                "f1.Name".to_string(),
                SemanticMapping {
                    semantic_value: "shell utility".to_string(),
                    technical_value: matched_application.to_string(),
                    description: "known shell binary".to_string(),
                    category: "process".to_string(),
                    confidence: 0.9,
                    rule_name: "known_binaries".to_string(),
                    feather_id: correlate_core::FeatherId::new("f1"),
                },
            );
            Ok(mappings)
        }
    }

    struct AlwaysFails;

    impl SemanticRuleEngine for AlwaysFails {
        fn map_identity(&self, _: &str, _: &str) -> Result<BTreeMap<String, SemanticMapping>, String> {
            Err("unreachable semantic backend".to_string())
        }
    }

    #[test]
    fn a_successful_mapping_produces_consolidated_semantic_data() {
        let data = build_semantic_data(&AlwaysOneMapping, "powershell.exe", "c:\\windows\\system32\\powershell.exe", correlate_core::EngineType::Identity);
        assert_eq!(data.mappings.len(), 1);
        assert_eq!(data.metadata.mappings_applied, 1);
        assert!(data.metadata.error.is_none());
    }

    #[test]
    fn a_failed_mapping_records_an_error_sentinel() {
        let data = build_semantic_data(&AlwaysFails, "powershell.exe", "c:\\windows\\system32\\powershell.exe", correlate_core::EngineType::Identity);
        assert!(data.mappings.is_empty());
        assert!(data.metadata.error.is_some());
    }
}
