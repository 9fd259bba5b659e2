// crates/correlate-engine/src/match_builder.rs
// ============================================================================
// Module: Match Builder & Deduplicator
// Description: Emits one Match per anchor, with per-feather deduplication.
// Purpose: Implement spec.md §4.5, including the two Open Question
//          resolutions recorded in DESIGN.md (anchor_feather_id authority,
//          dedup hash fidelity).
// Dependencies: correlate-core
// ============================================================================

//! ## Overview
//! [`MatchIdGenerator`] owns the monotonic counter spec.md §4.5 step 4
//! requires (`match_e{execution_id}_{micros}_{counter}_{feather_count}`).
//! The microsecond clock reading itself is supplied by the caller (the
//! engine's wing loop) rather than read here, keeping every wall-clock
//! access centralized at the orchestration layer (spec.md §9, "global
//! state" redesign note).

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use correlate_core::Anchor;
use correlate_core::ConfidenceCategory;
use correlate_core::ExecutionId;
use correlate_core::FeatherId;
use correlate_core::Match;
use correlate_core::MatchId;
use correlate_core::Record;

/// Generates globally unique [`MatchId`]s for one execution.
pub struct MatchIdGenerator {
    /// Execution this generator's ids are scoped to.
    execution_id: ExecutionId,
    /// Monotonic counter advancing across every identity in the wing
    /// (spec.md §4.5 step 4).
    counter: AtomicU64,
}

impl MatchIdGenerator {
    /// Creates a generator scoped to `execution_id`, counter starting at 0.
    #[must_use]
    pub const fn new(execution_id: ExecutionId) -> Self {
        Self { execution_id, counter: AtomicU64::new(0) }
    }

    /// Produces the next match id, given the caller's current microsecond
    /// clock reading and the match's feather count.
    pub fn next(&self, clock_micros: u64, feather_count: usize) -> MatchId {
        let counter = self.counter.fetch_add(1, Ordering::Relaxed);
        MatchId::new(format!(
            "match_e{}_{clock_micros}_{counter}_{feather_count}",
            self.execution_id.get()
        ))
    }
}

/// Fast per-feather deduplication key using only `(ts, name, path,
/// feather_id)` — intentionally not every field (DESIGN.md, Open Question
/// 3: preserved from the source for performance, confirmed via
/// `identity_based_engine_adapter.py`). Hashes the name/path the extractor's
/// column resolver actually picked for the record (`resolved_name`/
/// `resolved_path`), not a literally-named field — feathers name their
/// name/path columns differently (`ExecutableName`, `ProcessName`,
/// `TargetPath`, …), and hashing a guessed field name would collapse
/// distinct sub-identity variants sharing one timestamp/feather (spec.md
/// §4.5 step 2).
fn dedup_key(record: &Record, feather_id: &FeatherId) -> u64 {
    let mut hasher = DefaultHasher::new();
    record.timestamp.map(correlate_core::RecordTimestamp::to_iso8601).hash(&mut hasher);
    record.resolved_name.hash(&mut hasher);
    record.resolved_path.hash(&mut hasher);
    feather_id.as_str().hash(&mut hasher);
    hasher.finish()
}

/// Groups `anchor`'s records by feather, deduplicating within each group
/// under [`dedup_key`] (spec.md §4.5 steps 1-2).
fn group_and_dedupe(anchor: &Anchor) -> BTreeMap<FeatherId, Vec<Record>> {
    let mut grouped: BTreeMap<FeatherId, Vec<Record>> = BTreeMap::new();
    let mut seen: BTreeMap<FeatherId, BTreeSet<u64>> = BTreeMap::new();
    for record in &anchor.records {
        let feather_id = record.feather_id.clone();
        let key = dedup_key(record, &feather_id);
        let seen_for_feather = seen.entry(feather_id.clone()).or_default();
        if seen_for_feather.insert(key) {
            grouped.entry(feather_id).or_default().push(record.clone());
        }
    }
    grouped
}

/// Resolves the anchor's `anchor_feather_id`/`anchor_artifact_type`: the
/// first feather id encountered while grouping (DESIGN.md, Open Question
/// 1), and that feather's first record's table name as the artifact type
/// label.
fn anchor_origin(anchor: &Anchor) -> (FeatherId, String) {
    let first = anchor.records.first();
    first.map_or_else(
        || (FeatherId::new(String::new()), String::new()),
        |record| (record.feather_id.clone(), record.table.clone()),
    )
}

/// Builds one [`Match`] from `anchor` (spec.md §4.5).
///
/// `total_feathers` is the number of feathers configured for this wing,
/// used for the fallback `match_score` (`feather_count / total_feathers`,
/// or `0.5` if `total_feathers == 0`).
#[must_use]
pub fn build_match(
    id_generator: &MatchIdGenerator,
    clock_micros: u64,
    anchor: &Anchor,
    total_feathers: usize,
    matched_application: &str,
    matched_file_path: &str,
    sub_identities: &[correlate_core::SubIdentity],
) -> Match {
    let feather_records = group_and_dedupe(anchor);
    let feather_count = feather_records.len();
    let (anchor_feather_id, anchor_artifact_type) = anchor_origin(anchor);
    let match_score = if total_feathers == 0 {
        0.5
    } else {
        #[expect(
            clippy::cast_precision_loss,
            reason = "feather counts are small; precision loss is immaterial to a [0,1] score"
        )]
        {
            feather_count as f64 / total_feathers as f64
        }
    };

    Match {
        match_id: id_generator.next(clock_micros, feather_count),
        timestamp: anchor.anchor_start,
        anchor_start: anchor.anchor_start,
        anchor_end: anchor.anchor_end,
        anchor_record_count: anchor.records.len(),
        anchor_feather_id,
        anchor_artifact_type,
        feather_records,
        feather_count,
        time_spread_seconds: 0,
        match_score,
        confidence_score: match_score,
        confidence_category: ConfidenceCategory::from_score(match_score),
        weighted_score: None,
        score_breakdown: None,
        matched_application: matched_application.to_string(),
        matched_file_path: matched_file_path.to_string(),
        sub_identities: sub_identities.to_vec(),
        has_sub_identities: !sub_identities.is_empty(),
        sub_identity_count: sub_identities.len(),
        is_duplicate: false,
        duplicate_info: None,
        semantic_data: None,
    }
}

#[cfg(test)]
mod tests {
    use correlate_core::Anchor;
    use correlate_core::ExecutionId;
    use correlate_core::FeatherId;
    use correlate_core::Record;
    use correlate_core::RecordTimestamp;

    use super::MatchIdGenerator;
    use super::build_match;

    fn ts(raw: &str) -> RecordTimestamp {
        RecordTimestamp::parse(raw).expect("parseable")
    }

    #[test]
    fn scenario_a_two_feathers_one_match() {
        let r1 = Record::new(FeatherId::new("f1"), "Prefetch")
            .with_field("Name", "powershell.exe")
            .with_field("Path", "C:\\Windows\\System32\\powershell.exe")
            .with_resolved_identity("powershell.exe", "C:\\Windows\\System32\\powershell.exe")
            .with_timestamp(ts("2024-01-01T10:00:00"));
        let r2 = Record::new(FeatherId::new("f2"), "RunKeys")
            .with_field("Name", "powershell.exe")
            .with_field("Path", "C:\\Windows\\System32\\powershell.exe")
            .with_resolved_identity("powershell.exe", "C:\\Windows\\System32\\powershell.exe")
            .with_timestamp(ts("2024-01-01T10:02:00"));
        let mut anchor = Anchor::singleton(ts("2024-01-01T10:00:00"), r1);
        anchor.extend(ts("2024-01-01T10:02:00"), r2);

        let generator = MatchIdGenerator::new(ExecutionId::new(1));
        let built = build_match(&generator, 123_456, &anchor, 2, "powershell.exe", "C:\\Windows\\System32\\powershell.exe", &[]);

        assert_eq!(built.feather_count, 2);
        assert!((built.match_score - 1.0).abs() < f64::EPSILON);
        assert_eq!(built.anchor_start.to_iso8601(), "2024-01-01T10:00:00");
        assert_eq!(built.anchor_end.to_iso8601(), "2024-01-01T10:02:00");
    }

    #[test]
    fn duplicate_records_within_a_feather_are_collapsed() {
        let record = Record::new(FeatherId::new("f1"), "Prefetch")
            .with_field("Name", "notepad.exe")
            .with_field("Path", "C:\\Windows\\notepad.exe")
            .with_resolved_identity("notepad.exe", "C:\\Windows\\notepad.exe")
            .with_timestamp(ts("2024-01-01T10:00:00"));
        let mut anchor = Anchor::singleton(ts("2024-01-01T10:00:00"), record.clone());
        anchor.extend(ts("2024-01-01T10:00:00"), record);

        let generator = MatchIdGenerator::new(ExecutionId::new(1));
        let built = build_match(&generator, 1, &anchor, 1, "notepad.exe", "", &[]);

        assert_eq!(built.feather_count, 1);
        assert_eq!(built.feather_records.get(&FeatherId::new("f1")).map(Vec::len), Some(1));
    }

    #[test]
    fn distinct_resolved_names_at_the_same_timestamp_are_not_collapsed() {
        // A feather whose name column isn't literally "Name"/"Path" (e.g.
        // ExecutableName/TargetPath) still resolves two distinct
        // sub-identity variants sharing one timestamp; dedup must key off
        // the resolved identity, not a guessed field name.
        let first = Record::new(FeatherId::new("f1"), "ProcessLog")
            .with_field("ExecutableName", "chrome_1.exe")
            .with_field("TargetPath", "C:\\Program Files\\Chrome\\chrome_1.exe")
            .with_resolved_identity("chrome_1.exe", "C:\\Program Files\\Chrome\\chrome_1.exe")
            .with_timestamp(ts("2024-01-01T10:00:00"));
        let second = Record::new(FeatherId::new("f1"), "ProcessLog")
            .with_field("ExecutableName", "chrome_2.exe")
            .with_field("TargetPath", "C:\\Program Files\\Chrome\\chrome_2.exe")
            .with_resolved_identity("chrome_2.exe", "C:\\Program Files\\Chrome\\chrome_2.exe")
            .with_timestamp(ts("2024-01-01T10:00:00"));
        let mut anchor = Anchor::singleton(ts("2024-01-01T10:00:00"), first);
        anchor.extend(ts("2024-01-01T10:00:00"), second);

        let generator = MatchIdGenerator::new(ExecutionId::new(1));
        let built = build_match(&generator, 1, &anchor, 1, "chrome.exe", "", &[]);

        assert_eq!(built.feather_records.get(&FeatherId::new("f1")).map(Vec::len), Some(2));
    }

    #[test]
    fn match_ids_are_unique_across_calls() {
        let generator = MatchIdGenerator::new(ExecutionId::new(1));
        let first = generator.next(1, 1);
        let second = generator.next(1, 1);
        assert_ne!(first, second);
    }
}
