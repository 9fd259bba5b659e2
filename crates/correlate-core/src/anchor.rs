// crates/correlate-core/src/anchor.rs
// ============================================================================
// Module: Correlate Anchors
// Description: A time-adjacent cluster of one identity's records.
// Purpose: Hold the transient grouping the match builder consumes to emit
//          one Match per anchor.
// Dependencies: correlate-core::record, correlate-core::time
// ============================================================================

//! ## Overview
//! An [`Anchor`] groups records belonging to a single [`crate::identity::Identity`]
//! that fall within `window_minutes` of each other (spec.md §3, Anchor).
//! Anchors are transient: built by the Temporal Anchor Clusterer and
//! consumed immediately by the Match Builder within the same wing thread.

use crate::record::Record;
use crate::time::RecordTimestamp;

/// A temporally contiguous cluster of one identity's records.
///
/// # Invariants
/// - For every pair of consecutive records with parseable timestamps,
///   `|ts(next) - ts(prev)| <= window_minutes` (spec.md §3).
/// - Records without a parseable timestamp form their own anchor, one per
///   identity, with `anchor_start == anchor_end == now()`.
#[derive(Debug, Clone)]
pub struct Anchor {
    /// Start of the anchor's time range.
    pub anchor_start: RecordTimestamp,
    /// End of the anchor's time range.
    pub anchor_end: RecordTimestamp,
    /// Records belonging to this anchor, in temporal order (or arrival
    /// order, for the no-timestamp anchor).
    pub records: Vec<Record>,
}

impl Anchor {
    /// Creates a single-record anchor that starts and ends at that
    /// record's timestamp.
    #[must_use]
    pub fn singleton(timestamp: RecordTimestamp, record: Record) -> Self {
        Self {
            anchor_start: timestamp,
            anchor_end: timestamp,
            records: vec![record],
        }
    }

    /// Extends this anchor's end bound to `timestamp` and appends `record`.
    pub fn extend(&mut self, timestamp: RecordTimestamp, record: Record) {
        self.anchor_end = timestamp;
        self.records.push(record);
    }
}
