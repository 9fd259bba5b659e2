// crates/correlate-engine/src/loader.rs
// ============================================================================
// Module: Feather Loader
// Description: Opens each configured feather, streams its rows through the
//              pre-filters and extractor, and accumulates identities.
// Purpose: Implement spec.md §4.2's ingestion pipeline: one feather opened
//          read-only at a time, per-feather statistics, log-and-continue on
//          a feather-level failure.
// Dependencies: correlate-core
// ============================================================================

//! ## Overview
//! The loader owns the only place a [`Feather`] is opened (spec.md §5:
//! "Feather databases are opened read-only, one at a time, from the
//! loader"). For each feather it resolves [`ColumnResolver`] once from the
//! feather's declared hints, then for every non-system table: reads all
//! rows, runs them through [`TimeFilter`] and [`IdentityFilter`], extracts
//! an identity via [`extract`], and inserts surviving records into the
//! shared [`IdentityIndex`]. A table or feather that fails to read is
//! logged and skipped; the run continues with whatever feathers did load
//! (spec.md §4.2, Error semantics).

use correlate_core::Feather;
use correlate_core::FeatherId;
use tracing::warn;

use crate::extractor::ColumnResolver;
use crate::extractor::extract;
use crate::filters::IdentityFilter;
use crate::filters::TimeFilter;
use crate::index::IdentityIndex;

/// Per-feather ingestion counters (spec.md §4.2, loader statistics).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatherStats {
    /// Feather this summary covers.
    pub total_rows: u64,
    /// Rows that produced a non-empty extraction.
    pub extracted: u64,
    /// Rows dropped by a pre-filter or an all-empty extraction.
    pub filtered: u64,
    /// Distinct identities this feather contributed records to.
    pub identities_touched: u64,
}

/// Loads every table of one `feather` into `index`, applying `time_filter`
/// and `identity_filter` ahead of extraction (spec.md §4.2).
///
/// A table that fails to enumerate or read is logged via [`tracing::warn`]
/// and skipped; the feather's other tables still load. This function never
/// returns an error for that reason — only a total inability to enumerate
/// the feather's own table list is surfaced, and even then as an empty
/// stats record rather than a propagated failure, since a fully unreadable
/// feather is equivalent to one with zero rows for the purposes of the run
/// (spec.md §4.2).
pub fn load_feather(
    feather: &dyn Feather,
    time_filter: &TimeFilter,
    identity_filter: &IdentityFilter,
    index: &mut IdentityIndex,
) -> FeatherStats {
    let feather_id = feather.feather_id().clone();
    let resolver = ColumnResolver::from_hints(feather.metadata_hints());
    let mut stats = FeatherStats::default();

    let tables = match feather.tables() {
        Ok(tables) => tables,
        Err(err) => {
            warn!(feather_id = %feather_id, error = %err, "failed to enumerate feather tables; skipping feather");
            return stats;
        }
    };

    let mut touched_keys = std::collections::HashSet::new();
    for table in tables {
        load_table(feather, &table, &resolver, time_filter, identity_filter, index, &mut stats, &mut touched_keys);
    }
    stats.identities_touched = u64::try_from(touched_keys.len()).unwrap_or(u64::MAX);
    stats
}

/// Loads one table's rows into `index`, updating `stats` and `touched_keys`
/// as it goes. Isolated so a single table's read failure cannot abort its
/// siblings (spec.md §4.2).
#[expect(clippy::too_many_arguments, reason = "mirrors the loader's single ingestion pipeline step-by-step; splitting further would scatter one cohesive operation across helper signatures")]
fn load_table(
    feather: &dyn Feather,
    table: &str,
    resolver: &ColumnResolver,
    time_filter: &TimeFilter,
    identity_filter: &IdentityFilter,
    index: &mut IdentityIndex,
    stats: &mut FeatherStats,
    touched_keys: &mut std::collections::HashSet<correlate_core::IdentityKey>,
) {
    let feather_id: FeatherId = feather.feather_id().clone();
    let rows = match feather.rows(table) {
        Ok(rows) => rows,
        Err(err) => {
            warn!(feather_id = %feather_id, table, error = %err, "failed to read feather table; skipping table");
            return;
        }
    };

    for record in rows {
        stats.total_rows += 1;
        if !time_filter.accepts(&record) {
            stats.filtered += 1;
            continue;
        }
        let Some(extraction) = extract(resolver, &record) else {
            stats.filtered += 1;
            continue;
        };
        if !identity_filter.accepts(&extraction.full_name, &extraction.path, &extraction.hash) {
            stats.filtered += 1;
            continue;
        }
        stats.extracted += 1;
        touched_keys.insert(extraction.identity_key());
        index.insert(&extraction, record);
    }
}

#[cfg(test)]
mod tests {
    use correlate_core::Feather;
    use correlate_core::FeatherError;
    use correlate_core::FeatherId;
    use correlate_core::Record;

    use super::load_feather;
    use crate::filters::IdentityFilter;
    use crate::filters::TimeFilter;
    use crate::index::IdentityIndex;

    struct FakeFeather {
        id: FeatherId,
        tables: Vec<String>,
        rows_by_table: std::collections::HashMap<String, Vec<Record>>,
        fail_table: Option<String>,
    }

    impl Feather for FakeFeather {
        fn feather_id(&self) -> &FeatherId {
            &self.id
        }

        fn tables(&self) -> Result<Vec<String>, FeatherError> {
            Ok(self.tables.clone())
        }

        fn rows(&self, table: &str) -> Result<Vec<Record>, FeatherError> {
            if self.fail_table.as_deref() == Some(table) {
                return Err(FeatherError::RowRead {
                    feather_id: self.id.clone(),
                    table: table.to_string(),
                    message: "simulated failure".to_string(),
                });
            }
            Ok(self.rows_by_table.get(table).cloned().unwrap_or_default())
        }
    }

    #[test]
    fn all_rows_from_a_readable_table_are_indexed() {
        let mut rows_by_table = std::collections::HashMap::new();
        rows_by_table.insert(
            "Prefetch".to_string(),
            vec![
                Record::new(FeatherId::new("f1"), "Prefetch").with_field("Name", "notepad.exe"),
                Record::new(FeatherId::new("f1"), "Prefetch").with_field("Name", "calc.exe"),
            ],
        );
        let feather = FakeFeather { id: FeatherId::new("f1"), tables: vec!["Prefetch".to_string()], rows_by_table, fail_table: None };

        let time_filter = TimeFilter::new(None, None).expect("build filter");
        let identity_filter = IdentityFilter::new(&[], false).expect("build filter");
        let mut index = IdentityIndex::new();
        let stats = load_feather(&feather, &time_filter, &identity_filter, &mut index);

        assert_eq!(stats.total_rows, 2);
        assert_eq!(stats.extracted, 2);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn a_failing_table_is_skipped_without_affecting_siblings() {
        let mut rows_by_table = std::collections::HashMap::new();
        rows_by_table.insert(
            "RunKeys".to_string(),
            vec![Record::new(FeatherId::new("f1"), "RunKeys").with_field("Name", "svchost.exe")],
        );
        rows_by_table.insert("Broken".to_string(), vec![]);
        let feather = FakeFeather {
            id: FeatherId::new("f1"),
            tables: vec!["Broken".to_string(), "RunKeys".to_string()],
            rows_by_table,
            fail_table: Some("Broken".to_string()),
        };

        let time_filter = TimeFilter::new(None, None).expect("build filter");
        let identity_filter = IdentityFilter::new(&[], false).expect("build filter");
        let mut index = IdentityIndex::new();
        let stats = load_feather(&feather, &time_filter, &identity_filter, &mut index);

        assert_eq!(stats.total_rows, 1);
        assert_eq!(index.len(), 1);
    }
}
