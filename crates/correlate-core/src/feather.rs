// crates/correlate-core/src/feather.rs
// ============================================================================
// Module: Correlate Feather Interface
// Description: Backend-agnostic interface to an upstream artifact database.
// Purpose: Define the contract surface artifact-specific parsers plug into,
//          without the core depending on any concrete SQLite/parser crate.
// Dependencies: correlate-core::{ids, record}
// ============================================================================

//! ## Overview
//! A feather is an opaque relational container (spec.md §3, Feather). The
//! core never opens one itself; artifact-specific parsers are out of scope
//! (spec.md §1) and are expected to implement [`Feather`] over whatever
//! storage they actually use. `correlate-core` ships no implementation of
//! this trait; `correlate-engine`'s tests use an in-memory double.

use thiserror::Error;

use crate::ids::FeatherId;
use crate::record::Record;

/// Errors a [`Feather`] implementation may report while being read.
///
/// # Invariants
/// - Per spec.md §4.2, a feather error is logged and the feather (or the
///   offending table) is skipped; it must never abort the whole run.
#[derive(Debug, Error)]
pub enum FeatherError {
    /// The feather's table listing failed.
    #[error("failed to enumerate tables for feather {feather_id}: {message}")]
    TableEnumeration {
        /// Feather the failure occurred on.
        feather_id: FeatherId,
        /// Backend-reported error message.
        message: String,
    },
    /// Reading rows from a specific table failed.
    #[error("failed to read table {table} in feather {feather_id}: {message}")]
    RowRead {
        /// Feather the failure occurred on.
        feather_id: FeatherId,
        /// Table the failure occurred on.
        table: String,
        /// Backend-reported error message.
        message: String,
    },
}

/// Declared column hints for a feather, used by the extractor to prefer
/// authoritative columns over heuristic pattern scanning (spec.md §4.1).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatherMetadataHints {
    /// Column holding the application/process name, if declared.
    pub application_column: Option<String>,
    /// Column holding the file path, if declared.
    pub path_column: Option<String>,
    /// Column holding a content hash, if declared.
    pub hash_column: Option<String>,
    /// Column name patterns that may hold a timestamp.
    pub timestamp_patterns: Vec<String>,
}

/// Backend-agnostic source of feather rows.
///
/// Implementations are read-only; the loader opens at most one feather at
/// a time (spec.md §5, "Feather databases are opened read-only, one at a
/// time, from the loader").
pub trait Feather {
    /// Identifier of this feather, unique within the run.
    fn feather_id(&self) -> &FeatherId;

    /// Lists the non-system tables this feather exposes.
    ///
    /// # Errors
    ///
    /// Returns [`FeatherError::TableEnumeration`] when table listing fails.
    fn tables(&self) -> Result<Vec<String>, FeatherError>;

    /// Reads every row of `table`, tagged with `feather_id`/`table` per
    /// spec.md §3 (Record).
    ///
    /// # Errors
    ///
    /// Returns [`FeatherError::RowRead`] when the table cannot be read.
    fn rows(&self, table: &str) -> Result<Vec<Record>, FeatherError>;

    /// Declared metadata hints for this feather, if any were configured.
    fn metadata_hints(&self) -> Option<&FeatherMetadataHints> {
        None
    }
}
