// crates/correlate-store-sqlite/src/errors.rs
// ============================================================================
// Module: Correlate SQLite Store Errors
// Description: Error surface for the streaming results writer.
// Purpose: Stable, programmatically matchable error variants (mirrors
//          SqliteStoreError in the grounding store crate).
// Dependencies: thiserror
// ============================================================================

use thiserror::Error;

/// Errors raised by [`crate::StreamingResultWriter`].
///
/// # Invariants
/// - Per spec.md §7, only a writer-open failure is expected to surface to
///   the top-level caller; every other error here is handled by the wing
///   loop (logged, folded into `errors`/`warnings`) before it would ever
///   reach a caller of this crate.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database file could not be opened or its pragmas could not be
    /// applied.
    #[error("failed to open results database at {path}: {message}")]
    Open {
        /// Path that failed to open.
        path: String,
        /// Backend-reported error message.
        message: String,
    },
    /// A schema migration step failed.
    #[error("schema migration to version {target_version} failed: {message}")]
    Migration {
        /// Version the migration was attempting to reach.
        target_version: i64,
        /// Backend-reported error message.
        message: String,
    },
    /// The schema version on disk is newer than this writer understands.
    #[error("results database schema version {found} is newer than supported version {supported}")]
    UnsupportedSchemaVersion {
        /// Version found on disk.
        found: i64,
        /// Highest version this writer supports.
        supported: i64,
    },
    /// A SQL statement failed outside of migration.
    #[error("sqlite error: {0}")]
    Sql(String),
    /// JSON serialization or deserialization of a stored column failed.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Gzip compression or decompression of a stored blob failed.
    #[error("compression error: {0}")]
    Compression(String),
    /// The requested execution row does not exist.
    #[error("execution {0} not found")]
    ExecutionNotFound(i64),
    /// The requested result row does not exist.
    #[error("result {0} not found")]
    ResultNotFound(i64),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sql(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Compression(err.to_string())
    }
}
