// crates/correlate-store-sqlite/src/lib.rs
// ============================================================================
// Crate: correlate-store-sqlite
// Description: SQLite-backed streaming results persistence.
// Purpose: Durable, append-only storage for executions, per-wing results,
//          and matches, with gzip compression of oversized blobs and
//          additive-only schema migration.
// ============================================================================

//! ## Overview
//! This crate owns the on-disk results database described in spec.md §6.3.
//! Everything here is synchronous and is meant to be driven from a single
//! wing's worker thread (spec.md §5); it performs no scheduling or
//! cross-thread coordination of its own.

mod compression;
mod errors;
mod schema;
mod store;

pub use compression::COMPRESSION_THRESHOLD_BYTES;
pub use errors::StoreError;
pub use schema::CURRENT_SCHEMA_VERSION;
pub use store::BATCH_MAX_BYTES;
pub use store::BATCH_MAX_MATCHES;
pub use store::ExecutionMeta;
pub use store::PausedExecution;
pub use store::ResultCounters;
pub use store::ResultMeta;
pub use store::SemanticPhaseRow;
pub use store::StreamingResultWriter;
pub use store::apply_semantic_update;
pub use store::fetch_semantic_phase_page;
pub use store::find_resumable_execution;
pub use store::next_run_path;
pub use store::read_match_feather_records;
