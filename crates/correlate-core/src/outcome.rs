// crates/correlate-core/src/outcome.rs
// ============================================================================
// Module: Correlate Wing Outcomes
// Description: The result type threaded through a wing's execution loop.
// Purpose: Replace exceptions-as-control-flow for cancellation and fatal
//          failure (spec.md §9 redesign note) with an explicit sum type.
// Dependencies: correlate-core::errors
// ============================================================================

//! ## Overview
//! The source uses a raised exception to unwind out of a wing loop on
//! cancellation, caught at the wing boundary (spec.md §9). Here, a wing
//! worker returns a [`WingOutcome`] instead of propagating an error;
//! `CancellationOutcome` and `FailureKind` carry the information the
//! caller needs to either resume (pause) or surface the failure.

use serde::Deserialize;
use serde::Serialize;

use crate::ids::ExecutionId;

/// Snapshot captured when a wing is paused mid-run (spec.md §4.7, PAUSE
/// flow; spec.md §8, Scenario E). Serializable so it can be stored as
/// `executions.progress_snapshot_json` and read back on resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauseSnapshot {
    /// Execution this snapshot belongs to, so a resume can find it again.
    pub execution_id: ExecutionId,
    /// Number of identities processed before the pause.
    pub identities_processed: u64,
    /// Total identities known at pause time, if determined.
    pub total_identities: u64,
    /// `identities_processed / total_identities * 100`.
    pub percentage: f64,
    /// Identity key last processed before the pause.
    pub last_identity_key: Option<String>,
    /// ISO-8601 timestamp the pause was recorded at.
    pub paused_at: String,
}

/// Why a wing failed outright (spec.md §7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The stall monitor declared a stall (spec.md §4.8).
    Stalled,
    /// The streaming writer could not be opened (spec.md §7, Fatal row).
    WriterUnavailable(String),
    /// Any other non-recoverable condition encountered at the wing level.
    Other(String),
}

/// The outcome of running one wing to completion, pause, or failure
/// (spec.md §9 redesign note).
#[derive(Debug, Clone, PartialEq)]
pub enum WingOutcome {
    /// The wing ran to completion.
    Completed,
    /// The wing was cooperatively cancelled and a resumable snapshot was
    /// recorded.
    Cancelled(PauseSnapshot),
    /// The wing failed; the writer still flushed whatever it had
    /// (spec.md §5, Cancellation semantics).
    Failed(FailureKind),
}
