// crates/correlate-core/src/progress.rs
// ============================================================================
// Module: Correlate Progress Events
// Description: The typed event shapes emitted by the progress tracker.
// Purpose: Give listeners (GUI, CLI, tests) a stable, serializable event
//          shape instead of ad hoc structures.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Event types are exactly the set enumerated in spec.md §4.8. The shape
//! of each event matches spec.md §6.4.

use serde::Deserialize;
use serde::Serialize;

/// The exact set of progress event types a listener may observe
/// (spec.md §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressEventType {
    /// Correlation has begun.
    ScanningStart,
    /// A window of work has begun (sibling engine; unused by identity mode).
    WindowStart,
    /// A window of work has made progress (sibling engine).
    WindowProgress,
    /// A window of work has completed (sibling engine).
    WindowComplete,
    /// A streaming writer batch was flushed.
    BatchComplete,
    /// Streaming persistence has been activated for this run.
    StreamingEnabled,
    /// A soft memory-limit warning was raised.
    MemoryWarning,
    /// Cooperative cancellation was requested.
    CancellationRequested,
    /// Correlation has completed (phase boundary into the semantic
    /// post-phase).
    ScanningComplete,
    /// A recoverable error occurred and was logged.
    ErrorOccurred,
    /// A database query against a feather has begun.
    DatabaseQueryStart,
    /// A database query against a feather has made progress.
    DatabaseQueryProgress,
    /// A database query against a feather has completed.
    DatabaseQueryComplete,
}

/// Overall run progress (spec.md §6.4).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverallProgress {
    /// Items processed so far.
    pub processed: u64,
    /// Total items expected, if known in advance.
    pub total: u64,
    /// `processed / total * 100`, saturating at `100.0`.
    pub percentage: f64,
    /// Matches emitted so far.
    pub matches_found: u64,
    /// Processing rate in items/second (`processed / elapsed_seconds`,
    /// spec.md §4.8 — not a sliding window).
    pub rate: Option<f64>,
    /// Estimated seconds remaining, if `rate` is known and nonzero.
    pub eta_seconds: Option<f64>,
}

/// Fine-grained, per-item progress detail (spec.md §6.4); optional on
/// every event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemProgress {
    /// Identifier of the item currently being processed (an identity key,
    /// a feather id, or similar, depending on event type).
    pub item_id: String,
    /// Human-readable label for the item.
    pub label: Option<String>,
}

/// Structured detail describing a recoverable error (spec.md §6.4,
/// `error_details`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Short machine-readable error kind.
    pub kind: String,
    /// Human-readable error message.
    pub message: String,
}

/// A progress event emitted on the run's event bus (spec.md §6.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Which of the fixed event types this is.
    pub event_type: ProgressEventType,
    /// ISO-8601 timestamp the event was emitted at.
    pub timestamp: String,
    /// Overall run progress at the time of emission.
    pub overall_progress: OverallProgress,
    /// Optional fine-grained item progress.
    pub item_progress: Option<ItemProgress>,
    /// Optional human-readable message.
    pub message: Option<String>,
    /// Optional structured error detail (set on `ErrorOccurred`).
    pub error_details: Option<ErrorDetails>,
    /// Optional free-form additional data (engine-type-specific extras).
    pub additional_data: Option<serde_json::Value>,
}
