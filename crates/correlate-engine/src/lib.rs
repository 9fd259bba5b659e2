// crates/correlate-engine/src/lib.rs
// ============================================================================
// Crate: correlate-engine
// Description: The correlation core — identity extraction, anchor
//              clustering, match building, scoring, and the orchestrator
//              that wires them together across worker threads.
// Purpose: Implement spec.md §4's correlation algorithm and §6.2's engine
//          API, independent of any concrete storage or CLI surface.
// ============================================================================

//! ## Overview
//! This crate has no knowledge of how a feather's underlying database is
//! opened (spec.md §1, Non-goals) or how a run is launched from a shell;
//! both are the caller's responsibility. What it owns is everything
//! between "a set of opened feathers" and "a stream of scored matches
//! written to a [`correlate_store_sqlite::StreamingResultWriter`]":
//! extraction and normalization ([`extractor`]), identity accumulation
//! ([`index`]), pre-filtering ([`filters`]), time-window anchor clustering
//! ([`anchor_clusterer`]), match assembly ([`match_builder`]), scoring
//! ([`scoring`]), the semantic post-phase ([`semantic`]), cooperative
//! cancellation ([`cancellation`]) and stall detection ([`stall`]), and the
//! [`engine`] module that fans wings out across worker threads.

pub mod anchor_clusterer;
pub mod cancellation;
pub mod engine;
pub mod extractor;
pub mod filters;
pub mod index;
pub mod loader;
pub mod match_builder;
pub mod progress_tracker;
pub mod scoring;
pub mod semantic;
pub mod stall;

pub use cancellation::CancellationToken;
pub use engine::CorrelationEngine;
pub use engine::EngineError;
pub use engine::ExecutionSummary;
pub use engine::OpenFeather;
pub use engine::ResumeInfo;
pub use engine::WingJob;
pub use engine::WingResult;
pub use extractor::ColumnResolver;
pub use extractor::extract;
pub use extractor::normalize_name;
pub use filters::IdentityFilter;
pub use filters::TimeFilter;
pub use index::IdentityExtraction;
pub use index::IdentityIndex;
pub use loader::FeatherStats;
pub use loader::load_feather;
pub use match_builder::MatchIdGenerator;
pub use match_builder::build_match;
pub use progress_tracker::ProgressListener;
pub use progress_tracker::ProgressTracker;
pub use scoring::ScoreConfigManager;
pub use scoring::SimpleFallbackScorer;
pub use scoring::score_with_fallback;
pub use semantic::NoOpSemanticRuleEngine;
pub use semantic::SEMANTIC_BATCH_SIZE;
pub use semantic::SemanticPhaseSummary;
pub use semantic::SemanticRuleEngine;
pub use semantic::run_semantic_phase;
pub use stall::DEFAULT_STALL_TIMEOUT;
pub use stall::StallDiagnostics;
pub use stall::StallHealth;
pub use stall::StallMonitor;
