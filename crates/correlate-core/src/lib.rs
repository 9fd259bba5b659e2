// crates/correlate-core/src/lib.rs
// ============================================================================
// Crate: correlate-core
// Description: Shared types, identifiers, and interfaces for the
//              forensic correlation engine.
// Purpose: Pure data and trait contracts; no I/O, no database access, no
//          scheduling.
// ============================================================================

//! ## Overview
//! `correlate-core` defines the data model shared by `correlate-engine`
//! (which implements the correlation algorithms) and
//! `correlate-store-sqlite` (which persists the results). Nothing in this
//! crate touches a filesystem, a database connection, or a clock beyond
//! what callers explicitly hand it.

pub mod anchor;
pub mod config;
pub mod errors;
pub mod feather;
pub mod identity;
pub mod ids;
pub mod match_;
pub mod outcome;
pub mod progress;
pub mod record;
pub mod time;

pub use anchor::Anchor;
pub use config::EngineType;
pub use config::FeatherConfig;
pub use config::FeatherMetadataConfig;
pub use config::PipelineConfig;
pub use config::WingConfig;
pub use errors::ConfigError;
pub use feather::Feather;
pub use feather::FeatherError;
pub use feather::FeatherMetadataHints;
pub use identity::Identity;
pub use identity::IdentityKey;
pub use identity::SubIdentity;
pub use ids::ExecutionId;
pub use ids::FeatherId;
pub use ids::MatchId;
pub use ids::ResultId;
pub use ids::WingId;
pub use match_::ConfidenceCategory;
pub use match_::DuplicateInfo;
pub use match_::Match;
pub use match_::ScoreContribution;
pub use match_::SemanticData;
pub use match_::SemanticMapping;
pub use match_::SemanticMetadata;
pub use match_::WeightedScore;
pub use outcome::FailureKind;
pub use outcome::PauseSnapshot;
pub use outcome::WingOutcome;
pub use progress::ErrorDetails;
pub use progress::ItemProgress;
pub use progress::OverallProgress;
pub use progress::ProgressEvent;
pub use progress::ProgressEventType;
pub use record::Record;
pub use record::Value;
pub use time::RecordTimestamp;
