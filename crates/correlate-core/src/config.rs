// crates/correlate-core/src/config.rs
// ============================================================================
// Module: Correlate Configuration Shapes
// Description: Input configuration structs for a pipeline run.
// Purpose: Define the shape of configuration passed into the engine
//          (spec.md §6.1); loading it from disk is out of scope.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! These structs mirror spec.md §6.1 exactly. Nothing here parses a
//! configuration file from disk — that responsibility belongs to the host
//! application (`correlate-cli` deserializes JSON directly with no schema
//! validation layer, since that layer is explicitly out of scope).

use serde::Deserialize;
use serde::Serialize;

use crate::ids::FeatherId;
use crate::ids::WingId;

/// Terminology and behavior selector for the engine (spec.md §4.8):
/// identity-based engines use "identities"/"correlating", the sibling
/// time-window engine uses "windows"/"scanning". Only `Identity` is
/// implemented by `correlate-engine`; `TimeWindow` exists so
/// configuration and run-name generation (spec.md §6.3) agree with the
/// sibling engine's on-disk format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineType {
    /// The identity-based correlation engine (this crate's implementation).
    Identity,
    /// The time-window-scanning sibling engine (interface only; spec.md §1).
    TimeWindow,
}

impl EngineType {
    /// The run-name prefix for this engine type (spec.md §6.3).
    #[must_use]
    pub const fn run_name_prefix(self) -> &'static str {
        match self {
            Self::Identity => "Identity",
            Self::TimeWindow => "TimeWindow",
        }
    }

    /// The progress-event noun for processed units: "identities" for this
    /// engine, "windows" for the sibling (spec.md §4.8).
    #[must_use]
    pub const fn unit_noun(self) -> &'static str {
        match self {
            Self::Identity => "identities",
            Self::TimeWindow => "windows",
        }
    }

    /// The progress-event verb describing the run's activity.
    #[must_use]
    pub const fn activity_verb(self) -> &'static str {
        match self {
            Self::Identity => "correlating",
            Self::TimeWindow => "scanning",
        }
    }
}

/// Top-level configuration for one pipeline run (spec.md §6.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Human-readable pipeline name.
    pub pipeline_name: String,
    /// Optional case identifier.
    #[serde(default)]
    pub case_id: Option<String>,
    /// Optional case name.
    #[serde(default)]
    pub case_name: Option<String>,
    /// Optional investigator name.
    #[serde(default)]
    pub investigator: Option<String>,
    /// Which engine this pipeline runs under.
    pub engine_type: EngineType,
    /// Inclusive lower bound on record timestamps, if filtering by time.
    #[serde(default)]
    pub time_period_start: Option<String>,
    /// Inclusive upper bound on record timestamps, if filtering by time.
    #[serde(default)]
    pub time_period_end: Option<String>,
    /// Glob patterns used by the identity pre-filter (spec.md §4.9).
    #[serde(default)]
    pub identity_filters: Vec<String>,
    /// Whether identity-filter matching is case-sensitive.
    #[serde(default)]
    pub case_sensitive: bool,
    /// Directory the results database and artifacts are written under.
    pub output_dir: String,
    /// Soft memory budget in megabytes, if configured.
    #[serde(default)]
    pub memory_limit_mb: Option<u64>,
    /// Whether streaming persistence is enabled.
    #[serde(default = "default_true")]
    pub streaming_enabled: bool,
    /// Enables verbose debug-level tracing.
    #[serde(default)]
    pub debug_mode: bool,
    /// Enables verbose info-level tracing.
    #[serde(default)]
    pub verbose_logging: bool,
    /// Whether the identity-semantic post-phase runs after correlation.
    #[serde(default)]
    pub identity_semantic_phase_enabled: bool,
}

const fn default_true() -> bool {
    true
}

/// Per-feather configuration within a wing (spec.md §6.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatherConfig {
    /// Identifier of this feather, unique within the run.
    pub feather_id: FeatherId,
    /// Filesystem path to the feather database.
    pub database_path: String,
    /// Declared column hints, if known.
    #[serde(default)]
    pub metadata: Option<FeatherMetadataConfig>,
}

/// Declared column hints for a feather (spec.md §6.1, §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatherMetadataConfig {
    /// Column holding the application/process name.
    #[serde(default)]
    pub application_column: Option<String>,
    /// Column holding the file path.
    #[serde(default)]
    pub path_column: Option<String>,
    /// Column holding a content hash.
    #[serde(default)]
    pub hash_column: Option<String>,
    /// Column name patterns that may hold a timestamp.
    #[serde(default)]
    pub timestamp_patterns: Vec<String>,
}

/// A group of feathers processed as one correlation unit (spec.md §6.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WingConfig {
    /// Identifier of this wing, unique within the pipeline.
    pub wing_id: WingId,
    /// Human-readable wing name.
    pub wing_name: String,
    /// Feathers this wing correlates over.
    pub feathers: Vec<FeatherConfig>,
}
