// crates/correlate-core/src/errors.rs
// ============================================================================
// Module: Correlate Core Errors
// Description: Shared error types for configuration and identity handling.
// Purpose: Give callers a stable, programmatically matchable error surface
//          (mirrors SqliteStoreError/BrokerError in the store and engine
//          crates).
// Dependencies: thiserror
// ============================================================================

use thiserror::Error;

/// Errors raised while validating a [`crate::config::PipelineConfig`] or
/// [`crate::config::WingConfig`] before a run starts.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A wing declared no feathers.
    #[error("wing {wing_id} has no feathers configured")]
    EmptyWing {
        /// Offending wing id.
        wing_id: String,
    },
    /// A time filter bound could not be parsed as a timestamp.
    #[error("invalid time filter bound: {0}")]
    InvalidTimeBound(String),
    /// An identity filter pattern failed to compile as a glob.
    #[error("invalid identity filter pattern {pattern:?}: {message}")]
    InvalidFilterPattern {
        /// The offending pattern.
        pattern: String,
        /// Glob compiler's error message.
        message: String,
    },
}
