// crates/correlate-core/src/ids.rs
// ============================================================================
// Module: Correlate Identifiers
// Description: Canonical opaque identifiers used across the correlation
//              engine and the results database.
// Purpose: Provide strongly typed, serializable identifiers with stable
//          wire forms instead of passing raw strings/integers around.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identifiers are opaque newtypes over the primitive the results database
//! stores them as. Numeric identifiers are monotone and assigned by the
//! results store; string identifiers are assigned by the correlation engine
//! itself and carry no externally meaningful structure beyond uniqueness.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Identifier of a feather (an upstream artifact database) within a run.
///
/// # Invariants
/// - Unique within a single engine run (spec.md §3, Feather).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatherId(String);

impl FeatherId {
    /// Creates a new feather identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatherId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FeatherId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Identifier of a wing (a group of feathers processed as one correlation
/// unit; maps to one row in `results`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WingId(String);

impl WingId {
    /// Creates a new wing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an execution (one pipeline run; maps to one row in
/// `executions`).
///
/// # Invariants
/// - Monotone within the results database, assigned at row insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(i64);

impl ExecutionId {
    /// Creates an execution identifier from a raw row id.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw row identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a result row (the per-wing roll-up; 1-to-many under an
/// execution).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultId(i64);

impl ResultId {
    /// Creates a result identifier from a raw row id.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw row identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Globally unique match identifier (spec.md §3, Match).
///
/// # Invariants
/// - Incorporates execution id, microsecond clock, and a monotonic counter
///   (spec.md §4.5 step 4), so equality never occurs across two matches
///   produced in the same run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    /// Creates a match identifier from an already-formatted string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::FeatherId;
    use super::MatchId;

    #[test]
    fn feather_id_round_trips_through_display() {
        let id = FeatherId::new("prefetch_01");
        assert_eq!(id.to_string(), "prefetch_01");
        assert_eq!(id.as_str(), "prefetch_01");
    }

    #[test]
    fn match_id_preserves_exact_string() {
        let id = MatchId::new("match_e1_123456_0_2");
        assert_eq!(id.as_str(), "match_e1_123456_0_2");
    }
}
