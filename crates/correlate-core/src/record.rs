// crates/correlate-core/src/record.rs
// ============================================================================
// Module: Correlate Records
// Description: The typed unit ingested from a feather table.
// Purpose: Replace the source's duck-typed string->Any row maps with a
//          small closed value type plus a declarative field map.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Record`] is what the loader hands to the extractor: an opaque
//! field map plus the two reserved keys every row carries
//! (`_feather_id`, `_table`) promoted to first-class fields. `Value` is a
//! closed sum type rather than `serde_json::Value` so that callers cannot
//! accidentally smuggle nested structures a feather row would never
//! contain (spec.md §9, "duck-typed records" redesign note).

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::ids::FeatherId;
use crate::time::RecordTimestamp;

/// A single scalar value read from a feather row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A textual value.
    Text(String),
    /// A signed integer value.
    Integer(i64),
    /// A floating-point value.
    Float(f64),
    /// A binary blob value.
    Blob(Vec<u8>),
    /// An explicit absence of value (as opposed to a missing field).
    Null,
}

impl Value {
    /// Returns the value rendered as a string, for heuristic field
    /// scanning and hashing (spec.md §4.1, §4.5). Binary values render as
    /// an empty string since they are never matched against name/path
    /// patterns.
    #[must_use]
    pub fn as_display_string(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Integer(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Blob(_) | Self::Null => String::new(),
        }
    }

    /// Returns `true` if this value carries no usable content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Blob(bytes) => bytes.is_empty(),
            Self::Null => true,
            Self::Integer(_) | Self::Float(_) => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_display_string())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// A row read from a feather table, tagged with its provenance.
///
/// # Invariants
/// - `feather_id`/`table` are injected by the loader (spec.md §4.2) and are
///   never absent; `fields` holds every other column as read.
/// - `timestamp` is `None` until a timestamp field pattern has matched and
///   parsed successfully (spec.md §4.1); an unparseable or absent
///   timestamp is represented as `None`, never as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Feather this row was read from.
    pub feather_id: FeatherId,
    /// Source table name within the feather.
    pub table: String,
    /// Parsed timestamp, if any field matched a configured pattern.
    pub timestamp: Option<RecordTimestamp>,
    /// All row fields, keyed by column name, in a stable (sorted) order so
    /// extraction heuristics scan deterministically.
    pub fields: BTreeMap<String, Value>,
    /// The name the extractor's column resolver picked for this record,
    /// empty until extraction has run. Not the declared column name — the
    /// resolved value itself (spec.md §4.1, §4.5 step 2).
    pub resolved_name: String,
    /// The path the extractor's column resolver picked for this record,
    /// empty until extraction has run.
    pub resolved_path: String,
}

impl Record {
    /// Creates a record with no fields set; fields are added with
    /// [`Record::with_field`] or by assigning `fields` directly.
    #[must_use]
    pub fn new(feather_id: FeatherId, table: impl Into<String>) -> Self {
        Self {
            feather_id,
            table: table.into(),
            timestamp: None,
            fields: BTreeMap::new(),
            resolved_name: String::new(),
            resolved_path: String::new(),
        }
    }

    /// Builder-style field setter, for constructing test fixtures.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Builder-style timestamp setter.
    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: RecordTimestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Builder-style resolved name/path setter, for constructing test
    /// fixtures that exercise dedup without running full extraction.
    #[must_use]
    pub fn with_resolved_identity(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.resolved_name = name.into();
        self.resolved_path = path.into();
        self
    }

    /// Looks up a field by name, returning its display string if present
    /// and non-empty.
    #[must_use]
    pub fn field_str(&self, name: &str) -> Option<String> {
        self.fields.get(name).filter(|value| !value.is_empty()).map(Value::as_display_string)
    }
}

#[cfg(test)]
mod tests {
    use super::Record;
    use super::Value;
    use crate::ids::FeatherId;

    #[test]
    fn with_field_overwrites_existing_key() {
        let record = Record::new(FeatherId::new("f1"), "Prefetch")
            .with_field("Name", "powershell.exe")
            .with_field("Name", "cmd.exe");
        assert_eq!(record.field_str("Name"), Some("cmd.exe".to_string()));
    }

    #[test]
    fn empty_text_field_is_treated_as_absent() {
        let record = Record::new(FeatherId::new("f1"), "Prefetch").with_field("Path", "   ");
        assert_eq!(record.field_str("Path"), None);
    }

    #[test]
    fn value_display_matches_as_display_string() {
        let value = Value::Integer(42);
        assert_eq!(value.to_string(), "42");
    }
}
