// crates/correlate-cli/src/sqlite_feather.rs
// ============================================================================
// Module: SQLite Feather Reader
// Description: Generic read-only Feather implementation over a SQLite file.
// Purpose: Give correlate-cli something concrete to hand the engine without
//          embedding any artifact-specific parser (spec.md §1, Non-goals —
//          the core consumes feathers, it does not build them).
// Dependencies: correlate-core, rusqlite
// ============================================================================

//! ## Overview
//! A feather is, on disk, just a SQLite file (spec.md §3, Feather). This
//! reader treats every non-system table as an artifact table without
//! knowing anything about Prefetch, Amcache, or any other specific
//! collector's schema: each column becomes a field, and a timestamp field
//! is resolved by scanning declared `timestamp_patterns` (falling back to
//! a fixed default list) and parsing it via [`RecordTimestamp::parse`].

use correlate_core::Feather;
use correlate_core::FeatherError;
use correlate_core::FeatherId;
use correlate_core::FeatherMetadataHints;
use correlate_core::Record;
use correlate_core::RecordTimestamp;
use correlate_core::Value;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::types::ValueRef;

/// Column-name substrings tried, in order, when a feather declares no
/// `timestamp_patterns` of its own.
const DEFAULT_TIMESTAMP_PATTERNS: &[&str] = &["timestamp", "time", "date", "_ts"];

/// A read-only [`Feather`] backed by a single SQLite file, opened once and
/// queried per table on demand (spec.md §5, "opened read-only, one at a
/// time, from the loader").
pub struct SqliteFeather {
    /// Identifier of this feather, unique within the run.
    id: FeatherId,
    /// Read-only connection to the feather's backing file.
    connection: Connection,
    /// Declared column hints, if any were configured.
    hints: Option<FeatherMetadataHints>,
}

impl SqliteFeather {
    /// Opens `path` read-only as a feather named `id`.
    ///
    /// # Errors
    ///
    /// Returns [`FeatherError::TableEnumeration`] if the file cannot be
    /// opened as a SQLite database.
    pub fn open(id: FeatherId, path: &std::path::Path, hints: Option<FeatherMetadataHints>) -> Result<Self, FeatherError> {
        let connection = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX)
            .map_err(|err| FeatherError::TableEnumeration { feather_id: id.clone(), message: err.to_string() })?;
        Ok(Self { id, connection, hints })
    }

    /// The timestamp column-name patterns to scan: declared hints if any,
    /// otherwise [`DEFAULT_TIMESTAMP_PATTERNS`].
    fn timestamp_patterns(&self) -> Vec<&str> {
        self.hints
            .as_ref()
            .filter(|hints| !hints.timestamp_patterns.is_empty())
            .map_or_else(|| DEFAULT_TIMESTAMP_PATTERNS.to_vec(), |hints| hints.timestamp_patterns.iter().map(String::as_str).collect())
    }
}

impl Feather for SqliteFeather {
    fn feather_id(&self) -> &FeatherId {
        &self.id
    }

    fn tables(&self) -> Result<Vec<String>, FeatherError> {
        let mut statement = self
            .connection
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'")
            .map_err(|err| FeatherError::TableEnumeration { feather_id: self.id.clone(), message: err.to_string() })?;
        let rows = statement
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|err| FeatherError::TableEnumeration { feather_id: self.id.clone(), message: err.to_string() })?;
        let mut tables = Vec::new();
        for row in rows {
            tables.push(row.map_err(|err| FeatherError::TableEnumeration { feather_id: self.id.clone(), message: err.to_string() })?);
        }
        Ok(tables)
    }

    fn rows(&self, table: &str) -> Result<Vec<Record>, FeatherError> {
        let quoted = table.replace('"', "\"\"");
        let query = format!("SELECT * FROM \"{quoted}\"");
        let map_err = |err: rusqlite::Error| FeatherError::RowRead { feather_id: self.id.clone(), table: table.to_string(), message: err.to_string() };

        let mut statement = self.connection.prepare(&query).map_err(map_err)?;
        let column_names: Vec<String> = statement.column_names().iter().map(|name| (*name).to_string()).collect();
        let patterns = self.timestamp_patterns();

        let rows = statement
            .query_map([], |sql_row| {
                let mut record = Record::new(self.id.clone(), table);
                for (index, column) in column_names.iter().enumerate() {
                    let value = sql_value_ref_to_value(sql_row.get_ref(index)?);
                    record.fields.insert(column.clone(), value);
                }
                Ok(record)
            })
            .map_err(map_err)?;

        let mut records = Vec::new();
        for row in rows {
            let mut record = row.map_err(map_err)?;
            record.timestamp = resolve_timestamp(&record, &patterns);
            records.push(record);
        }
        Ok(records)
    }

    fn metadata_hints(&self) -> Option<&FeatherMetadataHints> {
        self.hints.as_ref()
    }
}

/// Converts one SQLite cell into a [`Value`].
fn sql_value_ref_to_value(value_ref: ValueRef<'_>) -> Value {
    match value_ref {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(integer) => Value::Integer(integer),
        ValueRef::Real(real) => Value::Float(real),
        ValueRef::Text(text) => Value::Text(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(blob) => Value::Blob(blob.to_vec()),
    }
}

/// Finds the first field whose column name matches one of `patterns`
/// case-insensitively and parses it as a timestamp, per spec.md §4.1's
/// "timestamp column family drawn from configured patterns" rule.
fn resolve_timestamp(record: &Record, patterns: &[&str]) -> Option<RecordTimestamp> {
    record.fields.iter().find_map(|(column, value)| {
        let lower = column.to_ascii_lowercase();
        if !patterns.iter().any(|pattern| lower.contains(pattern)) {
            return None;
        }
        RecordTimestamp::parse(&value.as_display_string())
    })
}

#[cfg(test)]
mod tests {
    use correlate_core::FeatherId;
    use rusqlite::Connection;

    use super::SqliteFeather;
    use super::resolve_timestamp;

    fn sample_feather() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("feather.sqlite");
        let connection = Connection::open(&path).expect("open");
        connection.execute("CREATE TABLE Prefetch (Name TEXT, Path TEXT, RunTimestamp TEXT)", []).expect("create table");
        connection
            .execute("INSERT INTO Prefetch (Name, Path, RunTimestamp) VALUES ('notepad.exe', 'c:\\windows\\notepad.exe', '2024-01-01T10:00:00')", [])
            .expect("insert");
        (dir, path)
    }

    #[test]
    fn tables_lists_user_tables_only() {
        let (_dir, path) = sample_feather();
        let feather = SqliteFeather::open(FeatherId::new("f1"), &path, None).expect("open feather");
        let tables = feather.tables().expect("tables");
        assert_eq!(tables, vec!["Prefetch".to_string()]);
    }

    #[test]
    fn rows_resolves_a_timestamp_field_by_pattern() {
        let (_dir, path) = sample_feather();
        let feather = SqliteFeather::open(FeatherId::new("f1"), &path, None).expect("open feather");
        let rows = feather.rows("Prefetch").expect("rows");
        assert_eq!(rows.len(), 1);
        assert!(rows[0].timestamp.is_some());
        assert_eq!(rows[0].field_str("Name"), Some("notepad.exe".to_string()));
    }

    #[test]
    fn resolve_timestamp_ignores_non_matching_columns() {
        let record = correlate_core::Record::new(FeatherId::new("f1"), "Prefetch").with_field("Name", "notepad.exe");
        assert!(resolve_timestamp(&record, &["timestamp"]).is_none());
    }
}
