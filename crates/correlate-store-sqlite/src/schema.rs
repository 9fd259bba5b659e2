// crates/correlate-store-sqlite/src/schema.rs
// ============================================================================
// Module: Correlate Results Schema
// Description: Base schema and additive migration list for the results
//              database.
// Purpose: Replace ad-hoc try/except ALTER migration (spec.md §9 redesign
//          note) with an explicit `[(version, statement)]` list applied in
//          order against a `pragma_table_info` snapshot, recorded in a
//          `schema_version` table.
// Dependencies: rusqlite
// ============================================================================

//! ## Overview
//! Version 1 is the base schema: the four tables of spec.md §6.3 without
//! the columns spec.md §4.7 calls out as migration additions
//! (`anchor_start_time`, `anchor_end_time`, `anchor_record_count`,
//! `semantic_data`, `compressed`, `feather_metadata`, `run_name`,
//! `run_number`). Each later version adds exactly one of those, by an
//! additive `ALTER TABLE` or `CREATE TABLE IF NOT EXISTS`, never a
//! destructive change (spec.md §3, Schema invariants).

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::params;

use crate::errors::StoreError;

/// Current schema version this writer creates/migrates up to.
pub const CURRENT_SCHEMA_VERSION: i64 = 7;

const BASE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS executions (
    execution_id INTEGER PRIMARY KEY AUTOINCREMENT,
    pipeline_name TEXT NOT NULL,
    execution_time TEXT NOT NULL,
    duration_seconds REAL,
    total_wings INTEGER NOT NULL DEFAULT 0,
    total_matches INTEGER NOT NULL DEFAULT 0,
    total_records_scanned INTEGER NOT NULL DEFAULT 0,
    output_directory TEXT NOT NULL,
    case_name TEXT,
    investigator TEXT,
    errors_json TEXT NOT NULL DEFAULT '[]',
    warnings_json TEXT NOT NULL DEFAULT '[]',
    engine_type TEXT NOT NULL,
    wing_config_json TEXT,
    pipeline_config_json TEXT,
    time_period_start TEXT,
    time_period_end TEXT,
    identity_filters_json TEXT NOT NULL DEFAULT '[]',
    status TEXT NOT NULL DEFAULT 'RUNNING'
);
CREATE TABLE IF NOT EXISTS results (
    result_id INTEGER PRIMARY KEY AUTOINCREMENT,
    execution_id INTEGER NOT NULL REFERENCES executions(execution_id),
    wing_id TEXT NOT NULL,
    wing_name TEXT NOT NULL,
    total_matches INTEGER NOT NULL DEFAULT 0,
    feathers_processed INTEGER NOT NULL DEFAULT 0,
    total_records_scanned INTEGER NOT NULL DEFAULT 0,
    duplicates_prevented INTEGER NOT NULL DEFAULT 0,
    matches_failed_validation INTEGER NOT NULL DEFAULT 0,
    execution_duration_seconds REAL,
    anchor_feather_id TEXT,
    anchor_selection_reason TEXT,
    filters_applied_json TEXT NOT NULL DEFAULT '{}'
);
CREATE TABLE IF NOT EXISTS matches (
    match_id TEXT PRIMARY KEY,
    result_id INTEGER NOT NULL REFERENCES results(result_id),
    timestamp TEXT NOT NULL,
    match_score REAL NOT NULL,
    confidence_score REAL NOT NULL,
    confidence_category TEXT NOT NULL,
    feather_count INTEGER NOT NULL,
    time_spread_seconds INTEGER NOT NULL DEFAULT 0,
    anchor_feather_id TEXT NOT NULL,
    anchor_artifact_type TEXT NOT NULL,
    matched_application TEXT,
    matched_file_path TEXT,
    matched_event_id TEXT,
    is_duplicate INTEGER NOT NULL DEFAULT 0,
    weighted_score_value REAL,
    weighted_score_interpretation TEXT,
    feather_records BLOB NOT NULL,
    score_breakdown_json TEXT
);
CREATE INDEX IF NOT EXISTS idx_results_execution_id ON results (execution_id);
CREATE INDEX IF NOT EXISTS idx_matches_result_id ON matches (result_id);
CREATE INDEX IF NOT EXISTS idx_matches_timestamp ON matches (timestamp);
CREATE INDEX IF NOT EXISTS idx_matches_match_score ON matches (match_score);
CREATE INDEX IF NOT EXISTS idx_matches_matched_application ON matches (matched_application);
CREATE INDEX IF NOT EXISTS idx_executions_engine_type ON executions (engine_type);
CREATE INDEX IF NOT EXISTS idx_executions_execution_time ON executions (execution_time);
CREATE INDEX IF NOT EXISTS idx_executions_pipeline_name ON executions (pipeline_name);
";

/// One additive migration step.
struct Migration {
    /// Schema version this step produces.
    version: i64,
    /// Table the step applies to (used for the `pragma_table_info` check).
    table: &'static str,
    /// Column this step adds, or `None` when the step only creates a
    /// table/index (idempotent via `IF NOT EXISTS`, so re-running is safe).
    column: Option<&'static str>,
    /// SQL to run when the column/table is missing.
    statement: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 2,
        table: "matches",
        column: Some("anchor_start_time"),
        statement: "ALTER TABLE matches ADD COLUMN anchor_start_time TEXT;
                     ALTER TABLE matches ADD COLUMN anchor_end_time TEXT;
                     ALTER TABLE matches ADD COLUMN anchor_record_count INTEGER NOT NULL DEFAULT 0;",
    },
    Migration {
        version: 3,
        table: "matches",
        column: Some("semantic_data_json"),
        statement: "ALTER TABLE matches ADD COLUMN semantic_data_json TEXT;",
    },
    Migration {
        version: 4,
        table: "matches",
        column: Some("compressed"),
        statement: "ALTER TABLE matches ADD COLUMN compressed INTEGER NOT NULL DEFAULT 0;",
    },
    Migration {
        version: 5,
        table: "executions",
        column: Some("run_name"),
        statement: "ALTER TABLE executions ADD COLUMN run_name TEXT;
                     ALTER TABLE executions ADD COLUMN run_number INTEGER NOT NULL DEFAULT 0;",
    },
    Migration {
        version: 6,
        table: "results",
        column: Some("feather_metadata_json"),
        statement: "ALTER TABLE results ADD COLUMN feather_metadata_json TEXT;",
    },
    Migration {
        version: 7,
        table: "feather_metadata",
        column: None,
        statement: "CREATE TABLE IF NOT EXISTS feather_metadata (
                         metadata_id INTEGER PRIMARY KEY AUTOINCREMENT,
                         result_id INTEGER NOT NULL REFERENCES results(result_id),
                         feather_id TEXT NOT NULL,
                         artifact_type TEXT,
                         database_path TEXT,
                         total_records INTEGER NOT NULL DEFAULT 0
                     );
                     CREATE INDEX IF NOT EXISTS idx_feather_metadata_result_id
                         ON feather_metadata (result_id);
                     ALTER TABLE executions ADD COLUMN progress_snapshot_json TEXT;",
    },
];

/// Opens (creating if necessary) the schema at `connection`, migrating it
/// up to [`CURRENT_SCHEMA_VERSION`].
///
/// # Errors
///
/// Returns [`StoreError::Migration`] if any migration step fails, or
/// [`StoreError::UnsupportedSchemaVersion`] if the database was created by
/// a newer writer.
pub fn initialize_and_migrate(connection: &mut Connection) -> Result<(), StoreError> {
    let tx = connection.transaction()?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;
    let current: Option<i64> =
        tx.query_row("SELECT version FROM schema_version LIMIT 1", params![], |row| row.get(0))
            .optional()?;

    match current {
        None => {
            tx.execute_batch(BASE_SCHEMA)?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![CURRENT_SCHEMA_VERSION],
            )?;
        }
        Some(found) if found == CURRENT_SCHEMA_VERSION => {}
        Some(found) if found > CURRENT_SCHEMA_VERSION => {
            return Err(StoreError::UnsupportedSchemaVersion {
                found,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }
        Some(found) => {
            apply_migrations(&tx, found)?;
            tx.execute("UPDATE schema_version SET version = ?1", params![CURRENT_SCHEMA_VERSION])?;
        }
    }

    tx.commit()?;
    Ok(())
}

/// Applies every migration step above `from_version`, skipping steps
/// whose column already exists (idempotent re-entry).
fn apply_migrations(tx: &Transaction<'_>, from_version: i64) -> Result<(), StoreError> {
    for migration in MIGRATIONS.iter().filter(|step| step.version > from_version) {
        let already_applied = match migration.column {
            Some(column) => table_has_column(tx, migration.table, column)?,
            None => table_exists(tx, migration.table)?,
        };
        if already_applied {
            continue;
        }
        tx.execute_batch(migration.statement).map_err(|err| StoreError::Migration {
            target_version: migration.version,
            message: err.to_string(),
        })?;
    }
    Ok(())
}

/// Checks whether `table` declares `column`, via `pragma_table_info`.
fn table_has_column(tx: &Transaction<'_>, table: &str, column: &str) -> Result<bool, StoreError> {
    let sql = format!("SELECT 1 FROM pragma_table_info('{table}') WHERE name = ?1");
    let found: Option<i64> = tx.query_row(&sql, params![column], |row| row.get(0)).optional()?;
    Ok(found.is_some())
}

/// Checks whether `table` exists in `sqlite_master`.
fn table_exists(tx: &Transaction<'_>, table: &str) -> Result<bool, StoreError> {
    let found: Option<i64> = tx
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use rusqlite::params;

    use super::CURRENT_SCHEMA_VERSION;
    use super::initialize_and_migrate;

    #[test]
    fn fresh_database_lands_on_current_version() {
        let mut connection = Connection::open_in_memory().expect("open");
        initialize_and_migrate(&mut connection).expect("init");
        let version: i64 = connection
            .query_row("SELECT version FROM schema_version LIMIT 1", params![], |row| row.get(0))
            .expect("read version");
        assert_eq!(version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn migrating_from_version_one_adds_every_additive_column() {
        let mut connection = Connection::open_in_memory().expect("open");
        {
            let tx = connection.transaction().expect("tx");
            tx.execute_batch(super::BASE_SCHEMA).expect("base schema");
            tx.execute_batch("CREATE TABLE schema_version (version INTEGER NOT NULL);")
                .expect("version table");
            tx.execute("INSERT INTO schema_version (version) VALUES (1)", params![])
                .expect("seed version");
            tx.commit().expect("commit");
        }

        initialize_and_migrate(&mut connection).expect("migrate");

        let version: i64 = connection
            .query_row("SELECT version FROM schema_version LIMIT 1", params![], |row| row.get(0))
            .expect("read version");
        assert_eq!(version, CURRENT_SCHEMA_VERSION);

        for (table, column) in [
            ("matches", "anchor_start_time"),
            ("matches", "semantic_data_json"),
            ("matches", "compressed"),
            ("executions", "run_name"),
            ("results", "feather_metadata_json"),
        ] {
            let sql = format!("SELECT 1 FROM pragma_table_info('{table}') WHERE name = ?1");
            let found: Option<i64> =
                connection.query_row(&sql, params![column], |row| row.get(0)).ok();
            assert!(found.is_some(), "expected {table}.{column} to exist after migration");
        }
    }

    #[test]
    fn rerunning_migration_on_current_schema_is_a_no_op() {
        let mut connection = Connection::open_in_memory().expect("open");
        initialize_and_migrate(&mut connection).expect("init");
        initialize_and_migrate(&mut connection).expect("re-init");
    }
}
