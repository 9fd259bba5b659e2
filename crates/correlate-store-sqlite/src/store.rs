// crates/correlate-store-sqlite/src/store.rs
// ============================================================================
// Module: Streaming Result Writer
// Description: SQLite-backed, append-only sink for executions, results, and
//              matches (spec.md §4.7, §5, §6.3).
// Purpose: Own the results database for one wing's worker thread, batching
//          match writes and committing in one transaction so a crash never
//          leaves a torn batch.
// Dependencies: rusqlite, correlate-core, tracing
// ============================================================================

//! ## Overview
//! One [`StreamingResultWriter`] is created per wing and lives entirely on
//! that wing's worker thread (spec.md §5: no writer is shared across
//! threads). It opens the results database in WAL mode, migrates it to the
//! current schema, creates the `executions`/`results` rows for its run, and
//! then accepts [`Match`] values one at a time, flushing them to disk in
//! batches bounded by count and by estimated byte size (spec.md §4.7).

use std::path::Path;
use std::path::PathBuf;

use correlate_core::EngineType;
use correlate_core::ExecutionId;
use correlate_core::Match;
use correlate_core::RecordTimestamp;
use correlate_core::ResultId;
use correlate_core::WingId;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::compression::decode_from_storage;
use crate::compression::encode_for_storage;
use crate::errors::StoreError;
use crate::schema::initialize_and_migrate;

/// Matches are flushed once this many have accumulated in memory.
pub const BATCH_MAX_MATCHES: usize = 500;

/// Matches are flushed once their estimated serialized size reaches this
/// many bytes, even if `BATCH_MAX_MATCHES` has not been reached.
pub const BATCH_MAX_BYTES: usize = 8 * 1024 * 1024;

/// Parameters needed to open a new execution row (spec.md §6.3,
/// `executions`).
#[derive(Debug, Clone)]
pub struct ExecutionMeta {
    /// Human-readable pipeline name.
    pub pipeline_name: String,
    /// ISO-8601 execution start time.
    pub execution_time: String,
    /// Output directory the run writes artifacts under.
    pub output_directory: String,
    /// Optional case name.
    pub case_name: Option<String>,
    /// Optional investigator name.
    pub investigator: Option<String>,
    /// Which engine produced this run.
    pub engine_type: EngineType,
    /// Serialized wing configuration, if available.
    pub wing_config_json: Option<String>,
    /// Serialized pipeline configuration, if available.
    pub pipeline_config_json: Option<String>,
}

/// Parameters needed to open a new per-wing result row (spec.md §6.3,
/// `results`).
#[derive(Debug, Clone)]
pub struct ResultMeta {
    /// Wing this result row belongs to.
    pub wing_id: WingId,
    /// Human-readable wing name.
    pub wing_name: String,
    /// Feather chosen as the anchor for this wing.
    pub anchor_feather_id: String,
    /// Human-readable reason the anchor feather was selected.
    pub anchor_selection_reason: String,
}

/// Running counters updated as a wing progresses, flushed into the
/// `results` row on [`StreamingResultWriter::finalize`].
#[derive(Debug, Clone, Default)]
pub struct ResultCounters {
    /// Total matches emitted.
    pub total_matches: u64,
    /// Feathers processed.
    pub feathers_processed: u64,
    /// Total records scanned across all feathers.
    pub total_records_scanned: u64,
    /// Matches dropped as duplicates during dedup.
    pub duplicates_prevented: u64,
    /// Matches dropped for failing validation.
    pub matches_failed_validation: u64,
    /// Wall-clock duration of the wing's run.
    pub execution_duration_seconds: f64,
    /// Per-feather statistics (records processed, extracted, filtered,
    /// identities touched) as a JSON array, one entry per feather
    /// (spec.md §3, §4.2, §6.3).
    pub feather_metadata_json: Option<String>,
}

/// Owns one open connection to the results database for the lifetime of a
/// single wing's execution.
pub struct StreamingResultWriter {
    connection: Connection,
    execution_id: ExecutionId,
    result_id: ResultId,
    pending: Vec<Match>,
    pending_bytes: usize,
}

impl StreamingResultWriter {
    /// Opens `path` (creating it if absent), applies WAL pragmas, migrates
    /// the schema, and either inserts a fresh `executions` row or, when
    /// `resume_execution_id` is given, reuses that row in place
    /// (spec.md §4.7, RESUME flow).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] if the file cannot be opened,
    /// [`StoreError::Migration`]/[`StoreError::UnsupportedSchemaVersion`]
    /// if the schema cannot be brought to the current version, or
    /// [`StoreError::ExecutionNotFound`] if `resume_execution_id` does not
    /// name a row in this database.
    pub fn open(path: &Path, execution: &ExecutionMeta, resume_execution_id: Option<ExecutionId>) -> Result<Self, StoreError> {
        let mut connection = Connection::open(path).map_err(|err| StoreError::Open {
            path: path_display(path),
            message: err.to_string(),
        })?;
        apply_pragmas(&connection)?;
        initialize_and_migrate(&mut connection)?;
        let execution_id = match resume_execution_id {
            Some(existing_id) => {
                resume_execution(&connection, existing_id)?;
                existing_id
            }
            None => insert_execution(&connection, execution)?,
        };

        info!(
            execution_id = execution_id.get(),
            pipeline = %execution.pipeline_name,
            path = %path_display(path),
            resumed = resume_execution_id.is_some(),
            "opened results database"
        );

        Ok(Self { connection, execution_id, result_id: ResultId::new(0), pending: Vec::new(), pending_bytes: 0 })
    }

    /// Inserts the `results` row for a wing under this writer's execution.
    /// Must be called once before [`write_match`](Self::write_match).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sql`] if the insert fails.
    pub fn begin_result(&mut self, meta: &ResultMeta) -> Result<ResultId, StoreError> {
        self.connection.execute(
            "INSERT INTO results (execution_id, wing_id, wing_name, anchor_feather_id, anchor_selection_reason)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.execution_id.get(),
                meta.wing_id.as_str(),
                meta.wing_name,
                meta.anchor_feather_id,
                meta.anchor_selection_reason,
            ],
        )?;
        let result_id = ResultId::new(self.connection.last_insert_rowid());
        self.result_id = result_id;
        debug!(result_id = result_id.get(), wing_id = %meta.wing_id, "opened result row");
        Ok(result_id)
    }

    /// Queues a match for writing, flushing the pending batch first if
    /// either batch bound (spec.md §4.7) has been reached.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if serialization or a forced flush fails.
    pub fn write_match(&mut self, item: Match) -> Result<(), StoreError> {
        let estimated_size = serde_json::to_vec(&item)?.len();
        self.pending_bytes += estimated_size;
        self.pending.push(item);

        if self.pending.len() >= BATCH_MAX_MATCHES || self.pending_bytes >= BATCH_MAX_BYTES {
            self.flush()?;
        }
        Ok(())
    }

    /// Commits every pending match in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sql`] if the transaction fails, or
    /// [`StoreError::Serialization`]/[`StoreError::Compression`] if a
    /// match's `feather_records` cannot be encoded.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(&mut self.pending);
        self.pending_bytes = 0;
        let batch_len = batch.len();

        let tx = self.connection.transaction()?;
        for item in &batch {
            insert_match(&tx, self.result_id, item)?;
        }
        tx.commit()?;

        debug!(result_id = self.result_id.get(), count = batch_len, "flushed match batch");
        Ok(())
    }

    /// Writes the `results` row's final counters (spec.md §6.3) after the
    /// wing finishes. Flushes any remaining pending matches first.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the flush or update fails.
    pub fn finalize(&mut self, counters: &ResultCounters) -> Result<(), StoreError> {
        self.flush()?;
        self.connection.execute(
            "UPDATE results SET
                total_matches = ?1,
                feathers_processed = ?2,
                total_records_scanned = ?3,
                duplicates_prevented = ?4,
                matches_failed_validation = ?5,
                execution_duration_seconds = ?6,
                feather_metadata_json = ?7
             WHERE result_id = ?8",
            params![
                counters.total_matches,
                counters.feathers_processed,
                counters.total_records_scanned,
                counters.duplicates_prevented,
                counters.matches_failed_validation,
                counters.execution_duration_seconds,
                counters.feather_metadata_json,
                self.result_id.get(),
            ],
        )?;
        Ok(())
    }

    /// Inserts one `feather_metadata` row under this writer's current
    /// result (spec.md §3, §4.2: one row per feather recording records
    /// processed). Called once per feather right after
    /// [`begin_result`](Self::begin_result), independent of how the wing
    /// later finishes, so the per-feather record survives a pause or
    /// failure.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sql`] if the insert fails.
    pub fn record_feather_metadata(
        &mut self,
        feather_id: &str,
        artifact_type: Option<&str>,
        database_path: &str,
        total_records: u64,
    ) -> Result<(), StoreError> {
        self.connection.execute(
            "INSERT INTO feather_metadata (result_id, feather_id, artifact_type, database_path, total_records)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![self.result_id.get(), feather_id, artifact_type, database_path, total_records],
        )?;
        Ok(())
    }

    /// Records a pause snapshot so a later run can resume (spec.md §5,
    /// cooperative cancellation). Stored as JSON on the owning execution
    /// row; the caller is responsible for restarting a fresh writer against
    /// the same database to resume.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the update fails.
    pub fn record_pause(&mut self, snapshot_json: &str) -> Result<(), StoreError> {
        self.flush()?;
        self.connection.execute(
            "UPDATE executions SET status = 'PAUSED', progress_snapshot_json = ?1 WHERE execution_id = ?2",
            params![snapshot_json, self.execution_id.get()],
        )?;
        warn!(execution_id = self.execution_id.get(), "wing paused; progress snapshot recorded");
        Ok(())
    }

    /// Marks the owning execution complete.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the update fails.
    pub fn complete_execution(&mut self) -> Result<(), StoreError> {
        self.connection.execute(
            "UPDATE executions SET status = 'COMPLETED' WHERE execution_id = ?1",
            params![self.execution_id.get()],
        )?;
        Ok(())
    }

    /// The execution id this writer is appending to.
    #[must_use]
    pub const fn execution_id(&self) -> ExecutionId {
        self.execution_id
    }

    /// The result row this writer is currently appending matches under.
    #[must_use]
    pub const fn result_id(&self) -> ResultId {
        self.result_id
    }
}

fn path_display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn apply_pragmas(connection: &Connection) -> Result<(), StoreError> {
    connection.pragma_update(None, "journal_mode", "WAL")?;
    connection.pragma_update(None, "synchronous", "NORMAL")?;
    connection.pragma_update(None, "foreign_keys", true)?;
    Ok(())
}

fn insert_execution(connection: &Connection, meta: &ExecutionMeta) -> Result<ExecutionId, StoreError> {
    let engine_type_label = match meta.engine_type {
        EngineType::Identity => "identity",
        EngineType::TimeWindow => "time_window",
    };
    let run_number = next_run_number(connection, engine_type_label)?;
    let run_name = build_run_name(meta, run_number);
    connection.execute(
        "INSERT INTO executions (
            pipeline_name, execution_time, output_directory, case_name,
            investigator, engine_type, wing_config_json, pipeline_config_json,
            run_name, run_number
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            meta.pipeline_name,
            meta.execution_time,
            meta.output_directory,
            meta.case_name,
            meta.investigator,
            engine_type_label,
            meta.wing_config_json,
            meta.pipeline_config_json,
            run_name,
            run_number,
        ],
    )?;
    Ok(ExecutionId::new(connection.last_insert_rowid()))
}

/// Next `run_number` for `engine_type_label`: one greater than the highest
/// recorded so far, strictly increasing per engine type (spec.md §6.3,
/// Testable Property 7).
fn next_run_number(connection: &Connection, engine_type_label: &str) -> Result<i64, StoreError> {
    let max: Option<i64> = connection.query_row(
        "SELECT MAX(run_number) FROM executions WHERE engine_type = ?1",
        params![engine_type_label],
        |row| row.get(0),
    )?;
    Ok(max.unwrap_or(0) + 1)
}

/// Builds the `run_name` spec.md §6.3 defines:
/// `{engine_prefix}_{pipeline}_Run{NNN}_{yyyymmdd_HHMMSS}`.
fn build_run_name(meta: &ExecutionMeta, run_number: i64) -> String {
    let prefix = meta.engine_type.run_name_prefix();
    let compact_time =
        RecordTimestamp::parse(&meta.execution_time).map(RecordTimestamp::to_compact_timestamp).unwrap_or_else(|| "00000000_000000".to_string());
    format!("{prefix}_{}_Run{run_number:03}_{compact_time}", meta.pipeline_name)
}

/// Marks an existing `executions` row `RUNNING` again so a resumed wing
/// can keep appending to it (spec.md §4.7, RESUME flow).
fn resume_execution(connection: &Connection, execution_id: ExecutionId) -> Result<(), StoreError> {
    let changed = connection.execute(
        "UPDATE executions SET status = 'RUNNING' WHERE execution_id = ?1",
        params![execution_id.get()],
    )?;
    if changed == 0 {
        return Err(StoreError::ExecutionNotFound(execution_id.get()));
    }
    Ok(())
}

/// A previously paused execution found in an existing results database,
/// ready to be resumed (spec.md §4.7, RESUME flow).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PausedExecution {
    /// The execution row to resume into.
    pub execution_id: ExecutionId,
    /// Identities already processed before the pause, read back from the
    /// stored progress snapshot.
    pub identities_processed: u64,
    /// Matches already persisted under this execution before the pause
    /// (spec.md §8, Scenario E: `resume_info.existing_matches`).
    pub existing_matches: u64,
}

/// Looks for the most recently paused execution in the database at `path`,
/// if any. Returns `None` when the file does not exist yet (a fresh run)
/// or when no execution there is `PAUSED`.
///
/// # Errors
///
/// Returns a [`StoreError`] if the file exists but cannot be opened or
/// queried.
pub fn find_resumable_execution(path: &Path) -> Result<Option<PausedExecution>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let connection = Connection::open(path).map_err(|err| StoreError::Open {
        path: path_display(path),
        message: err.to_string(),
    })?;
    apply_pragmas(&connection)?;

    let row: Option<(i64, Option<String>)> = connection
        .query_row(
            "SELECT execution_id, progress_snapshot_json FROM executions
             WHERE status = 'PAUSED' ORDER BY execution_id DESC LIMIT 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let Some((execution_id, snapshot_json)) = row else {
        return Ok(None);
    };

    let identities_processed = snapshot_json
        .as_deref()
        .and_then(|json| serde_json::from_str::<serde_json::Value>(json).ok())
        .and_then(|value| value.get("identities_processed").and_then(serde_json::Value::as_u64))
        .unwrap_or(0);
    let existing_matches: i64 = connection.query_row(
        "SELECT COALESCE(SUM(total_matches), 0) FROM results WHERE execution_id = ?1",
        params![execution_id],
        |row| row.get(0),
    )?;

    Ok(Some(PausedExecution {
        execution_id: ExecutionId::new(execution_id),
        identities_processed,
        existing_matches: u64::try_from(existing_matches).unwrap_or(0),
    }))
}

fn insert_match(tx: &rusqlite::Transaction<'_>, result_id: ResultId, item: &Match) -> Result<(), StoreError> {
    let raw_records = serde_json::to_vec(&item.feather_records)?;
    let (stored_records, compressed) = encode_for_storage(raw_records)?;
    let score_breakdown_json = item.score_breakdown.as_ref().map(serde_json::to_string).transpose()?;
    let semantic_data_json = item.semantic_data.as_ref().map(serde_json::to_string).transpose()?;
    let (weighted_score_value, weighted_score_interpretation) = item
        .weighted_score
        .as_ref()
        .map_or((None, None), |w| (Some(w.score), Some(w.interpretation.clone())));

    tx.execute(
        "INSERT INTO matches (
            match_id, result_id, timestamp, match_score, confidence_score,
            confidence_category, feather_count, time_spread_seconds,
            anchor_feather_id, anchor_artifact_type, matched_application,
            matched_file_path, is_duplicate, weighted_score_value,
            weighted_score_interpretation, feather_records, score_breakdown_json,
            anchor_start_time, anchor_end_time, anchor_record_count,
            semantic_data_json, compressed
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)",
        params![
            item.match_id.as_str(),
            result_id.get(),
            item.timestamp.to_iso8601(),
            item.match_score,
            item.confidence_score,
            confidence_label(item.confidence_category),
            item.feather_count,
            item.time_spread_seconds,
            item.anchor_feather_id.as_str(),
            item.anchor_artifact_type,
            item.matched_application,
            item.matched_file_path,
            item.is_duplicate,
            weighted_score_value,
            weighted_score_interpretation,
            stored_records,
            score_breakdown_json,
            item.anchor_start.to_iso8601(),
            item.anchor_end.to_iso8601(),
            item.anchor_record_count,
            semantic_data_json,
            compressed,
        ],
    )?;
    Ok(())
}

const fn confidence_label(category: correlate_core::ConfidenceCategory) -> &'static str {
    use correlate_core::ConfidenceCategory;
    match category {
        ConfidenceCategory::Critical => "critical",
        ConfidenceCategory::High => "high",
        ConfidenceCategory::Medium => "medium",
        ConfidenceCategory::Low => "low",
        ConfidenceCategory::Minimal => "minimal",
    }
}

/// Reads back the stored `feather_records` blob for `match_id`, transparently
/// decompressing it if the `compressed` flag is set.
///
/// # Errors
///
/// Returns [`StoreError::ResultNotFound`] if no such match exists, or a
/// deserialization/decompression error if the blob is malformed.
pub fn read_match_feather_records(
    connection: &Connection,
    match_id: &str,
) -> Result<std::collections::BTreeMap<correlate_core::FeatherId, Vec<correlate_core::Record>>, StoreError> {
    let row: Option<(Vec<u8>, bool)> = connection
        .query_row(
            "SELECT feather_records, compressed FROM matches WHERE match_id = ?1",
            params![match_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let (blob, compressed) = row.ok_or_else(|| StoreError::ResultNotFound(0))?;
    let decoded = decode_from_storage(blob, compressed)?;
    Ok(serde_json::from_slice(&decoded)?)
}

/// Resolves the path a new results database should be created at within
/// `output_dir`, given the prior run count for `pipeline_name` under the
/// given engine (spec.md §6.3: `run_name`/`run_number` generation).
#[must_use]
pub fn next_run_path(output_dir: &str, engine_type: EngineType, run_number: u32) -> PathBuf {
    let prefix = engine_type.run_name_prefix();
    PathBuf::from(output_dir).join(format!("{prefix}Run_{run_number:04}.sqlite"))
}

/// One page of match identity fields read back for the semantic
/// post-phase (spec.md §4.10): enough to group matches by identity without
/// pulling every column.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticPhaseRow {
    /// The match's id.
    pub match_id: String,
    /// Display application name, used to group matches by identity.
    pub matched_application: String,
    /// Display file path, used to group matches by identity.
    pub matched_file_path: String,
}

/// Reads one page of up to `limit` matches belonging to `result_id`,
/// ordered by their internal row id, starting after `after_rowid`
/// (spec.md §4.10 step 1: batches of at most 10 000).
///
/// # Errors
///
/// Returns a [`StoreError`] if the query fails.
pub fn fetch_semantic_phase_page(
    connection: &Connection,
    result_id: ResultId,
    after_rowid: i64,
    limit: u32,
) -> Result<Vec<(i64, SemanticPhaseRow)>, StoreError> {
    let mut statement = connection.prepare(
        "SELECT rowid, match_id, matched_application, matched_file_path
         FROM matches
         WHERE result_id = ?1 AND rowid > ?2
         ORDER BY rowid
         LIMIT ?3",
    )?;
    let rows = statement
        .query_map(params![result_id.get(), after_rowid, limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                SemanticPhaseRow {
                    match_id: row.get(1)?,
                    matched_application: row.get(2)?,
                    matched_file_path: row.get(3)?,
                },
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Writes the semantic enrichment produced for `match_id` back onto its
/// row (spec.md §4.10 step 3). The only in-place update the post-phase
/// ever performs.
///
/// # Errors
///
/// Returns a [`StoreError`] if serialization or the update fails.
pub fn apply_semantic_update(
    connection: &Connection,
    match_id: &str,
    semantic_data: &correlate_core::SemanticData,
) -> Result<(), StoreError> {
    let semantic_data_json = serde_json::to_string(semantic_data)?;
    connection.execute(
        "UPDATE matches SET semantic_data_json = ?1 WHERE match_id = ?2",
        params![semantic_data_json, match_id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use correlate_core::ConfidenceCategory;
    use correlate_core::FeatherId;
    use correlate_core::MatchId;
    use correlate_core::RecordTimestamp;
    use correlate_core::WingId;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    use super::ExecutionMeta;
    use super::ResultCounters;
    use super::ResultMeta;
    use super::StreamingResultWriter;
    use correlate_core::EngineType;
    use correlate_core::Match;

    fn sample_match(id: &str) -> Match {
        let ts = RecordTimestamp::parse("2024-01-01T00:00:00Z").expect("parse");
        Match {
            match_id: MatchId::new(id),
            timestamp: ts,
            anchor_start: ts,
            anchor_end: ts,
            anchor_record_count: 2,
            anchor_feather_id: FeatherId::new("prefetch"),
            anchor_artifact_type: "prefetch".to_string(),
            feather_records: BTreeMap::new(),
            feather_count: 1,
            time_spread_seconds: 0,
            match_score: 0.75,
            confidence_score: 0.75,
            confidence_category: ConfidenceCategory::from_score(0.75),
            weighted_score: None,
            score_breakdown: None,
            matched_application: "notepad.exe".to_string(),
            matched_file_path: "C:\\Windows\\notepad.exe".to_string(),
            sub_identities: Vec::new(),
            has_sub_identities: false,
            sub_identity_count: 0,
            is_duplicate: false,
            duplicate_info: None,
            semantic_data: None,
        }
    }

    #[test]
    fn opening_a_writer_creates_an_execution_row() {
        let dir = tempdir().expect("tmpdir");
        let path = dir.path().join("results.sqlite");
        let meta = ExecutionMeta {
            pipeline_name: "test-pipeline".to_string(),
            execution_time: "2024-01-01T00:00:00Z".to_string(),
            output_directory: dir.path().to_string_lossy().into_owned(),
            case_name: None,
            investigator: None,
            engine_type: EngineType::Identity,
            wing_config_json: None,
            pipeline_config_json: None,
        };
        let writer = StreamingResultWriter::open(&path, &meta, None).expect("open");
        assert_eq!(writer.execution_id().get(), 1);
    }

    #[test]
    fn writing_matches_below_batch_threshold_is_flushed_on_finalize() {
        let dir = tempdir().expect("tmpdir");
        let path = dir.path().join("results.sqlite");
        let meta = ExecutionMeta {
            pipeline_name: "test-pipeline".to_string(),
            execution_time: "2024-01-01T00:00:00Z".to_string(),
            output_directory: dir.path().to_string_lossy().into_owned(),
            case_name: None,
            investigator: None,
            engine_type: EngineType::Identity,
            wing_config_json: None,
            pipeline_config_json: None,
        };
        let mut writer = StreamingResultWriter::open(&path, &meta, None).expect("open");
        writer
            .begin_result(&ResultMeta {
                wing_id: WingId::new("wing-1"),
                wing_name: "Wing One".to_string(),
                anchor_feather_id: "prefetch".to_string(),
                anchor_selection_reason: "first configured feather".to_string(),
            })
            .expect("begin result");

        for i in 0..3 {
            writer.write_match(sample_match(&format!("match-{i}"))).expect("write match");
        }

        let mut counters = ResultCounters::default();
        counters.total_matches = 3;
        writer.finalize(&counters).expect("finalize");

        let count: i64 = writer
            .connection
            .query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))
            .expect("count matches");
        assert_eq!(count, 3);
    }
}
