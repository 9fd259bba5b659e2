// crates/correlate-engine/src/engine.rs
// ============================================================================
// Module: Correlation Engine Orchestrator
// Description: Wires loader, extractor, index, anchor clusterer, match
//              builder, scoring, and the streaming writer into one wing
//              run, and fans wings out across worker threads.
// Purpose: Implement spec.md §6.2's engine API surface and §5's
//          concurrency model (one std::thread per wing, cooperative
//          suspension points, FIFO writer flush).
// Dependencies: correlate-core, correlate-store-sqlite
// ============================================================================

//! ## Overview
//! [`CorrelationEngine`] owns the run-wide [`CancellationToken`] and the
//! shared progress-listener registry; everything else (the identity index,
//! the anchor clusterer, the match builder, the writer) is built fresh on
//! each wing's own worker thread, since spec.md §5 requires the core to be
//! single-threaded *within* a wing. `execute` spawns one thread per wing,
//! joins them, and folds the outcomes into one [`ExecutionSummary`].

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use correlate_core::ConfigError;
use correlate_core::EngineType;
use correlate_core::ExecutionId;
use correlate_core::Feather;
use correlate_core::FailureKind;
use correlate_core::PauseSnapshot;
use correlate_core::PipelineConfig;
use correlate_core::ProgressEvent;
use correlate_core::ResultId;
use correlate_core::WingConfig;
use correlate_core::WingOutcome;
use correlate_store_sqlite::ExecutionMeta;
use correlate_store_sqlite::ResultCounters;
use correlate_store_sqlite::ResultMeta;
use correlate_store_sqlite::StoreError;
use correlate_store_sqlite::StreamingResultWriter;
use rusqlite::Connection;
use thiserror::Error;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::anchor_clusterer;
use crate::cancellation::CancellationToken;
use crate::filters::IdentityFilter;
use crate::filters::TimeFilter;
use crate::index::IdentityIndex;
use crate::loader::FeatherStats;
use crate::loader::load_feather;
use crate::match_builder::MatchIdGenerator;
use crate::match_builder::build_match;
use crate::progress_tracker::ProgressListener;
use crate::progress_tracker::ProgressTracker;
use crate::scoring::ScoreConfigManager;
use crate::scoring::score_with_fallback;
use crate::semantic::SemanticRuleEngine;
use crate::semantic::run_semantic_phase;
use crate::stall::DEFAULT_STALL_TIMEOUT;
use crate::stall::StallHealth;
use crate::stall::StallMonitor;

/// Identities are checked for cancellation/stall/progress every this many
/// identities (spec.md §5, "10 000-15 000 depending on size").
const SUSPENSION_INTERVAL: u64 = 10_000;

/// Fatal engine failures — only writer-open failures and bad wing
/// configuration surface this way (spec.md §7, Propagation policy).
#[derive(Debug, Error)]
pub enum EngineError {
    /// A wing's configuration failed validation before it ran.
    #[error("wing {wing_id} failed validation: {source}")]
    InvalidWing {
        /// Offending wing.
        wing_id: String,
        /// Underlying validation error.
        #[source]
        source: ConfigError,
    },
    /// The wing's results database could not be opened.
    #[error("wing {wing_id} could not open its results database: {source}")]
    WriterUnavailable {
        /// Offending wing.
        wing_id: String,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },
}

/// One feather, opened and ready to be read, together with the metadata
/// the match builder and writer need to attribute records to it
/// (spec.md §3, Feather).
pub struct OpenFeather {
    /// The opened feather.
    pub feather: Box<dyn Feather + Send>,
    /// Path the feather was opened from, recorded into `feather_metadata`.
    pub database_path: String,
}

/// One wing's input: its configuration plus its already-opened feathers.
/// Opening feather databases is the caller's responsibility (spec.md §1,
/// Non-goals: artifact-specific parsers are out of scope for this crate).
pub struct WingJob {
    /// The wing's declared configuration.
    pub config: WingConfig,
    /// The wing's opened feathers, in configuration order.
    pub feathers: Vec<OpenFeather>,
    /// Path the wing's results database should be written to.
    pub database_path: PathBuf,
    /// If resuming a paused run, the number of identities already
    /// processed and persisted in a prior attempt against the same
    /// database (spec.md §8, PAUSE/RESUME idempotence).
    pub resume_identities_processed: u64,
    /// If resuming a paused run, the execution row to reuse rather than
    /// inserting a fresh one (spec.md §4.7, §8 RESUME flow).
    pub resume_execution_id: Option<ExecutionId>,
    /// If resuming a paused run, the number of matches already persisted
    /// under `resume_execution_id` before the pause.
    pub resume_existing_matches: u64,
}

/// Outcome and counters for one completed (or cancelled, or failed) wing.
#[derive(Debug)]
pub struct WingResult {
    /// Wing this result belongs to.
    pub wing_id: String,
    /// How the wing's run ended.
    pub outcome: WingOutcome,
    /// Final counters written to the `results` row.
    pub counters: ResultCounters,
}

/// The consolidated outcome of one `execute` call (spec.md §6.2).
#[derive(Debug)]
pub struct ExecutionSummary {
    /// Engine type this run executed under.
    pub engine_type: EngineType,
    /// `true` if a time or identity pre-filter was configured.
    pub filters_applied: bool,
    /// Per-wing results, in the order the wings were submitted.
    pub wing_results: Vec<WingResult>,
    /// `true` if cancellation was requested at any point during this run.
    pub cancelled: bool,
    /// `true` if any wing in this run resumed a previously paused
    /// execution rather than starting fresh.
    pub resumed: bool,
    /// One entry per wing that resumed a previously paused execution.
    pub resume_info: Vec<ResumeInfo>,
}

/// Describes one wing's resume of a previously paused execution
/// (spec.md §8, Scenario E).
#[derive(Debug, Clone)]
pub struct ResumeInfo {
    /// Wing that resumed.
    pub wing_id: String,
    /// Execution row that was reused.
    pub execution_id: ExecutionId,
    /// Identities already processed before the pause.
    pub identities_processed: u64,
    /// Matches already persisted under the execution before the pause.
    pub existing_matches: u64,
}

/// A cross-thread progress-listener bus. Each wing's own
/// [`ProgressTracker`] registers one closure here that forwards events
/// (its own listeners are `Box<dyn FnMut + Send>`, not `Sync`, so they
/// cannot be shared directly across the wing threads that call
/// [`CorrelationEngine::add_progress_listener`]).
struct ListenerRegistry {
    /// Monotonic id source for registered listeners.
    next_id: AtomicU64,
    /// Registered listeners, keyed by the id returned from `add`.
    listeners: Mutex<Vec<(u64, Arc<dyn Fn(&ProgressEvent) + Send + Sync>)>>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    fn new() -> Self {
        Self { next_id: AtomicU64::new(1), listeners: Mutex::new(Vec::new()) }
    }

    /// Registers `listener`, returning an id that can later be passed to
    /// [`ListenerRegistry::remove`].
    fn add(&self, listener: Arc<dyn Fn(&ProgressEvent) + Send + Sync>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push((id, listener));
        id
    }

    /// Unregisters the listener previously returned as `id`, if still present.
    fn remove(&self, id: u64) {
        self.listeners.lock().unwrap_or_else(std::sync::PoisonError::into_inner).retain(|(entry_id, _)| *entry_id != id);
    }

    /// Dispatches `event` to every currently registered listener, in
    /// registration order.
    fn dispatch(&self, event: &ProgressEvent) {
        let listeners = self.listeners.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for (_, listener) in listeners.iter() {
            listener(event);
        }
    }
}

/// Orchestrates a full pipeline run across one or more wings
/// (spec.md §6.2).
pub struct CorrelationEngine {
    /// Pipeline configuration shared read-only by every wing.
    pipeline: PipelineConfig,
    /// Cooperative cancellation flag shared across every wing thread.
    cancellation: CancellationToken,
    /// Cross-thread progress listener registry.
    listeners: Arc<ListenerRegistry>,
    /// Stall timeout handed to each wing's [`StallMonitor`].
    stall_timeout: Duration,
}

impl CorrelationEngine {
    /// Creates an engine for one pipeline run.
    #[must_use]
    pub fn new(pipeline: PipelineConfig) -> Self {
        Self {
            pipeline,
            cancellation: CancellationToken::new(),
            listeners: Arc::new(ListenerRegistry::new()),
            stall_timeout: DEFAULT_STALL_TIMEOUT,
        }
    }

    /// Requests cooperative cancellation of every running wing
    /// (spec.md §6.2, §8 "Cancellation liveness").
    pub fn request_cancellation(&self) {
        self.cancellation.cancel();
    }

    /// `true` once [`CorrelationEngine::request_cancellation`] has been
    /// called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_set()
    }

    /// Registers a progress listener, returning an id that can later be
    /// passed to [`CorrelationEngine::remove_progress_listener`]
    /// (spec.md §6.2).
    pub fn add_progress_listener(&self, listener: Arc<dyn Fn(&ProgressEvent) + Send + Sync>) -> u64 {
        self.listeners.add(listener)
    }

    /// Unregisters a previously added progress listener.
    pub fn remove_progress_listener(&self, listener_id: u64) {
        self.listeners.remove(listener_id);
    }

    /// Runs every wing in `jobs` to completion (or cancellation, or
    /// failure), one worker thread per wing (spec.md §5, §6.2).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] only for the conditions spec.md §7 allows
    /// to surface: a wing's configuration failing validation, or its
    /// results database failing to open. Every other failure is folded
    /// into that wing's [`WingOutcome::Failed`] instead.
    pub fn execute(
        &self,
        jobs: Vec<WingJob>,
        scorer: Arc<dyn ScoreConfigManager>,
        rule_engine: Arc<dyn SemanticRuleEngine>,
    ) -> Result<ExecutionSummary, EngineError> {
        for job in &jobs {
            if job.config.feathers.is_empty() {
                return Err(EngineError::InvalidWing {
                    wing_id: job.config.wing_id.as_str().to_string(),
                    source: ConfigError::EmptyWing { wing_id: job.config.wing_id.as_str().to_string() },
                });
            }
        }

        let filters_applied = self.pipeline.time_period_start.is_some()
            || self.pipeline.time_period_end.is_some()
            || !self.pipeline.identity_filters.is_empty();

        let resume_info: Vec<ResumeInfo> = jobs
            .iter()
            .filter_map(|job| {
                job.resume_execution_id.map(|execution_id| ResumeInfo {
                    wing_id: job.config.wing_id.as_str().to_string(),
                    execution_id,
                    identities_processed: job.resume_identities_processed,
                    existing_matches: job.resume_existing_matches,
                })
            })
            .collect();
        let resumed = !resume_info.is_empty();

        let mut handles = Vec::with_capacity(jobs.len());
        for job in jobs {
            let pipeline = self.pipeline.clone();
            let cancellation = self.cancellation.clone();
            let listeners = Arc::clone(&self.listeners);
            let stall_timeout = self.stall_timeout;
            let scorer = Arc::clone(&scorer);
            let rule_engine = Arc::clone(&rule_engine);
            handles.push(std::thread::spawn(move || {
                run_wing(&pipeline, job, &cancellation, &listeners, stall_timeout, &*scorer, &*rule_engine)
            }));
        }

        let mut wing_results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.join() {
                Ok(Ok(result)) => wing_results.push(result),
                Ok(Err(err)) => return Err(err),
                Err(_) => {
                    error!("a wing worker thread panicked");
                }
            }
        }

        Ok(ExecutionSummary {
            engine_type: self.pipeline.engine_type,
            filters_applied,
            cancelled: self.cancellation.is_set(),
            resumed,
            resume_info,
            wing_results,
        })
    }
}

/// Runs one wing to completion on the calling thread. Split out of
/// [`CorrelationEngine::execute`] so it can be handed to
/// [`std::thread::spawn`] without capturing `&self`.
fn run_wing(
    pipeline: &PipelineConfig,
    job: WingJob,
    cancellation: &CancellationToken,
    listeners: &Arc<ListenerRegistry>,
    stall_timeout: Duration,
    scorer: &dyn ScoreConfigManager,
    rule_engine: &dyn SemanticRuleEngine,
) -> Result<WingResult, EngineError> {
    let wing_id = job.config.wing_id.as_str().to_string();
    let database_path = job.database_path.clone();
    let writer = open_writer(pipeline, &job, &wing_id)?;
    let (outcome, counters, result_id) = execute_wing_body(pipeline, job, cancellation, listeners, stall_timeout, scorer, writer);

    if matches!(outcome, WingOutcome::Completed) && pipeline.identity_semantic_phase_enabled {
        match Connection::open(&database_path) {
            Ok(connection) => {
                let (summary, err) = run_semantic_phase(&connection, result_id, pipeline.engine_type, rule_engine);
                if let Some(err) = err {
                    error!(wing_id, error = %err, "semantic post-phase aborted");
                }
                info!(wing_id, matches_updated = summary.matches_updated, identities_mapped = summary.identities_mapped, "semantic post-phase ran");
            }
            Err(err) => error!(wing_id, error = %err, "could not reopen results database for semantic post-phase"),
        }
    }

    Ok(WingResult { wing_id, outcome, counters })
}

/// Opens the results database for `job` and inserts (or resumes) its
/// `executions` row.
fn open_writer(pipeline: &PipelineConfig, job: &WingJob, wing_id: &str) -> Result<StreamingResultWriter, EngineError> {
    let execution_meta = ExecutionMeta {
        pipeline_name: pipeline.pipeline_name.clone(),
        execution_time: now_iso8601(),
        output_directory: pipeline.output_dir.clone(),
        case_name: pipeline.case_name.clone(),
        investigator: pipeline.investigator.clone(),
        engine_type: pipeline.engine_type,
        wing_config_json: serde_json::to_string(&job.config).ok(),
        pipeline_config_json: serde_json::to_string(pipeline).ok(),
    };
    StreamingResultWriter::open(&job.database_path, &execution_meta, job.resume_execution_id)
        .map_err(|source| EngineError::WriterUnavailable { wing_id: wing_id.to_string(), source })
}

/// Loads every feather, builds the identity index, and walks identities
/// in order, emitting matches as it goes (spec.md §4.1-§4.8).
fn execute_wing_body(
    pipeline: &PipelineConfig,
    job: WingJob,
    cancellation: &CancellationToken,
    listeners: &Arc<ListenerRegistry>,
    stall_timeout: Duration,
    scorer: &dyn ScoreConfigManager,
    mut writer: StreamingResultWriter,
) -> (WingOutcome, ResultCounters, ResultId) {
    let total_feathers = job.feathers.len();
    let time_filter = match TimeFilter::new(pipeline.time_period_start.as_deref(), pipeline.time_period_end.as_deref()) {
        Ok(filter) => filter,
        Err(err) => {
            warn!(wing_id = %job.config.wing_id, error = %err, "invalid time filter bounds; proceeding unfiltered");
            TimeFilter::default()
        }
    };
    let identity_filter = match IdentityFilter::new(&pipeline.identity_filters, pipeline.case_sensitive) {
        Ok(filter) => filter,
        Err(err) => {
            warn!(wing_id = %job.config.wing_id, error = %err, "invalid identity filter patterns; proceeding unfiltered");
            IdentityFilter::default()
        }
    };

    let mut index = IdentityIndex::new();
    let mut total_records_scanned = 0u64;
    let mut per_feather: Vec<(String, String, FeatherStats)> = Vec::with_capacity(job.feathers.len());
    for open_feather in &job.feathers {
        let stats = load_feather(open_feather.feather.as_ref(), &time_filter, &identity_filter, &mut index);
        total_records_scanned += stats.total_rows;
        per_feather.push((open_feather.feather.feather_id().as_str().to_string(), open_feather.database_path.clone(), stats));
    }

    let anchor_feather_id = job.feathers.first().map_or_else(String::new, |feather| feather.feather.feather_id().as_str().to_string());
    if let Err(err) = writer.begin_result(&ResultMeta {
        wing_id: job.config.wing_id.clone(),
        wing_name: job.config.wing_name.clone(),
        anchor_feather_id,
        anchor_selection_reason: "first configured feather".to_string(),
    }) {
        error!(wing_id = %job.config.wing_id, error = %err, "failed to open result row");
        return (WingOutcome::Failed(FailureKind::WriterUnavailable(err.to_string())), ResultCounters::default(), writer.result_id());
    }

    for (feather_id, database_path, stats) in &per_feather {
        if let Err(err) = writer.record_feather_metadata(feather_id, None, database_path, stats.total_rows) {
            warn!(wing_id = %job.config.wing_id, feather_id, error = %err, "failed to record feather metadata");
        }
    }
    let feather_metadata_json = serde_json::to_string(
        &per_feather
            .iter()
            .map(|(feather_id, _, stats)| {
                serde_json::json!({
                    "feather_id": feather_id,
                    "total_rows": stats.total_rows,
                    "extracted": stats.extracted,
                    "filtered": stats.filtered,
                    "identities_touched": stats.identities_touched,
                })
            })
            .collect::<Vec<_>>(),
    )
    .ok();

    let id_generator = MatchIdGenerator::new(writer.execution_id());
    let wing_start = Instant::now();
    let mut stall = StallMonitor::new(stall_timeout, wing_start);
    let total_identities = u64::try_from(index.len()).unwrap_or(u64::MAX);
    let mut tracker = ProgressTracker::new(pipeline.engine_type, total_identities, wing_start);
    tracker.add_listener(dispatching_listener(listeners));

    let now_for_anchors = correlate_core::RecordTimestamp::from_utc(chrono::Utc::now());
    let mut total_matches = 0u64;
    let mut processed: u64 = 0;
    let mut last_identity_key: Option<String> = None;
    let skip = job.resume_identities_processed;

    for (position, identity) in index.into_ordered_identities().enumerate() {
        let position = u64::try_from(position).unwrap_or(u64::MAX);
        if position < skip {
            continue;
        }
        last_identity_key = Some(identity.identity_key.as_str().to_string());
        let anchors = anchor_clusterer::cluster(&identity, anchor_clusterer::DEFAULT_WINDOW_MINUTES, now_for_anchors);
        for anchor in &anchors {
            let clock_micros = current_micros();
            let mut built = build_match(
                &id_generator,
                clock_micros,
                anchor,
                total_feathers,
                &identity.display_name,
                &identity.path,
                &identity.sub_identities,
            );
            score_with_fallback(scorer, &mut built, total_feathers);
            if let Err(err) = writer.write_match(built) {
                warn!(wing_id = %job.config.wing_id, error = %err, "failed to queue match for writing");
                continue;
            }
            total_matches += 1;
        }
        processed += 1;

        if processed % SUSPENSION_INTERVAL == 0 {
            let now = Instant::now();
            stall.record_progress(now, processed, "identity_processed");
            tracker.record_processed(now, SUSPENSION_INTERVAL, total_matches);

            if cancellation.is_set() {
                return pause_and_flush(&mut writer, job.config.wing_id.to_string(), processed, total_identities, last_identity_key.clone(), total_matches, total_records_scanned, u64::try_from(total_feathers).unwrap_or(0), wing_start, feather_metadata_json.clone());
            }
            if stall.health(now) == StallHealth::Stalled {
                let diagnostics = stall.diagnostics();
                error!(
                    wing_id = %job.config.wing_id,
                    stage = %diagnostics.current_stage,
                    last_successful_operation = ?diagnostics.last_successful_operation,
                    "wing stalled; no progress within timeout"
                );
                let _ = writer.flush();
                return (WingOutcome::Failed(FailureKind::Stalled), counters(total_matches, total_feathers, total_records_scanned, wing_start, feather_metadata_json.clone()), writer.result_id());
            }
        }
    }

    if cancellation.is_set() {
        return pause_and_flush(&mut writer, job.config.wing_id.to_string(), processed, total_identities, last_identity_key, total_matches, total_records_scanned, u64::try_from(total_feathers).unwrap_or(0), wing_start, feather_metadata_json);
    }

    let final_counters = counters(total_matches, total_feathers, total_records_scanned, wing_start, feather_metadata_json);
    if let Err(err) = writer.finalize(&final_counters) {
        error!(wing_id = %job.config.wing_id, error = %err, "failed to finalize result row");
    }
    if let Err(err) = writer.complete_execution() {
        error!(wing_id = %job.config.wing_id, error = %err, "failed to mark execution complete");
    }
    info!(wing_id = %job.config.wing_id, total_matches, "wing completed");
    (WingOutcome::Completed, final_counters, writer.result_id())
}

/// Assembles the final [`ResultCounters`] for a wing from its live state.
fn counters(total_matches: u64, total_feathers: usize, total_records_scanned: u64, start: Instant, feather_metadata_json: Option<String>) -> ResultCounters {
    ResultCounters {
        total_matches,
        feathers_processed: u64::try_from(total_feathers).unwrap_or(0),
        total_records_scanned,
        duplicates_prevented: 0,
        matches_failed_validation: 0,
        execution_duration_seconds: start.elapsed().as_secs_f64(),
        feather_metadata_json,
    }
}

/// Flushes pending matches, records a [`PauseSnapshot`], and returns the
/// [`WingOutcome::Cancelled`] outcome for a wing that observed cancellation
/// mid-run (spec.md §4.7, §8 Scenario E).
#[expect(clippy::too_many_arguments, reason = "assembles one PauseSnapshot from the wing loop's live state; every argument is a distinct piece of that snapshot")]
fn pause_and_flush(
    writer: &mut StreamingResultWriter,
    wing_id: String,
    processed: u64,
    total_identities: u64,
    last_identity_key: Option<String>,
    total_matches: u64,
    total_records_scanned: u64,
    total_feathers: u64,
    wing_start: Instant,
    feather_metadata_json: Option<String>,
) -> (WingOutcome, ResultCounters, ResultId) {
    #[expect(clippy::cast_precision_loss, reason = "identity counts are far below f64's exact-integer range in practice")]
    let percentage = if total_identities == 0 { 100.0 } else { processed as f64 / total_identities as f64 * 100.0 };
    let snapshot = PauseSnapshot {
        execution_id: writer.execution_id(),
        identities_processed: processed,
        total_identities,
        percentage,
        last_identity_key,
        paused_at: now_iso8601(),
    };
    let snapshot_json = serde_json::to_string(&snapshot).unwrap_or_else(|_| "{}".to_string());
    if let Err(err) = writer.record_pause(&snapshot_json) {
        error!(wing_id, error = %err, "failed to record pause snapshot");
    }
    warn!(wing_id, processed, "wing cancelled; pausing with partial results");
    (WingOutcome::Cancelled(snapshot), counters(total_matches, total_feathers.try_into().unwrap_or(0), total_records_scanned, wing_start, feather_metadata_json), writer.result_id())
}

/// Builds a [`ProgressTracker`] listener that forwards every event into the
/// shared cross-thread [`ListenerRegistry`].
fn dispatching_listener(listeners: &Arc<ListenerRegistry>) -> ProgressListener {
    let listeners = Arc::clone(listeners);
    Box::new(move |event: &ProgressEvent| listeners.dispatch(event))
}

/// Current wall-clock reading in microseconds since the Unix epoch, for
/// [`MatchIdGenerator::next`]'s id formula (spec.md §4.5 step 4).
#[expect(clippy::cast_possible_truncation, reason = "microseconds since epoch fit comfortably in u64 for any realistic run date")]
fn current_micros() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|duration| duration.as_micros() as u64).unwrap_or(0)
}

/// Current wall-clock time rendered as ISO-8601, for execution/pause
/// timestamps.
fn now_iso8601() -> String {
    correlate_core::RecordTimestamp::from_utc(chrono::Utc::now()).to_iso8601()
}

#[cfg(test)]
mod tests {
    use correlate_core::FeatherError;
    use correlate_core::FeatherId;
    use correlate_core::Record;
    use correlate_core::WingId;

    use super::*;
    use crate::scoring::SimpleFallbackScorer;

    struct SingleRowFeather {
        id: FeatherId,
    }

    impl Feather for SingleRowFeather {
        fn feather_id(&self) -> &FeatherId {
            &self.id
        }

        fn tables(&self) -> Result<Vec<String>, FeatherError> {
            Ok(vec!["Prefetch".to_string()])
        }

        fn rows(&self, _table: &str) -> Result<Vec<Record>, FeatherError> {
            Ok(vec![
                Record::new(self.id.clone(), "Prefetch")
                    .with_field("Name", "notepad.exe")
                    .with_field("Path", "c:\\windows\\notepad.exe")
                    .with_timestamp(correlate_core::RecordTimestamp::parse("2024-01-01T10:00:00").expect("parseable")),
            ])
        }
    }

    fn sample_pipeline() -> PipelineConfig {
        PipelineConfig {
            pipeline_name: "test-pipeline".to_string(),
            case_id: None,
            case_name: None,
            investigator: None,
            engine_type: EngineType::Identity,
            time_period_start: None,
            time_period_end: None,
            identity_filters: Vec::new(),
            case_sensitive: false,
            output_dir: std::env::temp_dir().to_string_lossy().into_owned(),
            memory_limit_mb: None,
            streaming_enabled: true,
            debug_mode: false,
            verbose_logging: false,
            identity_semantic_phase_enabled: false,
        }
    }

    #[test]
    fn a_single_feather_wing_produces_one_match() {
        let dir = tempfile::tempdir().expect("tempdir");
        let database_path = dir.path().join("IdentityRun_0001.sqlite");
        let pipeline = sample_pipeline();
        let engine = CorrelationEngine::new(pipeline);

        let job = WingJob {
            config: WingConfig {
                wing_id: WingId::new("wing-1"),
                wing_name: "Wing One".to_string(),
                feathers: vec![correlate_core::FeatherConfig {
                    feather_id: FeatherId::new("f1"),
                    database_path: "unused".to_string(),
                    metadata: None,
                }],
            },
            feathers: vec![OpenFeather { feather: Box::new(SingleRowFeather { id: FeatherId::new("f1") }), database_path: "unused".to_string() }],
            database_path,
            resume_identities_processed: 0,
            resume_execution_id: None,
            resume_existing_matches: 0,
        };

        let summary =
            engine.execute(vec![job], Arc::new(SimpleFallbackScorer), Arc::new(crate::semantic::NoOpSemanticRuleEngine)).expect("execute succeeds");
        assert_eq!(summary.wing_results.len(), 1);
        assert_eq!(summary.wing_results[0].outcome, WingOutcome::Completed);
        assert_eq!(summary.wing_results[0].counters.total_matches, 1);
        assert!(!summary.resumed);
    }

    #[test]
    fn a_wing_with_no_feathers_is_rejected_before_any_thread_spawns() {
        let pipeline = sample_pipeline();
        let engine = CorrelationEngine::new(pipeline);
        let job = WingJob {
            config: WingConfig { wing_id: WingId::new("wing-empty"), wing_name: "Empty".to_string(), feathers: Vec::new() },
            feathers: Vec::new(),
            database_path: PathBuf::from("unused.sqlite"),
            resume_identities_processed: 0,
            resume_execution_id: None,
            resume_existing_matches: 0,
        };
        let result = engine.execute(vec![job], Arc::new(SimpleFallbackScorer), Arc::new(crate::semantic::NoOpSemanticRuleEngine));
        assert!(result.is_err());
    }
}
