// crates/correlate-cli/src/main.rs
// ============================================================================
// Module: Correlate CLI Entry Point
// Description: Loads a pipeline manifest, opens its feathers, and drives
//              the correlation engine to completion.
// Purpose: Provide a minimal host application for correlate-engine: no
//          reporting, search, or GUI surface (spec.md §1, Non-goals).
// Dependencies: clap, correlate-core, correlate-engine, correlate-store-sqlite,
//               ctrlc, serde_json, thiserror, tracing, tracing-subscriber.
// ============================================================================

//! ## Overview
//! The CLI's only job is to turn a JSON manifest (a [`PipelineConfig`]
//! plus a list of [`WingConfig`]) into the [`WingJob`]s
//! [`CorrelationEngine::execute`] expects, by opening each configured
//! feather as a [`SqliteFeather`]. A `Ctrl+C` handler wires into the
//! engine's cooperative cancellation token so a run can be paused cleanly
//! rather than killed outright.

mod sqlite_feather;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use correlate_core::EngineType;
use correlate_core::FeatherMetadataConfig;
use correlate_core::FeatherMetadataHints;
use correlate_core::PipelineConfig;
use correlate_core::WingConfig;
use correlate_core::FailureKind;
use correlate_core::WingOutcome;
use correlate_engine::CorrelationEngine;
use correlate_engine::EngineError;
use correlate_engine::ExecutionSummary;
use correlate_engine::NoOpSemanticRuleEngine;
use correlate_engine::OpenFeather;
use correlate_engine::ScoreConfigManager;
use correlate_engine::SemanticRuleEngine;
use correlate_engine::SimpleFallbackScorer;
use correlate_engine::WingJob;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::sqlite_feather::SqliteFeather;

/// A pipeline manifest on disk: one [`PipelineConfig`] plus the wings it
/// runs over (spec.md §6.1). `correlate-cli` deserializes this directly
/// with no schema-validation layer, matching `correlate-core::config`'s
/// documented division of responsibility.
#[derive(Debug, Deserialize)]
struct RunManifest {
    /// Pipeline-wide configuration.
    pipeline: PipelineConfig,
    /// Wings to run, in submission order.
    wings: Vec<WingConfig>,
}

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "correlate", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = clap::ArgAction::SetTrue)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs a pipeline manifest to completion.
    Run(RunArgs),
}

/// Arguments to the `run` subcommand.
#[derive(Args, Debug)]
struct RunArgs {
    /// Path to the pipeline manifest (pipeline + wings, JSON).
    #[arg(long, value_name = "FILE")]
    config: PathBuf,
}

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();
    match run() {
        Ok(code) => code,
        Err(err) => {
            let _ignored = write_stderr_line(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        write_stdout_line(env!("CARGO_PKG_VERSION")).map_err(|err| CliError::new(err.to_string()))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        write_stdout_line("usage: correlate run --config <FILE>").map_err(|err| CliError::new(err.to_string()))?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Run(args) => command_run(&args),
    }
}

/// Executes the `run` subcommand: load the manifest, open every feather,
/// drive the engine, print a summary.
fn command_run(args: &RunArgs) -> CliResult<ExitCode> {
    let manifest_bytes = fs::read(&args.config).map_err(|err| CliError::new(format!("failed to read {}: {err}", args.config.display())))?;
    let manifest: RunManifest =
        serde_json::from_slice(&manifest_bytes).map_err(|err| CliError::new(format!("invalid manifest {}: {err}", args.config.display())))?;

    let engine = Arc::new(CorrelationEngine::new(manifest.pipeline.clone()));
    install_cancellation_handler(&engine)?;

    let jobs = build_jobs(&manifest)?;
    let scorer: Arc<dyn ScoreConfigManager> = Arc::new(SimpleFallbackScorer);
    let rule_engine: Arc<dyn SemanticRuleEngine> = Arc::new(NoOpSemanticRuleEngine);
    let summary = engine.execute(jobs, scorer, rule_engine).map_err(engine_error_to_cli)?;

    print_summary(&summary)?;

    let any_failed = summary.wing_results.iter().any(|wing| matches!(wing.outcome, WingOutcome::Failed(_)));
    Ok(if any_failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

/// Wires `Ctrl+C` into the engine's cooperative cancellation token
/// (spec.md §4.7, PAUSE flow).
fn install_cancellation_handler(engine: &Arc<CorrelationEngine>) -> CliResult<()> {
    let engine = Arc::clone(engine);
    ctrlc::set_handler(move || {
        warn!("cancellation requested; wings will pause at their next checkpoint");
        engine.request_cancellation();
    })
    .map_err(|err| CliError::new(format!("failed to install signal handler: {err}")))
}

/// Opens every configured feather and assembles one [`WingJob`] per wing.
fn build_jobs(manifest: &RunManifest) -> CliResult<Vec<WingJob>> {
    let mut jobs = Vec::with_capacity(manifest.wings.len());
    for (index, wing) in manifest.wings.iter().enumerate() {
        let run_number = u32::try_from(index.saturating_add(1)).unwrap_or(u32::MAX);
        let database_path = correlate_store_sqlite::next_run_path(&manifest.pipeline.output_dir, manifest.pipeline.engine_type, run_number);

        let mut feathers = Vec::with_capacity(wing.feathers.len());
        for feather_config in &wing.feathers {
            let hints = feather_config.metadata.as_ref().map(config_to_hints);
            let path = std::path::Path::new(&feather_config.database_path);
            let feather = SqliteFeather::open(feather_config.feather_id.clone(), path, hints)
                .map_err(|err| CliError::new(format!("failed to open feather {}: {err}", feather_config.feather_id)))?;
            feathers.push(OpenFeather { feather: Box::new(feather), database_path: feather_config.database_path.clone() });
        }

        let resumable = correlate_store_sqlite::find_resumable_execution(&database_path)
            .map_err(|err| CliError::new(format!("failed to inspect existing results database {}: {err}", database_path.display())))?;
        if let Some(paused) = &resumable {
            info!(wing_id = %wing.wing_id, execution_id = paused.execution_id.get(), identities_processed = paused.identities_processed, "resuming paused execution");
        }

        info!(wing_id = %wing.wing_id, feathers = feathers.len(), "wing configured");
        jobs.push(WingJob {
            config: wing.clone(),
            feathers,
            database_path,
            resume_identities_processed: resumable.as_ref().map_or(0, |paused| paused.identities_processed),
            resume_execution_id: resumable.as_ref().map(|paused| paused.execution_id),
            resume_existing_matches: resumable.as_ref().map_or(0, |paused| paused.existing_matches),
        });
    }
    Ok(jobs)
}

/// Converts a declared [`FeatherMetadataConfig`] into the
/// [`FeatherMetadataHints`] the engine's extractor reads.
fn config_to_hints(config: &FeatherMetadataConfig) -> FeatherMetadataHints {
    FeatherMetadataHints {
        application_column: config.application_column.clone(),
        path_column: config.path_column.clone(),
        hash_column: config.hash_column.clone(),
        timestamp_patterns: config.timestamp_patterns.clone(),
    }
}

/// Maps an [`EngineError`] to a [`CliError`] for display.
fn engine_error_to_cli(err: EngineError) -> CliError {
    CliError::new(err.to_string())
}

/// Prints a one-line-per-wing summary of the run.
fn print_summary(summary: &ExecutionSummary) -> CliResult<()> {
    let engine_label = match summary.engine_type {
        EngineType::Identity => "identity",
        EngineType::TimeWindow => "time_window",
    };
    let filters_applied = summary.filters_applied;
    let cancelled = summary.cancelled;
    let resumed = summary.resumed;
    write_stdout_line(&format!("engine: {engine_label}  filters_applied: {filters_applied}  cancelled: {cancelled}  resumed: {resumed}"))
        .map_err(|err| CliError::new(err.to_string()))?;

    for info in &summary.resume_info {
        write_stdout_line(&format!(
            "wing {}: resumed execution {} ({} identities, {} matches already persisted)",
            info.wing_id,
            info.execution_id.get(),
            info.identities_processed,
            info.existing_matches
        ))
        .map_err(|err| CliError::new(err.to_string()))?;
    }

    for wing in &summary.wing_results {
        let wing_id = &wing.wing_id;
        let outcome_label = outcome_label(&wing.outcome);
        let total_matches = wing.counters.total_matches;
        let total_records_scanned = wing.counters.total_records_scanned;
        let duration = wing.counters.execution_duration_seconds;
        write_stdout_line(&format!("wing {wing_id}: {outcome_label}  matches={total_matches}  records_scanned={total_records_scanned}  duration={duration:.2}s"))
            .map_err(|err| CliError::new(err.to_string()))?;
    }
    Ok(())
}

/// Renders a [`WingOutcome`] as a short human-readable label.
fn outcome_label(outcome: &WingOutcome) -> String {
    match outcome {
        WingOutcome::Completed => "completed".to_string(),
        WingOutcome::Cancelled(snapshot) => format!("cancelled at {:.1}%", snapshot.percentage),
        WingOutcome::Failed(reason) => format!("failed ({})", failure_label(reason)),
    }
}

/// Renders a [`FailureKind`] as a short human-readable label.
fn failure_label(reason: &FailureKind) -> String {
    match reason {
        FailureKind::Stalled => "stalled".to_string(),
        FailureKind::WriterUnavailable(message) | FailureKind::Other(message) => message.clone(),
    }
}

/// Writes one line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    use std::io::Write;
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes one line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    use std::io::Write;
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}
