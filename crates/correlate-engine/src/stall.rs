// crates/correlate-engine/src/stall.rs
// ============================================================================
// Module: Stall Monitor
// Description: Declares a stall when no progress is recorded for a
//              configured timeout.
// Purpose: Implement spec.md §4.8's stall watchdog: bounded operation
//          history, bounded error list, health status, batched checks.
// Dependencies: correlate-core
// ============================================================================

//! ## Overview
//! The monitor is ticked explicitly by the wing loop at its suspension
//! points (spec.md §5, every 10 000-20 000 items); it never spawns its own
//! timer thread. Elapsed time is computed from a caller-supplied `now`
//! (an explicit `std::time::Instant`), keeping the module free of hidden
//! wall-clock reads.

use std::time::Duration;
use std::time::Instant;

/// Health classification for the current run (spec.md §4.8): `healthy`
/// below 80% of the timeout, `warning` from 80% up to the timeout itself,
/// `stalled` once the timeout has elapsed with no progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallHealth {
    /// No progress concerns.
    Healthy,
    /// Elapsed time since last progress has passed 80% of the timeout.
    Warning,
    /// Elapsed time since last progress has reached the timeout.
    Stalled,
}

/// Bounded history of recent operations, for the diagnostics bundle logged
/// on stall (spec.md §4.8).
const OPERATION_HISTORY_CAPACITY: usize = 50;

/// Bounded list of recent error messages, for the same diagnostics bundle.
const ERROR_HISTORY_CAPACITY: usize = 50;

/// Default stall timeout (spec.md §4.8).
pub const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_secs(300);

/// The stall watchdog for one wing's run.
#[derive(Debug, Clone)]
pub struct StallMonitor {
    /// Timeout after which no-progress is declared a stall.
    timeout: Duration,
    /// Last time progress was recorded.
    last_progress_at: Instant,
    /// Processed-item count as of the last progress record.
    last_processed_count: u64,
    /// Current processing stage label.
    current_stage: String,
    /// Last successful operation label.
    last_successful_operation: Option<String>,
    /// Bounded ring of recent operation labels.
    operation_history: Vec<String>,
    /// Bounded ring of recent error messages.
    error_history: Vec<String>,
}

/// A diagnostics bundle logged once a stall is declared (spec.md §4.8).
#[derive(Debug, Clone)]
pub struct StallDiagnostics {
    /// Current processing stage at the time of the stall.
    pub current_stage: String,
    /// Last successful operation, if any was recorded.
    pub last_successful_operation: Option<String>,
    /// Recent operation history, oldest first.
    pub operation_history: Vec<String>,
    /// Recent error messages, oldest first.
    pub error_history: Vec<String>,
    /// Items processed as of the last progress record.
    pub last_processed_count: u64,
}

impl StallMonitor {
    /// Creates a monitor with the given timeout, started at `now`.
    #[must_use]
    pub fn new(timeout: Duration, now: Instant) -> Self {
        Self {
            timeout,
            last_progress_at: now,
            last_processed_count: 0,
            current_stage: "initializing".to_string(),
            last_successful_operation: None,
            operation_history: Vec::new(),
            error_history: Vec::new(),
        }
    }

    /// Records progress: resets the stall clock and updates the processed
    /// count.
    pub fn record_progress(&mut self, now: Instant, processed_count: u64, operation: impl Into<String>) {
        self.last_progress_at = now;
        self.last_processed_count = processed_count;
        let operation = operation.into();
        self.last_successful_operation = Some(operation.clone());
        push_bounded(&mut self.operation_history, operation, OPERATION_HISTORY_CAPACITY);
    }

    /// Records a recoverable error into the bounded error history.
    pub fn record_error(&mut self, message: impl Into<String>) {
        push_bounded(&mut self.error_history, message.into(), ERROR_HISTORY_CAPACITY);
    }

    /// Updates the current stage label.
    pub fn set_stage(&mut self, stage: impl Into<String>) {
        self.current_stage = stage.into();
    }

    /// Classifies health at `now` relative to the configured timeout.
    #[must_use]
    pub fn health(&self, now: Instant) -> StallHealth {
        let elapsed = now.saturating_duration_since(self.last_progress_at);
        if elapsed >= self.timeout {
            StallHealth::Stalled
        } else if elapsed.as_secs_f64() >= self.timeout.as_secs_f64() * 0.8 {
            StallHealth::Warning
        } else {
            StallHealth::Healthy
        }
    }

    /// Builds the diagnostics bundle logged when [`StallMonitor::health`]
    /// reports [`StallHealth::Stalled`].
    #[must_use]
    pub fn diagnostics(&self) -> StallDiagnostics {
        StallDiagnostics {
            current_stage: self.current_stage.clone(),
            last_successful_operation: self.last_successful_operation.clone(),
            operation_history: self.operation_history.clone(),
            error_history: self.error_history.clone(),
            last_processed_count: self.last_processed_count,
        }
    }
}

/// Pushes `value` onto `history`, evicting the oldest entry once `capacity`
/// is exceeded.
fn push_bounded(history: &mut Vec<String>, value: String, capacity: usize) {
    history.push(value);
    if history.len() > capacity {
        history.remove(0);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use std::time::Instant;

    use super::StallHealth;
    use super::StallMonitor;

    #[test]
    fn health_is_healthy_immediately_after_creation() {
        let now = Instant::now();
        let monitor = StallMonitor::new(Duration::from_secs(300), now);
        assert_eq!(monitor.health(now), StallHealth::Healthy);
    }

    #[test]
    fn health_is_stalled_once_timeout_elapses_with_no_progress() {
        let start = Instant::now();
        let monitor = StallMonitor::new(Duration::from_secs(1), start);
        let later = start + Duration::from_secs(2);
        assert_eq!(monitor.health(later), StallHealth::Stalled);
    }

    #[test]
    fn recording_progress_resets_the_stall_clock() {
        let start = Instant::now();
        let mut monitor = StallMonitor::new(Duration::from_secs(10), start);
        let midpoint = start + Duration::from_secs(9);
        monitor.record_progress(midpoint, 100, "scan_feather");
        let later = midpoint + Duration::from_secs(1);
        assert_eq!(monitor.health(later), StallHealth::Healthy);
    }

    #[test]
    fn operation_history_is_bounded() {
        let start = Instant::now();
        let mut monitor = StallMonitor::new(Duration::from_secs(300), start);
        for i in 0..100 {
            monitor.record_progress(start, u64::from(i), format!("op_{i}"));
        }
        assert!(monitor.diagnostics().operation_history.len() <= 50);
    }
}
