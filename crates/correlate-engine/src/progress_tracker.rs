// crates/correlate-engine/src/progress_tracker.rs
// ============================================================================
// Module: Progress Tracker
// Description: Per-run counters, rate/ETA estimation, and a synchronous
//              listener bus.
// Purpose: Implement spec.md §4.8's progress tracker and reporter without
//          the source's cyclic tracker<->listener references (spec.md §9
//          redesign note: "central broker that owns all listeners").
// Dependencies: correlate-core
// ============================================================================

//! ## Overview
//! [`ProgressTracker`] owns its counters and its listener list; listeners
//! are plain `Box<dyn FnMut(&ProgressEvent) + Send>` closures invoked
//! synchronously on the emitter's thread (spec.md §5: "listeners must be
//! non-blocking"). Elapsed time and ETA are both derived from a
//! caller-supplied `Instant`, never read internally.

use std::time::Instant;

use correlate_core::EngineType;
use correlate_core::ErrorDetails;
use correlate_core::ItemProgress;
use correlate_core::OverallProgress;
use correlate_core::ProgressEvent;
use correlate_core::ProgressEventType;

/// A listener callback invoked synchronously for every emitted event.
pub type ProgressListener = Box<dyn FnMut(&ProgressEvent) + Send>;

/// Chooses the percentage-threshold reporting cadence for a dataset of
/// `total` items (spec.md §4.8, Progress reporter): `10%` generally, `5%`
/// above 50k items, `2%` above 100k.
#[must_use]
pub const fn reporting_interval_percent(total: u64) -> f64 {
    if total > 100_000 {
        2.0
    } else if total > 50_000 {
        5.0
    } else {
        10.0
    }
}

/// Per-run progress counters and event bus (spec.md §4.8).
pub struct ProgressTracker {
    /// Engine type this run is under, for event terminology.
    engine_type: EngineType,
    /// Total items expected, if known.
    total_items: u64,
    /// Items processed so far.
    processed_items: u64,
    /// Matches emitted so far.
    matches_found: u64,
    /// Run start time.
    start_time: Instant,
    /// Last percentage threshold crossed, to avoid re-emitting the same
    /// threshold repeatedly.
    last_reported_percent: f64,
    /// Registered listeners.
    listeners: Vec<ProgressListener>,
}

impl ProgressTracker {
    /// Creates a tracker for a run expecting `total_items` items.
    #[must_use]
    pub fn new(engine_type: EngineType, total_items: u64, start_time: Instant) -> Self {
        Self {
            engine_type,
            total_items,
            processed_items: 0,
            matches_found: 0,
            start_time,
            last_reported_percent: 0.0,
            listeners: Vec::new(),
        }
    }

    /// Registers a listener (spec.md §6.2, `add_progress_listener`).
    pub fn add_listener(&mut self, listener: ProgressListener) {
        self.listeners.push(listener);
    }

    /// Overall progress snapshot at `now`.
    #[must_use]
    pub fn overall_progress(&self, now: Instant) -> OverallProgress {
        let elapsed = now.saturating_duration_since(self.start_time).as_secs_f64();
        let rate = (elapsed > 0.0).then(|| {
            #[expect(
                clippy::cast_precision_loss,
                reason = "processed-item counts are far below f64's exact-integer range in practice"
            )]
            let processed = self.processed_items as f64;
            processed / elapsed
        });
        let eta_seconds = rate.filter(|rate| *rate > 0.0).map(|rate| {
            #[expect(
                clippy::cast_precision_loss,
                reason = "item counts are far below f64's exact-integer range in practice"
            )]
            let remaining = self.total_items.saturating_sub(self.processed_items) as f64;
            remaining / rate
        });
        #[expect(
            clippy::cast_precision_loss,
            reason = "item counts are far below f64's exact-integer range in practice"
        )]
        let percentage = if self.total_items == 0 {
            0.0
        } else {
            (self.processed_items as f64 / self.total_items as f64 * 100.0).min(100.0)
        };
        OverallProgress {
            processed: self.processed_items,
            total: self.total_items,
            percentage,
            matches_found: self.matches_found,
            rate,
            eta_seconds,
        }
    }

    /// Records `delta` additional processed items and `matches_delta`
    /// additional matches, then emits a progress event if a reporting
    /// threshold has been crossed (spec.md §4.8, Progress reporter).
    pub fn record_processed(&mut self, now: Instant, delta: u64, matches_delta: u64) {
        self.processed_items += delta;
        self.matches_found += matches_delta;
        let progress = self.overall_progress(now);
        let interval = reporting_interval_percent(self.total_items);
        if progress.percentage - self.last_reported_percent >= interval || progress.percentage >= 100.0 {
            self.last_reported_percent = progress.percentage;
            self.emit(ProgressEventType::ScanningStart, progress, None, None, None);
        }
    }

    /// Emits an arbitrary event immediately, bypassing the threshold
    /// cadence (used for phase-boundary events: scan start/complete,
    /// batch complete, cancellation, errors).
    pub fn emit_now(
        &mut self,
        event_type: ProgressEventType,
        now: Instant,
        item_progress: Option<ItemProgress>,
        message: Option<String>,
        error_details: Option<ErrorDetails>,
    ) {
        let progress = self.overall_progress(now);
        self.emit(event_type, progress, item_progress, message, error_details);
    }

    /// Builds and dispatches one event to every listener.
    fn emit(
        &mut self,
        event_type: ProgressEventType,
        overall_progress: OverallProgress,
        item_progress: Option<ItemProgress>,
        message: Option<String>,
        error_details: Option<ErrorDetails>,
    ) {
        let event = ProgressEvent {
            event_type,
            timestamp: correlate_core::RecordTimestamp::from_utc(chrono::Utc::now()).to_iso8601(),
            overall_progress,
            item_progress,
            message,
            error_details,
            additional_data: Some(serde_json::json!({
                "unit_noun": self.engine_type.unit_noun(),
                "activity_verb": self.engine_type.activity_verb(),
            })),
        };
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::time::Instant;

    use correlate_core::EngineType;
    use correlate_core::ProgressEventType;

    use super::ProgressTracker;
    use super::reporting_interval_percent;

    #[test]
    fn small_dataset_reports_every_ten_percent() {
        assert!((reporting_interval_percent(100) - 10.0).abs() < f64::EPSILON);
        assert!((reporting_interval_percent(60_000) - 5.0).abs() < f64::EPSILON);
        assert!((reporting_interval_percent(150_000) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn listeners_observe_emitted_events() {
        let now = Instant::now();
        let mut tracker = ProgressTracker::new(EngineType::Identity, 10, now);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        tracker.add_listener(Box::new(move |event| {
            seen_clone.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(event.event_type);
        }));

        tracker.emit_now(ProgressEventType::ScanningStart, now, None, None, None);
        tracker.record_processed(now, 10, 1);

        assert!(seen.lock().unwrap_or_else(std::sync::PoisonError::into_inner).contains(&ProgressEventType::ScanningStart));
    }
}
