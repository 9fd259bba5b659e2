// crates/correlate-engine/src/cancellation.rs
// ============================================================================
// Module: Cancellation Token
// Description: Cooperative cancellation flag checked at suspension points.
// Purpose: Implement spec.md §4.8's cancellation token and §5's
//          "checked only at suspension points" contract without exceptions
//          (spec.md §9 redesign note).
// Dependencies: correlate-core
// ============================================================================

//! ## Overview
//! The source raises an exception at `check_cancellation`, caught at the
//! wing boundary. Here the wing loop calls [`CancellationToken::is_set`] at
//! its suspension points and returns early with
//! [`correlate_core::WingOutcome::Cancelled`] itself; nothing in this
//! module unwinds the stack.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

/// A cooperative cancellation flag, cheaply cloneable and shareable across
/// the engine coordinator and the wing it is cancelling (spec.md §4.8).
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    /// Shared cancellation flag.
    flagged: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flagged.store(true, Ordering::SeqCst);
    }

    /// `true` once [`CancellationToken::cancel`] has been called.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.flagged.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::CancellationToken;

    #[test]
    fn a_clone_observes_the_original_being_cancelled() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_set());
        token.cancel();
        assert!(clone.is_set());
    }
}
