//! Run session — the controller-owned in-progress and cancellation flags.
//!
//! One session per controller instance, so per-project controllers do not
//! interfere with each other. The flag only guards this process; the
//! cross-client guard is the persisted-queue check in the controller.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::EngineError;

/// In-process run state for one controller.
#[derive(Debug, Default)]
pub struct RunSession {
    in_progress: AtomicBool,
    cancel_requested: AtomicBool,
}

/// Clears the in-progress flag when the run ends, on every exit path.
#[derive(Debug)]
pub struct RunGuard<'a> {
    session: &'a RunSession,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.session.in_progress.store(false, Ordering::SeqCst);
    }
}

impl RunSession {
    /// Creates an idle session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the in-progress flag for a new run and clears any stale
    /// cancellation request.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyInProgress`] if a run is active.
    pub fn begin(&self) -> Result<RunGuard<'_>, EngineError> {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngineError::AlreadyInProgress);
        }
        self.cancel_requested.store(false, Ordering::SeqCst);
        Ok(RunGuard { session: self })
    }

    /// Whether a run is active right now.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    /// Raises the cooperative cancellation signal. The dispatch loop checks
    /// it between iterations; work already accepted remotely continues.
    pub fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested for the active run.
    #[must_use]
    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }
}
