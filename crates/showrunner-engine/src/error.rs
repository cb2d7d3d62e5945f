//! Engine error types.

use showrunner_core::error::StoreError;
use thiserror::Error;

/// Errors surfaced by the generation controller.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A run is already in progress for this controller or project.
    #[error("a generation run is already in progress; resume it with continue_run instead of starting over")]
    AlreadyInProgress,

    /// The planner failed; without intents there is nothing to run.
    #[error("planning failed: {0}")]
    Planner(String),

    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
