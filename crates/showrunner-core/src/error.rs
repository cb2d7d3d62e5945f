//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

use crate::intent::SceneStatus;

/// Top-level error type for store operations and domain rules.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record was not found.
    #[error("record not found: {0}")]
    NotFound(Uuid),

    /// A status change does not follow a defined edge of the intent
    /// state machine.
    #[error("illegal status transition for intent {intent_id}: {from:?} -> {to:?}")]
    IllegalTransition {
        /// The intent whose status was being changed.
        intent_id: Uuid,
        /// The current status.
        from: SceneStatus,
        /// The requested status.
        to: SceneStatus,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
