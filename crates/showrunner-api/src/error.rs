//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use showrunner_core::error::StoreError;
use showrunner_engine::error::EngineError;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Store error during startup (schema creation).
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `EngineError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            EngineError::AlreadyInProgress => (StatusCode::CONFLICT, "generation_in_progress"),
            EngineError::Planner(_) => (StatusCode::BAD_GATEWAY, "planner_error"),
            EngineError::Store(store) => match store {
                StoreError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                StoreError::IllegalTransition { .. } => {
                    (StatusCode::CONFLICT, "illegal_transition")
                }
                StoreError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
                StoreError::Infrastructure(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
                }
            },
        };

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use showrunner_core::intent::SceneStatus;
    use uuid::Uuid;

    fn status_of(err: EngineError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn test_already_in_progress_maps_to_409() {
        assert_eq!(status_of(EngineError::AlreadyInProgress), StatusCode::CONFLICT);
    }

    #[test]
    fn test_planner_error_maps_to_502() {
        assert_eq!(
            status_of(EngineError::Planner("model overloaded".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(
            status_of(EngineError::Store(StoreError::NotFound(Uuid::new_v4()))),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_illegal_transition_maps_to_409() {
        assert_eq!(
            status_of(EngineError::Store(StoreError::IllegalTransition {
                intent_id: Uuid::new_v4(),
                from: SceneStatus::Written,
                to: SceneStatus::Pending,
            })),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_infrastructure_maps_to_500() {
        assert_eq!(
            status_of(EngineError::Store(StoreError::Infrastructure(
                "db down".into()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
