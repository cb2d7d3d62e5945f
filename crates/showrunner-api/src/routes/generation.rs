//! Routes driving the generation controller.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get, routing::post};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use showrunner_engine::controller::{ResumeOutcome, StartOutcome, StartRequest};
use showrunner_engine::progress::ProgressReport;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /start.
#[derive(Debug, Deserialize)]
pub struct StartGenerationRequest {
    /// The project to generate for.
    pub project_id: Uuid,
    /// The narrative outline to generate from.
    pub outline: String,
    /// Episode to generate.
    pub episode_number: i32,
    /// Output language.
    #[serde(default = "default_language")]
    pub language: String,
    /// Quality tier requested from the backend.
    #[serde(default = "default_quality_tier")]
    pub quality_tier: String,
    /// Target format.
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_quality_tier() -> String {
    "standard".to_string()
}

fn default_format() -> String {
    "series".to_string()
}

/// Request body for POST /continue, /cancel, and /reset.
#[derive(Debug, Deserialize)]
pub struct ProjectRequest {
    /// The project whose run is addressed.
    pub project_id: Uuid,
}

/// Response body for POST /cancel.
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    /// Whether a cancellation signal was raised.
    pub cancelled: bool,
}

/// Response body for POST /reset.
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    /// Always "reset" once the deletion went through.
    pub status: &'static str,
}

/// POST /start — plans the outline and drives dispatch until the run
/// settles. The response carries what the run achieved.
#[instrument(skip(state, request), fields(project_id = %request.project_id, episode = request.episode_number))]
async fn start_generation(
    State(state): State<AppState>,
    Json(request): Json<StartGenerationRequest>,
) -> Result<Json<StartOutcome>, ApiError> {
    info!("handling start request");
    let controller = state.controller(request.project_id).await?;
    let outcome = controller
        .start(StartRequest {
            outline: request.outline,
            episode_number: request.episode_number,
            language: request.language,
            quality_tier: request.quality_tier,
            format: request.format,
        })
        .await?;
    Ok(Json(outcome))
}

/// POST /continue — resumes an interrupted run.
#[instrument(skip(state, request), fields(project_id = %request.project_id))]
async fn continue_generation(
    State(state): State<AppState>,
    Json(request): Json<ProjectRequest>,
) -> Result<Json<ResumeOutcome>, ApiError> {
    info!("handling continue request");
    let controller = state.controller(request.project_id).await?;
    let outcome = controller.continue_run().await?;
    Ok(Json(outcome))
}

/// POST /cancel — raises the cooperative cancellation signal.
#[instrument(skip(state, request), fields(project_id = %request.project_id))]
async fn cancel_generation(
    State(state): State<AppState>,
    Json(request): Json<ProjectRequest>,
) -> Result<Json<CancelResponse>, ApiError> {
    let controller = state.controller(request.project_id).await?;
    controller.cancel();
    Ok(Json(CancelResponse { cancelled: true }))
}

/// POST /reset — deletes the project's generation state.
#[instrument(skip(state, request), fields(project_id = %request.project_id))]
async fn reset_generation(
    State(state): State<AppState>,
    Json(request): Json<ProjectRequest>,
) -> Result<Json<ResetResponse>, ApiError> {
    info!("handling reset request");
    let controller = state.controller(request.project_id).await?;
    controller.reset_run().await?;
    Ok(Json(ResetResponse { status: "reset" }))
}

/// GET /projects/{project_id}/progress — phase, cursor, and counters.
#[instrument(skip(state))]
async fn generation_progress(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ProgressReport>, ApiError> {
    let controller = state.controller(project_id).await?;
    let report = controller.progress().await?;
    Ok(Json(report))
}

/// Returns the router for the generation endpoints.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(start_generation))
        .route("/continue", post(continue_generation))
        .route("/cancel", post(cancel_generation))
        .route("/reset", post(reset_generation))
        .route("/projects/{project_id}/progress", get(generation_progress))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_request_fills_in_defaults() {
        let body = serde_json::json!({
            "project_id": Uuid::new_v4(),
            "outline": "Two strangers swap houses for a winter",
            "episode_number": 1,
        });

        let request: StartGenerationRequest = serde_json::from_value(body).unwrap();

        assert_eq!(request.language, "en");
        assert_eq!(request.quality_tier, "standard");
        assert_eq!(request.format, "series");
    }

    #[test]
    fn test_start_request_keeps_explicit_values() {
        let body = serde_json::json!({
            "project_id": Uuid::new_v4(),
            "outline": "outline",
            "episode_number": 2,
            "language": "de",
            "quality_tier": "premium",
            "format": "feature",
        });

        let request: StartGenerationRequest = serde_json::from_value(body).unwrap();

        assert_eq!(request.language, "de");
        assert_eq!(request.quality_tier, "premium");
        assert_eq!(request.format, "feature");
    }
}
