//! Integration tests for the health endpoint.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use showrunner_core::services::PlanResponse;
use showrunner_test_support::{
    InMemoryStore, ScriptedCompiler, ScriptedPlanner, ScriptedWriter, WriterBehavior,
};

fn test_app() -> axum::Router {
    let store = Arc::new(InMemoryStore::new());
    let planner = Arc::new(ScriptedPlanner::new(PlanResponse {
        scenes_planned: 0,
        job_ids: vec![],
    }));
    let writer = Arc::new(ScriptedWriter::new(WriterBehavior::AcknowledgeOnly, None));
    let compiler = Arc::new(ScriptedCompiler::new());
    common::build_test_app(&store, planner, writer, compiler)
}

#[tokio::test]
async fn test_health_returns_200_with_status_ok() {
    let app = test_app();

    let (status, json) = common::get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    // No request has touched a project yet.
    assert_eq!(json["active_projects"], 0);
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = test_app();

    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/api/v1/nonexistent")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
