//! Integration tests for the generation endpoints.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use showrunner_core::intent::SceneStatus;
use showrunner_core::services::PlanResponse;
use showrunner_test_support::{
    InMemoryStore, ScriptedCompiler, ScriptedPlanner, ScriptedWriter, WriterBehavior,
    narrative_state, scene_fixture, scene_intent,
};
use uuid::Uuid;

#[tokio::test]
async fn test_start_runs_to_completion_and_reports_counts() {
    // Arrange
    let project_id = Uuid::new_v4();
    let store = Arc::new(InMemoryStore::new());
    let seed: Vec<_> = (1..=3)
        .map(|n| scene_intent(project_id, 1, n, SceneStatus::Pending))
        .collect();
    let planner = Arc::new(
        ScriptedPlanner::new(PlanResponse {
            scenes_planned: 3,
            job_ids: vec![],
        })
        .seeding(store.clone(), seed),
    );
    let writer = Arc::new(ScriptedWriter::new(
        WriterBehavior::CompleteImmediately,
        Some(store.clone()),
    ));
    let compiler = Arc::new(ScriptedCompiler::new());
    let app = common::build_test_app(&store, planner, writer, compiler.clone());

    let body = serde_json::json!({
        "project_id": project_id,
        "outline": "A lighthouse keeper finds a message that predicts storms",
        "episode_number": 1,
    });

    // Act
    let (status, json) = common::post_json(&app, "/api/v1/generation/start", &body).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["scenes_planned"], 3);
    assert_eq!(json["dispatch"]["dispatched"], 3);
    assert_eq!(json["dispatch"]["completed"], 3);
    assert_eq!(compiler.call_count(), 1);

    let (status, json) = common::get_json(
        &app,
        &format!("/api/v1/generation/projects/{project_id}/progress"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "completed");
    assert_eq!(json["counters"]["total"], 3);
    assert_eq!(json["counters"]["completed"], 3);
}

#[tokio::test]
async fn test_batch_run_compiles_once_remote_writes_finish() {
    // The planner queues jobs instead of leaving dispatch to the controller;
    // the remote writer finishes them through the store. The server-side
    // feed watch must compile the episode without a /continue call.
    let project_id = Uuid::new_v4();
    let store = Arc::new(InMemoryStore::new());
    let seed: Vec<_> = (1..=2)
        .map(|n| scene_intent(project_id, 1, n, SceneStatus::Pending))
        .collect();
    let remote_work: Vec<_> = seed
        .iter()
        .map(|intent| (intent.id, scene_fixture(project_id, intent)))
        .collect();
    let planner = Arc::new(
        ScriptedPlanner::new(PlanResponse {
            scenes_planned: 2,
            job_ids: vec![Uuid::new_v4(), Uuid::new_v4()],
        })
        .seeding(store.clone(), seed),
    );
    let writer = Arc::new(ScriptedWriter::new(WriterBehavior::AcknowledgeOnly, None));
    let compiler = Arc::new(ScriptedCompiler::new());
    let app = common::build_test_app(&store, planner, writer, compiler.clone());

    let body = serde_json::json!({
        "project_id": project_id,
        "outline": "A salvage crew answers a distress call from their own ship",
        "episode_number": 1,
    });

    let (status, json) = common::post_json(&app, "/api/v1/generation/start", &body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["jobs_dispatched"], 2);
    assert_eq!(compiler.call_count(), 0);

    for (intent_id, scene) in remote_work {
        store.complete_intent(intent_id, scene);
    }
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let (status, json) = common::get_json(
        &app,
        &format!("/api/v1/generation/projects/{project_id}/progress"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "completed");
    assert_eq!(compiler.call_count(), 1);
}

#[tokio::test]
async fn test_start_returns_409_while_intents_are_in_flight() {
    let project_id = Uuid::new_v4();
    let store = Arc::new(InMemoryStore::new());
    store.insert_intent(scene_intent(project_id, 1, 1, SceneStatus::Writing));
    let planner = Arc::new(ScriptedPlanner::new(PlanResponse {
        scenes_planned: 0,
        job_ids: vec![],
    }));
    let writer = Arc::new(ScriptedWriter::new(WriterBehavior::AcknowledgeOnly, None));
    let compiler = Arc::new(ScriptedCompiler::new());
    let app = common::build_test_app(&store, planner, writer, compiler);

    let body = serde_json::json!({
        "project_id": project_id,
        "outline": "outline",
        "episode_number": 1,
    });

    let (status, json) = common::post_json(&app, "/api/v1/generation/start", &body).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "generation_in_progress");
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn test_planner_failure_returns_502() {
    let project_id = Uuid::new_v4();
    let store = Arc::new(InMemoryStore::new());
    let planner = Arc::new(ScriptedPlanner::failing("model overloaded"));
    let writer = Arc::new(ScriptedWriter::new(WriterBehavior::AcknowledgeOnly, None));
    let compiler = Arc::new(ScriptedCompiler::new());
    let app = common::build_test_app(&store, planner, writer, compiler);

    let body = serde_json::json!({
        "project_id": project_id,
        "outline": "outline",
        "episode_number": 1,
    });

    let (status, json) = common::post_json(&app, "/api/v1/generation/start", &body).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "planner_error");
}

#[tokio::test]
async fn test_continue_resumes_and_is_idempotent() {
    let project_id = Uuid::new_v4();
    let store = Arc::new(InMemoryStore::new());
    store.insert_intent(scene_intent(project_id, 1, 1, SceneStatus::Pending));
    store.insert_intent(scene_intent(project_id, 1, 2, SceneStatus::Pending));
    let planner = Arc::new(ScriptedPlanner::new(PlanResponse {
        scenes_planned: 0,
        job_ids: vec![],
    }));
    let writer = Arc::new(ScriptedWriter::new(
        WriterBehavior::CompleteImmediately,
        Some(store.clone()),
    ));
    let compiler = Arc::new(ScriptedCompiler::new());
    let app = common::build_test_app(&store, planner, writer, compiler);

    let body = serde_json::json!({ "project_id": project_id });

    let (status, first) = common::post_json(&app, "/api/v1/generation/continue", &body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["dispatch"]["dispatched"], 2);

    let (status, second) = common::post_json(&app, "/api/v1/generation/continue", &body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["dispatch"]["dispatched"], 0);
}

#[tokio::test]
async fn test_cancel_acknowledges_the_signal() {
    let project_id = Uuid::new_v4();
    let store = Arc::new(InMemoryStore::new());
    let planner = Arc::new(ScriptedPlanner::new(PlanResponse {
        scenes_planned: 0,
        job_ids: vec![],
    }));
    let writer = Arc::new(ScriptedWriter::new(WriterBehavior::AcknowledgeOnly, None));
    let compiler = Arc::new(ScriptedCompiler::new());
    let app = common::build_test_app(&store, planner, writer, compiler);

    let body = serde_json::json!({ "project_id": project_id });

    let (status, json) = common::post_json(&app, "/api/v1/generation/cancel", &body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cancelled"], true);
}

#[tokio::test]
async fn test_reset_deletes_generation_state() {
    let project_id = Uuid::new_v4();
    let store = Arc::new(InMemoryStore::new());
    store.insert_intent(scene_intent(project_id, 1, 1, SceneStatus::Written));
    store.put_narrative(narrative_state(project_id));
    let planner = Arc::new(ScriptedPlanner::new(PlanResponse {
        scenes_planned: 0,
        job_ids: vec![],
    }));
    let writer = Arc::new(ScriptedWriter::new(WriterBehavior::AcknowledgeOnly, None));
    let compiler = Arc::new(ScriptedCompiler::new());
    let app = common::build_test_app(&store, planner, writer, compiler);

    let body = serde_json::json!({ "project_id": project_id });

    let (status, json) = common::post_json(&app, "/api/v1/generation/reset", &body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "reset");
    assert_eq!(store.intent_count(project_id), 0);
    assert!(!store.narrative_exists(project_id));

    let (status, json) = common::get_json(
        &app,
        &format!("/api/v1/generation/projects/{project_id}/progress"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "idle");
}

#[tokio::test]
async fn test_start_returns_422_for_missing_body_fields() {
    let store = Arc::new(InMemoryStore::new());
    let planner = Arc::new(ScriptedPlanner::new(PlanResponse {
        scenes_planned: 0,
        job_ids: vec![],
    }));
    let writer = Arc::new(ScriptedWriter::new(WriterBehavior::AcknowledgeOnly, None));
    let compiler = Arc::new(ScriptedCompiler::new());
    let app = common::build_test_app(&store, planner, writer, compiler);

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/v1/generation/start")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{}"))
        .unwrap();

    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
