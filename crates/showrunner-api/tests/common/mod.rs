//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use showrunner_core::services::Planner;
use showrunner_engine::config::GenerationConfig;
use showrunner_engine::controller::{GenerationServices, GenerationStores};
use showrunner_test_support::{InMemoryStore, ScriptedCompiler, ScriptedWriter};
use tower::ServiceExt;

use showrunner_api::routes;
use showrunner_api::state::AppState;

/// Build the full app router over the in-memory store and scripted
/// collaborators. Uses the same route structure as `main.rs`.
pub fn build_test_app(
    store: &Arc<InMemoryStore>,
    planner: Arc<dyn Planner>,
    writer: Arc<ScriptedWriter>,
    compiler: Arc<ScriptedCompiler>,
) -> Router {
    let stores = GenerationStores {
        narrative: store.clone(),
        intents: store.clone(),
        repairs: store.clone(),
        jobs: store.clone(),
        feed: store.clone(),
    };
    let services = GenerationServices {
        planner,
        writer,
        compiler,
    };
    let app_state = AppState::new(stores, services, GenerationConfig::immediate());

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/generation", routes::generation::router())
        .with_state(app_state)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
