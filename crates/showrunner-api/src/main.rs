//! Showrunner API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use showrunner_api::error::AppError;
use showrunner_api::routes;
use showrunner_api::state::AppState;
use showrunner_api::telemetry;
use showrunner_engine::config::GenerationConfig;
use showrunner_engine::controller::{GenerationServices, GenerationStores};
use showrunner_rpc::{BackendClient, RpcConfig};
use showrunner_store::{PgChangeFeed, PgGenerationStore};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    telemetry::init()?;

    tracing::info!("Starting Showrunner API server");

    // Read configuration from environment.
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| AppError::Config("DATABASE_URL environment variable must be set".into()))?;
    let backend_url = std::env::var("BACKEND_URL")
        .map_err(|_| AppError::Config("BACKEND_URL environment variable must be set".into()))?;
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;

    // Create database connection pool and make sure the schema exists.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;
    let store = Arc::new(PgGenerationStore::new(pool.clone()));
    store.ensure_schema().await?;
    let feed = Arc::new(PgChangeFeed::new(pool));

    // Wire the backend client.
    let mut rpc_config = RpcConfig::new(backend_url);
    if let Ok(api_key) = std::env::var("BACKEND_API_KEY") {
        rpc_config = rpc_config.with_api_key(api_key);
    }
    let backend = Arc::new(
        BackendClient::new(rpc_config)
            .map_err(|e| AppError::Config(format!("backend client: {e}")))?,
    );

    // Build application state.
    let stores = GenerationStores {
        narrative: store.clone(),
        intents: store.clone(),
        repairs: store.clone(),
        jobs: store,
        feed,
    };
    let services = GenerationServices {
        planner: backend.clone(),
        writer: backend.clone(),
        compiler: backend,
    };
    let app_state = AppState::new(stores, services, GenerationConfig::default());

    // Build router.
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/generation", routes::generation::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
