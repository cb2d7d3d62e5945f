//! External collaborator contracts: Planner, Scene Writer, Script Compiler.
//!
//! These services live behind RPC. The writer's response is an
//! acknowledgement only; actual completion is observed through the persisted
//! store, never through the RPC response.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error talking to an external collaborator.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request never completed (connection, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with an error.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Input to the planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Owning project.
    pub project_id: Uuid,
    /// The narrative outline to plan from.
    pub outline: String,
    /// Episode being planned.
    pub episode_number: i32,
    /// Output language.
    pub language: String,
    /// Quality tier requested from the backend.
    pub quality_tier: String,
    /// Target format.
    pub format: String,
}

/// Planner output: how many scenes were planned, and optionally the dispatch
/// jobs the planner already enqueued for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    /// Number of scene intents created.
    pub scenes_planned: u32,
    /// Job references, when the planner queued the work itself.
    pub job_ids: Vec<Uuid>,
}

/// What a write request points at: the direct-dispatch path names an
/// intent, the batch path names a queued job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum WriteTarget {
    /// Write the scene for this intent.
    Intent {
        /// Intent to write.
        intent_id: Uuid,
        /// Episode of the scene.
        episode_number: i32,
        /// Scene number within the episode.
        scene_number: i32,
    },
    /// Run this already-queued job.
    Job {
        /// Queued job reference.
        job_id: Uuid,
    },
}

/// Input to the scene writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteRequest {
    /// Owning project.
    pub project_id: Uuid,
    /// The unit of work to run.
    pub target: WriteTarget,
}

/// Compiler output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileResponse {
    /// Identifier of the compiled script document.
    pub script_id: Uuid,
}

/// Plans an outline into scene intents.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Plans the outline. Creates intent records (and possibly dispatch
    /// jobs) as a side effect in the persisted store.
    async fn plan(&self, request: &PlanRequest) -> Result<PlanResponse, ServiceError>;
}

/// Turns one intent into scene text.
#[async_trait]
pub trait SceneWriter: Send + Sync {
    /// Asks the backend to write a scene. Returns once the backend accepts
    /// the work; completion is observed via the store.
    async fn write_scene(&self, request: &WriteRequest) -> Result<(), ServiceError>;
}

/// Assembles validated scenes into a final document.
#[async_trait]
pub trait ScriptCompiler: Send + Sync {
    /// Compiles the episode's scenes into a script document.
    async fn compile(
        &self,
        project_id: Uuid,
        episode_number: i32,
    ) -> Result<CompileResponse, ServiceError>;
}
