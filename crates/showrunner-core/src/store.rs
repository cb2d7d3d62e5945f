//! Store contracts for the four persisted collections.
//!
//! The persisted store is the single source of truth; the controller and
//! observer treat their own state as caches. Implementations live in
//! `showrunner-store` (PostgreSQL) and `showrunner-test-support` (in-memory).

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::intent::{SceneIntent, SceneStatus};
use crate::job::{DispatchJob, JobKind};
use crate::narrative::NarrativeState;
use crate::repair::SceneRepair;

/// Access to the per-project narrative-state record.
///
/// The controller only reads; the planner and writer replace the whole
/// record out of band.
#[async_trait]
pub trait NarrativeStateStore: Send + Sync {
    /// Loads the narrative state for a project, if one exists.
    async fn load(&self, project_id: Uuid) -> Result<Option<NarrativeState>, StoreError>;

    /// Deletes the narrative state for a project.
    async fn reset(&self, project_id: Uuid) -> Result<(), StoreError>;
}

/// Access to the ordered queue of scene intents.
#[async_trait]
pub trait SceneIntentQueue: Send + Sync {
    /// All intents for a project, ordered by (episode, scene number).
    async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<SceneIntent>, StoreError>;

    /// The in-flight subset of `list_by_project`, same order.
    async fn list_pending(&self, project_id: Uuid) -> Result<Vec<SceneIntent>, StoreError>;

    /// Loads a single intent.
    async fn find(&self, intent_id: Uuid) -> Result<Option<SceneIntent>, StoreError>;

    /// Changes an intent's status. Implementations must reject movements
    /// that do not follow the state-machine edges.
    async fn set_status(&self, intent_id: Uuid, status: SceneStatus) -> Result<(), StoreError>;

    /// Deletes every intent for a project.
    async fn delete_all_for_project(&self, project_id: Uuid) -> Result<(), StoreError>;
}

/// Access to the scene-repair ledger.
#[async_trait]
pub trait SceneRepairLedger: Send + Sync {
    /// All repairs for a project.
    async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<SceneRepair>, StoreError>;

    /// Deletes every repair for a project.
    async fn delete_all_for_project(&self, project_id: Uuid) -> Result<(), StoreError>;
}

/// Read/delete access to the remote dispatch-job queue.
///
/// Only the integrity validator deletes jobs; nothing here creates them.
#[async_trait]
pub trait DispatchJobStore: Send + Sync {
    /// In-flight jobs of the given kind for a project.
    async fn list_for_project(
        &self,
        project_id: Uuid,
        kind: JobKind,
    ) -> Result<Vec<DispatchJob>, StoreError>;

    /// Deletes one job.
    async fn delete(&self, job_id: Uuid) -> Result<(), StoreError>;
}
