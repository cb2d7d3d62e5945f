//! In-memory store — implements every store contract plus the change feed,
//! so engine tests can run the full pipeline without PostgreSQL.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use showrunner_core::error::StoreError;
use showrunner_core::feed::{ChangeEvent, ChangeFeed, ChangeOp, ChangeRecord, ChangeStream};
use showrunner_core::intent::{SceneIntent, SceneStatus};
use showrunner_core::job::{DispatchJob, JobKind};
use showrunner_core::narrative::NarrativeState;
use showrunner_core::repair::{RepairStatus, SceneRepair};
use showrunner_core::scene::Scene;
use showrunner_core::store::{
    DispatchJobStore, NarrativeStateStore, SceneIntentQueue, SceneRepairLedger,
};
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Default)]
struct Collections {
    narratives: Vec<NarrativeState>,
    intents: Vec<SceneIntent>,
    repairs: Vec<SceneRepair>,
    scenes: Vec<Scene>,
    jobs: Vec<DispatchJob>,
}

/// Mutex-backed store holding all five collections. Every mutation publishes
/// a change event to matching subscribers, mimicking the production feed.
#[derive(Default)]
pub struct InMemoryStore {
    data: Mutex<Collections>,
    subscribers: Mutex<Vec<(Uuid, mpsc::Sender<ChangeEvent>)>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a change event to every subscriber of the project.
    ///
    /// # Panics
    ///
    /// Panics if the subscriber registry mutex is poisoned.
    pub fn publish(&self, project_id: Uuid, event: &ChangeEvent) {
        let subscribers = self.subscribers.lock().unwrap();
        for (subscribed, sender) in subscribers.iter() {
            if *subscribed == project_id {
                // Dropped receivers and full buffers are fine in tests.
                let _ = sender.try_send(event.clone());
            }
        }
    }

    fn publish_record(&self, project_id: Uuid, op: ChangeOp, record: ChangeRecord) {
        self.publish(project_id, &ChangeEvent { op, record });
    }

    /// Inserts a scene intent.
    ///
    /// # Panics
    ///
    /// Panics if the data mutex is poisoned.
    pub fn insert_intent(&self, intent: SceneIntent) {
        let project_id = intent.project_id;
        self.data.lock().unwrap().intents.push(intent.clone());
        self.publish_record(project_id, ChangeOp::Insert, ChangeRecord::Intent(intent));
    }

    /// Inserts a scene repair.
    ///
    /// # Panics
    ///
    /// Panics if the data mutex is poisoned.
    pub fn insert_repair(&self, repair: SceneRepair) {
        let project_id = repair.project_id;
        self.data.lock().unwrap().repairs.push(repair.clone());
        self.publish_record(project_id, ChangeOp::Insert, ChangeRecord::Repair(repair));
    }

    /// Inserts a dispatch job.
    ///
    /// # Panics
    ///
    /// Panics if the data mutex is poisoned.
    pub fn insert_job(&self, job: DispatchJob) {
        self.data.lock().unwrap().jobs.push(job);
    }

    /// Creates or replaces the narrative state for its project.
    ///
    /// # Panics
    ///
    /// Panics if the data mutex is poisoned.
    pub fn put_narrative(&self, state: NarrativeState) {
        let project_id = state.project_id;
        let mut data = self.data.lock().unwrap();
        data.narratives.retain(|n| n.project_id != project_id);
        data.narratives.push(state.clone());
        drop(data);
        self.publish_record(
            project_id,
            ChangeOp::Update,
            ChangeRecord::Narrative(state),
        );
    }

    /// Simulates the writer backend finishing an intent: stores the scene,
    /// links it to the intent, and moves the intent to `written`.
    ///
    /// # Panics
    ///
    /// Panics if the intent does not exist or the data mutex is poisoned.
    pub fn complete_intent(&self, intent_id: Uuid, scene: Scene) {
        let (project_id, updated) = {
            let mut data = self.data.lock().unwrap();
            data.scenes.push(scene.clone());
            let intent = data
                .intents
                .iter_mut()
                .find(|i| i.id == intent_id)
                .expect("complete_intent: unknown intent");
            intent.scene_id = Some(scene.id);
            intent.status = SceneStatus::Written;
            intent.updated_at = Utc::now();
            (intent.project_id, intent.clone())
        };
        self.publish_record(project_id, ChangeOp::Insert, ChangeRecord::Scene(scene));
        self.publish_record(project_id, ChangeOp::Update, ChangeRecord::Intent(updated));
    }

    /// Moves a repair to a new status, publishing the update.
    ///
    /// # Panics
    ///
    /// Panics if the repair does not exist or the data mutex is poisoned.
    pub fn set_repair_status(&self, repair_id: Uuid, status: RepairStatus) {
        let (project_id, updated) = {
            let mut data = self.data.lock().unwrap();
            let repair = data
                .repairs
                .iter_mut()
                .find(|r| r.id == repair_id)
                .expect("set_repair_status: unknown repair");
            repair.status = status;
            repair.updated_at = Utc::now();
            (repair.project_id, repair.clone())
        };
        self.publish_record(project_id, ChangeOp::Update, ChangeRecord::Repair(updated));
    }

    /// Number of intents stored for a project.
    ///
    /// # Panics
    ///
    /// Panics if the data mutex is poisoned.
    #[must_use]
    pub fn intent_count(&self, project_id: Uuid) -> usize {
        self.data
            .lock()
            .unwrap()
            .intents
            .iter()
            .filter(|i| i.project_id == project_id)
            .count()
    }

    /// Number of repairs stored for a project.
    ///
    /// # Panics
    ///
    /// Panics if the data mutex is poisoned.
    #[must_use]
    pub fn repair_count(&self, project_id: Uuid) -> usize {
        self.data
            .lock()
            .unwrap()
            .repairs
            .iter()
            .filter(|r| r.project_id == project_id)
            .count()
    }

    /// Number of jobs stored for a project.
    ///
    /// # Panics
    ///
    /// Panics if the data mutex is poisoned.
    #[must_use]
    pub fn job_count(&self, project_id: Uuid) -> usize {
        self.data
            .lock()
            .unwrap()
            .jobs
            .iter()
            .filter(|j| j.project_id == project_id)
            .count()
    }

    /// Whether a narrative-state record exists for the project.
    ///
    /// # Panics
    ///
    /// Panics if the data mutex is poisoned.
    #[must_use]
    pub fn narrative_exists(&self, project_id: Uuid) -> bool {
        self.data
            .lock()
            .unwrap()
            .narratives
            .iter()
            .any(|n| n.project_id == project_id)
    }
}

#[async_trait]
impl NarrativeStateStore for InMemoryStore {
    async fn load(&self, project_id: Uuid) -> Result<Option<NarrativeState>, StoreError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .narratives
            .iter()
            .find(|n| n.project_id == project_id)
            .cloned())
    }

    async fn reset(&self, project_id: Uuid) -> Result<(), StoreError> {
        self.data
            .lock()
            .unwrap()
            .narratives
            .retain(|n| n.project_id != project_id);
        Ok(())
    }
}

#[async_trait]
impl SceneIntentQueue for InMemoryStore {
    async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<SceneIntent>, StoreError> {
        let mut intents: Vec<SceneIntent> = self
            .data
            .lock()
            .unwrap()
            .intents
            .iter()
            .filter(|i| i.project_id == project_id)
            .cloned()
            .collect();
        intents.sort_by_key(|i| (i.episode_number, i.scene_number));
        Ok(intents)
    }

    async fn list_pending(&self, project_id: Uuid) -> Result<Vec<SceneIntent>, StoreError> {
        let mut intents = SceneIntentQueue::list_by_project(self, project_id).await?;
        intents.retain(|i| i.status.is_in_flight());
        Ok(intents)
    }

    async fn find(&self, intent_id: Uuid) -> Result<Option<SceneIntent>, StoreError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .intents
            .iter()
            .find(|i| i.id == intent_id)
            .cloned())
    }

    async fn set_status(&self, intent_id: Uuid, status: SceneStatus) -> Result<(), StoreError> {
        let (project_id, updated) = {
            let mut data = self.data.lock().unwrap();
            let intent = data
                .intents
                .iter_mut()
                .find(|i| i.id == intent_id)
                .ok_or(StoreError::NotFound(intent_id))?;
            if intent.status == status {
                return Ok(());
            }
            if !SceneStatus::can_reach(intent.status, status) {
                return Err(StoreError::IllegalTransition {
                    intent_id,
                    from: intent.status,
                    to: status,
                });
            }
            intent.status = status;
            intent.updated_at = Utc::now();
            (intent.project_id, intent.clone())
        };
        self.publish_record(project_id, ChangeOp::Update, ChangeRecord::Intent(updated));
        Ok(())
    }

    async fn delete_all_for_project(&self, project_id: Uuid) -> Result<(), StoreError> {
        self.data
            .lock()
            .unwrap()
            .intents
            .retain(|i| i.project_id != project_id);
        Ok(())
    }
}

#[async_trait]
impl SceneRepairLedger for InMemoryStore {
    async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<SceneRepair>, StoreError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .repairs
            .iter()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn delete_all_for_project(&self, project_id: Uuid) -> Result<(), StoreError> {
        self.data
            .lock()
            .unwrap()
            .repairs
            .retain(|r| r.project_id != project_id);
        Ok(())
    }
}

#[async_trait]
impl DispatchJobStore for InMemoryStore {
    async fn list_for_project(
        &self,
        project_id: Uuid,
        kind: JobKind,
    ) -> Result<Vec<DispatchJob>, StoreError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .jobs
            .iter()
            .filter(|j| j.project_id == project_id && j.kind == kind)
            .cloned()
            .collect())
    }

    async fn delete(&self, job_id: Uuid) -> Result<(), StoreError> {
        let mut data = self.data.lock().unwrap();
        let before = data.jobs.len();
        data.jobs.retain(|j| j.id != job_id);
        if data.jobs.len() == before {
            return Err(StoreError::NotFound(job_id));
        }
        Ok(())
    }
}

#[async_trait]
impl ChangeFeed for InMemoryStore {
    async fn subscribe(&self, project_id: Uuid) -> Result<ChangeStream, StoreError> {
        let (tx, rx) = mpsc::channel(256);
        self.subscribers.lock().unwrap().push((project_id, tx));
        Ok(rx)
    }
}
