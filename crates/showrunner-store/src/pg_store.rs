//! PostgreSQL implementation of the generation store contracts.

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use showrunner_core::error::StoreError;
use showrunner_core::feed::{ChangeEvent, ChangeOp, ChangeRecord};
use showrunner_core::intent::{SceneIntent, SceneStatus};
use showrunner_core::job::{DispatchJob, JobKind};
use showrunner_core::narrative::NarrativeState;
use showrunner_core::repair::SceneRepair;
use showrunner_core::store::{
    DispatchJobStore, NarrativeStateStore, SceneIntentQueue, SceneRepairLedger,
};

use crate::feed::{CHANGE_CHANNEL, ChangeEnvelope};
use crate::schema;

/// PostgreSQL-backed implementation of all four store contracts.
#[derive(Debug, Clone)]
pub struct PgGenerationStore {
    pool: PgPool,
}

fn infra(error: sqlx::Error) -> StoreError {
    StoreError::Infrastructure(error.to_string())
}

fn corrupt(error: serde_json::Error) -> StoreError {
    StoreError::Infrastructure(format!("corrupt payload: {error}"))
}

fn decode<T: DeserializeOwned>(payload: serde_json::Value) -> Result<T, StoreError> {
    serde_json::from_value(payload).map_err(corrupt)
}

/// The snake_case wire label of a status or kind, as serde writes it.
fn label<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    match serde_json::to_value(value).map_err(corrupt)? {
        serde_json::Value::String(label) => Ok(label),
        other => Err(StoreError::Infrastructure(format!(
            "expected a string label, got {other}"
        ))),
    }
}

fn in_flight_labels() -> Result<Vec<String>, StoreError> {
    [
        SceneStatus::Pending,
        SceneStatus::Planning,
        SceneStatus::Planned,
        SceneStatus::Writing,
        SceneStatus::NeedsRepair,
        SceneStatus::Repairing,
    ]
    .iter()
    .map(label)
    .collect()
}

impl PgGenerationStore {
    /// Creates a store over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the schema if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Infrastructure`] if any DDL statement fails.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for ddl in schema::ALL_TABLES {
            sqlx::raw_sql(ddl).execute(&self.pool).await.map_err(infra)?;
        }
        Ok(())
    }

    /// Sends a change notification as part of the surrounding transaction.
    async fn notify(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        project_id: Uuid,
        event: ChangeEvent,
    ) -> Result<(), StoreError> {
        let envelope = ChangeEnvelope { project_id, event };
        let wire = serde_json::to_string(&envelope).map_err(corrupt)?;
        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(CHANGE_CHANNEL)
            .bind(wire)
            .execute(&mut **tx)
            .await
            .map_err(infra)?;
        Ok(())
    }
}

#[async_trait]
impl NarrativeStateStore for PgGenerationStore {
    async fn load(&self, project_id: Uuid) -> Result<Option<NarrativeState>, StoreError> {
        let row = sqlx::query("SELECT payload FROM narrative_states WHERE project_id = $1")
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(infra)?;
        row.map(|row| decode(row.try_get("payload").map_err(infra)?))
            .transpose()
    }

    async fn reset(&self, project_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM narrative_states WHERE project_id = $1")
            .bind(project_id)
            .execute(&self.pool)
            .await
            .map_err(infra)?;
        Ok(())
    }
}

#[async_trait]
impl SceneIntentQueue for PgGenerationStore {
    async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<SceneIntent>, StoreError> {
        let rows = sqlx::query(
            "SELECT payload FROM scene_intents \
             WHERE project_id = $1 \
             ORDER BY episode_number, scene_number",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(infra)?;
        rows.into_iter()
            .map(|row| decode(row.try_get("payload").map_err(infra)?))
            .collect()
    }

    async fn list_pending(&self, project_id: Uuid) -> Result<Vec<SceneIntent>, StoreError> {
        let rows = sqlx::query(
            "SELECT payload FROM scene_intents \
             WHERE project_id = $1 AND status = ANY($2) \
             ORDER BY episode_number, scene_number",
        )
        .bind(project_id)
        .bind(in_flight_labels()?)
        .fetch_all(&self.pool)
        .await
        .map_err(infra)?;
        rows.into_iter()
            .map(|row| decode(row.try_get("payload").map_err(infra)?))
            .collect()
    }

    async fn find(&self, intent_id: Uuid) -> Result<Option<SceneIntent>, StoreError> {
        let row = sqlx::query("SELECT payload FROM scene_intents WHERE id = $1")
            .bind(intent_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(infra)?;
        row.map(|row| decode(row.try_get("payload").map_err(infra)?))
            .transpose()
    }

    async fn set_status(&self, intent_id: Uuid, status: SceneStatus) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(infra)?;
        let row = sqlx::query("SELECT payload FROM scene_intents WHERE id = $1 FOR UPDATE")
            .bind(intent_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(infra)?;
        let Some(row) = row else {
            return Err(StoreError::NotFound(intent_id));
        };
        let mut intent: SceneIntent = decode(row.try_get("payload").map_err(infra)?)?;
        if intent.status == status {
            return Ok(());
        }
        // Readers are eventually consistent and may have missed steps, so
        // any forward path through the state machine is accepted.
        if !SceneStatus::can_reach(intent.status, status) {
            return Err(StoreError::IllegalTransition {
                intent_id,
                from: intent.status,
                to: status,
            });
        }

        intent.status = status;
        intent.updated_at = Utc::now();
        let payload = serde_json::to_value(&intent).map_err(corrupt)?;
        sqlx::query(
            "UPDATE scene_intents \
             SET status = $2, payload = $3, updated_at = $4 \
             WHERE id = $1",
        )
        .bind(intent_id)
        .bind(label(&status)?)
        .bind(&payload)
        .bind(intent.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(infra)?;

        let project_id = intent.project_id;
        Self::notify(
            &mut tx,
            project_id,
            ChangeEvent {
                op: ChangeOp::Update,
                record: ChangeRecord::Intent(intent),
            },
        )
        .await?;
        tx.commit().await.map_err(infra)?;
        debug!(%intent_id, ?status, "intent status updated");
        Ok(())
    }

    async fn delete_all_for_project(&self, project_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM scene_intents WHERE project_id = $1")
            .bind(project_id)
            .execute(&self.pool)
            .await
            .map_err(infra)?;
        Ok(())
    }
}

#[async_trait]
impl SceneRepairLedger for PgGenerationStore {
    async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<SceneRepair>, StoreError> {
        let rows = sqlx::query(
            "SELECT payload FROM scene_repairs WHERE project_id = $1 ORDER BY updated_at",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(infra)?;
        rows.into_iter()
            .map(|row| decode(row.try_get("payload").map_err(infra)?))
            .collect()
    }

    async fn delete_all_for_project(&self, project_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM scene_repairs WHERE project_id = $1")
            .bind(project_id)
            .execute(&self.pool)
            .await
            .map_err(infra)?;
        Ok(())
    }
}

#[async_trait]
impl DispatchJobStore for PgGenerationStore {
    async fn list_for_project(
        &self,
        project_id: Uuid,
        kind: JobKind,
    ) -> Result<Vec<DispatchJob>, StoreError> {
        let rows = sqlx::query(
            "SELECT payload FROM dispatch_jobs \
             WHERE project_id = $1 AND kind = $2 \
             ORDER BY enqueued_at",
        )
        .bind(project_id)
        .bind(label(&kind)?)
        .fetch_all(&self.pool)
        .await
        .map_err(infra)?;
        rows.into_iter()
            .map(|row| decode(row.try_get("payload").map_err(infra)?))
            .collect()
    }

    async fn delete(&self, job_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM dispatch_jobs WHERE id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await
            .map_err(infra)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(job_id));
        }
        Ok(())
    }
}
