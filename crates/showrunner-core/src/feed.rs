//! Change-notification feed contract.
//!
//! The feed delivers insert/update events for the four observed collections,
//! keyed by project. Delivery is eventually consistent and may arrive out of
//! order; consumers must treat an update for an unknown record as an
//! implicit insert.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::StoreError;
use crate::intent::SceneIntent;
use crate::narrative::NarrativeState;
use crate::repair::SceneRepair;
use crate::scene::Scene;

/// Whether a change event carries a new or an updated record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOp {
    /// The record was inserted.
    Insert,
    /// The record was updated.
    Update,
}

/// The changed record, typed per collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "collection", rename_all = "snake_case")]
pub enum ChangeRecord {
    /// A scene intent changed.
    Intent(SceneIntent),
    /// A produced scene changed.
    Scene(Scene),
    /// The narrative state changed.
    Narrative(NarrativeState),
    /// A scene repair changed.
    Repair(SceneRepair),
}

/// One change-notification event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Insert or update.
    pub op: ChangeOp,
    /// The changed record.
    pub record: ChangeRecord,
}

/// Receiving half of a change subscription.
pub type ChangeStream = mpsc::Receiver<ChangeEvent>;

/// Source of change notifications for one project.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Opens a subscription for the project. Each call returns an
    /// independent stream; dropping the stream ends the subscription.
    async fn subscribe(&self, project_id: Uuid) -> Result<ChangeStream, StoreError>;
}
