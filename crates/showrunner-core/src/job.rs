//! Dispatch jobs — queued remote work, referenced but not owned.
//!
//! Jobs live in the remote work queue. A job is orphaned when its intent
//! reference is missing or stale; the integrity validator is the only
//! component that deletes orphans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of remote work a dispatch job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Write a scene for an intent.
    SceneWrite,
    /// Repair a scene that failed validation.
    SceneRepair,
}

/// A queued unit of remote work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchJob {
    /// Unique job identifier.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// Kind of work.
    pub kind: JobKind,
    /// The intent this job works on, if it carries one.
    pub intent_id: Option<Uuid>,
    /// Backend-reported status string (opaque to this system).
    pub status: String,
    /// Enqueue timestamp.
    pub enqueued_at: DateTime<Utc>,
}
