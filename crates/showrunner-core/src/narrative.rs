//! Narrative state — one persisted progress/memory record per project.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted narrative progress and memory for a project.
///
/// At most one live record exists per project. The planner creates it on the
/// first planning call; the writer updates it as scenes land; it is deleted
/// only by an explicit reset. The controller treats this record as source of
/// truth and never invents fields locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeState {
    /// Unique record identifier.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// Target format (e.g. "series", "feature", "short").
    pub format: String,
    /// Human-readable label of the current narrative phase.
    pub current_phase: String,
    /// The overarching narrative goal.
    pub narrative_goal: String,
    /// Facts locked in by earlier scenes; later scenes must not contradict.
    pub locked_facts: Vec<String>,
    /// Actions the writer must not take.
    pub forbidden_actions: Vec<String>,
    /// Threads currently being advanced.
    pub active_threads: Vec<String>,
    /// Threads introduced but not yet advanced.
    pub open_threads: Vec<String>,
    /// Threads brought to a close.
    pub resolved_threads: Vec<String>,
    /// Per-character arc notes, keyed by character name.
    pub character_arcs: HashMap<String, String>,
    /// Number of scenes generated so far.
    pub scenes_generated: i32,
    /// Pacing metric maintained by the writer.
    pub pacing: f32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
