//! Scene intents — planned units of generation work and their status machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a scene intent.
///
/// Statuses move only along defined edges:
/// `pending → planning → planned → writing → written`, then either directly
/// to `validated`/`failed`, or through the repair path
/// `needs_repair → repairing → (validated | rejected | failed)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneStatus {
    /// Planned but not yet picked up.
    Pending,
    /// The planner is elaborating this intent.
    Planning,
    /// Fully planned, ready for dispatch.
    Planned,
    /// Dispatched to the scene writer.
    Writing,
    /// A scene has been produced.
    Written,
    /// The produced scene failed validation.
    NeedsRepair,
    /// A repair attempt is in progress.
    Repairing,
    /// The scene passed validation (possibly after repair).
    Validated,
    /// Repair gave up on this scene.
    Rejected,
    /// Generation failed for this intent.
    Failed,
}

impl SceneStatus {
    /// Returns `true` if `from → to` is a defined edge of the state machine.
    #[must_use]
    pub fn can_transition(from: Self, to: Self) -> bool {
        from.successors().contains(&to)
    }

    /// Direct successors of a status in the state machine.
    #[must_use]
    pub fn successors(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Planning],
            Self::Planning => &[Self::Planned],
            Self::Planned => &[Self::Writing],
            Self::Writing => &[Self::Written],
            Self::Written => &[Self::NeedsRepair, Self::Validated, Self::Failed],
            Self::NeedsRepair => &[Self::Repairing],
            Self::Repairing => &[Self::Validated, Self::Rejected, Self::Failed],
            Self::Validated | Self::Rejected | Self::Failed => &[],
        }
    }

    /// Returns `true` if `to` is reachable from `from` along one or more
    /// edges. Status writes enforce this rather than single edges, because
    /// an eventually-consistent reader can observe a record after several
    /// transitions happened remotely.
    #[must_use]
    pub fn can_reach(from: Self, to: Self) -> bool {
        if from == to {
            return false;
        }
        let mut frontier = vec![from];
        let mut seen = Vec::new();
        while let Some(status) = frontier.pop() {
            for &next in status.successors() {
                if next == to {
                    return true;
                }
                if !seen.contains(&next) {
                    seen.push(next);
                    frontier.push(next);
                }
            }
        }
        false
    }

    /// Returns `true` if no further automatic transition occurs from this
    /// status, in aggregate-phase terms.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Written | Self::Validated | Self::Rejected | Self::Failed
        )
    }

    /// Returns `true` if the intent still has work pending — the set a
    /// resume pass picks up.
    #[must_use]
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            Self::Pending
                | Self::Planning
                | Self::Planned
                | Self::Writing
                | Self::NeedsRepair
                | Self::Repairing
        )
    }
}

/// One planned scene, persisted in the intent queue.
///
/// `(project_id, episode_number, scene_number)` is unique; at most one
/// dispatch job is in flight per intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneIntent {
    /// Unique intent identifier.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// Owning narrative-state record.
    pub narrative_state_id: Uuid,
    /// Episode this scene belongs to.
    pub episode_number: i32,
    /// Position of the scene within the episode.
    pub scene_number: i32,
    /// One-line summary of what the scene must accomplish.
    pub summary: String,
    /// The emotional turn the scene delivers.
    pub emotional_turn: String,
    /// Information the scene reveals to the audience.
    pub info_revealed: Vec<String>,
    /// Information the scene deliberately withholds.
    pub info_hidden: Vec<String>,
    /// Characters appearing in the scene.
    pub characters: Vec<String>,
    /// Narrative thread this scene advances, if any.
    pub thread_ref: Option<String>,
    /// Constraints the writer must honor.
    pub constraints: Vec<String>,
    /// Current lifecycle status.
    pub status: SceneStatus,
    /// Dispatch job currently working this intent, if any.
    pub job_id: Option<Uuid>,
    /// The produced scene, once one exists.
    pub scene_id: Option<Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
