//! Local progress state: the scene cursor and derived counters.

use serde::Serialize;
use showrunner_core::intent::SceneStatus;
use showrunner_core::phase::GenerationPhase;

/// Where the dispatch loop currently is: the scene about to be (or being)
/// generated. Purely informational; the store is the source of truth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressCursor {
    /// Episode of the current scene.
    pub episode_number: i32,
    /// Scene number within the episode.
    pub scene_number: i32,
}

/// Derived per-project counters maintained by the realtime observer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenerationCounters {
    /// Intents known for the project.
    pub total: usize,
    /// Intents at `written` or `validated`.
    pub completed: usize,
    /// Intents at `validated`.
    pub validated: usize,
    /// Intents at `needs_repair` or `repairing`.
    pub repairing: usize,
    /// Intents at `failed` or `rejected`.
    pub failed: usize,
}

impl GenerationCounters {
    /// Adds one intent at `status` to the counters.
    pub fn add(&mut self, status: SceneStatus) {
        self.total += 1;
        self.adjust(status, 1);
    }

    /// Replaces one intent's status contribution.
    pub fn replace(&mut self, old: SceneStatus, new: SceneStatus) {
        self.adjust(old, -1);
        self.adjust(new, 1);
    }

    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn adjust(&mut self, status: SceneStatus, delta: isize) {
        let apply = |counter: &mut usize| {
            *counter = (*counter as isize + delta) as usize;
        };
        match status {
            SceneStatus::Written => apply(&mut self.completed),
            SceneStatus::Validated => {
                apply(&mut self.completed);
                apply(&mut self.validated);
            }
            SceneStatus::NeedsRepair | SceneStatus::Repairing => apply(&mut self.repairing),
            SceneStatus::Failed | SceneStatus::Rejected => apply(&mut self.failed),
            SceneStatus::Pending | SceneStatus::Planning | SceneStatus::Planned
            | SceneStatus::Writing => {}
        }
    }
}

/// Snapshot of a project's generation progress, served by the API.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProgressReport {
    /// Derived run phase.
    pub phase: GenerationPhase,
    /// Current dispatch position.
    pub cursor: ProgressCursor,
    /// Status counters.
    pub counters: GenerationCounters,
}
