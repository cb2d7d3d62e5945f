//! Derived run phase.
//!
//! The run-level phase is never stored; it is computed from the multiset of
//! intent statuses and is invariant under their ordering.

use serde::{Deserialize, Serialize};

use crate::intent::SceneStatus;

/// Run-level phase derived from the aggregate of intent statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationPhase {
    /// No work exists for the project.
    Idle,
    /// Intents exist but none has reached the writer yet.
    Planning,
    /// At least one intent is being written or repaired.
    Generating,
    /// Every intent reached `written` or `validated`.
    Completed,
    /// At least one intent failed (or was rejected by repair).
    Failed,
}

impl GenerationPhase {
    /// Derives the phase from a set of intent statuses.
    ///
    /// Precedence: failed > generating > planning > completed. An empty set
    /// is `Idle`.
    #[must_use]
    pub fn derive<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = SceneStatus>,
    {
        let mut any = false;
        let mut any_failed = false;
        let mut any_generating = false;
        let mut any_planning = false;
        let mut all_done = true;

        for status in statuses {
            any = true;
            match status {
                SceneStatus::Failed | SceneStatus::Rejected => any_failed = true,
                SceneStatus::Writing | SceneStatus::NeedsRepair | SceneStatus::Repairing => {
                    any_generating = true;
                }
                SceneStatus::Pending | SceneStatus::Planning | SceneStatus::Planned => {
                    any_planning = true;
                }
                SceneStatus::Written | SceneStatus::Validated => {}
            }
            if !matches!(status, SceneStatus::Written | SceneStatus::Validated) {
                all_done = false;
            }
        }

        if !any {
            Self::Idle
        } else if any_failed {
            Self::Failed
        } else if any_generating {
            Self::Generating
        } else if any_planning {
            Self::Planning
        } else if all_done {
            Self::Completed
        } else {
            Self::Idle
        }
    }
}
