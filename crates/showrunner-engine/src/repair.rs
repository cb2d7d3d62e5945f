//! Repair coordination — mapping repair outcomes onto intent terms.
//!
//! Repairs are created and driven by the external validator; this module
//! only tracks them. A repair that finishes `done` means its intent counts
//! as validated; `failed` or `rejected` means the intent counts as failed
//! for aggregate-phase purposes.

use showrunner_core::intent::{SceneIntent, SceneStatus};
use showrunner_core::repair::{RepairStatus, SceneRepair};

/// The intent-level status a finished repair implies, or `None` while the
/// repair is still in progress.
#[must_use]
pub fn repair_outcome(status: RepairStatus) -> Option<SceneStatus> {
    match status {
        RepairStatus::Done => Some(SceneStatus::Validated),
        RepairStatus::Failed | RepairStatus::Rejected => Some(SceneStatus::Failed),
        RepairStatus::Pending | RepairStatus::Repairing => None,
    }
}

/// The status an intent counts as once its repairs are taken into account.
/// The most recently updated repair for the intent wins; an unfinished
/// repair leaves the intent's own status in place.
#[must_use]
pub fn effective_status(intent: &SceneIntent, repairs: &[SceneRepair]) -> SceneStatus {
    repairs
        .iter()
        .filter(|repair| repair.intent_id == intent.id)
        .max_by_key(|repair| repair.updated_at)
        .and_then(|repair| repair_outcome(repair.status))
        .unwrap_or(intent.status)
}

/// Effective statuses for a whole project, in intent order.
#[must_use]
pub fn effective_statuses(intents: &[SceneIntent], repairs: &[SceneRepair]) -> Vec<SceneStatus> {
    intents
        .iter()
        .map(|intent| effective_status(intent, repairs))
        .collect()
}

/// Attempts left before a repair hits its cap.
#[must_use]
pub fn remaining_attempts(repair: &SceneRepair) -> i32 {
    (repair.max_attempts - repair.attempts).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use showrunner_core::repair::RepairStatus;
    use showrunner_test_support::{scene_intent, scene_repair};
    use uuid::Uuid;

    #[test]
    fn test_done_repair_counts_intent_as_validated() {
        let project_id = Uuid::new_v4();
        let intent = scene_intent(project_id, 1, 2, SceneStatus::Repairing);
        let repair = scene_repair(project_id, intent.id, Uuid::new_v4(), RepairStatus::Done);

        assert_eq!(
            effective_status(&intent, &[repair]),
            SceneStatus::Validated
        );
    }

    #[test]
    fn test_rejected_repair_counts_intent_as_failed() {
        let project_id = Uuid::new_v4();
        let intent = scene_intent(project_id, 1, 2, SceneStatus::Repairing);
        let repair = scene_repair(project_id, intent.id, Uuid::new_v4(), RepairStatus::Rejected);

        assert_eq!(effective_status(&intent, &[repair]), SceneStatus::Failed);
    }

    #[test]
    fn test_unfinished_repair_leaves_intent_status_alone() {
        let project_id = Uuid::new_v4();
        let intent = scene_intent(project_id, 1, 2, SceneStatus::NeedsRepair);
        let repair = scene_repair(project_id, intent.id, Uuid::new_v4(), RepairStatus::Repairing);

        assert_eq!(
            effective_status(&intent, &[repair]),
            SceneStatus::NeedsRepair
        );
    }

    #[test]
    fn test_latest_repair_wins() {
        let project_id = Uuid::new_v4();
        let intent = scene_intent(project_id, 1, 2, SceneStatus::Repairing);
        let mut first = scene_repair(project_id, intent.id, Uuid::new_v4(), RepairStatus::Failed);
        first.updated_at = Utc::now() - Duration::minutes(5);
        let second = scene_repair(project_id, intent.id, Uuid::new_v4(), RepairStatus::Done);

        assert_eq!(
            effective_status(&intent, &[first, second]),
            SceneStatus::Validated
        );
    }

    #[test]
    fn test_other_intents_repairs_are_ignored() {
        let project_id = Uuid::new_v4();
        let intent = scene_intent(project_id, 1, 2, SceneStatus::Written);
        let unrelated = scene_repair(
            project_id,
            Uuid::new_v4(),
            Uuid::new_v4(),
            RepairStatus::Rejected,
        );

        assert_eq!(effective_status(&intent, &[unrelated]), SceneStatus::Written);
    }
}
