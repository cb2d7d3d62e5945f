//! Scene repairs — validation failures and retry bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// Strategy chosen by the external validator for fixing a failed scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStrategy {
    /// Regenerate the scene from the intent.
    Rewrite,
    /// Patch the failing sections only.
    PartialFix,
    /// Keep the scene despite known issues.
    AcceptDegraded,
}

/// Lifecycle status of a repair. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStatus {
    /// Recorded but not yet picked up.
    Pending,
    /// A repair attempt is running.
    Repairing,
    /// The repair succeeded; the scene now passes validation.
    Done,
    /// The repair exhausted its attempts without passing.
    Failed,
    /// The validator rejected the scene outright.
    Rejected,
}

impl RepairStatus {
    /// Ordinal used to enforce forward-only movement.
    fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Repairing => 1,
            Self::Done | Self::Failed | Self::Rejected => 2,
        }
    }

    /// Returns `true` if `from → to` moves forward (or sideways between
    /// terminal outcomes is disallowed: terminal statuses are final).
    #[must_use]
    pub fn can_transition(from: Self, to: Self) -> bool {
        from.rank() < to.rank()
    }

    /// Returns `true` if no further transition occurs.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Rejected)
    }
}

/// Persisted record of a validation failure and its retry attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneRepair {
    /// Unique repair identifier.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// The scene that failed validation.
    pub scene_id: Uuid,
    /// The intent that produced the scene.
    pub intent_id: Uuid,
    /// Issues reported by the validator.
    pub issues: Vec<String>,
    /// Names of the checks that failed.
    pub failed_checks: Vec<String>,
    /// Validation score at time of failure.
    pub score: f32,
    /// Strategy supplied by the validator.
    pub strategy: RepairStrategy,
    /// Attempts made so far. Never exceeds `max_attempts`.
    pub attempts: i32,
    /// Attempt cap.
    pub max_attempts: i32,
    /// Current status.
    pub status: RepairStatus,
    /// Free-form log of repair activity.
    pub repair_log: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl SceneRepair {
    /// Records one more repair attempt.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] if the attempt cap is already
    /// reached.
    pub fn record_attempt(&mut self, note: impl Into<String>) -> Result<(), StoreError> {
        if self.attempts >= self.max_attempts {
            return Err(StoreError::Validation(format!(
                "repair {} exhausted its {} attempts",
                self.id, self.max_attempts
            )));
        }
        self.attempts += 1;
        self.repair_log.push(note.into());
        Ok(())
    }

    /// Moves the repair to a new status, enforcing forward-only movement.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] on a backward or repeated
    /// transition.
    pub fn advance(&mut self, to: RepairStatus) -> Result<(), StoreError> {
        if !RepairStatus::can_transition(self.status, to) {
            return Err(StoreError::Validation(format!(
                "repair {} cannot move {:?} -> {to:?}",
                self.id, self.status
            )));
        }
        self.status = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repair() -> SceneRepair {
        SceneRepair {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            scene_id: Uuid::new_v4(),
            intent_id: Uuid::new_v4(),
            issues: vec!["continuity break".to_owned()],
            failed_checks: vec!["locked_facts".to_owned()],
            score: 0.42,
            strategy: RepairStrategy::Rewrite,
            attempts: 0,
            max_attempts: 3,
            status: RepairStatus::Pending,
            repair_log: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_attempt_increments_until_cap() {
        let mut r = repair();

        r.record_attempt("first pass").unwrap();
        r.record_attempt("second pass").unwrap();
        r.record_attempt("third pass").unwrap();

        assert_eq!(r.attempts, 3);
        let err = r.record_attempt("fourth pass").unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(r.attempts, 3);
    }

    #[test]
    fn test_advance_moves_forward_only() {
        let mut r = repair();

        r.advance(RepairStatus::Repairing).unwrap();
        r.advance(RepairStatus::Done).unwrap();

        assert!(r.advance(RepairStatus::Repairing).is_err());
        assert!(r.advance(RepairStatus::Failed).is_err());
        assert_eq!(r.status, RepairStatus::Done);
    }

    #[test]
    fn test_pending_can_jump_straight_to_rejected() {
        let mut r = repair();

        r.advance(RepairStatus::Rejected).unwrap();

        assert!(r.status.is_terminal());
    }
}
