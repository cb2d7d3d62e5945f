//! Record fixtures with sensible defaults for tests.

use std::collections::HashMap;

use chrono::Utc;
use showrunner_core::intent::{SceneIntent, SceneStatus};
use showrunner_core::job::{DispatchJob, JobKind};
use showrunner_core::narrative::NarrativeState;
use showrunner_core::repair::{RepairStatus, RepairStrategy, SceneRepair};
use showrunner_core::scene::Scene;
use uuid::Uuid;

/// A scene intent at the given position and status.
#[must_use]
pub fn scene_intent(
    project_id: Uuid,
    episode_number: i32,
    scene_number: i32,
    status: SceneStatus,
) -> SceneIntent {
    SceneIntent {
        id: Uuid::new_v4(),
        project_id,
        narrative_state_id: Uuid::new_v4(),
        episode_number,
        scene_number,
        summary: format!("scene {scene_number} of episode {episode_number}"),
        emotional_turn: "calm to tension".to_owned(),
        info_revealed: vec![],
        info_hidden: vec![],
        characters: vec!["Mara".to_owned()],
        thread_ref: None,
        constraints: vec![],
        status,
        job_id: None,
        scene_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// A scene repair for the given intent/scene pair.
#[must_use]
pub fn scene_repair(
    project_id: Uuid,
    intent_id: Uuid,
    scene_id: Uuid,
    status: RepairStatus,
) -> SceneRepair {
    SceneRepair {
        id: Uuid::new_v4(),
        project_id,
        scene_id,
        intent_id,
        issues: vec!["pacing too slow".to_owned()],
        failed_checks: vec!["pacing".to_owned()],
        score: 0.55,
        strategy: RepairStrategy::Rewrite,
        attempts: 1,
        max_attempts: 3,
        status,
        repair_log: vec![],
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// A dispatch job, optionally referencing an intent.
#[must_use]
pub fn dispatch_job(project_id: Uuid, kind: JobKind, intent_id: Option<Uuid>) -> DispatchJob {
    DispatchJob {
        id: Uuid::new_v4(),
        project_id,
        kind,
        intent_id,
        status: "queued".to_owned(),
        enqueued_at: Utc::now(),
    }
}

/// A narrative-state record for the project.
#[must_use]
pub fn narrative_state(project_id: Uuid) -> NarrativeState {
    NarrativeState {
        id: Uuid::new_v4(),
        project_id,
        format: "series".to_owned(),
        current_phase: "act one".to_owned(),
        narrative_goal: "find the letter writer".to_owned(),
        locked_facts: vec!["the letter is real".to_owned()],
        forbidden_actions: vec![],
        active_threads: vec!["letter-mystery".to_owned()],
        open_threads: vec![],
        resolved_threads: vec![],
        character_arcs: HashMap::new(),
        scenes_generated: 0,
        pacing: 0.5,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// A produced scene for the given intent.
#[must_use]
pub fn scene_fixture(project_id: Uuid, intent: &SceneIntent) -> Scene {
    Scene {
        id: Uuid::new_v4(),
        project_id,
        intent_id: intent.id,
        episode_number: intent.episode_number,
        scene_number: intent.scene_number,
        content: "INT. ARCHIVE - NIGHT".to_owned(),
        word_count: 4,
        created_at: Utc::now(),
    }
}
