//! Integration tests for the orphaned-job sweep.

use std::sync::Arc;

use showrunner_core::intent::SceneStatus;
use showrunner_core::job::JobKind;
use showrunner_core::store::DispatchJobStore;
use showrunner_engine::integrity::cleanup_orphans;
use showrunner_test_support::{InMemoryStore, dispatch_job, scene_intent};
use uuid::Uuid;

#[tokio::test]
async fn test_cleanup_deletes_orphans_and_keeps_valid_jobs() {
    // Arrange: one job references a live intent, one references a deleted
    // intent, one carries no reference at all.
    let project_id = Uuid::new_v4();
    let store = Arc::new(InMemoryStore::new());
    let intent = scene_intent(project_id, 1, 1, SceneStatus::Writing);
    let valid = dispatch_job(project_id, JobKind::SceneWrite, Some(intent.id));
    let valid_id = valid.id;
    store.insert_intent(intent);
    store.insert_job(valid);
    store.insert_job(dispatch_job(
        project_id,
        JobKind::SceneWrite,
        Some(Uuid::new_v4()),
    ));
    store.insert_job(dispatch_job(project_id, JobKind::SceneWrite, None));

    // Act
    let cleanup = cleanup_orphans(store.as_ref(), store.as_ref(), project_id)
        .await
        .unwrap();

    // Assert
    assert!(cleanup.had_orphans);
    assert_eq!(cleanup.cleaned_count, 2);
    let remaining = store
        .list_for_project(project_id, JobKind::SceneWrite)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, valid_id);
}

#[tokio::test]
async fn test_every_job_is_orphaned_when_no_intents_exist() {
    let project_id = Uuid::new_v4();
    let store = Arc::new(InMemoryStore::new());
    store.insert_job(dispatch_job(
        project_id,
        JobKind::SceneWrite,
        Some(Uuid::new_v4()),
    ));

    let cleanup = cleanup_orphans(store.as_ref(), store.as_ref(), project_id)
        .await
        .unwrap();

    assert!(cleanup.had_orphans);
    assert_eq!(cleanup.cleaned_count, 1);
    assert_eq!(store.job_count(project_id), 0);
}

#[tokio::test]
async fn test_cleanup_is_a_no_op_without_jobs() {
    let project_id = Uuid::new_v4();
    let store = Arc::new(InMemoryStore::new());
    store.insert_intent(scene_intent(project_id, 1, 1, SceneStatus::Pending));

    let cleanup = cleanup_orphans(store.as_ref(), store.as_ref(), project_id)
        .await
        .unwrap();

    assert!(!cleanup.had_orphans);
    assert_eq!(cleanup.cleaned_count, 0);
}

#[tokio::test]
async fn test_repair_jobs_are_not_swept() {
    // The sweep targets scene-write jobs only; repair jobs are owned by the
    // repair coordinator.
    let project_id = Uuid::new_v4();
    let store = Arc::new(InMemoryStore::new());
    store.insert_job(dispatch_job(project_id, JobKind::SceneRepair, None));

    let cleanup = cleanup_orphans(store.as_ref(), store.as_ref(), project_id)
        .await
        .unwrap();

    assert!(!cleanup.had_orphans);
    assert_eq!(store.job_count(project_id), 1);
}
