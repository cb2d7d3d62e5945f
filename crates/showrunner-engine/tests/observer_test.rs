//! Integration tests for the realtime observer against the in-memory feed.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use showrunner_core::feed::{ChangeEvent, ChangeOp, ChangeRecord};
use showrunner_core::intent::SceneStatus;
use showrunner_core::repair::RepairStatus;
use showrunner_engine::observer::{ObserverHandlers, RealtimeObserver};
use showrunner_test_support::{
    InMemoryStore, narrative_state, scene_fixture, scene_intent, scene_repair,
};
use uuid::Uuid;

/// The feed delivers over a channel; give the consumer task a moment.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn test_observer_mirrors_inserts_and_updates() {
    // Arrange
    let project_id = Uuid::new_v4();
    let store = Arc::new(InMemoryStore::new());
    let observer = RealtimeObserver::new(store.clone());
    observer
        .subscribe(project_id, ObserverHandlers::default())
        .await
        .unwrap();

    // Act
    let intent = scene_intent(project_id, 1, 1, SceneStatus::Pending);
    let intent_id = intent.id;
    let scene = scene_fixture(project_id, &intent);
    let scene_id = scene.id;
    store.insert_intent(intent);
    store.complete_intent(intent_id, scene);
    store.put_narrative(narrative_state(project_id));
    settle().await;

    // Assert
    assert_eq!(observer.intent_status(intent_id), Some(SceneStatus::Written));
    assert!(observer.scene_seen(scene_id));
    assert!(observer.narrative().is_some());
    let counters = observer.counters();
    assert_eq!(counters.total, 1);
    assert_eq!(counters.completed, 1);
}

#[tokio::test]
async fn test_update_for_unknown_intent_is_an_implicit_insert() {
    // An update can arrive before the insert it logically follows. The
    // observer must count it rather than drop it.
    let project_id = Uuid::new_v4();
    let store = Arc::new(InMemoryStore::new());
    let observer = RealtimeObserver::new(store.clone());
    observer
        .subscribe(project_id, ObserverHandlers::default())
        .await
        .unwrap();

    let intent = scene_intent(project_id, 1, 1, SceneStatus::Writing);
    let intent_id = intent.id;
    store.publish(
        project_id,
        &ChangeEvent {
            op: ChangeOp::Update,
            record: ChangeRecord::Intent(intent),
        },
    );
    settle().await;

    assert_eq!(observer.intent_status(intent_id), Some(SceneStatus::Writing));
    assert_eq!(observer.counters().total, 1);
}

#[tokio::test]
async fn test_resubscribe_replaces_the_previous_subscription() {
    let project_id = Uuid::new_v4();
    let store = Arc::new(InMemoryStore::new());
    let observer = RealtimeObserver::new(store.clone());
    let intent_events = Arc::new(AtomicUsize::new(0));

    let counting_handlers = || {
        let seen = intent_events.clone();
        ObserverHandlers {
            on_intent: Some(Box::new(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            })),
            ..ObserverHandlers::default()
        }
    };

    // Act: subscribe twice, then publish one event.
    observer
        .subscribe(project_id, counting_handlers())
        .await
        .unwrap();
    store.insert_intent(scene_intent(project_id, 1, 1, SceneStatus::Pending));
    settle().await;
    observer
        .subscribe(project_id, counting_handlers())
        .await
        .unwrap();
    store.insert_intent(scene_intent(project_id, 1, 2, SceneStatus::Pending));
    settle().await;

    // Assert: the second event reached one consumer, not two, and the
    // resubscribe reset the mirror.
    assert_eq!(intent_events.load(Ordering::SeqCst), 2);
    assert_eq!(observer.counters().total, 1);
}

#[tokio::test]
async fn test_unsubscribe_stops_mirror_updates() {
    let project_id = Uuid::new_v4();
    let store = Arc::new(InMemoryStore::new());
    let observer = RealtimeObserver::new(store.clone());
    observer
        .subscribe(project_id, ObserverHandlers::default())
        .await
        .unwrap();

    observer.unsubscribe();
    store.insert_intent(scene_intent(project_id, 1, 1, SceneStatus::Pending));
    settle().await;

    assert_eq!(observer.counters().total, 0);
}

#[tokio::test]
async fn test_repair_updates_reach_the_mirror_and_handler() {
    let project_id = Uuid::new_v4();
    let store = Arc::new(InMemoryStore::new());
    let observer = RealtimeObserver::new(store.clone());
    let repair_events = Arc::new(AtomicUsize::new(0));
    let seen = repair_events.clone();
    observer
        .subscribe(
            project_id,
            ObserverHandlers {
                on_repair: Some(Box::new(move |_| {
                    seen.fetch_add(1, Ordering::SeqCst);
                })),
                ..ObserverHandlers::default()
            },
        )
        .await
        .unwrap();

    let repair = scene_repair(
        project_id,
        Uuid::new_v4(),
        Uuid::new_v4(),
        RepairStatus::Pending,
    );
    let repair_id = repair.id;
    store.insert_repair(repair);
    store.set_repair_status(repair_id, RepairStatus::Repairing);
    settle().await;

    assert_eq!(observer.repair_status(repair_id), Some(RepairStatus::Repairing));
    assert_eq!(repair_events.load(Ordering::SeqCst), 2);
}
