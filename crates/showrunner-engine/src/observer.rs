//! Realtime observer — projects the change feed into controller-local state.
//!
//! The observer consumes change notifications for the four collections and
//! maintains mirrors plus incremental counters, without ever re-querying the
//! store. Delivery may be out of order: an update for an unknown record is
//! treated as an implicit insert, which is why insert and update events take
//! the same path below.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use showrunner_core::error::StoreError;
use showrunner_core::feed::{ChangeEvent, ChangeFeed, ChangeRecord};
use showrunner_core::intent::{SceneIntent, SceneStatus};
use showrunner_core::narrative::NarrativeState;
use showrunner_core::repair::{RepairStatus, SceneRepair};
use showrunner_core::scene::Scene;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::progress::GenerationCounters;

/// Optional callbacks invoked after the mirror is updated for an event.
#[derive(Default)]
pub struct ObserverHandlers {
    /// Called for every intent insert/update.
    pub on_intent: Option<Box<dyn Fn(&SceneIntent) + Send + Sync>>,
    /// Called for every scene insert/update.
    pub on_scene: Option<Box<dyn Fn(&Scene) + Send + Sync>>,
    /// Called for every narrative-state insert/update.
    pub on_narrative: Option<Box<dyn Fn(&NarrativeState) + Send + Sync>>,
    /// Called for every repair insert/update.
    pub on_repair: Option<Box<dyn Fn(&SceneRepair) + Send + Sync>>,
}

#[derive(Default)]
struct Mirror {
    intents: HashMap<Uuid, SceneStatus>,
    repairs: HashMap<Uuid, RepairStatus>,
    scenes: HashSet<Uuid>,
    narrative: Option<NarrativeState>,
    counters: GenerationCounters,
}

impl Mirror {
    fn apply(&mut self, event: &ChangeEvent) {
        match &event.record {
            ChangeRecord::Intent(intent) => {
                match self.intents.insert(intent.id, intent.status) {
                    None => self.counters.add(intent.status),
                    Some(old) => self.counters.replace(old, intent.status),
                }
            }
            ChangeRecord::Scene(scene) => {
                self.scenes.insert(scene.id);
            }
            ChangeRecord::Narrative(state) => {
                self.narrative = Some(state.clone());
            }
            ChangeRecord::Repair(repair) => {
                self.repairs.insert(repair.id, repair.status);
            }
        }
    }
}

/// Subscribes to the change feed for one project and mirrors it locally.
pub struct RealtimeObserver {
    feed: Arc<dyn ChangeFeed>,
    mirror: Arc<Mutex<Mirror>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RealtimeObserver {
    /// Creates an observer over the given feed. No subscription is opened
    /// until [`subscribe`](Self::subscribe) is called.
    #[must_use]
    pub fn new(feed: Arc<dyn ChangeFeed>) -> Self {
        Self {
            feed,
            mirror: Arc::new(Mutex::new(Mirror::default())),
            task: Mutex::new(None),
        }
    }

    /// Opens a subscription for the project. Calling this again replaces
    /// the previous subscription and resets the mirrors; handlers never
    /// stack.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the feed refuses the subscription.
    ///
    /// # Panics
    ///
    /// Panics if an internal mutex is poisoned.
    pub async fn subscribe(
        &self,
        project_id: Uuid,
        handlers: ObserverHandlers,
    ) -> Result<(), StoreError> {
        let mut stream = self.feed.subscribe(project_id).await?;

        if let Some(previous) = self.task.lock().unwrap().take() {
            previous.abort();
        }
        *self.mirror.lock().unwrap() = Mirror::default();

        let mirror = Arc::clone(&self.mirror);
        let handle = tokio::spawn(async move {
            while let Some(event) = stream.recv().await {
                mirror.lock().unwrap().apply(&event);
                match &event.record {
                    ChangeRecord::Intent(intent) => {
                        if let Some(handler) = &handlers.on_intent {
                            handler(intent);
                        }
                    }
                    ChangeRecord::Scene(scene) => {
                        if let Some(handler) = &handlers.on_scene {
                            handler(scene);
                        }
                    }
                    ChangeRecord::Narrative(state) => {
                        if let Some(handler) = &handlers.on_narrative {
                            handler(state);
                        }
                    }
                    ChangeRecord::Repair(repair) => {
                        if let Some(handler) = &handlers.on_repair {
                            handler(repair);
                        }
                    }
                }
            }
        });
        *self.task.lock().unwrap() = Some(handle);
        Ok(())
    }

    /// Ends the current subscription, if any.
    ///
    /// # Panics
    ///
    /// Panics if the task mutex is poisoned.
    pub fn unsubscribe(&self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
        }
    }

    /// Snapshot of the derived counters.
    ///
    /// # Panics
    ///
    /// Panics if the mirror mutex is poisoned.
    #[must_use]
    pub fn counters(&self) -> GenerationCounters {
        self.mirror.lock().unwrap().counters
    }

    /// Last observed status for an intent, if any event mentioned it.
    ///
    /// # Panics
    ///
    /// Panics if the mirror mutex is poisoned.
    #[must_use]
    pub fn intent_status(&self, intent_id: Uuid) -> Option<SceneStatus> {
        self.mirror.lock().unwrap().intents.get(&intent_id).copied()
    }

    /// Last observed status for a repair.
    ///
    /// # Panics
    ///
    /// Panics if the mirror mutex is poisoned.
    #[must_use]
    pub fn repair_status(&self, repair_id: Uuid) -> Option<RepairStatus> {
        self.mirror.lock().unwrap().repairs.get(&repair_id).copied()
    }

    /// Whether a scene has been observed.
    ///
    /// # Panics
    ///
    /// Panics if the mirror mutex is poisoned.
    #[must_use]
    pub fn scene_seen(&self, scene_id: Uuid) -> bool {
        self.mirror.lock().unwrap().scenes.contains(&scene_id)
    }

    /// Last observed narrative state.
    ///
    /// # Panics
    ///
    /// Panics if the mirror mutex is poisoned.
    #[must_use]
    pub fn narrative(&self) -> Option<NarrativeState> {
        self.mirror.lock().unwrap().narrative.clone()
    }
}

impl Drop for RealtimeObserver {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
