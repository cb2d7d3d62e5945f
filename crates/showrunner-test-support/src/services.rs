//! Scripted collaborator doubles — planner, writer, and compiler stand-ins
//! that record their calls and drive the in-memory store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use showrunner_core::intent::SceneIntent;
use showrunner_core::services::{
    CompileResponse, PlanRequest, PlanResponse, Planner, SceneWriter, ScriptCompiler,
    ServiceError, WriteRequest, WriteTarget,
};
use showrunner_core::store::SceneIntentQueue;
use uuid::Uuid;

use crate::fixtures::scene_fixture;
use crate::store::InMemoryStore;

/// A planner that returns a fixed response and optionally seeds intents into
/// the store, the way the real planner creates records as a side effect.
pub struct ScriptedPlanner {
    response: Result<PlanResponse, String>,
    seed: Vec<SceneIntent>,
    store: Option<Arc<InMemoryStore>>,
    calls: AtomicUsize,
}

impl ScriptedPlanner {
    /// A planner that succeeds with the given response.
    #[must_use]
    pub fn new(response: PlanResponse) -> Self {
        Self {
            response: Ok(response),
            seed: vec![],
            store: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// A planner that fails every call.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_owned()),
            seed: vec![],
            store: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Seeds the given intents into `store` when `plan` is called.
    #[must_use]
    pub fn seeding(mut self, store: Arc<InMemoryStore>, intents: Vec<SceneIntent>) -> Self {
        self.store = Some(store);
        self.seed = intents;
        self
    }

    /// Number of `plan` calls made.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Planner for ScriptedPlanner {
    async fn plan(&self, _request: &PlanRequest) -> Result<PlanResponse, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            Ok(response) => {
                if let Some(store) = &self.store {
                    for intent in self.seed.clone() {
                        store.insert_intent(intent);
                    }
                }
                Ok(response.clone())
            }
            Err(message) => Err(ServiceError::Backend(message.clone())),
        }
    }
}

/// How a [`ScriptedWriter`] behaves on each call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterBehavior {
    /// Ack and immediately complete the intent in the store (scene created,
    /// status moved to `written`), so a poll terminates on the first read.
    CompleteImmediately,
    /// Ack and do nothing, leaving the intent to time out in the poll loop.
    AcknowledgeOnly,
    /// Fail the RPC.
    FailAlways,
}

/// A scene writer double that records every request.
pub struct ScriptedWriter {
    behavior: WriterBehavior,
    store: Option<Arc<InMemoryStore>>,
    requests: Mutex<Vec<WriteRequest>>,
}

impl ScriptedWriter {
    /// A writer with the given behavior. `store` is required for
    /// [`WriterBehavior::CompleteImmediately`].
    #[must_use]
    pub fn new(behavior: WriterBehavior, store: Option<Arc<InMemoryStore>>) -> Self {
        Self {
            behavior,
            store,
            requests: Mutex::new(vec![]),
        }
    }

    /// Snapshot of every request this writer received.
    ///
    /// # Panics
    ///
    /// Panics if the request mutex is poisoned.
    pub fn requests(&self) -> Vec<WriteRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of `write_scene` calls made.
    ///
    /// # Panics
    ///
    /// Panics if the request mutex is poisoned.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl SceneWriter for ScriptedWriter {
    async fn write_scene(&self, request: &WriteRequest) -> Result<(), ServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.behavior {
            WriterBehavior::FailAlways => {
                Err(ServiceError::Transport("connection refused".to_owned()))
            }
            WriterBehavior::AcknowledgeOnly => Ok(()),
            WriterBehavior::CompleteImmediately => {
                let store = self
                    .store
                    .as_ref()
                    .expect("CompleteImmediately requires a store");
                if let WriteTarget::Intent { intent_id, .. } = request.target {
                    let intent = store
                        .find(intent_id)
                        .await
                        .map_err(|e| ServiceError::Backend(e.to_string()))?
                        .ok_or_else(|| {
                            ServiceError::Backend(format!("unknown intent {intent_id}"))
                        })?;
                    let scene = scene_fixture(request.project_id, &intent);
                    store.complete_intent(intent_id, scene);
                }
                Ok(())
            }
        }
    }
}

/// A compiler double that records every call and returns a fixed result.
pub struct ScriptedCompiler {
    result: Result<Uuid, String>,
    calls: Mutex<Vec<(Uuid, i32)>>,
}

impl ScriptedCompiler {
    /// A compiler that succeeds with a fresh script id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            result: Ok(Uuid::new_v4()),
            calls: Mutex::new(vec![]),
        }
    }

    /// A compiler that fails every call.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_owned()),
            calls: Mutex::new(vec![]),
        }
    }

    /// Number of `compile` calls made.
    ///
    /// # Panics
    ///
    /// Panics if the call mutex is poisoned.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Snapshot of (project, episode) pairs compiled.
    ///
    /// # Panics
    ///
    /// Panics if the call mutex is poisoned.
    pub fn calls(&self) -> Vec<(Uuid, i32)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for ScriptedCompiler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScriptCompiler for ScriptedCompiler {
    async fn compile(
        &self,
        project_id: Uuid,
        episode_number: i32,
    ) -> Result<CompileResponse, ServiceError> {
        self.calls.lock().unwrap().push((project_id, episode_number));
        match &self.result {
            Ok(script_id) => Ok(CompileResponse {
                script_id: *script_id,
            }),
            Err(message) => Err(ServiceError::Backend(message.clone())),
        }
    }
}
