//! Shared application state.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex};

use showrunner_engine::config::GenerationConfig;
use showrunner_engine::controller::{GenerationController, GenerationServices, GenerationStores};
use showrunner_engine::error::EngineError;
use uuid::Uuid;

/// Application state shared across all request handlers.
///
/// Controllers are created lazily, one per project, and live for the life
/// of the process so the run guard and progress cache survive across
/// requests.
#[derive(Clone)]
pub struct AppState {
    stores: GenerationStores,
    services: GenerationServices,
    config: GenerationConfig,
    controllers: Arc<Mutex<HashMap<Uuid, Arc<GenerationController>>>>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        stores: GenerationStores,
        services: GenerationServices,
        config: GenerationConfig,
    ) -> Self {
        Self {
            stores,
            services,
            config,
            controllers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The controller for a project, created on first use. A new controller
    /// is subscribed to the change feed before it is handed out, so
    /// batch-dispatched runs compile without a manual resume.
    ///
    /// # Errors
    ///
    /// Returns a store error if the feed refuses the subscription.
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex is poisoned.
    pub async fn controller(
        &self,
        project_id: Uuid,
    ) -> Result<Arc<GenerationController>, EngineError> {
        let (controller, created) = {
            let mut controllers = self.controllers.lock().unwrap();
            match controllers.entry(project_id) {
                Entry::Occupied(entry) => (Arc::clone(entry.get()), false),
                Entry::Vacant(entry) => {
                    let controller = Arc::new(GenerationController::new(
                        project_id,
                        self.stores.clone(),
                        self.services.clone(),
                        self.config,
                    ));
                    entry.insert(Arc::clone(&controller));
                    (controller, true)
                }
            }
        };
        if created {
            Arc::clone(&controller).watch().await?;
        }
        Ok(controller)
    }

    /// Projects with a live controller in this process.
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex is poisoned.
    #[must_use]
    pub fn active_projects(&self) -> usize {
        self.controllers.lock().unwrap().len()
    }
}
