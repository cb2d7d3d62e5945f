//! Generation controller — the orchestrator state machine.
//!
//! Drives the pipeline: plan, dispatch, poll, finalize. The persisted store
//! is the source of truth throughout; the controller's own state (cursor,
//! last observed phase) is a cache with optimistic updates reverted on
//! remote failure.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use showrunner_core::feed::ChangeFeed;
use showrunner_core::intent::{SceneIntent, SceneStatus};
use showrunner_core::phase::GenerationPhase;
use showrunner_core::services::{
    PlanRequest, Planner, SceneWriter, ScriptCompiler, WriteRequest, WriteTarget,
};
use showrunner_core::store::{
    DispatchJobStore, NarrativeStateStore, SceneIntentQueue, SceneRepairLedger,
};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::GenerationConfig;
use crate::error::EngineError;
use crate::integrity::{OrphanCleanup, cleanup_orphans};
use crate::observer::{ObserverHandlers, RealtimeObserver};
use crate::optimistic::OptimisticUpdate;
use crate::progress::{GenerationCounters, ProgressCursor, ProgressReport};
use crate::repair::effective_statuses;
use crate::session::RunSession;

/// Store handles the controller works against.
#[derive(Clone)]
pub struct GenerationStores {
    /// Narrative-state records.
    pub narrative: Arc<dyn NarrativeStateStore>,
    /// The scene-intent queue.
    pub intents: Arc<dyn SceneIntentQueue>,
    /// The scene-repair ledger.
    pub repairs: Arc<dyn SceneRepairLedger>,
    /// The remote dispatch-job queue.
    pub jobs: Arc<dyn DispatchJobStore>,
    /// Change notifications for the project's records.
    pub feed: Arc<dyn ChangeFeed>,
}

/// External collaborator handles.
#[derive(Clone)]
pub struct GenerationServices {
    /// Plans outlines into intents.
    pub planner: Arc<dyn Planner>,
    /// Writes scenes.
    pub writer: Arc<dyn SceneWriter>,
    /// Compiles finished episodes.
    pub compiler: Arc<dyn ScriptCompiler>,
}

/// Caller input to [`GenerationController::start`].
#[derive(Debug, Clone)]
pub struct StartRequest {
    /// The narrative outline to generate from.
    pub outline: String,
    /// Episode to generate.
    pub episode_number: i32,
    /// Output language.
    pub language: String,
    /// Quality tier passed through to the backend.
    pub quality_tier: String,
    /// Target format.
    pub format: String,
}

/// What one pass of the direct-dispatch loop did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    /// Intents dispatched to the writer.
    pub dispatched: usize,
    /// Writing intents short-circuited to written (scene already existed).
    pub short_circuited: usize,
    /// Dispatched intents that settled successfully within the poll bound.
    pub completed: usize,
    /// Dispatched intents that settled as failed/rejected.
    pub failed: usize,
    /// Dispatched intents whose poll ran out inconclusively.
    pub timed_out: usize,
    /// Whether the loop stopped on a cancellation request.
    pub cancelled: bool,
}

/// Result of [`GenerationController::start`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StartOutcome {
    /// Scenes the planner created intents for.
    pub scenes_planned: u32,
    /// Batch jobs handed to the writer (progress observed asynchronously).
    pub jobs_dispatched: usize,
    /// Direct-dispatch activity, when the planner queued no jobs itself.
    pub dispatch: DispatchSummary,
}

/// Result of [`GenerationController::continue_run`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResumeOutcome {
    /// Orphaned jobs removed during the initial reload.
    pub cleanup: OrphanCleanup,
    /// Direct-dispatch activity.
    pub dispatch: DispatchSummary,
}

/// Tri-state result of polling one intent to a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The intent reached `written` or `validated`.
    Success(SceneStatus),
    /// The intent reached `failed` or `rejected`.
    Failure(SceneStatus),
    /// No terminal status within the wait bound; the intent stays
    /// resumable and is not marked failed locally.
    Inconclusive,
}

/// Details handed to the completion callback.
#[derive(Debug, Clone)]
pub struct CompletionNotice {
    /// The completed project.
    pub project_id: Uuid,
    /// The episode that was compiled.
    pub episode_number: i32,
    /// The compiled script, or `None` when compilation failed (non-fatal).
    pub script_id: Option<Uuid>,
}

/// Callback invoked once per completion event.
pub type CompletionHook = Box<dyn Fn(&CompletionNotice) + Send + Sync>;

/// The orchestrator for one project.
pub struct GenerationController {
    project_id: Uuid,
    stores: GenerationStores,
    services: GenerationServices,
    config: GenerationConfig,
    session: RunSession,
    observer: RealtimeObserver,
    cursor: Mutex<ProgressCursor>,
    last_phase: Mutex<GenerationPhase>,
    on_complete: Option<CompletionHook>,
}

impl GenerationController {
    /// Creates a controller for one project.
    #[must_use]
    pub fn new(
        project_id: Uuid,
        stores: GenerationStores,
        services: GenerationServices,
        config: GenerationConfig,
    ) -> Self {
        let observer = RealtimeObserver::new(Arc::clone(&stores.feed));
        Self {
            project_id,
            stores,
            services,
            config,
            session: RunSession::new(),
            observer,
            cursor: Mutex::new(ProgressCursor::default()),
            last_phase: Mutex::new(GenerationPhase::Idle),
            on_complete: None,
        }
    }

    /// Registers the completion callback, invoked after the compiler on
    /// every transition into the completed phase.
    #[must_use]
    pub fn with_completion_hook(mut self, hook: CompletionHook) -> Self {
        self.on_complete = Some(hook);
        self
    }

    /// The project this controller drives.
    #[must_use]
    pub fn project_id(&self) -> Uuid {
        self.project_id
    }

    /// Whether a run is active in this process.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    /// Subscribes to the change feed so that terminal intent updates
    /// re-evaluate completion. Batch-dispatched runs make progress through
    /// the store rather than the dispatch loop; without a watch their
    /// episode is only compiled on the next explicit resume.
    ///
    /// Calling this again replaces the previous subscription.
    ///
    /// # Errors
    ///
    /// Returns a store error if the feed refuses the subscription.
    pub async fn watch(self: Arc<Self>) -> Result<(), EngineError> {
        let controller = Arc::downgrade(&self);
        let handlers = ObserverHandlers {
            on_intent: Some(Box::new(move |intent: &SceneIntent| {
                if !intent.status.is_terminal() {
                    return;
                }
                if let Some(controller) = controller.upgrade() {
                    tokio::spawn(async move { controller.check_completion().await });
                }
            })),
            ..ObserverHandlers::default()
        };
        self.observer.subscribe(self.project_id, handlers).await?;
        Ok(())
    }

    /// Starts a new generation run.
    ///
    /// When the planner queues batch jobs, their completion arrives through
    /// the change feed; attach [`watch`](Self::watch) beforehand so the run
    /// compiles and notifies without a manual resume.
    ///
    /// Guarded twice: by this controller's in-process flag and by a
    /// best-effort check for in-flight intents in the persisted queue. The
    /// persisted check is a non-atomic check-then-act — two clients calling
    /// `start` inside the same read window can both pass it and
    /// double-dispatch. This is a known limitation; a server-side atomic
    /// run claim would be required to close it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyInProgress`] if either guard trips
    /// (resume with [`continue_run`](Self::continue_run) instead),
    /// [`EngineError::Planner`] if planning fails, or a store error from
    /// the initial reload.
    pub async fn start(&self, request: StartRequest) -> Result<StartOutcome, EngineError> {
        let _guard = self.session.begin()?;

        let in_flight = self.stores.intents.list_pending(self.project_id).await?;
        if !in_flight.is_empty() {
            info!(
                project_id = %self.project_id,
                pending = in_flight.len(),
                "start refused: in-flight intents exist"
            );
            return Err(EngineError::AlreadyInProgress);
        }

        self.reload_cleanup().await;

        let plan_request = PlanRequest {
            project_id: self.project_id,
            outline: request.outline,
            episode_number: request.episode_number,
            language: request.language,
            quality_tier: request.quality_tier,
            format: request.format,
        };
        let plan = self
            .services
            .planner
            .plan(&plan_request)
            .await
            .map_err(|error| EngineError::Planner(error.to_string()))?;
        info!(
            project_id = %self.project_id,
            episode = request.episode_number,
            scenes_planned = plan.scenes_planned,
            jobs = plan.job_ids.len(),
            "outline planned"
        );

        let mut outcome = StartOutcome {
            scenes_planned: plan.scenes_planned,
            jobs_dispatched: 0,
            dispatch: DispatchSummary::default(),
        };

        if plan.job_ids.is_empty() {
            if plan.scenes_planned > 0 {
                // Planner created intents without queuing jobs: fall back to
                // dispatching them ourselves, one at a time.
                let pending = self.stores.intents.list_pending(self.project_id).await?;
                outcome.dispatch = self.run_dispatch_loop(pending).await;
            }
        } else {
            outcome.jobs_dispatched = self.dispatch_jobs(&plan.job_ids).await;
        }

        self.check_completion().await;
        Ok(outcome)
    }

    /// Resumes an interrupted run. Safe to call repeatedly: once nothing is
    /// pending it dispatches nothing and returns.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyInProgress`] if a run is active, or a
    /// store error from the initial reload.
    pub async fn continue_run(&self) -> Result<ResumeOutcome, EngineError> {
        let _guard = self.session.begin()?;

        let cleanup = self.reload_cleanup().await;
        let pending = self.stores.intents.list_pending(self.project_id).await?;
        let dispatch = self.run_dispatch_loop(pending).await;

        self.check_completion().await;
        Ok(ResumeOutcome { cleanup, dispatch })
    }

    /// Raises the cooperative cancellation signal. The dispatch loop stops
    /// before its next iteration; work already accepted by the writer
    /// continues remotely and is picked up by a later resume.
    pub fn cancel(&self) {
        info!(project_id = %self.project_id, "cancellation requested");
        self.session.request_cancel();
    }

    /// Deletes repairs, intents, and narrative state for the project and
    /// clears all local progress.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyInProgress`] while a run is active, or
    /// the first store error hit. A partial deletion leaves residual
    /// records; retry the reset.
    ///
    /// # Panics
    ///
    /// Panics if an internal mutex is poisoned.
    pub async fn reset_run(&self) -> Result<(), EngineError> {
        let _guard = self.session.begin()?;

        self.stores
            .repairs
            .delete_all_for_project(self.project_id)
            .await?;
        self.stores
            .intents
            .delete_all_for_project(self.project_id)
            .await?;
        self.stores.narrative.reset(self.project_id).await?;

        *self.cursor.lock().unwrap() = ProgressCursor::default();
        *self.last_phase.lock().unwrap() = GenerationPhase::Idle;
        info!(project_id = %self.project_id, "run reset");
        Ok(())
    }

    /// Derived run phase, computed from the persisted intents with repair
    /// outcomes applied.
    ///
    /// # Errors
    ///
    /// Returns a store error if the queue or ledger cannot be listed.
    pub async fn phase(&self) -> Result<GenerationPhase, EngineError> {
        let intents = self.stores.intents.list_by_project(self.project_id).await?;
        let repairs = self.stores.repairs.list_by_project(self.project_id).await?;
        Ok(GenerationPhase::derive(effective_statuses(
            &intents, &repairs,
        )))
    }

    /// Progress snapshot for the caller's UI.
    ///
    /// # Errors
    ///
    /// Returns a store error if the queue or ledger cannot be listed.
    ///
    /// # Panics
    ///
    /// Panics if the cursor mutex is poisoned.
    pub async fn progress(&self) -> Result<ProgressReport, EngineError> {
        let intents = self.stores.intents.list_by_project(self.project_id).await?;
        let repairs = self.stores.repairs.list_by_project(self.project_id).await?;
        let statuses = effective_statuses(&intents, &repairs);

        let mut counters = GenerationCounters::default();
        for status in &statuses {
            counters.add(*status);
        }
        Ok(ProgressReport {
            phase: GenerationPhase::derive(statuses),
            cursor: *self.cursor.lock().unwrap(),
            counters,
        })
    }

    /// Orphan sweep at the start of any state reload. Failures are logged
    /// and ignored; a failed sweep must not block a resume.
    async fn reload_cleanup(&self) -> OrphanCleanup {
        match cleanup_orphans(
            self.stores.intents.as_ref(),
            self.stores.jobs.as_ref(),
            self.project_id,
        )
        .await
        {
            Ok(cleanup) => cleanup,
            Err(error) => {
                warn!(project_id = %self.project_id, %error, "orphan cleanup failed");
                OrphanCleanup::default()
            }
        }
    }

    /// Hands pre-queued jobs to the writer, pacing them with a fixed delay.
    /// Completion is not awaited here; progress arrives via the store.
    async fn dispatch_jobs(&self, job_ids: &[Uuid]) -> usize {
        let mut dispatched = 0;
        for (index, job_id) in job_ids.iter().enumerate() {
            if self.session.cancel_requested() {
                info!(project_id = %self.project_id, "job dispatch cancelled");
                break;
            }
            if index > 0 {
                sleep(self.config.dispatch_delay).await;
            }
            let request = WriteRequest {
                project_id: self.project_id,
                target: WriteTarget::Job { job_id: *job_id },
            };
            match self.services.writer.write_scene(&request).await {
                Ok(()) => dispatched += 1,
                Err(error) => {
                    warn!(
                        project_id = %self.project_id,
                        %job_id,
                        %error,
                        "job dispatch failed; continuing with the next job"
                    );
                }
            }
        }
        dispatched
    }

    /// The direct-dispatch loop: one intent at a time, in scene order, each
    /// polled to a terminal status (or the wait bound) before the next. A
    /// single intent's failure never aborts the loop.
    async fn run_dispatch_loop(&self, intents: Vec<SceneIntent>) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        for intent in intents {
            if self.session.cancel_requested() {
                info!(
                    project_id = %self.project_id,
                    episode = intent.episode_number,
                    scene = intent.scene_number,
                    "dispatch loop cancelled"
                );
                summary.cancelled = true;
                break;
            }

            // Repair-path intents are progressed by the validator, not by
            // writer dispatch.
            if matches!(
                intent.status,
                SceneStatus::NeedsRepair | SceneStatus::Repairing
            ) {
                debug!(
                    project_id = %self.project_id,
                    intent_id = %intent.id,
                    "skipping intent in repair"
                );
                continue;
            }

            // A writing intent that already references a produced scene was
            // interrupted after the work finished: short-circuit to written
            // instead of re-dispatching.
            if intent.status == SceneStatus::Writing && intent.scene_id.is_some() {
                match self
                    .stores
                    .intents
                    .set_status(intent.id, SceneStatus::Written)
                    .await
                {
                    Ok(()) => summary.short_circuited += 1,
                    Err(error) => {
                        warn!(
                            project_id = %self.project_id,
                            intent_id = %intent.id,
                            %error,
                            "short-circuit to written failed"
                        );
                    }
                }
                continue;
            }

            match self.dispatch_and_poll(&intent).await {
                None => {}
                Some(outcome) => {
                    summary.dispatched += 1;
                    match outcome {
                        PollOutcome::Success(status) => {
                            debug!(
                                project_id = %self.project_id,
                                intent_id = %intent.id,
                                ?status,
                                "intent settled"
                            );
                            summary.completed += 1;
                        }
                        PollOutcome::Failure(status) => {
                            warn!(
                                project_id = %self.project_id,
                                episode = intent.episode_number,
                                scene = intent.scene_number,
                                ?status,
                                "intent failed; continuing with the next scene"
                            );
                            summary.failed += 1;
                        }
                        PollOutcome::Inconclusive => {
                            warn!(
                                project_id = %self.project_id,
                                episode = intent.episode_number,
                                scene = intent.scene_number,
                                "poll timed out; intent left for a later resume"
                            );
                            summary.timed_out += 1;
                        }
                    }
                }
            }
        }

        summary
    }

    /// Dispatches one intent to the writer and polls it to a terminal
    /// status. Returns `None` when dispatch itself failed (logged, loop
    /// moves on).
    async fn dispatch_and_poll(&self, intent: &SceneIntent) -> Option<PollOutcome> {
        // Cursor moves before the dispatch, optimistically; a failed
        // dispatch puts it back.
        let cursor = &self.cursor;
        let position = ProgressCursor {
            episode_number: intent.episode_number,
            scene_number: intent.scene_number,
        };
        let update = OptimisticUpdate::apply(|| {
            let previous = std::mem::replace(&mut *cursor.lock().unwrap(), position);
            move || *cursor.lock().unwrap() = previous
        });

        if intent.status != SceneStatus::Writing {
            if let Err(error) = self
                .stores
                .intents
                .set_status(intent.id, SceneStatus::Writing)
                .await
            {
                warn!(
                    project_id = %self.project_id,
                    episode = intent.episode_number,
                    scene = intent.scene_number,
                    %error,
                    "could not move intent into writing"
                );
                update.revert();
                return None;
            }
        }

        let request = WriteRequest {
            project_id: self.project_id,
            target: WriteTarget::Intent {
                intent_id: intent.id,
                episode_number: intent.episode_number,
                scene_number: intent.scene_number,
            },
        };
        if let Err(error) = self.services.writer.write_scene(&request).await {
            warn!(
                project_id = %self.project_id,
                episode = intent.episode_number,
                scene = intent.scene_number,
                %error,
                "scene dispatch failed; continuing with the next scene"
            );
            update.revert();
            return None;
        }
        update.commit();

        Some(self.poll_intent(intent.id).await)
    }

    /// Bounded poll: reads the intent at a fixed interval until it reaches
    /// a terminal status or the wait bound elapses.
    async fn poll_intent(&self, intent_id: Uuid) -> PollOutcome {
        let started = Instant::now();
        loop {
            match self.stores.intents.find(intent_id).await {
                Ok(Some(intent)) if intent.status.is_terminal() => {
                    return match intent.status {
                        SceneStatus::Written | SceneStatus::Validated => {
                            PollOutcome::Success(intent.status)
                        }
                        other => PollOutcome::Failure(other),
                    };
                }
                Ok(Some(_)) => {}
                Ok(None) => {
                    warn!(
                        project_id = %self.project_id,
                        %intent_id,
                        "intent disappeared while polling"
                    );
                    return PollOutcome::Inconclusive;
                }
                Err(error) => {
                    // Transient read failures just burn poll budget.
                    warn!(project_id = %self.project_id, %intent_id, %error, "poll read failed");
                }
            }
            if started.elapsed() >= self.config.max_poll_wait {
                return PollOutcome::Inconclusive;
            }
            sleep(self.config.poll_interval).await;
        }
    }

    /// Edge-triggered completion: when the derived phase transitions into
    /// `completed`, compile the episode once and notify the caller. A
    /// compiler failure is surfaced in the notice but never reverts the
    /// phase.
    async fn check_completion(&self) {
        let phase = match self.phase().await {
            Ok(phase) => phase,
            Err(error) => {
                warn!(project_id = %self.project_id, %error, "phase evaluation failed");
                return;
            }
        };

        let entered_completed = {
            let mut last = self.last_phase.lock().unwrap();
            let entered =
                phase == GenerationPhase::Completed && *last != GenerationPhase::Completed;
            *last = phase;
            entered
        };
        if !entered_completed {
            return;
        }

        let episode_number = match self.stores.intents.list_by_project(self.project_id).await {
            Ok(intents) => intents
                .iter()
                .map(|intent| intent.episode_number)
                .max()
                .unwrap_or(1),
            Err(error) => {
                warn!(project_id = %self.project_id, %error, "episode lookup failed");
                return;
            }
        };

        let script_id = match self
            .services
            .compiler
            .compile(self.project_id, episode_number)
            .await
        {
            Ok(response) => {
                info!(
                    project_id = %self.project_id,
                    episode = episode_number,
                    script_id = %response.script_id,
                    "episode compiled"
                );
                Some(response.script_id)
            }
            Err(error) => {
                warn!(
                    project_id = %self.project_id,
                    episode = episode_number,
                    %error,
                    "script compilation failed; completion stands"
                );
                None
            }
        };

        if let Some(hook) = &self.on_complete {
            hook(&CompletionNotice {
                project_id: self.project_id,
                episode_number,
                script_id,
            });
        }
    }
}
