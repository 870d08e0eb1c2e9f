//! Build service: route graph → extrusion → placement.
//!
//! A build runs in three hops:
//!
//! 1. On the mutation thread, the user's full path is computed and the
//!    template loaded. Either failing aborts before anything is scheduled.
//! 2. The extrusion runs as an async task on the worker pool and leaves its
//!    report in a mutex slot.
//! 3. A tick task polls the slot and hands the instructions to the
//!    placement scheduler.

use crate::session::{Session, SessionStore};
use pathforge_core::{
    thread_safe_none, BatchId, BuildEvent, Error, EventDispatcher, ExtrusionError, RouteError,
    ThreadSafeOption, UserId,
};
use pathforge_extrude::{
    ExtrusionEngine, ExtrusionOptions, ExtrusionReport, JsonTemplateStore, MemoryTemplateStore,
    Template, TemplateStore,
};
use pathforge_placement::{
    PlacementOptions, PlacementScheduler, TaskHandle, TaskStatus, TickScheduler, UndoOutcome,
};
use pathforge_settings::Config;
use std::sync::Arc;
use std::time::Duration;

type ExtrusionSlot = ThreadSafeOption<Result<ExtrusionReport, ExtrusionError>>;

/// Ties sessions, the extrusion engine and the placement scheduler together.
pub struct BuildService {
    sessions: SessionStore,
    engine: Arc<ExtrusionEngine>,
    templates: Arc<dyn TemplateStore>,
    placement: PlacementScheduler,
    events: EventDispatcher,
}

impl BuildService {
    /// Creates a service configured from `config`.
    pub fn new(
        config: &Config,
        templates: Arc<dyn TemplateStore>,
        events: EventDispatcher,
    ) -> Result<Self, Error> {
        let engine = ExtrusionEngine::new(extrusion_options(config))?;
        let placement = PlacementScheduler::new(placement_options(config), events.clone());
        tracing::info!(
            workers = engine.worker_count(),
            blocks_per_tick = config.placement.blocks_per_tick,
            "build service ready"
        );

        Ok(Self {
            sessions: SessionStore::new(config.route.sampling_step, config.route.resample_step),
            engine: Arc::new(engine),
            templates,
            placement,
            events,
        })
    }

    /// The user's session, created on first use.
    pub fn session(&mut self, user: UserId) -> &mut Session {
        self.sessions.session(user)
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn placement(&self) -> &PlacementScheduler {
        &self.placement
    }

    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    pub fn templates(&self) -> &Arc<dyn TemplateStore> {
        &self.templates
    }

    /// Extrude `template` along the user's route and queue the result.
    ///
    /// Returns the handle of the tick task that waits for the extrusion.
    /// Placement then reports through [`BuildEvent`]s.
    pub fn build(
        &mut self,
        scheduler: &mut dyn TickScheduler,
        user: UserId,
        template: &str,
    ) -> Result<TaskHandle, Error> {
        let path = self
            .sessions
            .get(user)
            .ok_or(RouteError::EmptyRoute)?
            .graph()
            .compute_full_path()?;
        let template = self.templates.load(template)?;
        if template.is_empty() {
            return Err(ExtrusionError::EmptyTemplate {
                name: template.name().to_string(),
            }
            .into());
        }

        let sections = self.engine.sections(&template).len();
        tracing::info!(
            %user,
            template = template.name(),
            samples = path.len(),
            sections,
            "build requested"
        );
        self.events.publish(BuildEvent::ExtrusionStarted {
            user,
            samples: path.len(),
            sections,
        });

        let slot: ExtrusionSlot = thread_safe_none();
        let engine = Arc::clone(&self.engine);
        let result = Arc::clone(&slot);
        scheduler.run_once_async(Box::new(move || {
            let report = engine.extrude_with_report(&path, &template);
            *result.lock() = Some(report);
        }));

        let placement = self.placement.clone();
        let events = self.events.clone();
        let handle = scheduler.run_every_tick(Box::new(move |ctx| {
            let Some(report) = slot.lock().take() else {
                return TaskStatus::Continue;
            };
            match report {
                Ok(report) => {
                    for (section, reason) in report.failed_sections {
                        events.publish(BuildEvent::SectionFailed { section, reason });
                    }
                    if let Err(e) = placement.schedule(ctx, user, report.instructions) {
                        tracing::warn!(%user, error = %e, "extrusion produced nothing to place");
                        events.publish(BuildEvent::ExtrusionFailed {
                            user,
                            reason: e.to_string(),
                        });
                    }
                }
                Err(e) => {
                    tracing::error!(%user, error = %e, "extrusion failed");
                    events.publish(BuildEvent::ExtrusionFailed {
                        user,
                        reason: e.to_string(),
                    });
                }
            }
            TaskStatus::Done
        }));
        Ok(handle)
    }

    /// Undo the user's most recent placement.
    pub fn undo(&mut self, scheduler: &mut dyn TickScheduler, user: UserId) -> UndoOutcome {
        self.placement.undo(scheduler, user)
    }

    /// Cancel a queued or draining batch.
    pub fn cancel(&mut self, batch: BatchId) -> Result<(), Error> {
        Ok(self.placement.cancel(batch)?)
    }

    /// Drop the user's session and placement history.
    pub fn end_session(&mut self, user: UserId) {
        self.sessions.end(user);
        self.placement.history().borrow_mut().clear_user(user);
        tracing::info!(%user, "session closed");
    }
}

/// Templates from the configured directory, or an in-memory store holding
/// `fallback` when the directory has no template of that name.
pub fn open_template_store(
    config: &Config,
    fallback: Template,
) -> Result<Arc<dyn TemplateStore>, Error> {
    let store = JsonTemplateStore::new(config.template_dir());
    if store.names().iter().any(|name| name == fallback.name()) {
        tracing::info!(dir = %store.dir().display(), "using template directory");
        return Ok(Arc::new(store));
    }

    tracing::info!(
        dir = %store.dir().display(),
        template = fallback.name(),
        "template not on disk, using built-in"
    );
    let memory = MemoryTemplateStore::new();
    memory.save(&fallback)?;
    Ok(Arc::new(memory))
}

/// Extrusion tuning from the config file.
pub fn extrusion_options(config: &Config) -> ExtrusionOptions {
    ExtrusionOptions {
        worker_threads: config.extrusion.worker_threads,
        section_width: config.extrusion.section_width,
        smooth_slabs: config.extrusion.smooth_slabs,
        dedupe_positions: config.extrusion.dedupe_positions,
    }
}

/// Placement tuning from the config file.
pub fn placement_options(config: &Config) -> PlacementOptions {
    PlacementOptions {
        blocks_per_tick: config.placement.blocks_per_tick,
        progress_interval: Duration::from_millis(config.placement.progress_interval_ms),
        suppress_neighbor_updates: config.placement.suppress_neighbor_updates,
    }
}
