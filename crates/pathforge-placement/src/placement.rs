//! Placement scheduler.
//!
//! Batches drain in FIFO order under a block budget shared by all batches
//! in a tick. A batch that records history snapshots every target right
//! before its first commit and pushes the snapshot, reversed, onto its
//! user's history stack. Undo pops that entry and queues it as a batch that
//! records nothing.
//!
//! # Cancellation
//!
//! Cancelling a batch drops its remaining instructions. If it had already
//! started, its history entry is cut down to the positions actually
//! written, so a later undo restores exactly those.

use crate::batch::{Batch, BatchState, PlacementQueue};
use crate::history::{HistoryEntry, HistoryStore};
use crate::progress::{estimate_remaining, ProgressTracker};
use crate::scheduler::{TaskSpawner, TaskStatus, TickContext};
use pathforge_core::{
    shared, BatchId, BlockWorld, BuildEvent, EventDispatcher, PlacementError,
    PlacementInstruction, Shared, UserId,
};
use std::time::{Duration, Instant};

/// Placement tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementOptions {
    /// Instructions committed per tick across all batches.
    pub blocks_per_tick: usize,
    /// Minimum wall-clock time between progress events of a batch.
    pub progress_interval: Duration,
    /// Ask the host not to propagate neighbour updates.
    pub suppress_neighbor_updates: bool,
}

impl Default for PlacementOptions {
    fn default() -> Self {
        Self {
            blocks_per_tick: 500,
            progress_interval: Duration::from_secs(1),
            suppress_neighbor_updates: true,
        }
    }
}

/// Result of an undo request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    /// The user's history is empty.
    NothingToUndo,
    /// The restoring batch was queued.
    Scheduled(BatchId),
}

struct Inner {
    options: PlacementOptions,
    queue: PlacementQueue,
    history: Shared<HistoryStore>,
    events: EventDispatcher,
    draining: bool,
}

/// Queues placement batches and drains them from a tick task.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct PlacementScheduler {
    inner: Shared<Inner>,
}

impl PlacementScheduler {
    /// Creates a scheduler with its own history store.
    pub fn new(options: PlacementOptions, events: EventDispatcher) -> Self {
        Self::with_history(options, events, shared(HistoryStore::new()))
    }

    /// Creates a scheduler sharing an existing history store.
    pub fn with_history(
        options: PlacementOptions,
        events: EventDispatcher,
        history: Shared<HistoryStore>,
    ) -> Self {
        Self {
            inner: shared(Inner {
                options,
                queue: PlacementQueue::new(),
                history,
                events,
                draining: false,
            }),
        }
    }

    /// The history store.
    pub fn history(&self) -> Shared<HistoryStore> {
        self.inner.borrow().history.clone()
    }

    /// Dispatcher receiving batch and undo events.
    pub fn events(&self) -> EventDispatcher {
        self.inner.borrow().events.clone()
    }

    /// Queue a batch that records history.
    pub fn schedule(
        &self,
        spawner: &mut dyn TaskSpawner,
        user: UserId,
        instructions: Vec<PlacementInstruction>,
    ) -> Result<BatchId, PlacementError> {
        if instructions.is_empty() {
            return Err(PlacementError::EmptySelection);
        }
        Ok(self.enqueue(spawner, user, instructions, true))
    }

    /// Queue the restoration of a user's most recent batch.
    pub fn undo(&self, spawner: &mut dyn TaskSpawner, user: UserId) -> UndoOutcome {
        let entry = {
            let inner = self.inner.borrow();
            let mut history = inner.history.borrow_mut();
            history.pop(user)
        };

        let Some(entry) = entry else {
            tracing::info!(%user, "nothing to undo");
            self.inner.borrow().events.publish(BuildEvent::UndoEmpty { user });
            return UndoOutcome::NothingToUndo;
        };

        let undone = entry.batch;
        let instructions: Vec<PlacementInstruction> = entry
            .changes
            .into_iter()
            .map(|change| PlacementInstruction::new(change.pos, change.original))
            .collect();
        if instructions.is_empty() {
            tracing::debug!(%user, batch = %undone, "history entry had no changes");
            return self.undo(spawner, user);
        }

        let batch = self.enqueue(spawner, user, instructions, false);
        tracing::info!(%user, undone = %undone, batch = %batch, "undo queued");
        self.inner
            .borrow()
            .events
            .publish(BuildEvent::UndoQueued { user, batch });
        UndoOutcome::Scheduled(batch)
    }

    /// Cancel a queued or draining batch.
    ///
    /// Fails with [`PlacementError::BatchNotFound`] if the batch is unknown
    /// or already finished.
    pub fn cancel(&self, batch: BatchId) -> Result<(), PlacementError> {
        let mut inner = self.inner.borrow_mut();
        let Some(mut removed) = inner.queue.remove(batch) else {
            return Err(PlacementError::BatchNotFound { id: batch.0 });
        };
        let placed = removed.placed();
        let was_draining = removed.state() == BatchState::Draining;
        removed.cancel();

        if was_draining && removed.records_history() {
            inner
                .history
                .borrow_mut()
                .truncate_batch(removed.user(), batch, placed);
        }

        tracing::info!(%batch, placed, total = removed.total(), "batch cancelled");
        inner
            .events
            .publish(BuildEvent::BatchCancelled { batch, placed });
        Ok(())
    }

    /// Whether no batches are waiting.
    pub fn is_idle(&self) -> bool {
        self.inner.borrow().queue.is_empty()
    }

    /// Ids of queued batches, in drain order.
    pub fn pending_batches(&self) -> Vec<BatchId> {
        self.inner.borrow().queue.ids()
    }

    /// State of a queued batch. Finished batches are no longer tracked.
    pub fn batch_state(&self, batch: BatchId) -> Option<BatchState> {
        self.inner.borrow().queue.get(batch).map(Batch::state)
    }

    fn enqueue(
        &self,
        spawner: &mut dyn TaskSpawner,
        user: UserId,
        instructions: Vec<PlacementInstruction>,
        records_history: bool,
    ) -> BatchId {
        let start_drain = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.queue.next_id();
            let interval = inner.options.progress_interval;
            let total = instructions.len();
            inner
                .queue
                .push(Batch::new(id, user, instructions, records_history, interval));
            tracing::debug!(batch = %id, %user, total, records_history, "batch queued");

            let start = !inner.draining;
            inner.draining = true;
            (id, start)
        };

        let (id, start) = start_drain;
        if start {
            let scheduler = self.clone();
            spawner.run_every_tick(Box::new(move |ctx| scheduler.drain(ctx)));
        }
        id
    }

    /// Commit one tick's worth of instructions.
    fn drain(&self, ctx: &mut TickContext<'_>) -> TaskStatus {
        let mut inner = self.inner.borrow_mut();
        let inner = &mut *inner;
        let mut budget = inner.options.blocks_per_tick.max(1);
        let suppress = inner.options.suppress_neighbor_updates;
        let world = ctx.world();

        while budget > 0 {
            let Some(batch) = inner.queue.front_mut() else {
                break;
            };
            if batch.state() == BatchState::Pending {
                begin_batch(batch, &*world, &inner.history, &inner.events, Instant::now());
            }

            budget -= batch.commit(world, budget, suppress);
            report_progress(batch, &inner.events, Instant::now());

            if batch.state() == BatchState::Complete {
                let id = batch.id();
                let user = batch.user();
                let placed = batch.placed();
                let elapsed = batch.progress_mut().elapsed(Instant::now());
                inner.queue.pop_front();

                tracing::info!(
                    batch = %id,
                    %user,
                    placed,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "batch complete"
                );
                inner.events.publish(BuildEvent::BatchComplete {
                    batch: id,
                    user,
                    placed,
                    elapsed,
                });
            }
        }

        if inner.queue.is_empty() {
            inner.draining = false;
            TaskStatus::Done
        } else {
            TaskStatus::Continue
        }
    }
}

fn begin_batch(
    batch: &mut Batch,
    world: &dyn BlockWorld,
    history: &Shared<HistoryStore>,
    events: &EventDispatcher,
    now: Instant,
) {
    if batch.records_history() {
        let entry = HistoryEntry::from_snapshot(batch.id(), batch.snapshot(world));
        history.borrow_mut().push(batch.user(), entry);
    }
    batch.begin();
    batch.progress_mut().start(now);

    tracing::info!(
        batch = %batch.id(),
        user = %batch.user(),
        total = batch.total(),
        "batch started"
    );
    events.publish(BuildEvent::BatchStarted {
        batch: batch.id(),
        user: batch.user(),
        total: batch.total(),
    });
}

fn report_progress(batch: &mut Batch, events: &EventDispatcher, now: Instant) {
    if batch.state() != BatchState::Draining || !batch.progress_mut().due(now) {
        return;
    }
    let completed = batch.placed();
    let total = batch.total();
    let elapsed = batch.progress_mut().elapsed(now);
    events.publish(BuildEvent::Progress {
        batch: batch.id(),
        completed,
        total,
        percent: ProgressTracker::percent(completed, total),
        eta: estimate_remaining(elapsed, completed, total),
    });
}
