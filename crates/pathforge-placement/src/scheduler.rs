//! Cooperative tick scheduler.
//!
//! The host advances time in ticks. Tick tasks run on the thread that calls
//! [`CooperativeScheduler::tick`], in registration order, and receive a
//! [`TickContext`] giving them world access and the ability to register
//! further tick tasks. Async tasks run once on a named background thread and
//! never touch the world.

use pathforge_core::BlockWorld;
use std::cell::Cell;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Handle of a registered task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(pub u64);

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task {}", self.0)
    }
}

/// What a tick task wants after running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Run again next tick.
    Continue,
    /// Deregister.
    Done,
}

/// A task run on every tick until it reports [`TaskStatus::Done`].
pub type TickTask = Box<dyn FnMut(&mut TickContext<'_>) -> TaskStatus>;

/// A one-shot task run off the mutation thread.
pub type AsyncTask = Box<dyn FnOnce() + Send + 'static>;

/// Registers tick tasks.
pub trait TaskSpawner {
    /// Register a task to run on every tick, starting with the next one.
    fn run_every_tick(&mut self, task: TickTask) -> TaskHandle;
}

/// Full scheduler interface.
pub trait TickScheduler: TaskSpawner {
    /// Run a task once on a background thread.
    fn run_once_async(&mut self, task: AsyncTask) -> TaskHandle;

    /// Deregister a tick task. Returns `false` if the handle is unknown,
    /// already finished, or refers to an async task.
    fn cancel(&mut self, handle: TaskHandle) -> bool;
}

#[derive(Debug, Default)]
struct HandleAllocator {
    next: Cell<u64>,
}

impl HandleAllocator {
    fn allocate(&self) -> TaskHandle {
        let id = self.next.get() + 1;
        self.next.set(id);
        TaskHandle(id)
    }
}

/// Per-tick view handed to tick tasks.
pub struct TickContext<'a> {
    world: &'a mut dyn BlockWorld,
    handles: &'a HandleAllocator,
    spawned: Vec<(TaskHandle, TickTask)>,
    tick: u64,
}

impl<'a> TickContext<'a> {
    /// The host world.
    pub fn world(&mut self) -> &mut (dyn BlockWorld + 'a) {
        &mut *self.world
    }

    /// Number of the current tick, starting at 1.
    pub fn tick(&self) -> u64 {
        self.tick
    }
}

impl TaskSpawner for TickContext<'_> {
    fn run_every_tick(&mut self, task: TickTask) -> TaskHandle {
        let handle = self.handles.allocate();
        self.spawned.push((handle, task));
        handle
    }
}

/// Decrements the in-flight counter even if the task panics.
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Single-threaded scheduler driven by explicit `tick` calls.
#[derive(Default)]
pub struct CooperativeScheduler {
    tasks: Vec<(TaskHandle, TickTask)>,
    handles: HandleAllocator,
    in_flight: Arc<AtomicUsize>,
    ticks: u64,
}

impl CooperativeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every registered tick task once.
    pub fn tick(&mut self, world: &mut dyn BlockWorld) {
        self.ticks += 1;
        let mut tasks = std::mem::take(&mut self.tasks);
        let mut ctx = TickContext {
            world,
            handles: &self.handles,
            spawned: Vec::new(),
            tick: self.ticks,
        };

        tasks.retain_mut(|(_, task)| task(&mut ctx) == TaskStatus::Continue);
        tasks.extend(ctx.spawned);
        self.tasks = tasks;
    }

    /// Number of registered tick tasks.
    pub fn tick_task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Number of async tasks still running.
    pub fn async_in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// No tick tasks registered and no async work running.
    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty() && self.async_in_flight() == 0
    }
}

impl TaskSpawner for CooperativeScheduler {
    fn run_every_tick(&mut self, task: TickTask) -> TaskHandle {
        let handle = self.handles.allocate();
        self.tasks.push((handle, task));
        handle
    }
}

impl TickScheduler for CooperativeScheduler {
    fn run_once_async(&mut self, task: AsyncTask) -> TaskHandle {
        let handle = self.handles.allocate();
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlightGuard(Arc::clone(&self.in_flight));

        let spawned = std::thread::Builder::new()
            .name(format!("pathforge-async-{}", handle.0))
            .spawn(move || {
                let _guard = guard;
                task();
            });
        if let Err(e) = spawned {
            // The closure, and with it the guard, is dropped on failure.
            tracing::error!(%handle, error = %e, "failed to spawn async task");
        }
        handle
    }

    fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|(h, _)| *h != handle);
        let removed = self.tasks.len() != before;
        if removed {
            tracing::debug!(%handle, "tick task cancelled");
        }
        removed
    }
}
