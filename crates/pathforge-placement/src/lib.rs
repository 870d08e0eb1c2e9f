//! # PathForge Placement
//!
//! Applies placement instructions to the world under a per-tick budget,
//! records what was overwritten, and replays it on undo.
//!
//! ## Architecture
//!
//! ```text
//! PlacementScheduler
//!   ├── PlacementQueue (FIFO of batches, Pending → Draining → Complete)
//!   ├── HistoryStore   (per-user LIFO of overwritten block-states)
//!   └── drain task     (registered on a TickScheduler while work remains)
//!
//! CooperativeScheduler ── TickDriver (fixed-rate loop)
//! ```
//!
//! Everything here runs on the single mutation thread. Only the async tasks
//! handed to [`TickScheduler::run_once_async`] leave it.

pub mod batch;
pub mod driver;
pub mod history;
pub mod placement;
pub mod progress;
pub mod scheduler;

pub use batch::{Batch, BatchState, PlacementQueue};
pub use driver::TickDriver;
pub use history::{BlockChange, HistoryEntry, HistoryStore};
pub use placement::{PlacementOptions, PlacementScheduler, UndoOutcome};
pub use progress::{estimate_remaining, ProgressTracker};
pub use scheduler::{
    AsyncTask, CooperativeScheduler, TaskHandle, TaskSpawner, TaskStatus, TickContext,
    TickScheduler, TickTask,
};
