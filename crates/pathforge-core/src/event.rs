//! Build event system
//!
//! Provides:
//! - Event types for extrusion and placement progress
//! - Event dispatcher for publishing events to subscribers
//!
//! Publishing never blocks: the dispatcher sits on a broadcast channel and
//! slow subscribers simply lag.

use crate::world::UserId;
use std::fmt;
use std::time::Duration;
use tokio::sync::broadcast;

/// Identifier of a placement batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchId(pub u64);

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Build event types
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    /// Extrusion work was dispatched to the worker pool
    ExtrusionStarted {
        /// Requesting user.
        user: UserId,
        /// Number of path samples.
        samples: usize,
        /// Number of independent sections.
        sections: usize,
    },
    /// A section failed and contributed no instructions
    SectionFailed {
        /// Section index.
        section: usize,
        /// Failure description.
        reason: String,
    },
    /// Extrusion could not run at all
    ExtrusionFailed {
        /// Requesting user.
        user: UserId,
        /// Failure description.
        reason: String,
    },
    /// A batch snapshotted its targets and started committing
    BatchStarted {
        /// Batch id.
        batch: BatchId,
        /// Owning user.
        user: UserId,
        /// Number of instructions in the batch.
        total: usize,
    },
    /// Periodic progress report
    Progress {
        /// Batch id.
        batch: BatchId,
        /// Instructions committed so far.
        completed: usize,
        /// Instructions in the batch.
        total: usize,
        /// Completion percentage.
        percent: f64,
        /// Estimated time remaining.
        eta: Option<Duration>,
    },
    /// A batch drained completely
    BatchComplete {
        /// Batch id.
        batch: BatchId,
        /// Owning user.
        user: UserId,
        /// Instructions committed.
        placed: usize,
        /// Wall-clock time from first commit.
        elapsed: Duration,
    },
    /// A batch was cancelled before draining
    BatchCancelled {
        /// Batch id.
        batch: BatchId,
        /// Instructions committed before cancellation.
        placed: usize,
    },
    /// An undo batch was queued
    UndoQueued {
        /// Owning user.
        user: UserId,
        /// The undo batch.
        batch: BatchId,
    },
    /// Undo was requested with an empty history
    UndoEmpty {
        /// Requesting user.
        user: UserId,
    },
}

impl fmt::Display for BuildEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildEvent::ExtrusionStarted {
                samples, sections, ..
            } => write!(
                f,
                "Extruding {} samples in {} sections",
                samples, sections
            ),
            BuildEvent::SectionFailed { section, reason } => {
                write!(f, "Section {} failed: {}", section, reason)
            }
            BuildEvent::ExtrusionFailed { reason, .. } => write!(f, "Extrusion failed: {}", reason),
            BuildEvent::BatchStarted { batch, total, .. } => {
                write!(f, "Batch {} started: {} blocks", batch, total)
            }
            BuildEvent::Progress {
                batch,
                completed,
                total,
                percent,
                eta,
            } => {
                write!(
                    f,
                    "Batch {}: {}/{} ({:.1}%)",
                    batch, completed, total, percent
                )?;
                if let Some(eta) = eta {
                    write!(f, ", ETA {}s", eta.as_secs())?;
                }
                Ok(())
            }
            BuildEvent::BatchComplete {
                batch,
                placed,
                elapsed,
                ..
            } => write!(
                f,
                "Batch {} complete: {} blocks in {:.1}s",
                batch,
                placed,
                elapsed.as_secs_f64()
            ),
            BuildEvent::BatchCancelled { batch, placed } => {
                write!(f, "Batch {} cancelled after {} blocks", batch, placed)
            }
            BuildEvent::UndoQueued { batch, .. } => write!(f, "Undo queued as batch {}", batch),
            BuildEvent::UndoEmpty { .. } => write!(f, "Nothing to undo"),
        }
    }
}

/// Event dispatcher for publishing events to subscribers
#[derive(Clone)]
pub struct EventDispatcher {
    /// Broadcast sender channel for build events.
    tx: broadcast::Sender<BuildEvent>,
}

impl EventDispatcher {
    /// Create a new event dispatcher
    ///
    /// # Arguments
    /// * `buffer_size` - Size of the broadcast buffer (default 256)
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer_size.max(1));
        Self { tx }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<BuildEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all subscribers.
    ///
    /// Returns the number of subscribers reached; having none is not an error.
    pub fn publish(&self, event: BuildEvent) -> usize {
        tracing::trace!(%event, "build event");
        self.tx.send(event).unwrap_or(0)
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(256)
    }
}
