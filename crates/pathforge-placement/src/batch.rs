//! Placement batches and the FIFO queue holding them.

use crate::history::BlockChange;
use crate::progress::ProgressTracker;
use pathforge_core::{BatchId, BlockWorld, PlacementInstruction, UserId};
use std::collections::VecDeque;
use std::time::Duration;

/// Lifecycle of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// Queued, nothing committed yet.
    Pending,
    /// Targets snapshotted, committing.
    Draining,
    /// All instructions committed.
    Complete,
    /// Removed before draining completely.
    Cancelled,
}

/// An ordered set of instructions placed on behalf of one user.
#[derive(Debug, Clone)]
pub struct Batch {
    id: BatchId,
    user: UserId,
    instructions: Vec<PlacementInstruction>,
    cursor: usize,
    state: BatchState,
    records_history: bool,
    progress: ProgressTracker,
}

impl Batch {
    /// Creates a pending batch.
    pub fn new(
        id: BatchId,
        user: UserId,
        instructions: Vec<PlacementInstruction>,
        records_history: bool,
        progress_interval: Duration,
    ) -> Self {
        Self {
            id,
            user,
            instructions,
            cursor: 0,
            state: BatchState::Pending,
            records_history,
            progress: ProgressTracker::new(progress_interval),
        }
    }

    pub fn id(&self) -> BatchId {
        self.id
    }

    pub fn user(&self) -> UserId {
        self.user
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Whether the batch pushes a history entry before committing.
    pub fn records_history(&self) -> bool {
        self.records_history
    }

    /// Number of instructions.
    pub fn total(&self) -> usize {
        self.instructions.len()
    }

    /// Instructions committed so far.
    pub fn placed(&self) -> usize {
        self.cursor
    }

    /// Instructions not yet committed.
    pub fn remaining(&self) -> usize {
        self.instructions.len() - self.cursor
    }

    pub(crate) fn progress_mut(&mut self) -> &mut ProgressTracker {
        &mut self.progress
    }

    /// Read the current world state at every target, in placement order.
    pub fn snapshot(&self, world: &dyn BlockWorld) -> Vec<BlockChange> {
        self.instructions
            .iter()
            .map(|instruction| BlockChange {
                pos: instruction.pos,
                original: world.get_block(instruction.pos),
            })
            .collect()
    }

    pub(crate) fn begin(&mut self) {
        self.state = BatchState::Draining;
    }

    /// Commit up to `budget` instructions. Returns how many were committed.
    pub fn commit(
        &mut self,
        world: &mut dyn BlockWorld,
        budget: usize,
        suppress_updates: bool,
    ) -> usize {
        let end = (self.cursor + budget).min(self.instructions.len());
        for instruction in &self.instructions[self.cursor..end] {
            world.set_block(instruction.pos, instruction.state.clone(), suppress_updates);
        }
        let committed = end - self.cursor;
        self.cursor = end;
        if self.cursor == self.instructions.len() {
            self.state = BatchState::Complete;
        }
        committed
    }

    pub(crate) fn cancel(&mut self) {
        self.state = BatchState::Cancelled;
    }
}

/// FIFO of batches waiting to drain.
#[derive(Debug, Default)]
pub struct PlacementQueue {
    batches: VecDeque<Batch>,
    next_id: u64,
}

impl PlacementQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next batch id.
    pub fn next_id(&mut self) -> BatchId {
        self.next_id += 1;
        BatchId(self.next_id)
    }

    pub fn push(&mut self, batch: Batch) {
        self.batches.push_back(batch);
    }

    pub fn front_mut(&mut self) -> Option<&mut Batch> {
        self.batches.front_mut()
    }

    pub fn pop_front(&mut self) -> Option<Batch> {
        self.batches.pop_front()
    }

    /// Remove a batch wherever it is in the queue.
    pub fn remove(&mut self, id: BatchId) -> Option<Batch> {
        let index = self.batches.iter().position(|b| b.id == id)?;
        self.batches.remove(index)
    }

    pub fn get(&self, id: BatchId) -> Option<&Batch> {
        self.batches.iter().find(|b| b.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Ids of queued batches, in drain order.
    pub fn ids(&self) -> Vec<BatchId> {
        self.batches.iter().map(|b| b.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathforge_core::{BlockPos, BlockState, MemoryWorld};

    fn batch(id: u64, count: i32) -> Batch {
        let instructions = (0..count)
            .map(|x| {
                PlacementInstruction::new(BlockPos::new(x, 0, 0), BlockState::new("minecraft:stone"))
            })
            .collect();
        Batch::new(BatchId(id), UserId::nil(), instructions, true, Duration::ZERO)
    }

    #[test]
    fn test_commit_respects_budget() {
        let mut world = MemoryWorld::new();
        let mut batch = batch(1, 5);
        batch.begin();

        assert_eq!(batch.commit(&mut world, 3, true), 3);
        assert_eq!(batch.state(), BatchState::Draining);
        assert_eq!(batch.remaining(), 2);
        assert_eq!(batch.commit(&mut world, 3, true), 2);
        assert_eq!(batch.state(), BatchState::Complete);
        assert_eq!(world.block_count(), 5);
    }

    #[test]
    fn test_snapshot_reads_world() {
        let mut world = MemoryWorld::new();
        world.set_block(BlockPos::new(1, 0, 0), BlockState::new("minecraft:dirt"), true);
        let snapshot = batch(1, 2).snapshot(&world);
        assert!(snapshot[0].original.is_air());
        assert_eq!(snapshot[1].original.name(), "minecraft:dirt");
    }

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = PlacementQueue::new();
        let a = queue.next_id();
        let b = queue.next_id();
        queue.push(batch(a.0, 1));
        queue.push(batch(b.0, 1));
        assert_eq!(queue.ids(), vec![a, b]);
        assert_eq!(queue.remove(b).unwrap().id(), b);
        assert_eq!(queue.pop_front().unwrap().id(), a);
        assert!(queue.is_empty());
    }
}
