//! Per-user placement history for undo.

use pathforge_core::{BatchId, BlockPos, BlockState, UserId};
use std::collections::HashMap;

/// A block-state overwritten by a placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockChange {
    /// Position that was overwritten.
    pub pos: BlockPos,
    /// Block-state before the batch.
    pub original: BlockState,
}

/// Everything one batch overwrote.
///
/// `changes` is in reverse placement order, ready to be replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// The batch that made the changes.
    pub batch: BatchId,
    /// Original states, last placed first.
    pub changes: Vec<BlockChange>,
}

impl HistoryEntry {
    /// Build an entry from originals captured in placement order.
    pub fn from_snapshot(batch: BatchId, mut snapshot: Vec<BlockChange>) -> Self {
        snapshot.reverse();
        Self {
            batch,
            changes: snapshot,
        }
    }
}

/// Per-user LIFO stacks of history entries.
///
/// Stacks are created on first push and live until [`HistoryStore::clear_user`].
#[derive(Debug, Default)]
pub struct HistoryStore {
    stacks: HashMap<UserId, Vec<HistoryEntry>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an entry onto a user's stack.
    pub fn push(&mut self, user: UserId, entry: HistoryEntry) {
        self.stacks.entry(user).or_default().push(entry);
    }

    /// Pop the most recent entry of a user.
    pub fn pop(&mut self, user: UserId) -> Option<HistoryEntry> {
        self.stacks.get_mut(&user).and_then(Vec::pop)
    }

    /// Most recent entry of a user.
    pub fn peek(&self, user: UserId) -> Option<&HistoryEntry> {
        self.stacks.get(&user).and_then(|stack| stack.last())
    }

    /// Number of entries on a user's stack.
    pub fn depth(&self, user: UserId) -> usize {
        self.stacks.get(&user).map_or(0, Vec::len)
    }

    /// Drop a user's stack.
    pub fn clear_user(&mut self, user: UserId) {
        if let Some(stack) = self.stacks.remove(&user) {
            tracing::debug!(%user, entries = stack.len(), "history cleared");
        }
    }

    /// Number of users with a stack.
    pub fn user_count(&self) -> usize {
        self.stacks.len()
    }

    /// Keep only the changes of the first `placed` instructions of a batch.
    ///
    /// An entry left with no changes is removed. Returns `false` when the
    /// batch has no entry.
    pub fn truncate_batch(&mut self, user: UserId, batch: BatchId, placed: usize) -> bool {
        let Some(stack) = self.stacks.get_mut(&user) else {
            return false;
        };
        let Some(index) = stack.iter().position(|entry| entry.batch == batch) else {
            return false;
        };

        if placed == 0 {
            stack.remove(index);
        } else {
            let changes = &mut stack[index].changes;
            let unplaced = changes.len().saturating_sub(placed);
            changes.drain(..unplaced);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(x: i32, name: &str) -> BlockChange {
        BlockChange {
            pos: BlockPos::new(x, 0, 0),
            original: BlockState::new(name),
        }
    }

    #[test]
    fn test_lifo_per_user() {
        let mut store = HistoryStore::new();
        let alice = UserId::new();
        let bob = UserId::new();

        store.push(alice, HistoryEntry::from_snapshot(BatchId(1), vec![change(0, "a")]));
        store.push(alice, HistoryEntry::from_snapshot(BatchId(2), vec![change(1, "b")]));
        store.push(bob, HistoryEntry::from_snapshot(BatchId(3), vec![change(2, "c")]));

        assert_eq!(store.depth(alice), 2);
        assert_eq!(store.pop(alice).unwrap().batch, BatchId(2));
        assert_eq!(store.pop(bob).unwrap().batch, BatchId(3));
        assert!(store.pop(bob).is_none());
        assert_eq!(store.peek(alice).unwrap().batch, BatchId(1));
    }

    #[test]
    fn test_snapshot_is_reversed() {
        let entry = HistoryEntry::from_snapshot(BatchId(1), vec![change(0, "a"), change(1, "b")]);
        assert_eq!(entry.changes[0].pos, BlockPos::new(1, 0, 0));
    }

    #[test]
    fn test_truncate_keeps_placed_prefix() {
        let mut store = HistoryStore::new();
        let user = UserId::new();
        let snapshot = (0..5).map(|x| change(x, "air")).collect();
        store.push(user, HistoryEntry::from_snapshot(BatchId(7), snapshot));

        assert!(store.truncate_batch(user, BatchId(7), 2));
        let entry = store.peek(user).unwrap();
        let xs: Vec<i32> = entry.changes.iter().map(|c| c.pos.x).collect();
        assert_eq!(xs, vec![1, 0]);

        assert!(store.truncate_batch(user, BatchId(7), 0));
        assert_eq!(store.depth(user), 0);
        assert!(!store.truncate_batch(user, BatchId(7), 0));
    }

    #[test]
    fn test_clear_user() {
        let mut store = HistoryStore::new();
        let user = UserId::new();
        store.push(user, HistoryEntry::from_snapshot(BatchId(1), vec![change(0, "a")]));
        assert_eq!(store.user_count(), 1);
        store.clear_user(user);
        assert_eq!(store.user_count(), 0);
        assert_eq!(store.depth(user), 0);
    }
}
