//! World access collaborator.
//!
//! The host owns the world and only allows reads and writes from its single
//! mutation thread. PathForge moves opaque block-states through this trait
//! and never checks structural validity.

use crate::block::BlockState;
use crate::geometry::BlockPos;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Identifier of the user a build or history stack belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    /// A fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The all-zero id, used for console/system builds.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Block-state storage of the host world.
pub trait BlockWorld {
    /// Current block-state at a position.
    fn get_block(&self, pos: BlockPos) -> BlockState;

    /// Replace the block-state at a position.
    ///
    /// With `suppress_updates` the host must not propagate neighbour
    /// updates (physics, redstone, fluid flow) from this write.
    fn set_block(&mut self, pos: BlockPos, state: BlockState, suppress_updates: bool);
}

/// In-memory world, used by tests and the headless demo.
///
/// Positions never written read as air.
#[derive(Debug, Default, Clone)]
pub struct MemoryWorld {
    blocks: HashMap<BlockPos, BlockState>,
    writes: usize,
}

impl MemoryWorld {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of non-air blocks stored.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Total number of `set_block` calls served.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Iterate over stored non-air blocks.
    pub fn iter(&self) -> impl Iterator<Item = (&BlockPos, &BlockState)> {
        self.blocks.iter()
    }
}

impl BlockWorld for MemoryWorld {
    fn get_block(&self, pos: BlockPos) -> BlockState {
        self.blocks.get(&pos).cloned().unwrap_or_else(BlockState::air)
    }

    fn set_block(&mut self, pos: BlockPos, state: BlockState, _suppress_updates: bool) {
        self.writes += 1;
        if state.is_air() {
            self.blocks.remove(&pos);
        } else {
            self.blocks.insert(pos, state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_world_defaults_to_air() {
        let world = MemoryWorld::new();
        assert!(world.get_block(BlockPos::new(0, 64, 0)).is_air());
        assert_eq!(world.block_count(), 0);
    }

    #[test]
    fn test_memory_world_set_and_clear() {
        let mut world = MemoryWorld::new();
        let pos = BlockPos::new(1, 2, 3);
        world.set_block(pos, BlockState::new("minecraft:stone"), true);
        assert_eq!(world.get_block(pos).name(), "minecraft:stone");
        assert_eq!(world.block_count(), 1);

        world.set_block(pos, BlockState::air(), true);
        assert!(world.get_block(pos).is_air());
        assert_eq!(world.block_count(), 0);
        assert_eq!(world.write_count(), 2);
    }

    #[test]
    fn test_user_ids_are_distinct() {
        assert_ne!(UserId::new(), UserId::new());
        assert_eq!(UserId::nil().to_string(), "00000000-0000-0000-0000-000000000000");
    }
}
