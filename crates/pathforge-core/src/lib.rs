//! # PathForge Core
//!
//! Core types, traits, and utilities for PathForge.
//! Provides the geometry primitives shared by the route and extrusion
//! crates, the immutable block-state value, the world access trait,
//! build events and the unified error type.

pub mod block;
pub mod error;
pub mod event;
pub mod geometry;
pub mod types;
pub mod world;

pub use block::{BlockState, PlacementInstruction};
pub use error::{
    BlockStateError, Error, ExtrusionError, PlacementError, Result, RouteError,
};
pub use event::{BatchId, BuildEvent, EventDispatcher};
pub use geometry::{
    circle_through, cross2, heading_of, horizontal, lerp_degrees, wrap_degrees, wrap_radians,
    Basis, BlockPos, Circle2, Vec3,
};
pub use types::{shared, thread_safe_none, Shared, ThreadSafeOption};
pub use world::{BlockWorld, MemoryWorld, UserId};
