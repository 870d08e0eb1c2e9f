//! # PathForge
//!
//! Procedural route building for block worlds:
//! - Route graphs of control points joined by straight, arc and spline edges
//! - Tangent-continuous, uniformly resampled 3D paths with orientation
//! - Cross-section templates swept along the path on a worker pool
//! - Rate-limited placement with per-user undo
//!
//! ## Architecture
//!
//! PathForge is organized as a workspace with multiple crates:
//!
//! 1. **pathforge-core** - Errors, geometry, block-states, world trait, events
//! 2. **pathforge-route** - Curve solver, route graph, resampler
//! 3. **pathforge-extrude** - Templates, template storage, extrusion engine
//! 4. **pathforge-placement** - Tick scheduler, batches, history, undo
//! 5. **pathforge-settings** - Configuration files
//! 6. **pathforge** - Sessions, the build service, and the demo binary

pub mod service;
pub mod session;

pub use service::{extrusion_options, open_template_store, placement_options, BuildService};
pub use session::{Session, SessionStore};

pub use pathforge_core::{
    BatchId, BlockPos, BlockState, BlockWorld, BuildEvent, Error, EventDispatcher, MemoryWorld,
    PlacementInstruction, Result, UserId, Vec3,
};
pub use pathforge_extrude::{
    ExtrusionEngine, ExtrusionOptions, JsonTemplateStore, MemoryTemplateStore, Slice, Template,
    TemplateStore,
};
pub use pathforge_placement::{
    CooperativeScheduler, PlacementOptions, PlacementScheduler, TickDriver, TickScheduler,
    UndoOutcome,
};
pub use pathforge_route::{CurveKind, NodeId, PathSample, RouteGraph};
pub use pathforge_settings::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support (INFO by default)
/// - Thread ids and names, so worker output can be told apart
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
