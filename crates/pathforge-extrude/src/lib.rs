//! # PathForge Extrude
//!
//! Sweeps a cross-section template along a resampled path and produces an
//! ordered list of placement instructions.
//!
//! The lateral extent of the template is split into independent sections
//! that run on a bounded worker pool; results are reassembled in section
//! order so the output does not depend on the number of workers.

pub mod engine;
pub mod slab;
pub mod store;
pub mod template;

pub use engine::{ExtrusionEngine, ExtrusionOptions, ExtrusionReport, Section};
pub use slab::smooth_slab;
pub use store::{JsonTemplateStore, MemoryTemplateStore, TemplateStore};
pub use template::{Slice, Template};
