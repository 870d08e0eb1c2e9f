//! # PathForge Route
//!
//! Turns a graph of control points and curve hints into a dense,
//! tangent-continuous, uniformly resampled 3D path with a heading at every
//! sample.
//!
//! ## Architecture
//!
//! ```text
//! RouteGraph (nodes, anchors, edges)
//!   ├── tangents (joint continuity at two-edge nodes)
//!   ├── CurveSolver (Straight / Arc / SplineApprox per edge, cached)
//!   └── full path (chain walk → resample at a fixed step)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pathforge_route::{CurveKind, RouteGraph, Vec3};
//!
//! let mut graph = RouteGraph::new();
//! let a = graph.add_node(Vec3::new(0.0, 64.0, 0.0));
//! let b = graph.add_node(Vec3::new(10.0, 64.0, 0.0));
//! graph.connect(a, b, CurveKind::Straight)?;
//! let path = graph.compute_full_path()?;
//! ```

pub mod curve;
pub mod graph;
pub mod ids;
pub mod resample;
pub mod sample;

pub use curve::{analytic_tangent, anchor_is_valid, CurveInput, CurveKind, CurveSolver};
pub use graph::{Anchor, Edge, Node, RouteGraph};
pub use ids::{AnchorId, EdgeKey, NodeId};
pub use pathforge_core::Vec3;
pub use resample::resample;
pub use sample::PathSample;
