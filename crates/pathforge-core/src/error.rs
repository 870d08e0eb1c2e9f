//! Error handling for PathForge
//!
//! Provides error types for every layer of the build pipeline:
//! - Route errors (graph editing, missing path)
//! - Block-state errors (textual encoding, rotation)
//! - Extrusion errors (template lookup, missing input)
//! - Placement errors (batches, empty selections)
//!
//! Geometric degeneracy is deliberately absent: the curve solver recovers
//! locally by falling back to linear interpolation.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Route graph error type
///
/// Represents failures of graph editing operations and of requests
/// that need a calculated path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouteError {
    /// Node id is not present in the graph
    #[error("Node {id} not found")]
    NodeNotFound {
        /// The missing node id.
        id: u64,
    },

    /// No edge connects the two nodes
    #[error("No edge between nodes {a} and {b}")]
    EdgeNotFound {
        /// First node id.
        a: u64,
        /// Second node id.
        b: u64,
    },

    /// An edge between the two nodes already exists
    #[error("Nodes {a} and {b} are already connected")]
    DuplicateEdge {
        /// First node id.
        a: u64,
        /// Second node id.
        b: u64,
    },

    /// An edge must join two distinct nodes
    #[error("Cannot connect node {id} to itself")]
    SelfLoop {
        /// The node id.
        id: u64,
    },

    /// Anchor id is not present in the graph
    #[error("Anchor {id} not found")]
    AnchorNotFound {
        /// The missing anchor id.
        id: u64,
    },

    /// The graph has no edges to build a path from
    #[error("No path set: the route has no edges")]
    EmptyRoute,
}

/// Block-state error type
///
/// Raised while parsing the textual block-state encoding or when a
/// rotation produces a value the encoding cannot represent.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BlockStateError {
    /// The encoding could not be parsed
    #[error("Malformed block-state '{input}': {reason}")]
    Malformed {
        /// The offending input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A property value has no rotated counterpart
    #[error("Cannot rotate property {property}={value}")]
    InvalidRotation {
        /// The property name.
        property: String,
        /// The value that could not be rotated.
        value: String,
    },
}

/// Extrusion error type
///
/// Represents failures that abort a whole extrusion request. Failures of a
/// single section are isolated and never surface through this type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtrusionError {
    /// The path has no samples
    #[error("Cannot extrude along an empty path")]
    EmptyPath,

    /// The template has no slices
    #[error("Template '{name}' has no slices")]
    EmptyTemplate {
        /// The template name.
        name: String,
    },

    /// No template is stored under the name
    #[error("Template '{name}' not found")]
    TemplateNotFound {
        /// The requested template name.
        name: String,
    },

    /// A slice does not match the template grid
    #[error("Slice is {got_width}x{got_height}, template grid is {width}x{height}")]
    DimensionMismatch {
        /// Template lateral width.
        width: usize,
        /// Template vertical height.
        height: usize,
        /// Offending slice width.
        got_width: usize,
        /// Offending slice height.
        got_height: usize,
    },

    /// A template could not be read from or written to storage
    #[error("Template storage failed for '{name}': {reason}")]
    TemplateStorage {
        /// The template name.
        name: String,
        /// The underlying failure.
        reason: String,
    },

    /// The worker pool could not be created
    #[error("Failed to build worker pool: {reason}")]
    WorkerPool {
        /// The reason reported by the pool builder.
        reason: String,
    },
}

/// Placement error type
///
/// Represents failures of the placement scheduler API.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlacementError {
    /// The batch id is unknown or already finished
    #[error("Batch {id} not found")]
    BatchNotFound {
        /// The batch id.
        id: u64,
    },

    /// Nothing to place
    #[error("Empty selection: no placement instructions")]
    EmptySelection,
}

/// Main error type for PathForge
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Route error
    #[error(transparent)]
    Route(#[from] RouteError),

    /// Block-state error
    #[error(transparent)]
    BlockState(#[from] BlockStateError),

    /// Extrusion error
    #[error(transparent)]
    Extrusion(#[from] ExtrusionError),

    /// Placement error
    #[error(transparent)]
    Placement(#[from] PlacementError),
}

impl Error {
    /// Check if the error means the request lacked its input
    /// (no path, unknown template, nothing selected)
    pub fn is_missing_input(&self) -> bool {
        matches!(
            self,
            Error::Route(RouteError::EmptyRoute)
                | Error::Extrusion(ExtrusionError::EmptyPath)
                | Error::Extrusion(ExtrusionError::EmptyTemplate { .. })
                | Error::Extrusion(ExtrusionError::TemplateNotFound { .. })
                | Error::Placement(PlacementError::EmptySelection)
        )
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
