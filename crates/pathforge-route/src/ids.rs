//! Identifiers for route graph elements.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a node in a route graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Identifier of an anchor in a route graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnchorId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {}", self.0)
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "anchor {}", self.0)
    }
}

/// Unordered pair of node ids identifying an edge.
///
/// `EdgeKey::new(a, b) == EdgeKey::new(b, a)`, and both hash the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey {
    low: NodeId,
    high: NodeId,
}

impl EdgeKey {
    /// Create a key for the edge between two nodes, in either order.
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// Both node ids, smallest first.
    pub fn nodes(&self) -> (NodeId, NodeId) {
        (self.low, self.high)
    }

    /// Whether the edge touches a node.
    pub fn contains(&self, node: NodeId) -> bool {
        self.low == node || self.high == node
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edge {}-{}", self.low.0, self.high.0)
    }
}
