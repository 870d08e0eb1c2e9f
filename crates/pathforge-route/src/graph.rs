//! Route graph.
//!
//! Nodes are control points, edges join two distinct nodes with a curve
//! kind and an optional anchor. Every edit eagerly recomputes the cached
//! path of each edge whose shape may have changed, so cached paths are
//! always current.
//!
//! ## Tangent continuity
//!
//! At a node with exactly two incident edges the edge that comes first in
//! insertion order owns the joint tangent: it computes its own analytic
//! tangent there and the other edge reuses it. The reused tangent is
//! flipped when the node is the same end (start or end) of both edges, so
//! that travel through the joint stays continuous.

use crate::curve::{analytic_tangent, CurveInput, CurveKind, CurveSolver};
use crate::ids::{AnchorId, EdgeKey, NodeId};
use crate::resample::resample;
use crate::sample::PathSample;
use pathforge_core::{RouteError, Vec3};
use std::collections::{HashMap, HashSet};

/// Default spacing of dense edge samples.
pub const DEFAULT_SAMPLING_STEP: f64 = 0.25;
/// Default spacing of the resampled full path.
pub const DEFAULT_RESAMPLE_STEP: f64 = 1.0;

/// A control point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    /// Node id.
    pub id: NodeId,
    /// World position.
    pub position: Vec3,
}

/// A point shaping the curve of one edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    /// Anchor id.
    pub id: AnchorId,
    /// World position.
    pub position: Vec3,
    /// The edge this anchor is attached to.
    pub edge: EdgeKey,
}

/// A connection between two nodes.
///
/// Equality and hashing use the unordered node pair only.
#[derive(Debug, Clone)]
pub struct Edge {
    p1: NodeId,
    p2: NodeId,
    kind: CurveKind,
    anchor: Option<AnchorId>,
    path: Vec<PathSample>,
}

impl Edge {
    fn new(p1: NodeId, p2: NodeId, kind: CurveKind) -> Self {
        Self {
            p1,
            p2,
            kind,
            anchor: None,
            path: Vec::new(),
        }
    }

    /// Unordered key of this edge.
    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.p1, self.p2)
    }

    /// Start node.
    pub fn p1(&self) -> NodeId {
        self.p1
    }

    /// End node.
    pub fn p2(&self) -> NodeId {
        self.p2
    }

    /// Curve kind.
    pub fn kind(&self) -> CurveKind {
        self.kind
    }

    /// Attached anchor, if any.
    pub fn anchor(&self) -> Option<AnchorId> {
        self.anchor
    }

    /// Cached dense path, from `p1` to `p2`.
    pub fn path(&self) -> &[PathSample] {
        &self.path
    }

    /// Whether the edge touches a node.
    pub fn touches(&self, node: NodeId) -> bool {
        self.p1 == node || self.p2 == node
    }

    /// The opposite end from `node`.
    pub fn other(&self, node: NodeId) -> NodeId {
        if self.p1 == node {
            self.p2
        } else {
            self.p1
        }
    }

    /// Dense path travelled starting from `from`.
    fn path_from(&self, from: NodeId) -> Vec<PathSample> {
        if from == self.p1 {
            self.path.clone()
        } else {
            self.path.iter().rev().map(PathSample::reversed).collect()
        }
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Edge {}

impl std::hash::Hash for Edge {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Control-point graph with cached per-edge paths.
#[derive(Debug, Clone)]
pub struct RouteGraph {
    nodes: HashMap<NodeId, Node>,
    anchors: HashMap<AnchorId, Anchor>,
    edges: Vec<Edge>,
    next_id: u64,
    solver: CurveSolver,
    resample_step: f64,
}

impl Default for RouteGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteGraph {
    /// Creates an empty graph with default sampling steps.
    pub fn new() -> Self {
        Self::with_steps(DEFAULT_SAMPLING_STEP, DEFAULT_RESAMPLE_STEP)
    }

    /// Creates an empty graph with explicit dense and resample steps.
    pub fn with_steps(sampling_step: f64, resample_step: f64) -> Self {
        Self {
            nodes: HashMap::new(),
            anchors: HashMap::new(),
            edges: Vec::new(),
            next_id: 1,
            solver: CurveSolver::new(sampling_step),
            resample_step,
        }
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // ---------------------------------------------------------------------
    // Nodes
    // ---------------------------------------------------------------------

    /// Add a control point.
    pub fn add_node(&mut self, position: Vec3) -> NodeId {
        let id = NodeId(self.allocate_id());
        self.nodes.insert(id, Node { id, position });
        tracing::debug!(node = id.0, ?position, "node added");
        id
    }

    /// Remove a node together with its incident edges and their anchors.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), RouteError> {
        self.require_node(id)?;

        let neighbours: Vec<NodeId> = self.neighbours(id).collect();
        let removed: Vec<Edge> = self
            .edges
            .iter()
            .filter(|e| e.touches(id))
            .cloned()
            .collect();
        self.edges.retain(|e| !e.touches(id));
        for edge in &removed {
            if let Some(anchor) = edge.anchor {
                self.anchors.remove(&anchor);
            }
        }
        self.nodes.remove(&id);

        tracing::debug!(node = id.0, edges = removed.len(), "node removed");
        self.refresh_around(&neighbours);
        Ok(())
    }

    /// Move a node and recompute the affected edges.
    pub fn move_node(&mut self, id: NodeId, position: Vec3) -> Result<(), RouteError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(RouteError::NodeNotFound { id: id.0 })?;
        node.position = position;
        self.refresh_around(&[id]);
        Ok(())
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// All nodes, ordered by id.
    pub fn nodes(&self) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self.nodes.values().collect();
        nodes.sort_by_key(|n| n.id);
        nodes
    }

    /// Number of edges touching a node.
    pub fn degree(&self, id: NodeId) -> usize {
        self.edges.iter().filter(|e| e.touches(id)).count()
    }

    // ---------------------------------------------------------------------
    // Edges
    // ---------------------------------------------------------------------

    /// Connect two distinct nodes.
    pub fn connect(
        &mut self,
        a: NodeId,
        b: NodeId,
        kind: CurveKind,
    ) -> Result<EdgeKey, RouteError> {
        if a == b {
            return Err(RouteError::SelfLoop { id: a.0 });
        }
        self.require_node(a)?;
        self.require_node(b)?;
        let key = EdgeKey::new(a, b);
        if self.edge_index(key).is_some() {
            return Err(RouteError::DuplicateEdge { a: a.0, b: b.0 });
        }

        self.edges.push(Edge::new(a, b, kind));
        tracing::debug!(a = a.0, b = b.0, %kind, "edge added");
        self.refresh_around(&[a, b]);
        Ok(key)
    }

    /// Remove the edge between two nodes and its anchor.
    pub fn disconnect(&mut self, a: NodeId, b: NodeId) -> Result<(), RouteError> {
        let index = self.require_edge(a, b)?;
        let edge = self.edges.remove(index);
        if let Some(anchor) = edge.anchor {
            self.anchors.remove(&anchor);
        }
        tracing::debug!(a = a.0, b = b.0, "edge removed");
        self.refresh_around(&[a, b]);
        Ok(())
    }

    /// Change the curve kind of an edge.
    pub fn set_curve_kind(
        &mut self,
        a: NodeId,
        b: NodeId,
        kind: CurveKind,
    ) -> Result<(), RouteError> {
        let index = self.require_edge(a, b)?;
        self.edges[index].kind = kind;
        self.refresh_around(&[a, b]);
        Ok(())
    }

    /// Look up the edge between two nodes, in either order.
    pub fn edge(&self, a: NodeId, b: NodeId) -> Option<&Edge> {
        self.edge_index(EdgeKey::new(a, b)).map(|i| &self.edges[i])
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edges touching a node, in insertion order.
    pub fn incident_edges(&self, id: NodeId) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.touches(id)).collect()
    }

    // ---------------------------------------------------------------------
    // Anchors
    // ---------------------------------------------------------------------

    /// Attach an anchor to an edge, replacing any existing one.
    pub fn attach_anchor(
        &mut self,
        a: NodeId,
        b: NodeId,
        position: Vec3,
    ) -> Result<AnchorId, RouteError> {
        let index = self.require_edge(a, b)?;
        if let Some(old) = self.edges[index].anchor.take() {
            self.anchors.remove(&old);
        }

        let id = AnchorId(self.allocate_id());
        let edge = self.edges[index].key();
        self.anchors.insert(id, Anchor { id, position, edge });
        self.edges[index].anchor = Some(id);
        tracing::debug!(anchor = id.0, %edge, "anchor attached");
        self.refresh_around(&[a, b]);
        Ok(id)
    }

    /// Move an anchor and recompute the affected edges.
    pub fn move_anchor(&mut self, id: AnchorId, position: Vec3) -> Result<(), RouteError> {
        let anchor = self
            .anchors
            .get_mut(&id)
            .ok_or(RouteError::AnchorNotFound { id: id.0 })?;
        anchor.position = position;
        let (a, b) = anchor.edge.nodes();
        self.refresh_around(&[a, b]);
        Ok(())
    }

    /// Delete an anchor; its edge reverts to the anchorless shape.
    pub fn delete_anchor(&mut self, id: AnchorId) -> Result<(), RouteError> {
        let anchor = self
            .anchors
            .remove(&id)
            .ok_or(RouteError::AnchorNotFound { id: id.0 })?;
        if let Some(index) = self.edge_index(anchor.edge) {
            self.edges[index].anchor = None;
        }
        let (a, b) = anchor.edge.nodes();
        self.refresh_around(&[a, b]);
        Ok(())
    }

    /// Look up an anchor.
    pub fn anchor(&self, id: AnchorId) -> Option<&Anchor> {
        self.anchors.get(&id)
    }

    // ---------------------------------------------------------------------
    // Sampling settings
    // ---------------------------------------------------------------------

    /// Spacing of dense edge samples.
    pub fn sampling_step(&self) -> f64 {
        self.solver.sampling_step()
    }

    /// Change the dense sampling step and recompute every edge.
    pub fn set_sampling_step(&mut self, step: f64) {
        self.solver = CurveSolver::new(step);
        let all: Vec<EdgeKey> = self.edges.iter().map(Edge::key).collect();
        self.refresh(all.into_iter().collect());
    }

    /// Spacing of the resampled full path.
    pub fn resample_step(&self) -> f64 {
        self.resample_step
    }

    /// Change the resample step used by [`RouteGraph::compute_full_path`].
    pub fn set_resample_step(&mut self, step: f64) {
        self.resample_step = step;
    }

    // ---------------------------------------------------------------------
    // Paths
    // ---------------------------------------------------------------------

    /// Travel direction of an edge at one of its nodes, honouring joint
    /// continuity at two-edge nodes.
    pub fn tangent_at(&self, a: NodeId, b: NodeId, node: NodeId) -> Result<Vec3, RouteError> {
        let index = self.require_edge(a, b)?;
        let edge = &self.edges[index];
        if !edge.touches(node) {
            return Err(RouteError::NodeNotFound { id: node.0 });
        }
        Ok(self.joint_tangent(edge, node))
    }

    /// Dense path of one edge from its `p1` to its `p2`.
    pub fn compute_path(&self, a: NodeId, b: NodeId) -> Result<Vec<PathSample>, RouteError> {
        let index = self.require_edge(a, b)?;
        Ok(self.edges[index].path.clone())
    }

    /// Uniformly resampled path over the whole graph.
    ///
    /// Edges are walked into chains starting from nodes that do not have
    /// exactly two edges, then any remaining closed loops. Each chain is
    /// resampled on its own and the results are concatenated.
    pub fn compute_full_path(&self) -> Result<Vec<PathSample>, RouteError> {
        if self.edges.is_empty() {
            return Err(RouteError::EmptyRoute);
        }

        let chains = self.chains();
        let mut full = Vec::new();
        for chain in &chains {
            full.extend(resample(chain, self.resample_step));
        }
        tracing::debug!(
            chains = chains.len(),
            samples = full.len(),
            "full path computed"
        );
        Ok(full)
    }

    fn chains(&self) -> Vec<Vec<PathSample>> {
        let mut used = vec![false; self.edges.len()];
        let mut chains = Vec::new();

        let mut starts = Vec::new();
        for edge in &self.edges {
            for node in [edge.p1, edge.p2] {
                if self.degree(node) != 2 && !starts.contains(&node) {
                    starts.push(node);
                }
            }
        }

        for start in starts {
            while let Some(chain) = self.walk_chain(start, &mut used) {
                chains.push(chain);
            }
        }

        // Closed loops have no start node; begin at the first unused edge.
        while let Some(index) = used.iter().position(|u| !u) {
            let start = self.edges[index].p1;
            match self.walk_chain(start, &mut used) {
                Some(chain) => chains.push(chain),
                None => break,
            }
        }
        chains
    }

    /// Walk unused edges from `start` through two-edge nodes.
    fn walk_chain(&self, start: NodeId, used: &mut [bool]) -> Option<Vec<PathSample>> {
        let mut chain: Vec<PathSample> = Vec::new();
        let mut current = start;

        loop {
            let next = self
                .edges
                .iter()
                .enumerate()
                .find(|(i, e)| !used[*i] && e.touches(current))
                .map(|(i, _)| i);
            let Some(index) = next else {
                break;
            };
            used[index] = true;

            let edge = &self.edges[index];
            let segment = edge.path_from(current);
            let skip = usize::from(!chain.is_empty());
            chain.extend(segment.into_iter().skip(skip));

            current = edge.other(current);
            if current == start || self.degree(current) != 2 {
                break;
            }
        }

        if chain.is_empty() {
            None
        } else {
            Some(chain)
        }
    }

    // ---------------------------------------------------------------------
    // Recalculation
    // ---------------------------------------------------------------------

    fn joint_tangent(&self, edge: &Edge, node: NodeId) -> Vec3 {
        let incident: Vec<&Edge> = self.edges.iter().filter(|e| e.touches(node)).collect();
        if let [owner, _] = incident.as_slice() {
            if owner.key() != edge.key() {
                let tangent = self.own_tangent(owner, node);
                let same_end = (owner.p1 == node) == (edge.p1 == node);
                return if same_end { -tangent } else { tangent };
            }
        }
        self.own_tangent(edge, node)
    }

    fn own_tangent(&self, edge: &Edge, node: NodeId) -> Vec3 {
        let (p1, p2) = self.endpoints(edge);
        analytic_tangent(edge.kind, p1, p2, self.anchor_position(edge), edge.p1 == node)
    }

    fn endpoints(&self, edge: &Edge) -> (Vec3, Vec3) {
        let position = |id: NodeId| self.nodes.get(&id).map(|n| n.position).unwrap_or_default();
        (position(edge.p1), position(edge.p2))
    }

    fn anchor_position(&self, edge: &Edge) -> Option<Vec3> {
        edge.anchor
            .and_then(|id| self.anchors.get(&id))
            .map(|a| a.position)
    }

    fn solve_edge(&self, edge: &Edge) -> Vec<PathSample> {
        let (p1, p2) = self.endpoints(edge);
        let input = CurveInput {
            p1,
            p2,
            tangent1: self.joint_tangent(edge, edge.p1),
            tangent2: self.joint_tangent(edge, edge.p2),
            anchor: self.anchor_position(edge),
        };
        self.solver.solve(edge.kind, &input)
    }

    /// Recompute every edge within one hop of the given nodes.
    fn refresh_around(&mut self, nodes: &[NodeId]) {
        let mut touched: HashSet<NodeId> = nodes.iter().copied().collect();
        for &node in nodes {
            touched.extend(self.neighbours(node));
        }
        let affected = self
            .edges
            .iter()
            .filter(|e| touched.contains(&e.p1) || touched.contains(&e.p2))
            .map(Edge::key)
            .collect();
        self.refresh(affected);
    }

    fn refresh(&mut self, affected: HashSet<EdgeKey>) {
        let paths: Vec<(usize, Vec<PathSample>)> = self
            .edges
            .iter()
            .enumerate()
            .filter(|(_, e)| affected.contains(&e.key()))
            .map(|(i, e)| (i, self.solve_edge(e)))
            .collect();
        tracing::trace!(edges = paths.len(), "edges recomputed");
        for (index, path) in paths {
            self.edges[index].path = path;
        }
    }

    fn neighbours(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.edges
            .iter()
            .filter(move |e| e.touches(id))
            .map(move |e| e.other(id))
    }

    fn edge_index(&self, key: EdgeKey) -> Option<usize> {
        self.edges.iter().position(|e| e.key() == key)
    }

    fn require_node(&self, id: NodeId) -> Result<(), RouteError> {
        if self.nodes.contains_key(&id) {
            Ok(())
        } else {
            Err(RouteError::NodeNotFound { id: id.0 })
        }
    }

    fn require_edge(&self, a: NodeId, b: NodeId) -> Result<usize, RouteError> {
        self.require_node(a)?;
        self.require_node(b)?;
        self.edge_index(EdgeKey::new(a, b))
            .ok_or(RouteError::EdgeNotFound { a: a.0, b: b.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_validates_nodes() {
        let mut graph = RouteGraph::new();
        let a = graph.add_node(Vec3::ZERO);
        let b = graph.add_node(Vec3::X * 4.0);

        assert_eq!(
            graph.connect(a, a, CurveKind::Straight),
            Err(RouteError::SelfLoop { id: a.0 })
        );
        assert_eq!(
            graph.connect(a, NodeId(99), CurveKind::Straight),
            Err(RouteError::NodeNotFound { id: 99 })
        );
        graph.connect(a, b, CurveKind::Straight).unwrap();
        assert!(matches!(
            graph.connect(b, a, CurveKind::Arc),
            Err(RouteError::DuplicateEdge { .. })
        ));
    }

    #[test]
    fn test_edge_lookup_is_unordered() {
        let mut graph = RouteGraph::new();
        let a = graph.add_node(Vec3::ZERO);
        let b = graph.add_node(Vec3::X * 4.0);
        graph.connect(a, b, CurveKind::Straight).unwrap();
        assert_eq!(graph.edge(b, a).unwrap().p1(), a);
        assert_eq!(graph.compute_path(b, a).unwrap().len(), 17);
    }

    #[test]
    fn test_remove_node_drops_edges_and_anchors() {
        let mut graph = RouteGraph::new();
        let a = graph.add_node(Vec3::ZERO);
        let b = graph.add_node(Vec3::new(10.0, 0.0, 0.0));
        graph.connect(a, b, CurveKind::Arc).unwrap();
        let anchor = graph.attach_anchor(a, b, Vec3::new(5.0, 0.0, 5.0)).unwrap();

        graph.remove_node(b).unwrap();
        assert!(graph.edges().is_empty());
        assert!(graph.anchor(anchor).is_none());
        assert_eq!(graph.nodes().len(), 1);
        assert_eq!(graph.compute_full_path(), Err(RouteError::EmptyRoute));
    }

    #[test]
    fn test_attach_anchor_replaces_existing() {
        let mut graph = RouteGraph::new();
        let a = graph.add_node(Vec3::ZERO);
        let b = graph.add_node(Vec3::new(10.0, 0.0, 0.0));
        graph.connect(a, b, CurveKind::Arc).unwrap();
        let first = graph.attach_anchor(a, b, Vec3::new(5.0, 0.0, 3.0)).unwrap();
        let second = graph.attach_anchor(a, b, Vec3::new(5.0, 0.0, -3.0)).unwrap();

        assert!(graph.anchor(first).is_none());
        assert_eq!(graph.edge(a, b).unwrap().anchor(), Some(second));
        let path = graph.compute_path(a, b).unwrap();
        assert!(path[path.len() / 2].position.z < -1.0);
    }

    #[test]
    fn test_delete_anchor_reverts_to_linear() {
        let mut graph = RouteGraph::new();
        let a = graph.add_node(Vec3::ZERO);
        let b = graph.add_node(Vec3::new(10.0, 0.0, 0.0));
        graph.connect(a, b, CurveKind::Arc).unwrap();
        let anchor = graph.attach_anchor(a, b, Vec3::new(5.0, 0.0, 5.0)).unwrap();
        graph.delete_anchor(anchor).unwrap();

        let path = graph.compute_path(a, b).unwrap();
        assert!(path.iter().all(|s| s.position.z == 0.0));
        assert_eq!(
            graph.delete_anchor(anchor),
            Err(RouteError::AnchorNotFound { id: anchor.0 })
        );
    }

    #[test]
    fn test_move_node_updates_cached_path() {
        let mut graph = RouteGraph::new();
        let a = graph.add_node(Vec3::ZERO);
        let b = graph.add_node(Vec3::new(4.0, 0.0, 0.0));
        graph.connect(a, b, CurveKind::Straight).unwrap();
        graph.move_node(b, Vec3::new(0.0, 0.0, 8.0)).unwrap();

        let path = graph.compute_path(a, b).unwrap();
        assert_eq!(path.last().unwrap().position, Vec3::new(0.0, 0.0, 8.0));
        assert!((path[0].yaw - 90.0).abs() < 1e-9);
    }
}
