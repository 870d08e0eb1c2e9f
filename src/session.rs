//! Per-user editing sessions.
//!
//! A session owns the user's route graph together with the selection state
//! an editing front end needs: the selected node and anchor, the source of a
//! connection being drawn, and the curve kind new edges get.

use pathforge_core::{RouteError, UserId, Vec3};
use pathforge_route::{AnchorId, CurveKind, EdgeKey, NodeId, RouteGraph};
use std::collections::HashMap;

/// One user's graph and selection.
#[derive(Debug, Clone)]
pub struct Session {
    graph: RouteGraph,
    selected_node: Option<NodeId>,
    selected_anchor: Option<AnchorId>,
    connect_from: Option<NodeId>,
    curve_kind: CurveKind,
}

impl Session {
    pub fn new(graph: RouteGraph) -> Self {
        Self {
            graph,
            selected_node: None,
            selected_anchor: None,
            connect_from: None,
            curve_kind: CurveKind::default(),
        }
    }

    pub fn graph(&self) -> &RouteGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut RouteGraph {
        &mut self.graph
    }

    /// Curve kind given to edges created by [`Session::complete_connection`].
    pub fn curve_kind(&self) -> CurveKind {
        self.curve_kind
    }

    pub fn set_curve_kind(&mut self, kind: CurveKind) {
        self.curve_kind = kind;
    }

    pub fn selected_node(&self) -> Option<NodeId> {
        self.selected_node
    }

    pub fn selected_anchor(&self) -> Option<AnchorId> {
        self.selected_anchor
    }

    pub fn pending_connection(&self) -> Option<NodeId> {
        self.connect_from
    }

    /// Add a node at `position` and select it.
    pub fn place_node(&mut self, position: Vec3) -> NodeId {
        let id = self.graph.add_node(position);
        self.selected_node = Some(id);
        self.selected_anchor = None;
        id
    }

    pub fn select_node(&mut self, id: NodeId) -> Result<(), RouteError> {
        if self.graph.node(id).is_none() {
            return Err(RouteError::NodeNotFound { id: id.0 });
        }
        self.selected_node = Some(id);
        self.selected_anchor = None;
        Ok(())
    }

    pub fn select_anchor(&mut self, id: AnchorId) -> Result<(), RouteError> {
        if self.graph.anchor(id).is_none() {
            return Err(RouteError::AnchorNotFound { id: id.0 });
        }
        self.selected_anchor = Some(id);
        self.selected_node = None;
        Ok(())
    }

    /// Move whatever is selected.
    ///
    /// Returns `false` when nothing is selected.
    pub fn move_selection(&mut self, position: Vec3) -> Result<bool, RouteError> {
        if let Some(node) = self.selected_node {
            self.graph.move_node(node, position)?;
            Ok(true)
        } else if let Some(anchor) = self.selected_anchor {
            self.graph.move_anchor(anchor, position)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Delete whatever is selected, along with edges and anchors that depend
    /// on it.
    pub fn delete_selection(&mut self) -> Result<bool, RouteError> {
        if let Some(node) = self.selected_node.take() {
            self.graph.remove_node(node)?;
            self.forget_missing();
            Ok(true)
        } else if let Some(anchor) = self.selected_anchor.take() {
            self.graph.delete_anchor(anchor)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Start drawing an edge from `from`.
    pub fn begin_connection(&mut self, from: NodeId) -> Result<(), RouteError> {
        if self.graph.node(from).is_none() {
            return Err(RouteError::NodeNotFound { id: from.0 });
        }
        self.connect_from = Some(from);
        Ok(())
    }

    /// Finish the pending edge at `to` using the session's curve kind.
    ///
    /// Returns `Ok(None)` when no connection was pending. The pending source
    /// is cleared whether or not connecting succeeds.
    pub fn complete_connection(&mut self, to: NodeId) -> Result<Option<EdgeKey>, RouteError> {
        let Some(from) = self.connect_from.take() else {
            return Ok(None);
        };
        self.graph.connect(from, to, self.curve_kind).map(Some)
    }

    pub fn cancel_connection(&mut self) {
        self.connect_from = None;
    }

    pub fn clear_selection(&mut self) {
        self.selected_node = None;
        self.selected_anchor = None;
        self.connect_from = None;
    }

    /// Drop selection references to things no longer in the graph.
    fn forget_missing(&mut self) {
        if self.selected_anchor.is_some_and(|id| self.graph.anchor(id).is_none()) {
            self.selected_anchor = None;
        }
        if self.connect_from.is_some_and(|id| self.graph.node(id).is_none()) {
            self.connect_from = None;
        }
    }
}

/// Sessions keyed by user, created on first use.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: HashMap<UserId, Session>,
    sampling_step: f64,
    resample_step: f64,
}

impl SessionStore {
    /// Store whose new graphs use the given sampling and resampling steps.
    pub fn new(sampling_step: f64, resample_step: f64) -> Self {
        Self {
            sessions: HashMap::new(),
            sampling_step,
            resample_step,
        }
    }

    /// The user's session, created if missing.
    pub fn session(&mut self, user: UserId) -> &mut Session {
        let (sampling, resample) = (self.sampling_step, self.resample_step);
        self.sessions.entry(user).or_insert_with(|| {
            tracing::debug!(%user, "session created");
            Session::new(RouteGraph::with_steps(sampling, resample))
        })
    }

    pub fn get(&self, user: UserId) -> Option<&Session> {
        self.sessions.get(&user)
    }

    /// Drop a session. Returns `false` if the user had none.
    pub fn end(&mut self, user: UserId) -> bool {
        let ended = self.sessions.remove(&user).is_some();
        if ended {
            tracing::debug!(%user, "session ended");
        }
        ended
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(
            pathforge_route::graph::DEFAULT_SAMPLING_STEP,
            pathforge_route::graph::DEFAULT_RESAMPLE_STEP,
        )
    }
}
