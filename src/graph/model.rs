use super::edge::{Edge, EdgeId, Handle};
use super::node::{Node, NodeId, NodeKind, Position};
use super::{connect, order};
use crate::error::StructuralError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A connection proposed by the canvas, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedLink {
    pub source: NodeId,
    pub source_handle: Option<Handle>,
    pub target: NodeId,
    pub target_handle: Option<Handle>,
}

impl ProposedLink {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            source_handle: Some(Handle::Bottom),
            target: target.into(),
            target_handle: Some(Handle::Top),
        }
    }

    pub fn with_source_handle(mut self, handle: Handle) -> Self {
        self.source_handle = Some(handle);
        self
    }

    pub fn with_target_handle(mut self, handle: Handle) -> Self {
        self.target_handle = Some(handle);
        self
    }
}

/// A structural edit of the graph. All mutation goes through
/// `WorkflowGraph::apply`; nothing else touches the collections.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    AddNode(Node),
    RemoveNode(NodeId),
    Connect(ProposedLink),
    Disconnect(EdgeId),
}

/// An immutable snapshot of the workflow graph.
///
/// Nodes and edges are two ordered collections keyed by id. `apply`
/// validates a mutation, produces the next snapshot, and recomputes
/// order/labels before returning, so derived fields never go stale. The
/// canvas subscribes to snapshots; it does not own the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<EdgeId, Edge>,
}

impl Default for WorkflowGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowGraph {
    /// An empty flow: just the Start and End nodes.
    pub fn new() -> Self {
        Self::with_positions(Position::new(250.0, 50.0), Position::new(250.0, 600.0))
    }

    pub fn with_positions(start: Position, end: Position) -> Self {
        let start = Node::start(start);
        let end = Node::end(end);
        let mut nodes = IndexMap::new();
        nodes.insert(start.id.clone(), start);
        nodes.insert(end.id.clone(), end);
        let mut graph = Self {
            nodes,
            edges: IndexMap::new(),
        };
        order::recompute(&mut graph);
        graph
    }

    /// Applies one mutation, returning the next snapshot.
    ///
    /// On any structural error the current snapshot is untouched and can
    /// keep being used.
    pub fn apply(&self, mutation: Mutation) -> Result<Self, StructuralError> {
        let mut next = self.clone();
        match mutation {
            Mutation::AddNode(node) => next.insert_node(node)?,
            Mutation::RemoveNode(id) => next.delete_node(&id)?,
            Mutation::Connect(link) => connect::connect(&mut next, link)?,
            Mutation::Disconnect(id) => next.delete_edge(&id)?,
        }
        order::recompute(&mut next);
        Ok(next)
    }

    /// Recomputes order/labels without a structural change, e.g. after
    /// loading a persisted flow whose derived fields may be stale.
    pub fn refreshed(&self) -> Self {
        let mut next = self.clone();
        order::recompute(&mut next);
        next
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn start_node(&self) -> Option<&Node> {
        self.nodes.values().find(|n| n.is_start())
    }

    pub fn end_node(&self) -> Option<&Node> {
        self.nodes.values().find(|n| n.is_end())
    }

    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.values().filter(move |e| e.source == id)
    }

    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.values().filter(move |e| e.target == id)
    }

    /// Replaces a node's configuration in place (panel save). Structure is
    /// untouched, so no recompute is needed.
    pub fn configure_node(
        &self,
        id: &str,
        config: super::node::NodeConfig,
    ) -> Result<Self, StructuralError> {
        let mut next = self.clone();
        let node = next
            .nodes
            .get_mut(id)
            .ok_or_else(|| StructuralError::NodeNotFound(id.to_string()))?;
        node.config = config;
        Ok(next)
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut IndexMap<NodeId, Node> {
        &mut self.nodes
    }

    pub(crate) fn insert_node(&mut self, node: Node) -> Result<(), StructuralError> {
        if self.nodes.contains_key(&node.id) {
            return Err(StructuralError::DuplicateNode(node.id));
        }
        if (node.is_start() && self.start_node().is_some())
            || (node.is_end() && self.end_node().is_some())
        {
            return Err(StructuralError::DuplicateNode(node.id));
        }
        // Loop nodes carry their dedicated self-edge from birth.
        let self_loop = (node.action == Some(super::node::ActionKind::Loop))
            .then(|| Edge::self_loop(node.id.clone()));
        self.nodes.insert(node.id.clone(), node);
        if let Some(edge) = self_loop {
            self.edges.insert(edge.id.clone(), edge);
        }
        Ok(())
    }

    pub(crate) fn delete_node(&mut self, id: &str) -> Result<(), StructuralError> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| StructuralError::NodeNotFound(id.to_string()))?;
        if matches!(node.kind, NodeKind::Start | NodeKind::End) {
            return Err(StructuralError::ProtectedNode);
        }
        self.nodes.shift_remove(id);

        // Cascade to incident edges, remembering any Path branches they
        // belonged to so the paired Condition nodes go with them.
        let mut branch_keys: Vec<NodeId> = Vec::new();
        self.edges.retain(|_, e| {
            let incident = e.source == id || e.target == id;
            if incident {
                if let Some(key) = &e.condition_node_id {
                    branch_keys.push(key.clone());
                }
            }
            !incident
        });
        for key in branch_keys {
            self.remove_branch(&key);
        }
        Ok(())
    }

    pub(crate) fn delete_edge(&mut self, id: &str) -> Result<(), StructuralError> {
        let edge = self
            .edges
            .shift_remove(id)
            .ok_or_else(|| StructuralError::EdgeNotFound(id.to_string()))?;
        if let Some(key) = edge.condition_node_id {
            self.remove_branch(&key);
        }
        Ok(())
    }

    /// Removes a synthesized Path branch: the Condition node and both of
    /// the edges that share its id.
    fn remove_branch(&mut self, key: &str) {
        self.edges
            .retain(|_, e| e.condition_node_id.as_deref() != Some(key));
        self.nodes.shift_remove(key);
    }

    pub(crate) fn insert_edge(&mut self, edge: Edge) {
        self.edges.insert(edge.id.clone(), edge);
    }
}
