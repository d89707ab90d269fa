use super::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type EdgeId = String;

/// The connection point an edge attaches to on a node.
///
/// `Loop`/`LoopBack` are reserved for a Loop node's dedicated self-edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Handle {
    Top,
    Bottom,
    Loop,
    LoopBack,
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Handle::Top => "top",
            Handle::Bottom => "bottom",
            Handle::Loop => "loop",
            Handle::LoopBack => "loop-back",
        };
        write!(f, "{}", name)
    }
}

/// A directed connection between two nodes.
///
/// `condition_node_id` marks the two edges of a synthesized Path branch;
/// they share the id of their Condition node and are always deleted
/// together with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<Handle>,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<Handle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_node_id: Option<NodeId>,
    #[serde(default)]
    pub animated: bool,
}

impl Edge {
    pub fn new(
        source: impl Into<NodeId>,
        source_handle: Option<Handle>,
        target: impl Into<NodeId>,
        target_handle: Option<Handle>,
    ) -> Self {
        let source = source.into();
        let target = target.into();
        let id = match source_handle {
            Some(handle) => format!("e-{}:{}-{}", source, handle, target),
            None => format!("e-{}-{}", source, target),
        };
        Self {
            id,
            source,
            source_handle,
            target,
            target_handle,
            condition_node_id: None,
            animated: false,
        }
    }

    /// The auto-maintained self-edge of a Loop node.
    pub fn self_loop(node: impl Into<NodeId>) -> Self {
        let node = node.into();
        let mut edge = Edge::new(
            node.clone(),
            Some(Handle::Loop),
            node,
            Some(Handle::LoopBack),
        );
        edge.animated = true;
        edge
    }

    /// Whether the edge leaves through a loop handle. Loop edges do not
    /// count toward the one-output-per-node rule and are skipped by the
    /// order traversals.
    pub fn is_loop(&self) -> bool {
        matches!(self.source_handle, Some(Handle::Loop))
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}
