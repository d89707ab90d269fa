//! The persisted/exchanged shape of a flow, built from a graph snapshot.
//!
//! This is the payload the save gateway accepts and the server-side
//! execution engine later walks; the core only prepares it.

use crate::condition::Condition;
use crate::graph::{
    ActionKind, Edge, FieldMapping, FormatterConfig, Handle, LoopConfig, Node, NodeConfig, NodeId,
    NodeKind, PathOption, Position, WorkflowGraph,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Everything the save gateway needs to persist one flow version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowPayload {
    pub user_id: String,
    pub instance_url: String,
    pub flow_id: String,
    pub nodes: Vec<PersistedNode>,
    pub edges: Vec<PersistedEdge>,
    pub mappings: Vec<NodeMapping>,
}

/// A canvas node as persisted: fixed `"custom"` render type, position,
/// and the node data with its action config flattened in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: String,
    pub position: Position,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedEdge {
    pub id: String,
    pub source: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<Handle>,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<Handle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_node_id: Option<NodeId>,
}

/// One execution-mapping row per step node: the flattened view the
/// server-side engine consumes, with explicit previous/next links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMapping {
    pub node_id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<ActionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salesforce_object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_mappings: Option<Vec<FieldMapping>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_logic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_config: Option<LoopConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatter_config: Option<FormatterConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_option: Option<PathOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_node_id: Option<NodeId>,
    pub next_node_ids: Vec<NodeId>,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    pub form_version_id: String,
}

impl FlowPayload {
    /// Assembles the payload from a snapshot. Serialization of the config
    /// payloads is infallible for the types involved, but the error is
    /// propagated rather than swallowed.
    pub fn from_graph(
        graph: &WorkflowGraph,
        user_id: impl Into<String>,
        instance_url: impl Into<String>,
        flow_id: impl Into<String>,
        form_version_id: &str,
    ) -> Result<Self, serde_json::Error> {
        let nodes = graph
            .nodes()
            .map(persist_node)
            .collect::<Result<Vec<_>, _>>()?;
        let edges = graph.edges().map(persist_edge).collect();
        let mappings = graph
            .nodes()
            .filter(|n| n.kind != NodeKind::Start && n.kind != NodeKind::End)
            .sorted_by_key(|n| n.order.unwrap_or(u32::MAX))
            .map(|n| mapping_row(graph, n, form_version_id))
            .collect();

        Ok(Self {
            user_id: user_id.into(),
            instance_url: instance_url.into(),
            flow_id: flow_id.into(),
            nodes,
            edges,
            mappings,
        })
    }
}

fn persist_node(node: &Node) -> Result<PersistedNode, serde_json::Error> {
    let mut data = Map::new();
    data.insert("label".to_string(), Value::String(node.label.clone()));
    data.insert(
        "displayLabel".to_string(),
        Value::String(node.display_label.clone()),
    );
    data.insert("action".to_string(), serde_json::to_value(node.action)?);
    data.insert("type".to_string(), serde_json::to_value(node.kind)?);
    data.insert("order".to_string(), serde_json::to_value(node.order)?);
    for (key, value) in config_fields(&node.config)? {
        data.insert(key, value);
    }
    Ok(PersistedNode {
        id: node.id.clone(),
        node_type: "custom".to_string(),
        position: node.position,
        data: Value::Object(data),
    })
}

fn persist_edge(edge: &Edge) -> PersistedEdge {
    PersistedEdge {
        id: edge.id.clone(),
        source: edge.source.clone(),
        source_handle: edge.source_handle,
        target: edge.target.clone(),
        target_handle: edge.target_handle,
        condition_node_id: edge.condition_node_id.clone(),
    }
}

/// The action config as a flat JSON object, merged into the node data.
fn config_fields(config: &NodeConfig) -> Result<Map<String, Value>, serde_json::Error> {
    let value = match config {
        NodeConfig::Empty => Value::Object(Map::new()),
        NodeConfig::CreateUpdate(c) => serde_json::to_value(c)?,
        NodeConfig::Find(c) => serde_json::to_value(c)?,
        NodeConfig::Filter(c) => serde_json::to_value(c)?,
        NodeConfig::Condition(c) => serde_json::to_value(c)?,
        NodeConfig::Loop(c) => serde_json::to_value(c)?,
        NodeConfig::Formatter(c) => serde_json::to_value(c)?,
        NodeConfig::Sheet(c) => serde_json::to_value(c)?,
        NodeConfig::FindSheet(c) => serde_json::to_value(c)?,
    };
    match value {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

fn mapping_row(graph: &WorkflowGraph, node: &Node, form_version_id: &str) -> NodeMapping {
    let previous_node_id = graph
        .incoming(&node.id)
        .find(|e| !e.is_self_loop())
        .map(|e| e.source.clone());
    let next_node_ids = graph
        .outgoing(&node.id)
        .filter(|e| !e.is_self_loop())
        .map(|e| e.target.clone())
        .collect();

    let mut row = NodeMapping {
        node_id: node.id.clone(),
        action_type: node.action,
        salesforce_object: None,
        field_mappings: None,
        conditions: None,
        logic_type: None,
        custom_logic: None,
        loop_config: None,
        formatter_config: None,
        path_option: None,
        previous_node_id,
        next_node_ids,
        label: node.label.clone(),
        order: node.order,
        form_version_id: form_version_id.to_string(),
    };

    match &node.config {
        NodeConfig::Empty => {}
        NodeConfig::CreateUpdate(c) => {
            row.salesforce_object = c.object.clone();
            row.field_mappings = Some(c.field_mappings.clone());
            if c.conditions_enabled {
                row.conditions = Some(c.conditions.clone());
                row.logic_type = c.logic.as_ref().map(|l| l.type_name().to_string());
                row.custom_logic = c.logic.as_ref().and_then(|l| l.expression()).map(String::from);
            }
        }
        NodeConfig::Find(c) => {
            row.salesforce_object = c.object.clone();
            row.conditions = Some(c.conditions.clone());
            row.logic_type = c.logic.as_ref().map(|l| l.type_name().to_string());
            row.custom_logic = c.logic.as_ref().and_then(|l| l.expression()).map(String::from);
        }
        NodeConfig::Filter(c) => {
            row.conditions = Some(c.conditions.clone());
            row.logic_type = c.logic.as_ref().map(|l| l.type_name().to_string());
            row.custom_logic = c.logic.as_ref().and_then(|l| l.expression()).map(String::from);
        }
        NodeConfig::Condition(c) => {
            row.path_option = Some(c.path_option);
            row.conditions = Some(c.conditions.clone());
            row.logic_type = c.logic.as_ref().map(|l| l.type_name().to_string());
            row.custom_logic = c.logic.as_ref().and_then(|l| l.expression()).map(String::from);
        }
        NodeConfig::Loop(c) => {
            row.loop_config = Some(c.clone());
        }
        NodeConfig::Formatter(c) => {
            row.formatter_config = Some(c.clone());
        }
        NodeConfig::Sheet(c) => {
            row.salesforce_object = c.spreadsheet.clone();
            row.field_mappings = Some(c.field_mappings.clone());
        }
        NodeConfig::FindSheet(c) => {
            row.salesforce_object = c.spreadsheet.clone();
            row.conditions = Some(c.conditions.clone());
            row.logic_type = c.logic.as_ref().map(|l| l.type_name().to_string());
            row.custom_logic = c.logic.as_ref().and_then(|l| l.expression()).map(String::from);
        }
    }

    row
}
