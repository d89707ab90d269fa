//! Shared builders for graph-shaped test fixtures.
use kairo::prelude::*;

/// A step node at the origin; tests that care about positions set them.
#[allow(dead_code)]
pub fn step(id: &str, action: ActionKind) -> Node {
    Node::step(id, action, Position::new(0.0, 0.0))
}

#[allow(dead_code)]
pub fn add(graph: WorkflowGraph, node: Node) -> WorkflowGraph {
    graph.apply(Mutation::AddNode(node)).expect("add node")
}

#[allow(dead_code)]
pub fn connect(graph: WorkflowGraph, source: &str, target: &str) -> WorkflowGraph {
    graph
        .apply(Mutation::Connect(ProposedLink::new(source, target)))
        .expect("connect")
}

/// A Find step configured against the Account object.
#[allow(dead_code)]
pub fn configured_find(id: &str) -> Node {
    step(id, ActionKind::Find).with_config(NodeConfig::Find(FindConfig {
        object: Some("Account".to_string()),
        conditions: vec![Condition::new("Name", CompareOp::Equals, "Acme")],
        logic: Some(LogicSpec::And),
        return_limit: Some(10),
    }))
}

/// A Create/Update step mapping a single field on Contact.
#[allow(dead_code)]
pub fn configured_create(id: &str) -> Node {
    step(id, ActionKind::CreateUpdate).with_config(NodeConfig::CreateUpdate(CreateUpdateConfig {
        object: Some("Contact".to_string()),
        field_mappings: vec![FieldMapping::new("LastName", "{form.lastName}")],
        ..Default::default()
    }))
}

/// `Start -> Find -> Create -> End`, fully configured.
#[allow(dead_code)]
pub fn linear_flow() -> WorkflowGraph {
    let graph = WorkflowGraph::new();
    let graph = add(graph, configured_find("find-1"));
    let graph = add(graph, configured_create("create-1"));
    let graph = connect(graph, "start", "find-1");
    let graph = connect(graph, "find-1", "create-1");
    connect(graph, "create-1", "end")
}

/// `Start -> Path` with two synthesized branches joining at End.
///
/// Layout: `path -> cond(a) -> create-a -> end`, `path -> cond(b) -> create-b -> end`.
#[allow(dead_code)]
pub fn branched_flow() -> WorkflowGraph {
    let graph = WorkflowGraph::new();
    let graph = add(graph, step("path-1", ActionKind::Path));
    let graph = add(graph, configured_create("create-a"));
    let graph = add(graph, configured_create("create-b"));
    let graph = connect(graph, "start", "path-1");
    let graph = connect(graph, "path-1", "create-a");
    let graph = connect(graph, "path-1", "create-b");
    let graph = connect(graph, "create-a", "end");
    connect(graph, "create-b", "end")
}

/// `Start -> Find -> Loop -> End`, loop fully configured against the Find.
#[allow(dead_code)]
pub fn looped_flow() -> WorkflowGraph {
    let graph = WorkflowGraph::new();
    let graph = add(graph, configured_find("find-1"));
    let loop_node = step("loop-1", ActionKind::Loop).with_config(NodeConfig::Loop(LoopConfig {
        collection_node: Some("find-1".to_string()),
        variable: Some("record".to_string()),
        max_iterations: Some(50),
        exit_conditions: Vec::new(),
        exit_logic: None,
    }));
    let graph = add(graph, loop_node);
    let graph = connect(graph, "start", "find-1");
    let graph = connect(graph, "find-1", "loop-1");
    connect(graph, "loop-1", "end")
}

/// The condition nodes synthesized for a Path node's branches, in
/// insertion order.
#[allow(dead_code)]
pub fn branch_conditions(graph: &WorkflowGraph, path: &str) -> Vec<NodeId> {
    graph
        .outgoing(path)
        .filter_map(|e| e.condition_node_id.clone())
        .collect()
}
