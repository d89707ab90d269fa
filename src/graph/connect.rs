//! Validates a proposed connection and, for Path sources, rewrites it
//! into a synthesized branch before it reaches the graph collections.

use super::edge::{Edge, Handle};
use super::model::{ProposedLink, WorkflowGraph};
use super::node::{ActionKind, Node, NodeConfig, NodeId, NodeKind, Position};
use crate::error::StructuralError;
use ahash::AHashSet;

/// Rules are checked in order; the first failure wins and leaves the
/// graph untouched.
pub(crate) fn connect(graph: &mut WorkflowGraph, link: ProposedLink) -> Result<(), StructuralError> {
    let source = graph
        .node(&link.source)
        .ok_or_else(|| StructuralError::NodeNotFound(link.source.clone()))?;
    let target = graph
        .node(&link.target)
        .ok_or_else(|| StructuralError::NodeNotFound(link.target.clone()))?;

    // (a) self-edges are reserved for the Loop node's dedicated handle.
    if link.source == link.target && link.source_handle != Some(Handle::Loop) {
        return Err(StructuralError::SelfReference(link.source));
    }

    // (b) Start takes no input, End produces no output.
    if target.kind == NodeKind::Start {
        return Err(StructuralError::IntoStart);
    }
    if source.kind == NodeKind::End {
        return Err(StructuralError::OutOfEnd);
    }

    let source_position = source.position;
    let target_position = target.position;

    // (c) Path sources get a synthesized Condition node per branch.
    if source.action == Some(ActionKind::Path) {
        let branches = graph.outgoing(&link.source).filter(|e| !e.is_loop()).count();
        if branches >= 2 {
            return Err(StructuralError::BranchLimit(link.source));
        }
        if reaches(graph, &link.target, &link.source) {
            return Err(StructuralError::CycleDetected {
                from: link.source,
                to: link.target,
            });
        }

        let condition_id = branch_condition_id(graph, &link.source, &link.target);
        let condition = Node::step(
            condition_id.clone(),
            ActionKind::Condition,
            Position::midpoint(source_position, target_position),
        )
        .with_config(NodeConfig::Condition(Default::default()));

        let mut into_condition = Edge::new(
            link.source.clone(),
            link.source_handle,
            condition_id.clone(),
            Some(Handle::Top),
        );
        into_condition.condition_node_id = Some(condition_id.clone());
        let mut out_of_condition = Edge::new(
            condition_id.clone(),
            Some(Handle::Bottom),
            link.target.clone(),
            link.target_handle,
        );
        out_of_condition.condition_node_id = Some(condition_id.clone());

        tracing::debug!(
            path = %link.source,
            target = %link.target,
            condition = %condition_id,
            "synthesized path branch"
        );
        graph.insert_node(condition)?;
        graph.insert_edge(into_condition);
        graph.insert_edge(out_of_condition);
        return Ok(());
    }

    // (d) every other source: one non-loop output, no cycles.
    if link.source_handle != Some(Handle::Loop) {
        if graph.outgoing(&link.source).any(|e| !e.is_loop()) {
            return Err(StructuralError::OutputOccupied(link.source));
        }
    }
    if link.source != link.target && reaches(graph, &link.target, &link.source) {
        return Err(StructuralError::CycleDetected {
            from: link.source,
            to: link.target,
        });
    }

    let mut edge = Edge::new(
        link.source,
        link.source_handle,
        link.target,
        link.target_handle,
    );
    edge.animated = link.source_handle == Some(Handle::Loop);
    graph.insert_edge(edge);
    Ok(())
}

/// Reachability DFS over outgoing edges, skipping self-loops. "No path
/// found" is the success case for the cycle check.
fn reaches(graph: &WorkflowGraph, from: &str, to: &str) -> bool {
    if from == to {
        return true;
    }
    let mut visited: AHashSet<&str> = AHashSet::new();
    let mut stack: Vec<&str> = vec![from];
    while let Some(node) = stack.pop() {
        if !visited.insert(node) {
            continue;
        }
        for edge in graph.outgoing(node).filter(|e| !e.is_self_loop()) {
            if edge.target == to {
                return true;
            }
            stack.push(&edge.target);
        }
    }
    false
}

/// Synthesized Condition node ids stay deterministic per source/target
/// pair, with a numeric suffix when a stale sibling still holds the name.
fn branch_condition_id(graph: &WorkflowGraph, source: &str, target: &str) -> NodeId {
    let base = format!("cond-{}-{}", source, target);
    if !graph.contains_node(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !graph.contains_node(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
