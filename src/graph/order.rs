//! Derives `order`, `label` and `display_label` for every node.
//!
//! Runs after every structural mutation. Order is the topological
//! execution sequence number; level is the longest-path distance from
//! Start and only feeds label generation.

use super::model::WorkflowGraph;
use super::node::{ActionKind, NodeId};
use ahash::AHashMap;

pub(crate) fn recompute(graph: &mut WorkflowGraph) {
    let Some(start_id) = graph.start_node().map(|n| n.id.clone()) else {
        return;
    };
    let end_id = graph.end_node().map(|n| n.id.clone());

    // Adjacency without self-loops; a Loop node's dedicated self-edge
    // never participates in leveling or ordering.
    let mut adjacency: AHashMap<NodeId, Vec<NodeId>> = AHashMap::new();
    for edge in graph.edges().filter(|e| !e.is_self_loop()) {
        adjacency
            .entry(edge.source.clone())
            .or_default()
            .push(edge.target.clone());
    }

    // Phase 1: leveling. A node settles at the maximum level over all of
    // its incoming paths, so convergent branches meet at the deepest
    // level. Edges into End only raise the end-level counter; End itself
    // is never visited early. No level can exceed the node count in an
    // acyclic graph, so the cap keeps the fixpoint loop terminating even
    // when a hand-edited or corrupt snapshot smuggles in a cycle.
    let level_cap = graph.node_count() as u32;
    let mut levels: AHashMap<NodeId, u32> = AHashMap::new();
    levels.insert(start_id.clone(), 0);
    let mut end_level: u32 = 1;
    let mut stack: Vec<(NodeId, u32)> = vec![(start_id.clone(), 0)];
    while let Some((node, level)) = stack.pop() {
        for child in adjacency.get(&node).into_iter().flatten() {
            if Some(child) == end_id.as_ref() {
                end_level = end_level.max(level + 1);
                continue;
            }
            let next = level + 1;
            if next > level_cap {
                continue;
            }
            if levels.get(child).is_none_or(|&existing| existing < next) {
                levels.insert(child.clone(), next);
                stack.push((child.clone(), next));
            }
        }
    }

    // Phase 2: ordering. A depth-first walk records the first-visit
    // sequence; final orders sort by (level, visit) so a merge node is
    // numbered after every branch that feeds it, keeping order strictly
    // increasing along each edge. Within a level the visit sequence keeps
    // siblings in traversal order.
    let mut visits: AHashMap<NodeId, u32> = AHashMap::new();
    let mut visit_counter: u32 = 0;
    let mut stack: Vec<NodeId> = vec![start_id.clone()];
    while let Some(node) = stack.pop() {
        if visits.contains_key(&node) {
            continue;
        }
        visit_counter += 1;
        visits.insert(node.clone(), visit_counter);
        if let Some(children) = adjacency.get(&node) {
            for child in children.iter().rev() {
                if Some(child) != end_id.as_ref() && !visits.contains_key(child) {
                    stack.push(child.clone());
                }
            }
        }
    }
    let mut reachable: Vec<NodeId> = visits.keys().cloned().collect();
    reachable.sort_by_key(|id| (levels.get(id).copied().unwrap_or(0), visits[id]));
    let mut orders: AHashMap<NodeId, u32> = AHashMap::new();
    let mut counter: u32 = 0;
    for id in reachable {
        counter += 1;
        orders.insert(id, counter);
    }

    // Trailing pass: orphans (unreachable mid-edit) still get an order so
    // the save payload stays total. End is excluded; it is finalized last.
    let orphan_ids: Vec<NodeId> = graph
        .nodes()
        .filter(|n| !n.is_end() && !orders.contains_key(&n.id))
        .map(|n| n.id.clone())
        .collect();
    for id in orphan_ids {
        counter += 1;
        orders.insert(id, counter);
    }

    // Phase 3: labeling, per (level, action type) running counter.
    // Numbering follows execution order for determinism.
    let mut by_order: Vec<NodeId> = orders.keys().cloned().collect();
    by_order.sort_by_key(|id| orders[id]);

    let mut label_counters: AHashMap<(u32, ActionKind), u32> = AHashMap::new();
    let mut labels: AHashMap<NodeId, String> = AHashMap::new();
    for id in &by_order {
        let Some(node) = graph.node(id) else { continue };
        let Some(action) = node.action else { continue };
        let level = levels.get(id).copied().unwrap_or(0);
        let n = label_counters.entry((level, action)).or_insert(0);
        *n += 1;
        let label = match node.config.object_name() {
            Some(object) => format!(
                "{}_{}_{}_Level{}",
                action.label_prefix(),
                label_fragment(object),
                n,
                level
            ),
            None => format!("{}_{}_Level{}", action.label_prefix(), n, level),
        };
        labels.insert(id.clone(), label);
    }

    let max_order = counter;
    for node in graph.nodes_mut().values_mut() {
        if node.is_start() {
            node.order = orders.get(&node.id).copied();
            node.label = "Start".to_string();
            node.display_label = "Start".to_string();
        } else if node.is_end() {
            node.order = Some(max_order + 1);
            node.label = "End".to_string();
            node.display_label = "End".to_string();
        } else {
            node.order = orders.get(&node.id).copied();
            if let Some(label) = labels.get(&node.id) {
                node.label = label.clone();
            }
            if let Some(action) = node.action {
                node.display_label = action.display_name().to_string();
            }
        }
    }

    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        end_level,
        end_order = max_order + 1,
        "recomputed order and labels"
    );
}

/// Object names are embedded in labels with anything non-alphanumeric
/// stripped, e.g. `Find_Account_1_Level2`.
fn label_fragment(object: &str) -> String {
    object.chars().filter(|c| c.is_alphanumeric()).collect()
}
