//! Per-node configuration validation, run over every node before a graph
//! is persisted (and eagerly per node when a panel closes).
//!
//! Each check returns the first problem it finds as a single
//! human-readable error naming the offending node; `validate_graph` is
//! fail-fast across nodes, in execution order.

use crate::condition::Condition;
use crate::error::ConfigError;
use crate::graph::{
    ConditionConfig, CreateUpdateConfig, FilterConfig, FindConfig, FormatterConfig, LoopConfig,
    Node, NodeConfig, PathOption, SheetConfig, SheetFindConfig, WorkflowGraph,
};
use crate::logic::LogicSpec;
use crate::metadata::MetadataCache;
use ahash::AHashSet;
use itertools::Itertools;

/// Validates every node, stopping at the first error. Nodes are checked
/// in execution order so the reported node is the earliest broken one.
pub fn validate_graph(graph: &WorkflowGraph, metadata: &MetadataCache) -> Result<(), ConfigError> {
    let ordered = graph
        .nodes()
        .sorted_by_key(|n| n.order.unwrap_or(u32::MAX));
    for node in ordered {
        validate_node(graph, node, metadata)?;
    }
    Ok(())
}

/// Validates a single node's configuration against its action type.
pub fn validate_node(
    graph: &WorkflowGraph,
    node: &Node,
    metadata: &MetadataCache,
) -> Result<(), ConfigError> {
    if !node.config.matches(node.action) {
        return Err(ConfigError::MismatchedConfig {
            node: node_name(node),
        });
    }
    match &node.config {
        NodeConfig::Empty => Ok(()),
        NodeConfig::CreateUpdate(config) => check_create_update(node, config, metadata),
        NodeConfig::Find(config) => check_find(node, config),
        NodeConfig::Filter(config) => check_filter(graph, node, config),
        NodeConfig::Condition(config) => check_condition(node, config),
        NodeConfig::Loop(config) => check_loop(graph, node, config),
        NodeConfig::Formatter(config) => check_formatter(node, config),
        NodeConfig::Sheet(config) => check_sheet(node, config),
        NodeConfig::FindSheet(config) => check_find_sheet(node, config),
    }
}

/// Error messages prefer the generated label; freshly dropped nodes that
/// have not been ordered yet fall back to their id.
fn node_name(node: &Node) -> String {
    if node.label.is_empty() {
        node.id.clone()
    } else {
        node.label.clone()
    }
}

fn check_create_update(
    node: &Node,
    config: &CreateUpdateConfig,
    metadata: &MetadataCache,
) -> Result<(), ConfigError> {
    let name = node_name(node);
    let object = match config.object.as_deref().filter(|o| !o.trim().is_empty()) {
        Some(object) => object,
        None => return Err(ConfigError::MissingObject { node: name }),
    };

    let mapped: AHashSet<&str> = config
        .field_mappings
        .iter()
        .filter(|m| m.is_complete())
        .map(|m| m.field.as_str())
        .collect();
    if mapped.is_empty() {
        return Err(ConfigError::NoFieldMappings { node: name });
    }

    // Mandatory-field coverage uses the metadata cache; an object that
    // was never fetched has no known mandatory fields to enforce.
    if let Some(fields) = metadata.fields(object) {
        for field in fields.iter().filter(|f| f.required) {
            if !mapped.contains(field.name.as_str()) {
                return Err(ConfigError::UnmappedRequiredField {
                    node: name,
                    field: field.name.clone(),
                });
            }
        }
    }

    if config.conditions_enabled {
        check_condition_set(&name, &config.conditions, config.logic.as_ref(), true)?;
    }

    if config.file_to_document && config.upload_fields.is_empty() {
        return Err(ConfigError::MissingUploadFields { node: name });
    }
    Ok(())
}

fn check_find(node: &Node, config: &FindConfig) -> Result<(), ConfigError> {
    let name = node_name(node);
    if config
        .object
        .as_deref()
        .filter(|o| !o.trim().is_empty())
        .is_none()
    {
        return Err(ConfigError::MissingObject { node: name });
    }
    check_condition_set(&name, &config.conditions, config.logic.as_ref(), false)?;
    check_return_limit(&name, config.return_limit)
}

fn check_filter(
    graph: &WorkflowGraph,
    node: &Node,
    config: &FilterConfig,
) -> Result<(), ConfigError> {
    let name = node_name(node);
    let source = match config.source_node.as_deref() {
        Some(source) if !source.trim().is_empty() => source,
        _ => return Err(ConfigError::MissingFilterSource { node: name }),
    };
    let is_find = graph
        .node(source)
        .and_then(|n| n.action)
        .is_some_and(|a| a.yields_collection());
    if !is_find {
        return Err(ConfigError::InvalidFilterSource {
            node: name,
            source_node: source.to_string(),
        });
    }
    check_condition_set(&name, &config.conditions, config.logic.as_ref(), false)
}

fn check_condition(node: &Node, config: &ConditionConfig) -> Result<(), ConfigError> {
    match config.path_option {
        // Always Run and Fallback branches carry no rules of their own.
        PathOption::AlwaysRun | PathOption::Fallback => Ok(()),
        PathOption::Rules => {
            let name = node_name(node);
            check_condition_set(&name, &config.conditions, config.logic.as_ref(), true)
        }
    }
}

fn check_loop(graph: &WorkflowGraph, node: &Node, config: &LoopConfig) -> Result<(), ConfigError> {
    let name = node_name(node);

    let collection = match config.collection_node.as_deref() {
        Some(collection) if !collection.trim().is_empty() => collection,
        _ => return Err(ConfigError::InvalidCollection { node: name }),
    };
    let is_find = graph
        .node(collection)
        .and_then(|n| n.action)
        .is_some_and(|a| a.yields_collection());
    if !is_find || !ancestors(graph, &node.id).contains(collection) {
        return Err(ConfigError::InvalidCollection { node: name });
    }

    if config
        .variable
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .is_none()
    {
        return Err(ConfigError::MissingIterationVariable { node: name });
    }

    if config.max_iterations == Some(0) {
        return Err(ConfigError::InvalidMaxIterations { node: name });
    }

    if !config.exit_conditions.is_empty() {
        check_condition_set(
            &name,
            &config.exit_conditions,
            config.exit_logic.as_ref(),
            false,
        )?;
    }
    Ok(())
}

fn check_formatter(node: &Node, config: &FormatterConfig) -> Result<(), ConfigError> {
    let name = node_name(node);
    let field = config
        .field
        .as_ref()
        .ok_or_else(|| ConfigError::MissingFormatterField { node: name.clone() })?;
    let operation = config
        .operation
        .as_ref()
        .ok_or_else(|| ConfigError::MissingFormatterOperation { node: name.clone() })?;

    if !operation.options_complete() {
        return Err(ConfigError::IncompleteFormatterOptions {
            node: name,
            operation: operation.name().to_string(),
        });
    }
    if !operation.compatible_types().contains(&field.field_type) {
        return Err(ConfigError::IncompatibleFormatterField {
            node: name,
            field: field.name.clone(),
            operation: operation.name().to_string(),
        });
    }
    Ok(())
}

fn check_sheet(node: &Node, config: &SheetConfig) -> Result<(), ConfigError> {
    let name = node_name(node);
    if config.spreadsheet.as_deref().is_none_or(str::is_empty)
        || config.worksheet.as_deref().is_none_or(str::is_empty)
    {
        return Err(ConfigError::MissingSheet { node: name });
    }
    if !config.field_mappings.iter().any(|m| m.is_complete()) {
        return Err(ConfigError::NoFieldMappings { node: name });
    }
    Ok(())
}

fn check_find_sheet(node: &Node, config: &SheetFindConfig) -> Result<(), ConfigError> {
    let name = node_name(node);
    if config.spreadsheet.as_deref().is_none_or(str::is_empty)
        || config.worksheet.as_deref().is_none_or(str::is_empty)
    {
        return Err(ConfigError::MissingSheet { node: name });
    }
    check_condition_set(&name, &config.conditions, config.logic.as_ref(), false)?;
    check_return_limit(&name, config.return_limit)
}

/// Shared rules for a condition list: at least one complete condition
/// (when required), a resolved logic type once more than one condition is
/// in play, and a syntactically valid expression for Custom logic.
fn check_condition_set(
    name: &str,
    conditions: &[Condition],
    logic: Option<&LogicSpec>,
    logic_always_required: bool,
) -> Result<(), ConfigError> {
    let complete = conditions.iter().filter(|c| c.is_complete()).count();
    if complete == 0 {
        return Err(ConfigError::MissingConditions {
            node: name.to_string(),
        });
    }
    if logic.is_none() && (logic_always_required || complete > 1) {
        return Err(ConfigError::MissingLogicType {
            node: name.to_string(),
        });
    }
    if let Some(spec) = logic {
        // Custom expressions reference positions in the full list, so the
        // range check uses the list length, not the complete count.
        let errors = spec.validate(conditions.len());
        if !errors.is_empty() {
            return Err(ConfigError::InvalidExpression {
                node: name.to_string(),
                errors,
            });
        }
    }
    Ok(())
}

fn check_return_limit(name: &str, limit: Option<u32>) -> Result<(), ConfigError> {
    match limit {
        Some(limit) if !(1..=100).contains(&limit) => Err(ConfigError::ReturnLimitOutOfRange {
            node: name.to_string(),
            limit,
        }),
        _ => Ok(()),
    }
}

/// Every node reachable by walking incoming edges upward from `id`,
/// skipping self-loops. Used for the Loop collection check.
fn ancestors(graph: &WorkflowGraph, id: &str) -> AHashSet<String> {
    let mut seen: AHashSet<String> = AHashSet::new();
    let mut stack: Vec<String> = vec![id.to_string()];
    while let Some(node) = stack.pop() {
        for edge in graph.incoming(&node) {
            if edge.is_self_loop() {
                continue;
            }
            if seen.insert(edge.source.clone()) {
                stack.push(edge.source.clone());
            }
        }
    }
    seen
}
