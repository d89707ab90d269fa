//! Per-node configuration validation.
mod common;

use common::*;
use kairo::prelude::*;
use pretty_assertions::assert_eq;

fn validate_one(graph: &WorkflowGraph, id: &str, metadata: &MetadataCache) -> Result<(), ConfigError> {
    let node = graph.node(id).expect("node");
    validate_node(graph, node, metadata)
}

fn empty_metadata() -> MetadataCache {
    MetadataCache::new()
}

fn contact_metadata() -> MetadataCache {
    let mut cache = MetadataCache::new();
    cache.insert(
        "Contact",
        vec![
            FieldDescriptor::new("LastName", FieldType::Text, true),
            FieldDescriptor::new("Email", FieldType::Email, true),
            FieldDescriptor::new("Phone", FieldType::Phone, false),
        ],
    );
    cache
}

#[test]
fn fully_configured_flow_validates() {
    assert_eq!(validate_graph(&linear_flow(), &empty_metadata()), Ok(()));
    assert_eq!(validate_graph(&looped_flow(), &empty_metadata()), Ok(()));
}

#[test]
fn create_without_an_object_fails() {
    let node = step("create-1", ActionKind::CreateUpdate);
    let graph = add(WorkflowGraph::new(), node);
    let err = validate_one(&graph, "create-1", &empty_metadata()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingObject { .. }));
}

#[test]
fn create_without_any_complete_mapping_fails() {
    let node = step("create-1", ActionKind::CreateUpdate).with_config(NodeConfig::CreateUpdate(
        CreateUpdateConfig {
            object: Some("Contact".to_string()),
            field_mappings: vec![FieldMapping::new("LastName", "  ")],
            ..Default::default()
        },
    ));
    let graph = add(WorkflowGraph::new(), node);
    let err = validate_one(&graph, "create-1", &empty_metadata()).unwrap_err();
    assert!(matches!(err, ConfigError::NoFieldMappings { .. }));
}

#[test]
fn unmapped_required_field_is_named_in_the_error() {
    // LastName is mapped, Email is required but missing.
    let graph = add(WorkflowGraph::new(), configured_create("create-1"));
    let err = validate_one(&graph, "create-1", &contact_metadata()).unwrap_err();
    match err {
        ConfigError::UnmappedRequiredField { field, .. } => assert_eq!(field, "Email"),
        other => panic!("expected UnmappedRequiredField, got {other:?}"),
    }

    // Mapping the field clears the error.
    let node = step("create-2", ActionKind::CreateUpdate).with_config(NodeConfig::CreateUpdate(
        CreateUpdateConfig {
            object: Some("Contact".to_string()),
            field_mappings: vec![
                FieldMapping::new("LastName", "{form.lastName}"),
                FieldMapping::new("Email", "{form.email}"),
            ],
            ..Default::default()
        },
    ));
    let graph = add(graph, node);
    assert_eq!(validate_one(&graph, "create-2", &contact_metadata()), Ok(()));
}

#[test]
fn unfetched_objects_skip_the_required_field_check() {
    // Account was never fetched, so only the generic checks run.
    let graph = add(WorkflowGraph::new(), configured_create("create-1"));
    let mut cache = MetadataCache::new();
    cache.insert("Account", vec![FieldDescriptor::new("Name", FieldType::Text, true)]);
    assert_eq!(validate_one(&graph, "create-1", &cache), Ok(()));
}

#[test]
fn create_conditions_need_a_logic_type_when_enabled() {
    let node = step("create-1", ActionKind::CreateUpdate).with_config(NodeConfig::CreateUpdate(
        CreateUpdateConfig {
            object: Some("Contact".to_string()),
            field_mappings: vec![FieldMapping::new("LastName", "{form.lastName}")],
            conditions_enabled: true,
            conditions: vec![Condition::new("Stage", CompareOp::Equals, "Won")],
            logic: None,
            ..Default::default()
        },
    ));
    let graph = add(WorkflowGraph::new(), node);
    let err = validate_one(&graph, "create-1", &empty_metadata()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingLogicType { .. }));
}

#[test]
fn file_to_document_requires_upload_fields() {
    let node = step("create-1", ActionKind::CreateUpdate).with_config(NodeConfig::CreateUpdate(
        CreateUpdateConfig {
            object: Some("Contact".to_string()),
            field_mappings: vec![FieldMapping::new("LastName", "{form.lastName}")],
            file_to_document: true,
            upload_fields: Vec::new(),
            ..Default::default()
        },
    ));
    let graph = add(WorkflowGraph::new(), node);
    let err = validate_one(&graph, "create-1", &empty_metadata()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingUploadFields { .. }));
}

#[test]
fn find_needs_object_and_conditions() {
    let node = step("find-1", ActionKind::Find);
    let graph = add(WorkflowGraph::new(), node);
    assert!(matches!(
        validate_one(&graph, "find-1", &empty_metadata()).unwrap_err(),
        ConfigError::MissingObject { .. }
    ));

    let node = step("find-2", ActionKind::Find).with_config(NodeConfig::Find(FindConfig {
        object: Some("Account".to_string()),
        ..Default::default()
    }));
    let graph = add(graph, node);
    assert!(matches!(
        validate_one(&graph, "find-2", &empty_metadata()).unwrap_err(),
        ConfigError::MissingConditions { .. }
    ));
}

#[test]
fn return_limit_must_stay_in_range() {
    for (limit, ok) in [(0, false), (1, true), (100, true), (101, false)] {
        let node = step("find-1", ActionKind::Find).with_config(NodeConfig::Find(FindConfig {
            object: Some("Account".to_string()),
            conditions: vec![Condition::new("Name", CompareOp::IsNotNull, "")],
            logic: Some(LogicSpec::And),
            return_limit: Some(limit),
        }));
        let graph = add(WorkflowGraph::new(), node);
        let result = validate_one(&graph, "find-1", &empty_metadata());
        if ok {
            assert_eq!(result, Ok(()));
        } else {
            assert!(matches!(
                result.unwrap_err(),
                ConfigError::ReturnLimitOutOfRange { limit: l, .. } if l == limit
            ));
        }
    }
}

#[test]
fn filter_source_must_be_a_find_node() {
    let graph = linear_flow();
    let filter =
        step("filter-1", ActionKind::Filter).with_config(NodeConfig::Filter(FilterConfig {
            source_node: Some("create-1".to_string()),
            conditions: vec![Condition::new("Name", CompareOp::IsNotNull, "")],
            logic: Some(LogicSpec::And),
        }));
    let graph = add(graph, filter);
    let err = validate_one(&graph, "filter-1", &empty_metadata()).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidFilterSource { source_node, .. } if source_node == "create-1"
    ));

    let filter =
        step("filter-2", ActionKind::Filter).with_config(NodeConfig::Filter(FilterConfig {
            source_node: Some("find-1".to_string()),
            conditions: vec![Condition::new("Name", CompareOp::IsNotNull, "")],
            logic: Some(LogicSpec::And),
        }));
    let graph = add(graph, filter);
    assert_eq!(validate_one(&graph, "filter-2", &empty_metadata()), Ok(()));
}

#[test]
fn filter_without_a_source_fails() {
    let node = step("filter-1", ActionKind::Filter);
    let graph = add(WorkflowGraph::new(), node);
    let err = validate_one(&graph, "filter-1", &empty_metadata()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingFilterSource { .. }));
}

#[test]
fn loop_collection_must_be_an_ancestor_find() {
    // find-2 is a Find node but sits outside the loop's upstream chain.
    let graph = looped_flow();
    let graph = add(graph, configured_find("find-2"));
    let graph = graph
        .configure_node(
            "loop-1",
            NodeConfig::Loop(LoopConfig {
                collection_node: Some("find-2".to_string()),
                variable: Some("record".to_string()),
                max_iterations: Some(50),
                ..Default::default()
            }),
        )
        .expect("configure");
    let err = validate_one(&graph, "loop-1", &empty_metadata()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidCollection { .. }));

    // The ancestor Find is accepted.
    assert_eq!(validate_one(&looped_flow(), "loop-1", &empty_metadata()), Ok(()));
}

#[test]
fn loop_collection_must_yield_a_collection() {
    let graph = WorkflowGraph::new();
    let graph = add(graph, step("format-1", ActionKind::Formatter));
    let loop_node = step("loop-1", ActionKind::Loop).with_config(NodeConfig::Loop(LoopConfig {
        collection_node: Some("format-1".to_string()),
        variable: Some("record".to_string()),
        ..Default::default()
    }));
    let graph = add(graph, loop_node);
    let graph = connect(graph, "start", "format-1");
    let graph = connect(graph, "format-1", "loop-1");
    let err = validate_one(&graph, "loop-1", &empty_metadata()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidCollection { .. }));
}

#[test]
fn loop_needs_a_variable_and_a_positive_iteration_cap() {
    let graph = looped_flow();
    let graph = graph
        .configure_node(
            "loop-1",
            NodeConfig::Loop(LoopConfig {
                collection_node: Some("find-1".to_string()),
                variable: None,
                ..Default::default()
            }),
        )
        .expect("configure");
    assert!(matches!(
        validate_one(&graph, "loop-1", &empty_metadata()).unwrap_err(),
        ConfigError::MissingIterationVariable { .. }
    ));

    let graph = graph
        .configure_node(
            "loop-1",
            NodeConfig::Loop(LoopConfig {
                collection_node: Some("find-1".to_string()),
                variable: Some("record".to_string()),
                max_iterations: Some(0),
                ..Default::default()
            }),
        )
        .expect("configure");
    assert!(matches!(
        validate_one(&graph, "loop-1", &empty_metadata()).unwrap_err(),
        ConfigError::InvalidMaxIterations { .. }
    ));
}

#[test]
fn condition_branches_follow_their_path_option() {
    let always = step("cond-1", ActionKind::Condition).with_config(NodeConfig::Condition(
        ConditionConfig {
            path_option: PathOption::AlwaysRun,
            conditions: Vec::new(),
            logic: None,
        },
    ));
    let graph = add(WorkflowGraph::new(), always);
    assert_eq!(validate_one(&graph, "cond-1", &empty_metadata()), Ok(()));

    // Rules branches need at least one complete condition.
    let rules = step("cond-2", ActionKind::Condition);
    let graph = add(graph, rules);
    assert!(matches!(
        validate_one(&graph, "cond-2", &empty_metadata()).unwrap_err(),
        ConfigError::MissingConditions { .. }
    ));
}

#[test]
fn formatter_checks_field_operation_and_compatibility() {
    let graph = WorkflowGraph::new();

    let bare = step("format-1", ActionKind::Formatter);
    let graph = add(graph, bare);
    assert!(matches!(
        validate_one(&graph, "format-1", &empty_metadata()).unwrap_err(),
        ConfigError::MissingFormatterField { .. }
    ));

    let no_op = step("format-2", ActionKind::Formatter).with_config(NodeConfig::Formatter(
        FormatterConfig {
            field: Some(FieldRef::new("CreatedDate", FieldType::Date)),
            operation: None,
        },
    ));
    let graph = add(graph, no_op);
    assert!(matches!(
        validate_one(&graph, "format-2", &empty_metadata()).unwrap_err(),
        ConfigError::MissingFormatterOperation { .. }
    ));

    let blank_format = step("format-3", ActionKind::Formatter).with_config(NodeConfig::Formatter(
        FormatterConfig {
            field: Some(FieldRef::new("CreatedDate", FieldType::Date)),
            operation: Some(FormatterOp::DateFormat {
                format: String::new(),
            }),
        },
    ));
    let graph = add(graph, blank_format);
    assert!(matches!(
        validate_one(&graph, "format-3", &empty_metadata()).unwrap_err(),
        ConfigError::IncompleteFormatterOptions { .. }
    ));

    // Number formatting a text field is rejected.
    let mismatched = step("format-4", ActionKind::Formatter).with_config(NodeConfig::Formatter(
        FormatterConfig {
            field: Some(FieldRef::new("Name", FieldType::Text)),
            operation: Some(FormatterOp::NumberFormat { decimals: 2 }),
        },
    ));
    let graph = add(graph, mismatched);
    assert!(matches!(
        validate_one(&graph, "format-4", &empty_metadata()).unwrap_err(),
        ConfigError::IncompatibleFormatterField { .. }
    ));

    let valid = step("format-5", ActionKind::Formatter).with_config(NodeConfig::Formatter(
        FormatterConfig {
            field: Some(FieldRef::new("CreatedDate", FieldType::Date)),
            operation: Some(FormatterOp::DateFormat {
                format: "YYYY-MM-DD".to_string(),
            }),
        },
    ));
    let graph = add(graph, valid);
    assert_eq!(validate_one(&graph, "format-5", &empty_metadata()), Ok(()));
}

#[test]
fn sheet_steps_need_spreadsheet_worksheet_and_mappings() {
    let node = step("sheet-1", ActionKind::GoogleSheet);
    let graph = add(WorkflowGraph::new(), node);
    assert!(matches!(
        validate_one(&graph, "sheet-1", &empty_metadata()).unwrap_err(),
        ConfigError::MissingSheet { .. }
    ));

    let no_mappings = step("sheet-2", ActionKind::GoogleSheet).with_config(NodeConfig::Sheet(
        SheetConfig {
            spreadsheet: Some("Leads".to_string()),
            worksheet: Some("Q3".to_string()),
            field_mappings: Vec::new(),
        },
    ));
    let graph = add(graph, no_mappings);
    assert!(matches!(
        validate_one(&graph, "sheet-2", &empty_metadata()).unwrap_err(),
        ConfigError::NoFieldMappings { .. }
    ));
}

#[test]
fn mismatched_config_is_rejected_before_field_checks() {
    let node = step("find-1", ActionKind::Find).with_config(NodeConfig::Formatter(
        FormatterConfig::default(),
    ));
    let graph = add(WorkflowGraph::new(), node);
    let err = validate_one(&graph, "find-1", &empty_metadata()).unwrap_err();
    assert!(matches!(err, ConfigError::MismatchedConfig { .. }));
}

#[test]
fn broken_custom_logic_surfaces_its_expression_errors() {
    let node = step("find-1", ActionKind::Find).with_config(NodeConfig::Find(FindConfig {
        object: Some("Account".to_string()),
        conditions: vec![
            Condition::new("Name", CompareOp::IsNotNull, ""),
            Condition::new("Stage", CompareOp::Equals, "Won"),
        ],
        logic: Some(LogicSpec::Custom("1 AND 5".to_string())),
        return_limit: None,
    }));
    let graph = add(WorkflowGraph::new(), node);
    let err = validate_one(&graph, "find-1", &empty_metadata()).unwrap_err();
    match err {
        ConfigError::InvalidExpression { errors, .. } => {
            assert_eq!(errors, vec![ExpressionError::IndexOutOfRange { index: 5, max: 2 }]);
        }
        other => panic!("expected InvalidExpression, got {other:?}"),
    }
}

#[test]
fn graph_validation_reports_the_earliest_broken_node() {
    // Both the Find and the Create are broken; the Find runs first.
    let graph = WorkflowGraph::new();
    let graph = add(graph, step("find-1", ActionKind::Find));
    let graph = add(graph, step("create-1", ActionKind::CreateUpdate));
    let graph = connect(graph, "start", "find-1");
    let graph = connect(graph, "find-1", "create-1");
    let graph = connect(graph, "create-1", "end");

    let err = validate_graph(&graph, &empty_metadata()).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::MissingObject { node } if node.starts_with("Find")
    ));
}
