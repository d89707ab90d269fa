use crate::condition::Condition;
use crate::logic::LogicSpec;
use crate::metadata::FieldType;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type NodeId = String;

/// The structural role of a node. Exactly one Start and one End exist per
/// graph; everything else is an Action (touches external records) or a
/// Utility (shapes control or data flow).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Start,
    End,
    Action,
    Utility,
}

/// The closed set of step types a node can perform.
///
/// Dispatch on this enum is always an exhaustive match, so adding a step
/// type is a compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    #[serde(rename = "Create/Update Record")]
    CreateUpdate,
    #[serde(rename = "Find Record")]
    Find,
    #[serde(rename = "Filter Records")]
    Filter,
    #[serde(rename = "Condition")]
    Condition,
    #[serde(rename = "Path")]
    Path,
    #[serde(rename = "Loop")]
    Loop,
    #[serde(rename = "Formatter")]
    Formatter,
    #[serde(rename = "Google Sheet")]
    GoogleSheet,
    #[serde(rename = "Find Google Sheet Row")]
    FindGoogleSheet,
}

impl ActionKind {
    /// The structural role this step type implies.
    pub fn kind(&self) -> NodeKind {
        match self {
            ActionKind::CreateUpdate
            | ActionKind::Find
            | ActionKind::GoogleSheet
            | ActionKind::FindGoogleSheet => NodeKind::Action,
            ActionKind::Filter
            | ActionKind::Condition
            | ActionKind::Path
            | ActionKind::Loop
            | ActionKind::Formatter => NodeKind::Utility,
        }
    }

    /// The short prefix used when generating machine labels.
    pub fn label_prefix(&self) -> &'static str {
        match self {
            ActionKind::CreateUpdate => "Create",
            ActionKind::Find => "Find",
            ActionKind::Filter => "Filter",
            ActionKind::Condition => "Cond",
            ActionKind::Path => "Path",
            ActionKind::Loop => "Loop",
            ActionKind::Formatter => "Format",
            ActionKind::GoogleSheet => "Sheet",
            ActionKind::FindGoogleSheet => "FindSheet",
        }
    }

    /// The unadorned name shown on the canvas, independent of position.
    pub fn display_name(&self) -> &'static str {
        match self {
            ActionKind::CreateUpdate => "Create/Update Record",
            ActionKind::Find => "Find Record",
            ActionKind::Filter => "Filter Records",
            ActionKind::Condition => "Condition",
            ActionKind::Path => "Path",
            ActionKind::Loop => "Loop",
            ActionKind::Formatter => "Formatter",
            ActionKind::GoogleSheet => "Google Sheet",
            ActionKind::FindGoogleSheet => "Find Google Sheet Row",
        }
    }

    /// Whether this step produces a record collection a Loop can iterate.
    pub fn yields_collection(&self) -> bool {
        matches!(self, ActionKind::Find | ActionKind::FindGoogleSheet)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Canvas coordinates of a node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn midpoint(a: Position, b: Position) -> Self {
        Self {
            x: (a.x + b.x) / 2.0,
            y: (a.y + b.y) / 2.0,
        }
    }
}

/// One field-to-value assignment on a Create/Update or Sheet step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    pub field: String,
    pub value: String,
}

impl FieldMapping {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.field.trim().is_empty() && !self.value.trim().is_empty()
    }
}

/// Configuration of a Create/Update Record step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUpdateConfig {
    pub object: Option<String>,
    #[serde(default)]
    pub field_mappings: Vec<FieldMapping>,
    /// When set, the step only runs if its conditions hold.
    #[serde(default)]
    pub conditions_enabled: bool,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub logic: Option<LogicSpec>,
    /// File-to-document mode: uploaded files become document records.
    #[serde(default)]
    pub file_to_document: bool,
    #[serde(default)]
    pub upload_fields: Vec<String>,
}

/// Configuration of a Find Record step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindConfig {
    pub object: Option<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub logic: Option<LogicSpec>,
    #[serde(default)]
    pub return_limit: Option<u32>,
}

/// Configuration of a Filter Records step, narrowing the results of an
/// earlier Find.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    /// The Find node whose results are filtered.
    pub source_node: Option<NodeId>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub logic: Option<LogicSpec>,
}

/// How a Condition node decides whether its branch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathOption {
    Rules,
    #[serde(rename = "Always Run")]
    AlwaysRun,
    Fallback,
}

/// Configuration of a Condition node, including the ones synthesized for
/// Path branches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionConfig {
    pub path_option: PathOption,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub logic: Option<LogicSpec>,
}

impl Default for ConditionConfig {
    fn default() -> Self {
        Self {
            path_option: PathOption::Rules,
            conditions: Vec::new(),
            logic: Some(LogicSpec::And),
        }
    }
}

/// Configuration of a Loop step iterating over a found collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopConfig {
    /// The ancestor Find node whose results are iterated.
    pub collection_node: Option<NodeId>,
    pub variable: Option<String>,
    #[serde(default)]
    pub max_iterations: Option<u32>,
    #[serde(default)]
    pub exit_conditions: Vec<Condition>,
    #[serde(default)]
    pub exit_logic: Option<LogicSpec>,
}

/// The input field a Formatter step transforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRef {
    pub name: String,
    pub field_type: FieldType,
}

impl FieldRef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// A value-reshaping operation, each with its own options and the set of
/// field types it accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum FormatterOp {
    DateFormat { format: String },
    TimezoneConvert { from: String, to: String },
    NumberFormat { decimals: u32 },
    UnitConvert { unit: String, factor: f64 },
    Split { delimiter: String, index: u32 },
    Capitalize,
    Titlecase,
}

impl FormatterOp {
    pub fn name(&self) -> &'static str {
        match self {
            FormatterOp::DateFormat { .. } => "Date Format",
            FormatterOp::TimezoneConvert { .. } => "Timezone Convert",
            FormatterOp::NumberFormat { .. } => "Number Format",
            FormatterOp::UnitConvert { .. } => "Unit Convert",
            FormatterOp::Split { .. } => "Split",
            FormatterOp::Capitalize => "Capitalize",
            FormatterOp::Titlecase => "Titlecase",
        }
    }

    /// Field types this operation can be applied to.
    pub fn compatible_types(&self) -> &'static [FieldType] {
        match self {
            FormatterOp::DateFormat { .. } => &[FieldType::Date, FieldType::DateTime],
            FormatterOp::TimezoneConvert { .. } => &[FieldType::DateTime],
            FormatterOp::NumberFormat { .. } => &[FieldType::Number, FieldType::Currency],
            FormatterOp::UnitConvert { .. } => &[FieldType::Number],
            FormatterOp::Split { .. } => &[
                FieldType::Text,
                FieldType::Email,
                FieldType::Phone,
                FieldType::Picklist,
            ],
            FormatterOp::Capitalize | FormatterOp::Titlecase => {
                &[FieldType::Text, FieldType::Picklist]
            }
        }
    }

    /// Whether every option the operation needs has been filled in.
    pub fn options_complete(&self) -> bool {
        match self {
            FormatterOp::DateFormat { format } => !format.trim().is_empty(),
            FormatterOp::TimezoneConvert { from, to } => {
                !from.trim().is_empty() && !to.trim().is_empty()
            }
            FormatterOp::NumberFormat { .. } => true,
            FormatterOp::UnitConvert { unit, factor } => {
                !unit.trim().is_empty() && factor.is_finite() && *factor != 0.0
            }
            FormatterOp::Split { delimiter, .. } => !delimiter.is_empty(),
            FormatterOp::Capitalize | FormatterOp::Titlecase => true,
        }
    }
}

/// Configuration of a Formatter step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatterConfig {
    pub field: Option<FieldRef>,
    #[serde(default, flatten)]
    pub operation: Option<FormatterOp>,
}

/// Configuration of a Google Sheet write step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetConfig {
    pub spreadsheet: Option<String>,
    pub worksheet: Option<String>,
    #[serde(default)]
    pub field_mappings: Vec<FieldMapping>,
}

/// Configuration of a Find Google Sheet Row step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetFindConfig {
    pub spreadsheet: Option<String>,
    pub worksheet: Option<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub logic: Option<LogicSpec>,
    #[serde(default)]
    pub return_limit: Option<u32>,
}

/// The type-specific payload carried by a node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "config")]
pub enum NodeConfig {
    #[default]
    Empty,
    CreateUpdate(CreateUpdateConfig),
    Find(FindConfig),
    Filter(FilterConfig),
    Condition(ConditionConfig),
    Loop(LoopConfig),
    Formatter(FormatterConfig),
    Sheet(SheetConfig),
    FindSheet(SheetFindConfig),
}

impl NodeConfig {
    /// The default payload for a freshly dropped node of the given type.
    pub fn default_for(action: ActionKind) -> Self {
        match action {
            ActionKind::CreateUpdate => NodeConfig::CreateUpdate(CreateUpdateConfig::default()),
            ActionKind::Find => NodeConfig::Find(FindConfig::default()),
            ActionKind::Filter => NodeConfig::Filter(FilterConfig::default()),
            ActionKind::Condition => NodeConfig::Condition(ConditionConfig::default()),
            // Path branches carry their rules on the synthesized Condition
            // nodes, so the Path node itself holds no payload.
            ActionKind::Path => NodeConfig::Empty,
            ActionKind::Loop => NodeConfig::Loop(LoopConfig::default()),
            ActionKind::Formatter => NodeConfig::Formatter(FormatterConfig::default()),
            ActionKind::GoogleSheet => NodeConfig::Sheet(SheetConfig::default()),
            ActionKind::FindGoogleSheet => NodeConfig::FindSheet(SheetFindConfig::default()),
        }
    }

    /// Whether this payload variant belongs to the given step type.
    pub fn matches(&self, action: Option<ActionKind>) -> bool {
        match (self, action) {
            (NodeConfig::Empty, None) | (NodeConfig::Empty, Some(ActionKind::Path)) => true,
            (NodeConfig::CreateUpdate(_), Some(ActionKind::CreateUpdate)) => true,
            (NodeConfig::Find(_), Some(ActionKind::Find)) => true,
            (NodeConfig::Filter(_), Some(ActionKind::Filter)) => true,
            (NodeConfig::Condition(_), Some(ActionKind::Condition)) => true,
            (NodeConfig::Loop(_), Some(ActionKind::Loop)) => true,
            (NodeConfig::Formatter(_), Some(ActionKind::Formatter)) => true,
            (NodeConfig::Sheet(_), Some(ActionKind::GoogleSheet)) => true,
            (NodeConfig::FindSheet(_), Some(ActionKind::FindGoogleSheet)) => true,
            _ => false,
        }
    }

    /// The external object this step touches, when it names one. Used for
    /// label generation and metadata lookups.
    pub fn object_name(&self) -> Option<&str> {
        match self {
            NodeConfig::CreateUpdate(c) => c.object.as_deref(),
            NodeConfig::Find(c) => c.object.as_deref(),
            NodeConfig::Sheet(c) => c.spreadsheet.as_deref(),
            NodeConfig::FindSheet(c) => c.spreadsheet.as_deref(),
            _ => None,
        }
    }
}

/// A single step in the workflow graph.
///
/// `order`, `label` and `display_label` are derived views recomputed from
/// the node/edge sets after every mutation; they are never hand-edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionKind>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub order: Option<u32>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub display_label: String,
    #[serde(default)]
    pub config: NodeConfig,
}

impl Node {
    /// The unique Start node of a graph.
    pub fn start(position: Position) -> Self {
        Self {
            id: "start".to_string(),
            kind: NodeKind::Start,
            action: None,
            position,
            order: None,
            label: "Start".to_string(),
            display_label: "Start".to_string(),
            config: NodeConfig::Empty,
        }
    }

    /// The unique End node of a graph.
    pub fn end(position: Position) -> Self {
        Self {
            id: "end".to_string(),
            kind: NodeKind::End,
            action: None,
            position,
            order: None,
            label: "End".to_string(),
            display_label: "End".to_string(),
            config: NodeConfig::Empty,
        }
    }

    /// A freshly dropped step node with the default payload for its type.
    pub fn step(id: impl Into<NodeId>, action: ActionKind, position: Position) -> Self {
        Self {
            id: id.into(),
            kind: action.kind(),
            action: Some(action),
            position,
            order: None,
            label: String::new(),
            display_label: action.display_name().to_string(),
            config: NodeConfig::default_for(action),
        }
    }

    pub fn with_config(mut self, config: NodeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn is_start(&self) -> bool {
        self.kind == NodeKind::Start
    }

    pub fn is_end(&self) -> bool {
        self.kind == NodeKind::End
    }
}
