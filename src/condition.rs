use serde::{Deserialize, Serialize};
use std::fmt;

/// A comparison operator applied to a single field.
///
/// Serialized with the human-readable names the canvas and the runtime
/// exchange ("does not contain", "is null", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "equals")]
    Equals,
    #[serde(rename = "not equals")]
    NotEquals,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "does not contain")]
    NotContains,
    #[serde(rename = "greater than")]
    GreaterThan,
    #[serde(rename = "greater or equal")]
    GreaterOrEqual,
    #[serde(rename = "less than")]
    LessThan,
    #[serde(rename = "less or equal")]
    LessOrEqual,
    #[serde(rename = "between")]
    Between,
    #[serde(rename = "is null")]
    IsNull,
    #[serde(rename = "is not null")]
    IsNotNull,
}

impl CompareOp {
    /// Whether the operator compares against a user-supplied value at all.
    pub fn needs_value(&self) -> bool {
        !matches!(self, CompareOp::IsNull | CompareOp::IsNotNull)
    }

    /// Whether the operator needs a second value (`BETWEEN` only).
    pub fn needs_second_value(&self) -> bool {
        matches!(self, CompareOp::Between)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompareOp::Equals => "equals",
            CompareOp::NotEquals => "not equals",
            CompareOp::Contains => "contains",
            CompareOp::NotContains => "does not contain",
            CompareOp::GreaterThan => "greater than",
            CompareOp::GreaterOrEqual => "greater or equal",
            CompareOp::LessThan => "less than",
            CompareOp::LessOrEqual => "less or equal",
            CompareOp::Between => "between",
            CompareOp::IsNull => "is null",
            CompareOp::IsNotNull => "is not null",
        };
        write!(f, "{}", name)
    }
}

/// A single predicate over a named field.
///
/// `value2` is only meaningful for `BETWEEN`, where it carries the upper
/// bound of the range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub field: String,
    pub operator: CompareOp,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value2: Option<String>,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: CompareOp, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
            value2: None,
        }
    }

    pub fn between(
        field: impl Into<String>,
        low: impl Into<String>,
        high: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: CompareOp::Between,
            value: low.into(),
            value2: Some(high.into()),
        }
    }

    /// A condition counts toward validation only when every part the
    /// operator needs has been filled in.
    pub fn is_complete(&self) -> bool {
        if self.field.trim().is_empty() {
            return false;
        }
        if self.operator.needs_value() && self.value.trim().is_empty() {
            return false;
        }
        if self.operator.needs_second_value() {
            return self
                .value2
                .as_ref()
                .is_some_and(|v| !v.trim().is_empty());
        }
        true
    }
}

/// A runtime field value resolved from a form submission.
///
/// `Many` holds the per-iteration values of a field on a loop-repeated
/// page; a predicate over a `Many` value holds when any element satisfies
/// it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Many(Vec<FieldValue>),
    Null,
}

impl FieldValue {
    /// Numeric view of the value, parsing text when possible.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Textual view used by the string operators.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Null => String::new(),
            FieldValue::Many(_) => String::new(),
        }
    }

    /// Null semantics: an absent value or an empty string both count.
    pub fn is_null(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}
