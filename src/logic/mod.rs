//! The boolean logic language used to combine condition results.
//!
//! A `LogicSpec` is attached wherever a node carries a list of conditions:
//! branching, record filtering, loop exit, and (at runtime) field
//! visibility all share it. `AND` and `OR` fold the whole list; `Custom`
//! carries a user-authored expression such as `(1 AND 2) OR 3` that
//! references conditions by their 1-based position. Custom expressions are
//! parsed into a small AST and evaluated by a tree walk; the string form is
//! only ever an external syntax.

pub mod parser;
pub mod token;
pub mod validate;

pub use parser::LogicAst;
pub use validate::validate_expression;

use crate::error::ExpressionError;
use serde::{Deserialize, Serialize};

/// How a node's conditions are combined into a single boolean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "expression")]
pub enum LogicSpec {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
    Custom(String),
}

impl LogicSpec {
    /// The wire/display name of the logic type.
    pub fn type_name(&self) -> &'static str {
        match self {
            LogicSpec::And => "AND",
            LogicSpec::Or => "OR",
            LogicSpec::Custom(_) => "Custom",
        }
    }

    /// The custom expression, when there is one.
    pub fn expression(&self) -> Option<&str> {
        match self {
            LogicSpec::Custom(expr) => Some(expr),
            _ => None,
        }
    }

    /// Checks the spec against the number of conditions it will combine.
    ///
    /// `AND`/`OR` are always valid; `Custom` runs the full expression
    /// validation and returns every error found.
    pub fn validate(&self, condition_count: usize) -> Vec<ExpressionError> {
        match self {
            LogicSpec::Custom(expr) => validate_expression(expr, condition_count),
            _ => Vec::new(),
        }
    }

    /// Combines per-condition results into the final outcome.
    ///
    /// An empty predicate list is vacuously true for every logic type; the
    /// config validator separately requires at least one condition wherever
    /// conditions are mandatory.
    pub fn evaluate(&self, predicates: &[bool]) -> Result<bool, Vec<ExpressionError>> {
        if predicates.is_empty() {
            return Ok(true);
        }
        match self {
            LogicSpec::And => Ok(predicates.iter().all(|p| *p)),
            LogicSpec::Or => Ok(predicates.iter().any(|p| *p)),
            LogicSpec::Custom(expr) => {
                let ast = LogicAst::parse(expr, predicates.len())?;
                Ok(ast.evaluate(predicates))
            }
        }
    }
}
