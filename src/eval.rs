//! Runtime predicate evaluation: the same `Condition` + `LogicSpec` model
//! the validators check at design time, decided against a live form
//! submission to drive branching, filtering, loop exit, and visibility.

use crate::condition::{CompareOp, Condition, FieldValue};
use crate::error::EvalError;
use crate::logic::LogicSpec;
use ahash::AHashMap;

/// The field values of a form submission, keyed by field name.
///
/// Fields on a loop-repeated page resolve to `FieldValue::Many`; a field
/// that was never filled in resolves to `Null`.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    values: AHashMap<String, FieldValue>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> &mut Self {
        self.values.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> &FieldValue {
        self.values.get(field).unwrap_or(&FieldValue::Null)
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for EvaluationContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Evaluates a condition list under a logic spec against the context.
pub fn evaluate_conditions(
    conditions: &[Condition],
    logic: &LogicSpec,
    context: &EvaluationContext,
) -> Result<bool, EvalError> {
    let predicates = conditions
        .iter()
        .map(|c| evaluate_condition(c, context))
        .collect::<Result<Vec<bool>, EvalError>>()?;
    logic.evaluate(&predicates).map_err(EvalError::Expression)
}

/// Evaluates a single predicate. A `Many` value holds if any iteration's
/// value satisfies it; this existential reading is the one place runtime
/// evaluation diverges from design time, which has no loop arrays yet.
pub fn evaluate_condition(
    condition: &Condition,
    context: &EvaluationContext,
) -> Result<bool, EvalError> {
    match context.get(&condition.field) {
        FieldValue::Many(items) => {
            for item in items {
                if evaluate_scalar(condition, item)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        value => evaluate_scalar(condition, value),
    }
}

fn evaluate_scalar(condition: &Condition, value: &FieldValue) -> Result<bool, EvalError> {
    match condition.operator {
        CompareOp::IsNull => Ok(value.is_null()),
        CompareOp::IsNotNull => Ok(!value.is_null()),
        CompareOp::Equals => Ok(equals(condition, value)),
        CompareOp::NotEquals => Ok(!equals(condition, value)),
        CompareOp::Contains => Ok(contains(condition, value)),
        CompareOp::NotContains => Ok(!contains(condition, value)),
        CompareOp::GreaterThan => Ok(numeric(condition, value, |a, b| a > b)),
        CompareOp::GreaterOrEqual => Ok(numeric(condition, value, |a, b| a >= b)),
        CompareOp::LessThan => Ok(numeric(condition, value, |a, b| a < b)),
        CompareOp::LessOrEqual => Ok(numeric(condition, value, |a, b| a <= b)),
        CompareOp::Between => {
            let high = condition
                .value2
                .as_deref()
                .and_then(|v| v.trim().parse::<f64>().ok())
                .ok_or_else(|| EvalError::MissingRangeBound {
                    field: condition.field.clone(),
                })?;
            let low: Option<f64> = condition.value.trim().parse().ok();
            match (value.as_number(), low) {
                (Some(actual), Some(low)) => Ok(actual >= low && actual <= high),
                _ => Ok(false),
            }
        }
    }
}

/// Equality is numeric when both sides parse as numbers, otherwise a
/// case-insensitive string comparison. Both sides are trimmed.
fn equals(condition: &Condition, value: &FieldValue) -> bool {
    if let (Some(actual), Ok(expected)) = (
        value.as_number(),
        condition.value.trim().parse::<f64>(),
    ) {
        return actual == expected;
    }
    value
        .as_text()
        .trim()
        .eq_ignore_ascii_case(condition.value.trim())
}

/// Case-insensitive substring test, both sides trimmed.
fn contains(condition: &Condition, value: &FieldValue) -> bool {
    value
        .as_text()
        .trim()
        .to_lowercase()
        .contains(&condition.value.trim().to_lowercase())
}

/// Numeric operators coerce both sides through a float parse; an
/// unparseable side makes the predicate false rather than an error.
fn numeric(condition: &Condition, value: &FieldValue, op: impl Fn(f64, f64) -> bool) -> bool {
    match (value.as_number(), condition.value.trim().parse::<f64>()) {
        (Some(actual), Ok(expected)) => op(actual, expected),
        _ => false,
    }
}
