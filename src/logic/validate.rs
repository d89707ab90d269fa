use super::token::{Token, tokenize};
use crate::error::ExpressionError;

/// Checks a custom logic expression against a condition count.
///
/// Every check runs independently and all failures are collected, so the
/// user sees the full list of problems at once. An empty vector means the
/// expression is valid.
pub fn validate_expression(expression: &str, condition_count: usize) -> Vec<ExpressionError> {
    let mut errors = Vec::new();

    if expression.trim().is_empty() {
        errors.push(ExpressionError::Empty);
        return errors;
    }

    let tokens = tokenize(expression);

    for token in &tokens {
        match token {
            Token::Invalid(word) => errors.push(ExpressionError::InvalidToken(word.clone())),
            Token::Index(n) if *n == 0 || *n > condition_count => {
                errors.push(ExpressionError::IndexOutOfRange {
                    index: *n,
                    max: condition_count,
                });
            }
            _ => {}
        }
    }

    if tokens
        .windows(2)
        .any(|pair| pair[0].is_operator() && pair[1].is_operator())
    {
        errors.push(ExpressionError::AdjacentOperators);
    }

    let mut depth: i32 = 0;
    let mut unbalanced = false;
    for token in &tokens {
        match token {
            Token::Open => depth += 1,
            Token::Close => {
                depth -= 1;
                if depth < 0 {
                    unbalanced = true;
                }
            }
            _ => {}
        }
    }
    if unbalanced || depth != 0 {
        errors.push(ExpressionError::UnbalancedParens);
    }

    if tokens.first().is_some_and(Token::is_operator) {
        errors.push(ExpressionError::LeadingOperator);
    }
    if tokens.last().is_some_and(Token::is_operator) {
        errors.push(ExpressionError::TrailingOperator);
    }

    errors
}
