use super::token::{Token, tokenize};
use super::validate::validate_expression;
use crate::error::ExpressionError;

/// The parsed form of a custom logic expression.
///
/// `AND` binds tighter than `OR`, matching the usual `&&`-over-`||`
/// precedence; parentheses dissolve into the tree shape. Atoms carry the
/// 1-based condition reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicAst {
    And(Box<LogicAst>, Box<LogicAst>),
    Or(Box<LogicAst>, Box<LogicAst>),
    Atom(usize),
}

impl LogicAst {
    /// Validates and parses an expression.
    ///
    /// Validation runs first so that every token-level problem is reported
    /// together; only a structurally broken-but-token-valid expression
    /// (e.g. `1 2`) falls through to a single `Malformed` error.
    pub fn parse(expression: &str, condition_count: usize) -> Result<Self, Vec<ExpressionError>> {
        let errors = validate_expression(expression, condition_count);
        if !errors.is_empty() {
            return Err(errors);
        }
        let tokens = tokenize(expression);
        let mut parser = Parser { tokens, pos: 0 };
        let ast = parser.or_expr().map_err(|e| vec![e])?;
        if parser.pos != parser.tokens.len() {
            return Err(vec![ExpressionError::Malformed(
                "unexpected trailing tokens".to_string(),
            )]);
        }
        Ok(ast)
    }

    /// Walks the tree against the predicate results.
    ///
    /// Indices are validated at parse time; an out-of-range reference can
    /// only appear if the predicate slice shrank afterwards, in which case
    /// it evaluates to `false`.
    pub fn evaluate(&self, predicates: &[bool]) -> bool {
        match self {
            LogicAst::And(l, r) => l.evaluate(predicates) && r.evaluate(predicates),
            LogicAst::Or(l, r) => l.evaluate(predicates) || r.evaluate(predicates),
            LogicAst::Atom(index) => predicates.get(index - 1).copied().unwrap_or(false),
        }
    }
}

/// Recursive-descent parser over the token stream.
///
/// Grammar: `or := and (OR and)*`, `and := primary (AND primary)*`,
/// `primary := "(" or ")" | index`.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn or_expr(&mut self) -> Result<LogicAst, ExpressionError> {
        let mut lhs = self.and_expr()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.next();
            let rhs = self.and_expr()?;
            lhs = LogicAst::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<LogicAst, ExpressionError> {
        let mut lhs = self.primary()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.next();
            let rhs = self.primary()?;
            lhs = LogicAst::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn primary(&mut self) -> Result<LogicAst, ExpressionError> {
        match self.next() {
            Some(Token::Open) => {
                let inner = self.or_expr()?;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(ExpressionError::Malformed(
                        "expected a closing bracket".to_string(),
                    )),
                }
            }
            Some(Token::Index(n)) => Ok(LogicAst::Atom(n)),
            Some(token) => Err(ExpressionError::Malformed(format!(
                "unexpected token {:?}",
                token
            ))),
            None => Err(ExpressionError::Malformed(
                "expression ended unexpectedly".to_string(),
            )),
        }
    }
}
