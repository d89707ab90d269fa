/// A lexical token of the custom logic language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Open,
    Close,
    And,
    Or,
    /// A 1-based condition reference.
    Index(usize),
    /// Anything the lexer could not recognize, kept for error reporting.
    Invalid(String),
}

impl Token {
    pub fn is_operator(&self) -> bool {
        matches!(self, Token::And | Token::Or)
    }
}

/// Splits an expression like `(1 AND 2) OR 3` into tokens.
///
/// Parentheses are single-character tokens even when written flush against
/// a digit, and the keywords are case-insensitive.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            c if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        digits.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match digits.parse() {
                    Ok(n) => tokens.push(Token::Index(n)),
                    Err(_) => tokens.push(Token::Invalid(digits)),
                }
            }
            _ => {
                let mut word = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_whitespace() || d == '(' || d == ')' {
                        break;
                    }
                    word.push(d);
                    chars.next();
                }
                match word.to_ascii_uppercase().as_str() {
                    "AND" => tokens.push(Token::And),
                    "OR" => tokens.push(Token::Or),
                    _ => tokens.push(Token::Invalid(word)),
                }
            }
        }
    }

    tokens
}
