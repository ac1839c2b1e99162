//! Integer arithmetic expressions.
//!
//! Script blobs often carry values such as `300 + -50` or `(3 + 4) * 2` where a
//! JSON number is expected. This module parses that small language into an
//! [`Expr`] tree and evaluates it with 64-bit integer arithmetic.
//!
//! Grammar:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := integer | '(' expr ')'
//! ```
//!
//! Division truncates toward zero. Overflow and division by zero are errors.
//! Inputs longer than [`MAX_TOKENS`] tokens or nested deeper than
//! [`MAX_DEPTH`] are rejected before a tree is built.

use tracing::debug;

use crate::error::{Error, Result};

/// Deepest allowed nesting of parentheses and unary signs.
pub const MAX_DEPTH: usize = 256;

/// Longest accepted expression, in tokens. Also bounds the depth of
/// left-leaning operator chains.
pub const MAX_TOKENS: usize = 4096;

/// Unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

/// Binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Parsed arithmetic expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(i64),
    Paren(Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Evaluate the tree.
    pub fn eval(&self) -> Result<i64> {
        match self {
            Self::Literal(value) => Ok(*value),
            Self::Paren(inner) => inner.eval(),
            Self::Unary(UnaryOp::Plus, inner) => inner.eval(),
            Self::Unary(UnaryOp::Minus, inner) => inner
                .eval()?
                .checked_neg()
                .ok_or_else(|| overflow("negation")),
            Self::Binary(op, lhs, rhs) => {
                let (x, y) = (lhs.eval()?, rhs.eval()?);
                match op {
                    BinaryOp::Add => x.checked_add(y).ok_or_else(|| overflow("addition")),
                    BinaryOp::Sub => x.checked_sub(y).ok_or_else(|| overflow("subtraction")),
                    BinaryOp::Mul => x.checked_mul(y).ok_or_else(|| overflow("multiplication")),
                    BinaryOp::Div if y == 0 => {
                        Err(Error::InvalidExpression("division by zero".to_string()))
                    }
                    BinaryOp::Div => x.checked_div(y).ok_or_else(|| overflow("division")),
                }
            }
        }
    }
}

fn overflow(op: &str) -> Error {
    Error::InvalidExpression(format!("integer overflow in {op}"))
}

/// Parse and evaluate `source`.
///
/// # Example
///
/// ```rust
/// use scrapekit::expr::evaluate_expression;
///
/// assert_eq!(evaluate_expression("(3 + 4) * -2 + 10").ok(), Some(-4));
/// assert!(evaluate_expression("3 +").is_err());
/// ```
pub fn evaluate_expression(source: &str) -> Result<i64> {
    let result = parse_expression(source).and_then(|expr| expr.eval());
    if let Err(err) = &result {
        debug!(source, error = %err, "expression evaluation failed");
    }
    result
}

/// Parse `source` into an expression tree.
pub fn parse_expression(source: &str) -> Result<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(Error::InvalidExpression(format!(
            "unexpected {token:?} at token {}",
            parser.pos
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Int(i64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '0'..='9' => {
                let mut end = start + 1;
                while let Some(&(i, d)) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    end = i + 1;
                    chars.next();
                }
                let digits = &source[start..end];
                let value = digits.parse::<i64>().map_err(|e| {
                    Error::InvalidExpression(format!("bad integer literal {digits}: {e}"))
                })?;
                Token::Int(value)
            }
            other => {
                return Err(Error::InvalidExpression(format!(
                    "unexpected character {other:?} at offset {start}"
                )))
            }
        };
        tokens.push(token);
        if tokens.len() > MAX_TOKENS {
            return Err(Error::InvalidExpression(format!(
                "expression longer than {MAX_TOKENS} tokens"
            )));
        }
    }

    if tokens.is_empty() {
        return Err(Error::InvalidExpression("empty expression".to_string()));
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Run `parse` one nesting level deeper.
    fn nested(&mut self, parse: impl FnOnce(&mut Self) -> Result<Expr>) -> Result<Expr> {
        if self.depth >= MAX_DEPTH {
            return Err(Error::InvalidExpression(format!(
                "nesting deeper than {MAX_DEPTH} at token {}",
                self.pos
            )));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn expr(&mut self) -> Result<Expr> {
        let mut lhs = self.term()?;
        while let Some(op) = match self.peek() {
            Some(Token::Plus) => Some(BinaryOp::Add),
            Some(Token::Minus) => Some(BinaryOp::Sub),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut lhs = self.unary()?;
        while let Some(op) = match self.peek() {
            Some(Token::Star) => Some(BinaryOp::Mul),
            Some(Token::Slash) => Some(BinaryOp::Div),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(Token::Plus) => {
                self.pos += 1;
                let inner = self.nested(Self::unary)?;
                Ok(Expr::Unary(UnaryOp::Plus, Box::new(inner)))
            }
            Some(Token::Minus) => {
                self.pos += 1;
                let inner = self.nested(Self::unary)?;
                Ok(Expr::Unary(UnaryOp::Minus, Box::new(inner)))
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::Int(value)) => Ok(Expr::Literal(value)),
            Some(Token::LParen) => {
                let inner = self.nested(Self::expr)?;
                match self.next() {
                    Some(Token::RParen) => Ok(Expr::Paren(Box::new(inner))),
                    other => Err(Error::InvalidExpression(format!(
                        "expected ')', found {other:?}"
                    ))),
                }
            }
            other => Err(Error::InvalidExpression(format!(
                "expected a number or '(', found {other:?}"
            ))),
        }
    }
}
