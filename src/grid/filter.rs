//! Row filter expressions (tokens + recursive descent parser + evaluator).
//!
//! The language covers comparisons and boolean logic over named columns,
//! nothing more:
//!
//! ```text
//! or      := and (("or" | "|" | "||") and)*
//! and     := not (("and" | "&" | "&&") not)*
//! not     := ("not" | "~" | "!") not
//!          | compare
//! compare := operand (("==" | "!=" | "<" | "<=" | ">" | ">=") operand)?
//! operand := NUMBER | "-" NUMBER | STRING | "True" | "False"
//!          | IDENT | `QUOTED NAME`
//!          | "(" or ")"
//! ```
//!
//! Column names resolve through [`Column::matches`], so snake_case keys and
//! back-tick quoted display names both work.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

use crate::model::{Column, Value};

/// Deepest `not`/parenthesis nesting the parser accepts.
pub const MAX_NESTING: usize = 256;

/// A filter expression that failed to parse or evaluate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Nothing to evaluate.
    #[error("Empty filter expression")]
    Empty,

    /// Malformed input.
    #[error("Syntax error at {position}: {message}")]
    Syntax {
        /// Character offset of the offending token
        position: usize,
        /// What went wrong
        message: String,
    },

    /// Expression ended early.
    #[error("Unexpected end of expression")]
    UnexpectedEnd,

    /// Column name not present in the frame.
    #[error("name '{0}' is not defined")]
    UnknownColumn(String),

    /// Operands cannot be compared.
    #[error("'{op}' not supported between {left} and {right}")]
    TypeMismatch {
        /// Operator
        op: &'static str,
        /// Left operand type
        left: &'static str,
        /// Right operand type
        right: &'static str,
    },

    /// A boolean was required.
    #[error("expected a boolean, found {0}")]
    NotBoolean(&'static str),
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Literal(Value),
    /// Column reference by name
    Column(String),
    /// Resolved column reference
    ColumnIndex(usize),
    /// Logical negation
    Not(Box<Expr>),
    /// Logical conjunction of two or more terms
    And(Vec<Expr>),
    /// Logical disjunction of two or more terms
    Or(Vec<Expr>),
    /// Comparison
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Quoted(String),
    Str(String),
    Number(f64),
    Minus,
    LParen,
    RParen,
    And,
    Or,
    Not,
    Cmp(CompareOp),
}

/// A filter compiled against a frame's columns.
#[derive(Debug, Clone)]
pub struct Filter {
    source: String,
    expr: Expr,
}

impl Filter {
    /// Parse an expression and resolve its column names.
    pub fn compile(input: &str, columns: &[Column]) -> Result<Self, FilterError> {
        let expr = parse_filter(input)?;
        let expr = resolve(expr, columns)?;
        Ok(Self {
            source: input.trim().to_string(),
            expr,
        })
    }

    /// The expression text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against one row's cells.
    pub fn matches(&self, cells: &[Value]) -> Result<bool, FilterError> {
        as_bool(&eval(&self.expr, cells)?)
    }
}

/// Parse a filter expression into an AST.
pub fn parse_filter(input: &str) -> Result<Expr, FilterError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(FilterError::Empty);
    }

    let mut parser = ExprParser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_or()?;

    // All tokens must be consumed.
    if let Some((position, token)) = parser.tokens.get(parser.pos) {
        return Err(FilterError::Syntax {
            position: *position,
            message: format!("unexpected {:?}", token),
        });
    }

    Ok(expr)
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, FilterError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((pos, ch)) = chars.peek().copied() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        match ch {
            '\'' | '"' | '`' => {
                chars.next();
                let mut buf = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == ch {
                        closed = true;
                        break;
                    }
                    buf.push(c);
                }
                if !closed {
                    return Err(FilterError::Syntax {
                        position: pos,
                        message: "unterminated quote".to_string(),
                    });
                }
                let token = if ch == '`' {
                    Token::Quoted(buf)
                } else {
                    Token::Str(buf)
                };
                tokens.push((pos, token));
            }
            '(' => {
                chars.next();
                tokens.push((pos, Token::LParen));
            }
            ')' => {
                chars.next();
                tokens.push((pos, Token::RParen));
            }
            '-' => {
                chars.next();
                tokens.push((pos, Token::Minus));
            }
            '~' => {
                chars.next();
                tokens.push((pos, Token::Not));
            }
            '&' | '|' => {
                chars.next();
                if chars.peek().map(|(_, c)| *c) == Some(ch) {
                    chars.next();
                }
                let token = if ch == '&' { Token::And } else { Token::Or };
                tokens.push((pos, token));
            }
            '=' | '!' | '<' | '>' => {
                chars.next();
                let followed_by_eq = chars.peek().map(|(_, c)| *c) == Some('=');
                if followed_by_eq {
                    chars.next();
                }
                let token = match (ch, followed_by_eq) {
                    ('=', true) => Token::Cmp(CompareOp::Eq),
                    ('!', true) => Token::Cmp(CompareOp::Ne),
                    ('!', false) => Token::Not,
                    ('<', true) => Token::Cmp(CompareOp::Le),
                    ('<', false) => Token::Cmp(CompareOp::Lt),
                    ('>', true) => Token::Cmp(CompareOp::Ge),
                    ('>', false) => Token::Cmp(CompareOp::Gt),
                    _ => {
                        return Err(FilterError::Syntax {
                            position: pos,
                            message: "single '=' is not a comparison, use '=='".to_string(),
                        })
                    }
                };
                tokens.push((pos, token));
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut buf = String::new();
                while let Some((_, c)) = chars.peek().copied() {
                    if !(c.is_ascii_digit() || c == '.') {
                        break;
                    }
                    buf.push(c);
                    chars.next();
                }
                let number = buf.parse().map_err(|_| FilterError::Syntax {
                    position: pos,
                    message: format!("invalid number '{}'", buf),
                })?;
                tokens.push((pos, Token::Number(number)));
            }
            c if c.is_alphanumeric() || c == '_' => {
                let mut buf = String::new();
                while let Some((_, c)) = chars.peek().copied() {
                    if !(c.is_alphanumeric() || c == '_') {
                        break;
                    }
                    buf.push(c);
                    chars.next();
                }
                let token = match buf.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    _ => Token::Ident(buf),
                };
                tokens.push((pos, token));
            }
            other => {
                return Err(FilterError::Syntax {
                    position: pos,
                    message: format!("unexpected character '{}'", other),
                })
            }
        }
    }

    Ok(tokens)
}

struct ExprParser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    depth: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn next(&mut self) -> Option<(usize, Token)> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn enter(&mut self, position: usize) -> Result<(), FilterError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(FilterError::Syntax {
                position,
                message: "expression nested too deeply".to_string(),
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_or(&mut self) -> Result<Expr, FilterError> {
        let mut terms = vec![self.parse_and()?];
        while self.peek() == Some(&Token::Or) {
            self.next();
            terms.push(self.parse_and()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::Or(terms)
        })
    }

    fn parse_and(&mut self) -> Result<Expr, FilterError> {
        let mut terms = vec![self.parse_not()?];
        while self.peek() == Some(&Token::And) {
            self.next();
            terms.push(self.parse_not()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::And(terms)
        })
    }

    fn parse_not(&mut self) -> Result<Expr, FilterError> {
        if self.peek() == Some(&Token::Not) {
            let (position, _) = self.next().ok_or(FilterError::UnexpectedEnd)?;
            self.enter(position)?;
            let inner = self.parse_not()?;
            self.leave();
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_compare()
    }

    fn parse_compare(&mut self) -> Result<Expr, FilterError> {
        let left = self.parse_operand()?;
        if let Some(Token::Cmp(op)) = self.peek().cloned() {
            self.next();
            let right = self.parse_operand()?;
            return Ok(Expr::Compare {
                op,
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn parse_operand(&mut self) -> Result<Expr, FilterError> {
        let (position, token) = self.next().ok_or(FilterError::UnexpectedEnd)?;
        match token {
            Token::Number(n) => Ok(Expr::Literal(number(n))),
            Token::Minus => match self.next() {
                Some((_, Token::Number(n))) => Ok(Expr::Literal(number(-n))),
                Some((position, _)) => Err(FilterError::Syntax {
                    position,
                    message: "expected a number after '-'".to_string(),
                }),
                None => Err(FilterError::UnexpectedEnd),
            },
            Token::Str(s) => Ok(Expr::Literal(Value::Text(s))),
            Token::Ident(name) => Ok(match name.as_str() {
                "True" | "true" => Expr::Literal(Value::Bool(true)),
                "False" | "false" => Expr::Literal(Value::Bool(false)),
                _ => Expr::Column(name),
            }),
            Token::Quoted(name) => Ok(Expr::Column(name)),
            Token::LParen => {
                self.enter(position)?;
                let inner = self.parse_or()?;
                self.leave();
                match self.next() {
                    Some((_, Token::RParen)) => Ok(inner),
                    Some((position, _)) => Err(FilterError::Syntax {
                        position,
                        message: "expected ')'".to_string(),
                    }),
                    None => Err(FilterError::UnexpectedEnd),
                }
            }
            other => Err(FilterError::Syntax {
                position,
                message: format!("unexpected {:?}", other),
            }),
        }
    }
}

fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::Int(n as i64)
    } else {
        Value::Float(n)
    }
}

/// Replace column names with indices into the frame.
fn resolve(expr: Expr, columns: &[Column]) -> Result<Expr, FilterError> {
    Ok(match expr {
        Expr::Column(name) => {
            let index = columns
                .iter()
                .position(|c| c.matches(&name))
                .ok_or(FilterError::UnknownColumn(name))?;
            Expr::ColumnIndex(index)
        }
        Expr::Not(inner) => Expr::Not(Box::new(resolve(*inner, columns)?)),
        Expr::And(terms) => Expr::And(resolve_all(terms, columns)?),
        Expr::Or(terms) => Expr::Or(resolve_all(terms, columns)?),
        Expr::Compare { op, left, right } => Expr::Compare {
            op,
            left: Box::new(resolve(*left, columns)?),
            right: Box::new(resolve(*right, columns)?),
        },
        other => other,
    })
}

fn resolve_all(terms: Vec<Expr>, columns: &[Column]) -> Result<Vec<Expr>, FilterError> {
    terms.into_iter().map(|t| resolve(t, columns)).collect()
}

fn eval(expr: &Expr, cells: &[Value]) -> Result<Value, FilterError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::ColumnIndex(i) => Ok(cells.get(*i).cloned().unwrap_or(Value::Empty)),
        Expr::Column(name) => Err(FilterError::UnknownColumn(name.clone())),
        Expr::Not(inner) => Ok(Value::Bool(!as_bool(&eval(inner, cells)?)?)),
        Expr::And(terms) => {
            for term in terms {
                if !as_bool(&eval(term, cells)?)? {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        Expr::Or(terms) => {
            for term in terms {
                if as_bool(&eval(term, cells)?)? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        Expr::Compare { op, left, right } => {
            let l = eval(left, cells)?;
            let r = eval(right, cells)?;
            compare(*op, &l, &r).map(Value::Bool)
        }
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<bool, FilterError> {
    let ordering = left.compare(right);
    match op {
        // Mismatched types are simply unequal.
        CompareOp::Eq => Ok(ordering == Some(Ordering::Equal)),
        CompareOp::Ne => Ok(ordering != Some(Ordering::Equal)),
        _ => {
            if left.is_empty() || right.is_empty() {
                return Ok(false);
            }
            let ordering = ordering.ok_or(FilterError::TypeMismatch {
                op: op.symbol(),
                left: left.type_name(),
                right: right.type_name(),
            })?;
            Ok(match op {
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::Le => ordering != Ordering::Greater,
                CompareOp::Gt => ordering == Ordering::Greater,
                CompareOp::Ge => ordering != Ordering::Less,
                CompareOp::Eq => ordering == Ordering::Equal,
                CompareOp::Ne => ordering != Ordering::Equal,
            })
        }
    }
}

fn as_bool(value: &Value) -> Result<bool, FilterError> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(FilterError::NotBoolean(other.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Field;

    fn columns() -> Vec<Column> {
        vec![
            Column::Known(Field::ParagraphNumber),
            Column::Known(Field::ParagraphStyle),
            Column::Known(Field::FontSize),
            Column::Known(Field::IsBold),
            Column::Custom("Reviewer".to_string()),
        ]
    }

    fn row(number: i64, style: &str, size: f64, bold: bool) -> Vec<Value> {
        vec![
            Value::Int(number),
            Value::Text(style.to_string()),
            Value::Float(size),
            Value::Bool(bold),
            Value::Empty,
        ]
    }

    fn eval_on(input: &str, cells: &[Value]) -> Result<bool, FilterError> {
        Filter::compile(input, &columns())?.matches(cells)
    }

    #[test]
    fn test_comparisons() {
        let r = row(3, "Normal", 11.0, false);
        assert_eq!(eval_on("paragraph_number > 2", &r), Ok(true));
        assert_eq!(eval_on("paragraph_number >= 4", &r), Ok(false));
        assert_eq!(eval_on("font_size == 11", &r), Ok(true));
        assert_eq!(eval_on("`Paragraph Style` == 'Normal'", &r), Ok(true));
        assert_eq!(eval_on("paragraph_style != \"Normal\"", &r), Ok(false));
    }

    #[test]
    fn test_boolean_operators() {
        let r = row(3, "Heading 1", 16.0, true);
        assert_eq!(eval_on("is_bold and font_size > 12", &r), Ok(true));
        assert_eq!(eval_on("(is_bold == False) | (paragraph_number < 2)", &r), Ok(false));
        assert_eq!(eval_on("~is_bold", &r), Ok(false));
        assert_eq!(eval_on("not is_bold or paragraph_number == 3", &r), Ok(true));
        assert_eq!(eval_on("is_bold && !(font_size < 10)", &r), Ok(true));
    }

    #[test]
    fn test_negative_numbers() {
        let cols = vec![Column::Known(Field::FirstLineIndent)];
        let filter = Filter::compile("first_line_indent < -0.5", &cols).unwrap();
        assert_eq!(filter.matches(&[Value::Float(-0.63)]), Ok(true));
    }

    #[test]
    fn test_unknown_column() {
        let err = Filter::compile("nonexistent_column > 0", &columns()).unwrap_err();
        assert_eq!(err, FilterError::UnknownColumn("nonexistent_column".to_string()));
        assert_eq!(err.to_string(), "name 'nonexistent_column' is not defined");
    }

    #[test]
    fn test_type_mismatch() {
        let r = row(3, "Normal", 11.0, false);
        assert!(matches!(
            eval_on("paragraph_style > 3", &r),
            Err(FilterError::TypeMismatch { .. })
        ));
        assert_eq!(eval_on("paragraph_style == 3", &r), Ok(false));
        assert!(matches!(
            eval_on("paragraph_number", &r),
            Err(FilterError::NotBoolean("number"))
        ));
    }

    #[test]
    fn test_empty_cells_never_order() {
        let r = row(3, "Normal", 11.0, false);
        assert_eq!(eval_on("Reviewer > 'a'", &r), Ok(false));
        assert_eq!(eval_on("Reviewer == 'a'", &r), Ok(false));
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(parse_filter("   "), Err(FilterError::Empty));
        assert_eq!(parse_filter("font_size >"), Err(FilterError::UnexpectedEnd));
        assert!(matches!(
            parse_filter("font_size = 3"),
            Err(FilterError::Syntax { .. })
        ));
        assert!(matches!(
            parse_filter("(font_size > 3"),
            Err(FilterError::UnexpectedEnd)
        ));
        assert!(matches!(
            parse_filter("'open"),
            Err(FilterError::Syntax { .. })
        ));
        assert!(matches!(
            parse_filter("a > 1 b"),
            Err(FilterError::Syntax { .. })
        ));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let deep = format!("{}1 == 1{}", "(".repeat(50_000), ")".repeat(50_000));
        let err = parse_filter(&deep).unwrap_err();
        assert!(matches!(
            err,
            FilterError::Syntax { ref message, .. } if message == "expression nested too deeply"
        ));

        let negated = format!("{}is_bold", "not ".repeat(10_000));
        assert!(matches!(
            parse_filter(&negated),
            Err(FilterError::Syntax { .. })
        ));

        let ok = format!("{}is_bold{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        let r = row(1, "Normal", 11.0, true);
        assert_eq!(eval_on(&ok, &r), Ok(true));
    }

    #[test]
    fn test_long_chains_stay_flat() {
        let chain = vec!["is_bold"; 50_000].join(" and ");
        let r = row(1, "Normal", 11.0, true);
        assert_eq!(eval_on(&chain, &r), Ok(true));
        let either = vec!["paragraph_number == 2"; 50_000].join(" or ");
        assert_eq!(eval_on(&either, &r), Ok(false));
    }

    #[test]
    fn test_source_is_trimmed() {
        let filter = Filter::compile("  is_bold  ", &columns()).unwrap();
        assert_eq!(filter.source(), "is_bold");
    }
}
