//! Typed cell values of the projection.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::host::TextRange;

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// Boolean
    Bool(bool),
    /// Paragraph range
    Range(TextRange),
    /// Text
    Text(String),
    /// Missing value
    Empty,
}

impl Value {
    /// Numeric view of the value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer view of the value; floats qualify when integral.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    /// Text view of the value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Check if this is [`Value::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Name of the value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) | Value::Float(_) => "number",
            Value::Bool(_) => "bool",
            Value::Range(_) => "range",
            Value::Text(_) => "string",
            Value::Empty => "empty",
        }
    }

    /// Compare two values of compatible type.
    ///
    /// Integers and floats compare numerically. Returns `None` for
    /// incompatible types.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Range(a), Value::Range(b)) => Some(a.cmp(b)),
            (Value::Empty, Value::Empty) => Some(Ordering::Equal),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }

    /// Total order used for sorting: values of different types are grouped
    /// by type, empty cells last.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        self.compare(other)
            .unwrap_or_else(|| self.rank().cmp(&other.rank()))
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Int(_) | Value::Float(_) => 0,
            Value::Bool(_) => 1,
            Value::Text(_) => 2,
            Value::Range(_) => 3,
            Value::Empty => 4,
        }
    }

    /// Case-insensitive substring test on the display form.
    ///
    /// `needle` must already be lowercase.
    pub fn contains_lowercase(&self, needle: &str) -> bool {
        self.to_string().to_lowercase().contains(needle)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Range(r) => write!(f, "{}", r),
            Value::Text(s) => f.write_str(s),
            Value::Empty => Ok(()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<TextRange> for Value {
    fn from(v: TextRange) -> Self {
        Value::Range(v)
    }
}

/// Parse `[s, e]`, `(s, e)` or `s, e`.
pub fn parse_range(s: &str) -> Option<TextRange> {
    let inner = s
        .trim()
        .trim_start_matches(['[', '('])
        .trim_end_matches([']', ')']);
    let (start, end) = inner.split_once(',')?;
    Some(TextRange::new(
        start.trim().parse().ok()?,
        end.trim().parse().ok()?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_comparison_across_int_and_float() {
        assert_eq!(
            Value::Int(2).compare(&Value::Float(1.5)),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Int(2).compare(&Value::Text("2".into())), None);
    }

    #[test]
    fn test_sort_cmp_puts_empty_last() {
        let mut values = vec![Value::Empty, Value::Int(3), Value::Int(1)];
        values.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(values, vec![Value::Int(1), Value::Int(3), Value::Empty]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Float(1.25).to_string(), "1.25");
        assert_eq!(Value::Range(TextRange::new(0, 12)).to_string(), "[0, 12]");
        assert_eq!(Value::Empty.to_string(), "");
    }

    #[test]
    fn test_contains_lowercase() {
        assert!(Value::Text("Heading 1".into()).contains_lowercase("heading"));
        assert!(Value::Int(120).contains_lowercase("12"));
        assert!(!Value::Empty.contains_lowercase("x"));
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("[3, 17]"), Some(TextRange::new(3, 17)));
        assert_eq!(parse_range("(3,17)"), Some(TextRange::new(3, 17)));
        assert_eq!(parse_range("3"), None);
    }
}
