//! Column catalogue of the projection.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::record::{
    format_tab_indices, format_tab_positions, parse_tab_indices, parse_tab_positions,
    NumberingValue, ParagraphRecord,
};
use super::value::{parse_range, Value};
use crate::host::TableProperties;

/// How a column's cells are typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Integer
    Int,
    /// Floating point
    Float,
    /// Free text
    Text,
    /// Boolean
    Bool,
    /// `[start, end]`
    Range,
    /// List value: integer, or the `"0"` sentinel
    Numbering,
    /// `pos:align;pos:align`
    TabPositions,
    /// `i;j;k`
    TabIndices,
    /// Table properties as JSON
    Table,
}

impl FieldKind {
    /// Parse raw user or CSV input into a cell of this kind.
    ///
    /// Returns `None` when the input does not fit.
    pub fn parse(&self, raw: &str) -> Option<Value> {
        let trimmed = raw.trim();
        match self {
            FieldKind::Int => parse_int(trimmed).map(Value::Int),
            FieldKind::Float => parse_finite(trimmed).map(Value::Float),
            FieldKind::Text => Some(Value::Text(raw.to_string())),
            FieldKind::Bool => parse_bool(trimmed).map(Value::Bool),
            FieldKind::Range => parse_range(trimmed).map(Value::Range),
            FieldKind::Numbering => parse_int(trimmed).map(Value::Int),
            FieldKind::TabPositions => {
                parse_tab_positions(trimmed).map(|t| Value::Text(format_tab_positions(&t)))
            }
            FieldKind::TabIndices => {
                parse_tab_indices(trimmed).map(|t| Value::Text(format_tab_indices(&t)))
            }
            FieldKind::Table => {
                if trimmed.is_empty() {
                    Some(Value::Empty)
                } else {
                    serde_json::from_str::<TableProperties>(trimmed)
                        .ok()
                        .map(|_| Value::Text(trimmed.to_string()))
                }
            }
        }
    }
}

fn parse_int(s: &str) -> Option<i64> {
    s.parse().ok().or_else(|| {
        let f = parse_finite(s)?;
        (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
    })
}

/// Parse a float, rejecting `NaN` and infinities.
pub(crate) fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// A known paragraph column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ParagraphNumber,
    ParagraphStyle,
    FirstLineIndent,
    HangingIndent,
    FontName,
    FontSize,
    CharacterCount,
    WordCount,
    TabCount,
    EqualsSignCount,
    IsItalic,
    IsBold,
    Text,
    NumberingType,
    ListValue,
    TabPositions,
    TabIndices,
    WithinTable,
    SpacingBefore,
    SpacingAfter,
    TableProperties,
    ParagraphRange,
}

impl Field {
    /// All known columns in display order.
    pub const ALL: [Field; 22] = [
        Field::ParagraphNumber,
        Field::ParagraphStyle,
        Field::FirstLineIndent,
        Field::HangingIndent,
        Field::FontName,
        Field::FontSize,
        Field::CharacterCount,
        Field::WordCount,
        Field::TabCount,
        Field::EqualsSignCount,
        Field::IsItalic,
        Field::IsBold,
        Field::Text,
        Field::NumberingType,
        Field::ListValue,
        Field::TabPositions,
        Field::TabIndices,
        Field::WithinTable,
        Field::SpacingBefore,
        Field::SpacingAfter,
        Field::TableProperties,
        Field::ParagraphRange,
    ];

    /// Column header.
    pub fn display_name(&self) -> &'static str {
        match self {
            Field::ParagraphNumber => "Paragraph Number",
            Field::ParagraphStyle => "Paragraph Style",
            Field::FirstLineIndent => "First Line Indent (cm)",
            Field::HangingIndent => "Hanging Indent (cm)",
            Field::FontName => "Font Name",
            Field::FontSize => "Font Size",
            Field::CharacterCount => "Character Count",
            Field::WordCount => "Word Count",
            Field::TabCount => "Tab Count",
            Field::EqualsSignCount => "Equals Sign Count",
            Field::IsItalic => "Is Italic",
            Field::IsBold => "Is Bold",
            Field::Text => "Text",
            Field::NumberingType => "Numbering Type",
            Field::ListValue => "List Value",
            Field::TabPositions => "Tab Positions",
            Field::TabIndices => "Tab Indices",
            Field::WithinTable => "Within Table",
            Field::SpacingBefore => "Spacing Before",
            Field::SpacingAfter => "Spacing After",
            Field::TableProperties => "Table Properties",
            Field::ParagraphRange => "Paragraph Range",
        }
    }

    /// Identifier usable unquoted in filter expressions.
    pub fn key(&self) -> &'static str {
        match self {
            Field::ParagraphNumber => "paragraph_number",
            Field::ParagraphStyle => "paragraph_style",
            Field::FirstLineIndent => "first_line_indent",
            Field::HangingIndent => "hanging_indent",
            Field::FontName => "font_name",
            Field::FontSize => "font_size",
            Field::CharacterCount => "character_count",
            Field::WordCount => "word_count",
            Field::TabCount => "tab_count",
            Field::EqualsSignCount => "equals_sign_count",
            Field::IsItalic => "is_italic",
            Field::IsBold => "is_bold",
            Field::Text => "text",
            Field::NumberingType => "numbering_type",
            Field::ListValue => "list_value",
            Field::TabPositions => "tab_positions",
            Field::TabIndices => "tab_indices",
            Field::WithinTable => "within_table",
            Field::SpacingBefore => "spacing_before",
            Field::SpacingAfter => "spacing_after",
            Field::TableProperties => "table_properties",
            Field::ParagraphRange => "paragraph_range",
        }
    }

    /// Additional accepted names.
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Field::FirstLineIndent => &["First Line Indent"],
            Field::HangingIndent => &["Hanging Indent", "Left Indent", "left_indent"],
            Field::IsItalic => &["Italic"],
            Field::IsBold => &["Bold", "IsBold"],
            _ => &[],
        }
    }

    /// Cell type.
    pub fn kind(&self) -> FieldKind {
        match self {
            Field::ParagraphNumber
            | Field::CharacterCount
            | Field::WordCount
            | Field::TabCount
            | Field::EqualsSignCount
            | Field::NumberingType => FieldKind::Int,
            Field::FirstLineIndent
            | Field::HangingIndent
            | Field::FontSize
            | Field::SpacingBefore
            | Field::SpacingAfter => FieldKind::Float,
            Field::ParagraphStyle | Field::FontName | Field::Text => FieldKind::Text,
            Field::IsItalic | Field::IsBold | Field::WithinTable => FieldKind::Bool,
            Field::ListValue => FieldKind::Numbering,
            Field::TabPositions => FieldKind::TabPositions,
            Field::TabIndices => FieldKind::TabIndices,
            Field::TableProperties => FieldKind::Table,
            Field::ParagraphRange => FieldKind::Range,
        }
    }

    /// Resolve a column by header, key or alias (case-insensitive).
    pub fn from_name(name: &str) -> Option<Field> {
        let name = name.trim();
        Field::ALL.into_iter().find(|f| {
            f.display_name().eq_ignore_ascii_case(name)
                || f.key().eq_ignore_ascii_case(name)
                || f.aliases().iter().any(|a| a.eq_ignore_ascii_case(name))
        })
    }

    /// Cell value of this column for a record.
    pub fn value_of(&self, record: &ParagraphRecord) -> Value {
        match self {
            Field::ParagraphNumber => Value::Int(i64::from(record.number)),
            Field::ParagraphStyle => Value::Text(record.style.clone()),
            Field::FirstLineIndent => Value::Float(record.first_line_indent),
            Field::HangingIndent => Value::Float(record.hanging_indent),
            Field::FontName => Value::Text(record.font_name.clone()),
            Field::FontSize => Value::Float(record.font_size),
            Field::CharacterCount => Value::Int(record.character_count as i64),
            Field::WordCount => Value::Int(record.word_count as i64),
            Field::TabCount => Value::Int(record.tab_count as i64),
            Field::EqualsSignCount => Value::Int(record.equals_count as i64),
            Field::IsItalic => Value::Bool(record.italic),
            Field::IsBold => Value::Bool(record.bold),
            Field::Text => Value::Text(record.text.clone()),
            Field::NumberingType => Value::Int(i64::from(record.numbering_type)),
            Field::ListValue => numbering_cell(record.list_value),
            Field::TabPositions => Value::Text(format_tab_positions(&record.tab_positions)),
            Field::TabIndices => Value::Text(format_tab_indices(&record.tab_indices)),
            Field::WithinTable => Value::Bool(record.within_table),
            Field::SpacingBefore => Value::Float(record.spacing_before),
            Field::SpacingAfter => Value::Float(record.spacing_after),
            Field::TableProperties => record
                .table
                .as_ref()
                .and_then(|t| serde_json::to_string(t).ok())
                .map(Value::Text)
                .unwrap_or(Value::Empty),
            Field::ParagraphRange => Value::Range(record.range),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Cell form of a list value: the `"0"` text sentinel, or an integer.
pub fn numbering_cell(value: NumberingValue) -> Value {
    match value {
        NumberingValue::Unnumbered => Value::Text("0".to_string()),
        NumberingValue::Value(v) => Value::Int(v),
    }
}

/// A projection column: a known field or a user-added one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    /// Extracted paragraph field
    Known(Field),
    /// Display-only column created by an edit or an import
    Custom(String),
}

impl Column {
    /// Resolve a header; unknown names become custom columns.
    pub fn from_name(name: &str) -> Column {
        Field::from_name(name)
            .map(Column::Known)
            .unwrap_or_else(|| Column::Custom(name.trim().to_string()))
    }

    /// Header text.
    pub fn name(&self) -> &str {
        match self {
            Column::Known(f) => f.display_name(),
            Column::Custom(name) => name,
        }
    }

    /// The known field, if any.
    pub fn field(&self) -> Option<Field> {
        match self {
            Column::Known(f) => Some(*f),
            Column::Custom(_) => None,
        }
    }

    /// Cell type; custom columns hold text.
    pub fn kind(&self) -> FieldKind {
        self.field().map(|f| f.kind()).unwrap_or(FieldKind::Text)
    }

    /// Whether a filter or lookup name refers to this column.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Column::Known(f) => Field::from_name(name) == Some(*f),
            Column::Custom(custom) => custom.eq_ignore_ascii_case(name.trim()),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_accepts_headers_keys_and_aliases() {
        assert_eq!(Field::from_name("Font Name"), Some(Field::FontName));
        assert_eq!(Field::from_name("font_name"), Some(Field::FontName));
        assert_eq!(Field::from_name("hanging indent"), Some(Field::HangingIndent));
        assert_eq!(Field::from_name("Left Indent"), Some(Field::HangingIndent));
        assert_eq!(
            Field::from_name("First Line Indent"),
            Some(Field::FirstLineIndent)
        );
        assert_eq!(Field::from_name("Reviewer"), None);
    }

    #[test]
    fn test_every_field_has_distinct_key() {
        let mut keys: Vec<_> = Field::ALL.iter().map(|f| f.key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), Field::ALL.len());
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(FieldKind::Int.parse("3.0"), Some(Value::Int(3)));
        assert_eq!(FieldKind::Int.parse("x"), None);
        assert_eq!(FieldKind::Float.parse(" 1.5 "), Some(Value::Float(1.5)));
        assert_eq!(FieldKind::Bool.parse("Yes"), Some(Value::Bool(true)));
        assert_eq!(
            FieldKind::TabPositions.parse("1.25:left"),
            Some(Value::Text("1.25:left".into()))
        );
        assert_eq!(FieldKind::TabPositions.parse("1.25"), None);
        assert_eq!(FieldKind::Table.parse(""), Some(Value::Empty));
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        for raw in ["NaN", "nan", "inf", "-inf", "infinity"] {
            assert_eq!(FieldKind::Float.parse(raw), None, "{}", raw);
            assert_eq!(FieldKind::Int.parse(raw), None, "{}", raw);
        }
        assert_eq!(FieldKind::TabPositions.parse("NaN:left"), None);
        assert_eq!(FieldKind::Int.parse("1e300"), None);
    }

    #[test]
    fn test_custom_column() {
        let col = Column::from_name("Reviewer");
        assert_eq!(col, Column::Custom("Reviewer".into()));
        assert_eq!(col.kind(), FieldKind::Text);
        assert!(col.matches("reviewer"));
    }

    #[test]
    fn test_numbering_cell_sentinel() {
        assert_eq!(
            numbering_cell(NumberingValue::Unnumbered),
            Value::Text("0".into())
        );
        assert_eq!(numbering_cell(NumberingValue::Value(0)), Value::Int(0));
    }
}
