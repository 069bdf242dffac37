//! Per-paragraph records produced by extraction.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::host::{TabAlignment, TableProperties, TextRange};

/// Computed list value of a paragraph.
///
/// Unnumbered paragraphs serialize as the string `"0"`, which keeps them
/// distinct from a list item whose computed value is the number `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberingValue {
    /// Not a list item
    #[default]
    Unnumbered,
    /// List item with the host-computed value
    Value(i64),
}

impl NumberingValue {
    /// Build from the host's list type and value.
    pub fn from_list(list_type: i32, list_value: i64) -> Self {
        if list_type != 0 {
            NumberingValue::Value(list_value)
        } else {
            NumberingValue::Unnumbered
        }
    }

    /// Check if this is a list item.
    pub fn is_numbered(&self) -> bool {
        matches!(self, NumberingValue::Value(_))
    }
}

impl fmt::Display for NumberingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberingValue::Unnumbered => f.write_str("0"),
            NumberingValue::Value(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for NumberingValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NumberingValue::Unnumbered => serializer.serialize_str("0"),
            NumberingValue::Value(v) => serializer.serialize_i64(*v),
        }
    }
}

impl<'de> Deserialize<'de> for NumberingValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(i64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(NumberingValue::Value(v)),
            Repr::Text(s) if s == "0" => Ok(NumberingValue::Unnumbered),
            Repr::Text(s) => s
                .trim()
                .parse()
                .map(NumberingValue::Value)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// A declared tab stop, position in centimeters on the 0.05 grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TabPosition {
    /// Position in cm
    pub position: f64,
    /// Alignment
    pub alignment: TabAlignment,
}

impl fmt::Display for TabPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.position, self.alignment)
    }
}

/// Format tab positions as `pos:align;pos:align`.
pub fn format_tab_positions(tabs: &[TabPosition]) -> String {
    tabs.iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(";")
}

/// Parse the output of [`format_tab_positions`].
pub fn parse_tab_positions(s: &str) -> Option<Vec<TabPosition>> {
    if s.trim().is_empty() {
        return Some(Vec::new());
    }
    s.split(';')
        .map(|item| {
            let (pos, align) = item.split_once(':')?;
            Some(TabPosition {
                position: super::field::parse_finite(pos.trim())?,
                alignment: TabAlignment::parse(align)?,
            })
        })
        .collect()
}

/// Format tab-character indices as `i;j;k`.
pub fn format_tab_indices(indices: &[usize]) -> String {
    indices
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(";")
}

/// Parse the output of [`format_tab_indices`].
pub fn parse_tab_indices(s: &str) -> Option<Vec<usize>> {
    if s.trim().is_empty() {
        return Some(Vec::new());
    }
    s.split(';').map(|i| i.trim().parse().ok()).collect()
}

/// Flat metadata of one paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphRecord {
    /// 1-based ordinal
    pub number: u32,

    /// Style name
    pub style: String,

    /// First-line indent in cm
    pub first_line_indent: f64,

    /// Left (hanging) indent in cm
    pub hanging_indent: f64,

    /// Font name
    pub font_name: String,

    /// Font size in points
    pub font_size: f64,

    /// Host-counted characters
    pub character_count: usize,

    /// Host-counted words
    pub word_count: usize,

    /// Number of tab characters
    pub tab_count: usize,

    /// Number of `=` characters
    pub equals_count: usize,

    /// Italic
    pub italic: bool,

    /// Bold
    pub bold: bool,

    /// Text with commas and the paragraph mark removed
    pub text: String,

    /// Host list type (0 = none)
    pub numbering_type: i32,

    /// Computed list value
    pub list_value: NumberingValue,

    /// Declared tab stops; empty unless the text contains a tab
    pub tab_positions: Vec<TabPosition>,

    /// Indices of tab characters in the text; empty unless the text contains a tab
    pub tab_indices: Vec<usize>,

    /// Whether the paragraph intersects a table
    pub within_table: bool,

    /// Properties of the first intersecting table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<TableProperties>,

    /// Space before, in points
    pub spacing_before: f64,

    /// Space after, in points
    pub spacing_after: f64,

    /// Location in the host document at extraction time
    pub range: TextRange,
}

impl ParagraphRecord {
    /// Create a record with empty fields.
    pub fn new(number: u32, range: TextRange) -> Self {
        Self {
            number,
            style: String::new(),
            first_line_indent: 0.0,
            hanging_indent: 0.0,
            font_name: String::new(),
            font_size: 0.0,
            character_count: 0,
            word_count: 0,
            tab_count: 0,
            equals_count: 0,
            italic: false,
            bold: false,
            text: String::new(),
            numbering_type: 0,
            list_value: NumberingValue::Unnumbered,
            tab_positions: Vec::new(),
            tab_indices: Vec::new(),
            within_table: false,
            table: None,
            spacing_before: 0.0,
            spacing_after: 0.0,
            range,
        }
    }
}

/// A pattern hit in the host document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPosition {
    /// Start offset in the document
    pub start: usize,
    /// End offset in the document
    pub end: usize,
    /// Matched text
    pub matched: String,
}

impl MatchPosition {
    /// Range covered by the match.
    pub fn range(&self) -> TextRange {
        TextRange::new(self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbering_sentinel_serialization() {
        let json = serde_json::to_string(&NumberingValue::Unnumbered).unwrap();
        assert_eq!(json, "\"0\"");
        let json = serde_json::to_string(&NumberingValue::Value(0)).unwrap();
        assert_eq!(json, "0");

        let back: NumberingValue = serde_json::from_str("\"0\"").unwrap();
        assert_eq!(back, NumberingValue::Unnumbered);
        let back: NumberingValue = serde_json::from_str("0").unwrap();
        assert_eq!(back, NumberingValue::Value(0));
    }

    #[test]
    fn test_numbering_from_list() {
        assert_eq!(NumberingValue::from_list(0, 5), NumberingValue::Unnumbered);
        assert_eq!(NumberingValue::from_list(3, 0), NumberingValue::Value(0));
    }

    #[test]
    fn test_tab_positions_format_and_parse() {
        let tabs = vec![
            TabPosition {
                position: 1.25,
                alignment: TabAlignment::Left,
            },
            TabPosition {
                position: 10.5,
                alignment: TabAlignment::Right,
            },
        ];
        let s = format_tab_positions(&tabs);
        assert_eq!(s, "1.25:left;10.5:right");
        assert_eq!(parse_tab_positions(&s), Some(tabs));
        assert_eq!(parse_tab_positions(""), Some(Vec::new()));
        assert_eq!(parse_tab_positions("oops"), None);
    }

    #[test]
    fn test_tab_indices_format_and_parse() {
        assert_eq!(format_tab_indices(&[3, 9]), "3;9");
        assert_eq!(parse_tab_indices("3;9"), Some(vec![3, 9]));
        assert_eq!(parse_tab_indices(""), Some(Vec::new()));
    }
}
