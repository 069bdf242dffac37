//! Host document abstraction layer.
//!
//! Provides a trait-based interface to the word-processing application that
//! owns the live document, isolating extraction and editing logic from any
//! concrete automation binding. Every accessor is fallible on its own so a
//! caller can decide, per property, whether a failure aborts or degrades.

pub mod memory;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::{
    HeaderFooterSet, HeaderParagraph, MemoryApplication, MemoryDocument, MemoryParagraph,
    MemorySection,
};

/// Result type for a single host call.
pub type HostResult<T> = std::result::Result<T, HostError>;

/// A failed property get/set against the host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Host call {operation} failed: {message}")]
pub struct HostError {
    /// Host operation that failed (e.g. "font.name")
    pub operation: String,
    /// Host-reported message
    pub message: String,
}

impl HostError {
    /// Create a new host error.
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Error for an operation the host does not implement.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::new(operation, "not supported by this host")
    }
}

/// A `(start, end)` character-offset pair into the document's content stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TextRange {
    /// Start offset (inclusive)
    pub start: usize,
    /// End offset (exclusive)
    pub end: usize,
}

impl TextRange {
    /// Create a range, swapping the bounds if they are reversed.
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the range is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether two ranges share at least one character, or touch at an empty range.
    pub fn intersects(&self, other: &TextRange) -> bool {
        if self.is_empty() || other.is_empty() {
            return self.start >= other.start && self.start <= other.end
                || other.start >= self.start && other.start <= self.end;
        }
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Paragraph-level formatting, in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphFormat {
    /// First-line indent (negative for hanging)
    pub first_line_indent: f64,
    /// Left indent
    pub left_indent: f64,
    /// Right indent
    pub right_indent: f64,
    /// Space before the paragraph
    pub space_before: f64,
    /// Space after the paragraph
    pub space_after: f64,
}

/// Character formatting of a range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontInfo {
    /// Font family name
    pub name: String,
    /// Font size in points
    pub size: f64,
    /// Bold
    pub bold: bool,
    /// Italic
    pub italic: bool,
}

/// Host-counted characters and words of a range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeCounts {
    /// Character count as the host reports it
    pub characters: usize,
    /// Word count as the host reports it
    pub words: usize,
}

/// List numbering of a paragraph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFormat {
    /// Host list type (0 = not a list item)
    pub list_type: i32,
    /// Computed list value
    pub list_value: i64,
}

/// Alignment of a tab stop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabAlignment {
    /// Left-aligned (default)
    #[default]
    Left,
    /// Centered
    Center,
    /// Right-aligned
    Right,
    /// Aligned on the decimal separator
    Decimal,
    /// Vertical bar
    Bar,
}

impl TabAlignment {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TabAlignment::Left => "left",
            TabAlignment::Center => "center",
            TabAlignment::Right => "right",
            TabAlignment::Decimal => "decimal",
            TabAlignment::Bar => "bar",
        }
    }

    /// Parse a lowercase or capitalised name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Some(TabAlignment::Left),
            "center" | "centre" => Some(TabAlignment::Center),
            "right" => Some(TabAlignment::Right),
            "decimal" => Some(TabAlignment::Decimal),
            "bar" => Some(TabAlignment::Bar),
            _ => None,
        }
    }
}

impl fmt::Display for TabAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared tab stop, position in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TabStop {
    /// Position in EMU
    pub position: f64,
    /// Alignment
    #[serde(default)]
    pub alignment: TabAlignment,
}

/// Properties of a table a paragraph sits in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableProperties {
    /// Preferred width
    pub width: f64,
    /// Inside border line style
    pub border_style: i32,
    /// Inside border color
    pub border_color: i64,
    /// Inside border line width
    pub border_size: i32,
    /// Background shading color
    pub shading: i64,
    /// Font of the table range
    pub font: String,
    /// Left, right and first-column indents, when the host exposes them
    #[serde(default)]
    pub indents: Option<TableIndents>,
}

/// Per-table indents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TableIndents {
    /// Left indent
    pub left: f64,
    /// Right indent
    pub right: f64,
    /// First-column indent
    pub first_column: f64,
}

/// Which header/footer of a section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderFooterKind {
    /// Primary (odd pages, or all pages when even/odd differ is off)
    #[default]
    Primary,
    /// Even pages
    EvenPages,
    /// First page
    FirstPage,
}

impl HeaderFooterKind {
    /// Every kind a section carries.
    pub const ALL: [HeaderFooterKind; 3] = [
        HeaderFooterKind::Primary,
        HeaderFooterKind::EvenPages,
        HeaderFooterKind::FirstPage,
    ];
}

/// Read/write access to an open host document.
///
/// Paragraphs are addressed by 0-based position in document order. Ranges
/// are character offsets into the whole content stream. Mutating calls
/// default to [`HostError::unsupported`] so read-only hosts only need the
/// accessors.
pub trait HostDocument {
    /// Document name (usually the file name).
    fn name(&self) -> String;

    /// Number of paragraphs.
    fn paragraph_count(&self) -> HostResult<usize>;

    /// Range of a paragraph, including its paragraph mark.
    fn paragraph_range(&self, index: usize) -> HostResult<TextRange>;

    /// Text of a range, paragraph marks as `\r`.
    fn range_text(&self, range: TextRange) -> HostResult<String>;

    /// Localised style name of a paragraph.
    fn paragraph_style(&self, index: usize) -> HostResult<String>;

    /// Indents and spacing of a paragraph.
    fn paragraph_format(&self, index: usize) -> HostResult<ParagraphFormat>;

    /// Character formatting of a range.
    fn range_font(&self, range: TextRange) -> HostResult<FontInfo>;

    /// Host-counted characters and words of a range.
    fn range_counts(&self, range: TextRange) -> HostResult<RangeCounts>;

    /// List numbering of a paragraph.
    fn list_format(&self, index: usize) -> HostResult<ListFormat>;

    /// Tables intersecting a range, in document order.
    fn tables_in_range(&self, range: TextRange) -> HostResult<Vec<TableProperties>>;

    /// Declared tab stops of a paragraph.
    fn tab_stops(&self, index: usize) -> HostResult<Vec<TabStop>>;

    /// Number of sections.
    fn section_count(&self) -> HostResult<usize>;

    /// Header text of a section (1-based), paragraph marks stripped by the caller.
    fn header_text(&self, section: usize, kind: HeaderFooterKind) -> HostResult<String>;

    /// Footer text of a section (1-based).
    fn footer_text(&self, section: usize, kind: HeaderFooterKind) -> HostResult<String>;

    /// Total page count computed by the host.
    fn page_count(&self) -> HostResult<u32>;

    /// Adjusted page number shown on the first rendered page.
    fn first_rendered_page(&mut self) -> HostResult<u32>;

    /// Adjusted page number shown on the last rendered page, after layout.
    fn last_rendered_page(&mut self) -> HostResult<u32>;

    /// Select a range in the host UI.
    fn select(&mut self, _range: TextRange) -> HostResult<()> {
        Err(HostError::unsupported("select"))
    }

    /// Set the font name of a range.
    fn set_font_name(&mut self, _range: TextRange, _name: &str) -> HostResult<()> {
        Err(HostError::unsupported("font.name"))
    }

    /// Set the font size of a range.
    fn set_font_size(&mut self, _range: TextRange, _size: f64) -> HostResult<()> {
        Err(HostError::unsupported("font.size"))
    }

    /// Assign a paragraph style to a range.
    fn set_style(&mut self, _range: TextRange, _style: &str) -> HostResult<()> {
        Err(HostError::unsupported("style"))
    }

    /// Set the left indent (points) of the paragraphs in a range.
    fn set_left_indent(&mut self, _range: TextRange, _points: f64) -> HostResult<()> {
        Err(HostError::unsupported("paragraph_format.left_indent"))
    }

    /// Set the first-line indent (points) of the paragraphs in a range.
    fn set_first_line_indent(&mut self, _range: TextRange, _points: f64) -> HostResult<()> {
        Err(HostError::unsupported("paragraph_format.first_line_indent"))
    }

    /// Set the right indent (points) of the paragraphs in a range.
    fn set_right_indent(&mut self, _range: TextRange, _points: f64) -> HostResult<()> {
        Err(HostError::unsupported("paragraph_format.right_indent"))
    }

    /// Clear all tab stops of the paragraphs in a range and add new ones (positions in points).
    fn replace_tab_stops(&mut self, _range: TextRange, _positions: &[f64]) -> HostResult<()> {
        Err(HostError::unsupported("tab_stops"))
    }

    /// Replace the text of a range.
    fn set_range_text(&mut self, _range: TextRange, _text: &str) -> HostResult<()> {
        Err(HostError::unsupported("range.text"))
    }

    /// Replace a section's header text.
    fn set_header_text(
        &mut self,
        _section: usize,
        _kind: HeaderFooterKind,
        _text: &str,
    ) -> HostResult<()> {
        Err(HostError::unsupported("headers.text"))
    }

    /// Replace a section's footer text.
    fn set_footer_text(
        &mut self,
        _section: usize,
        _kind: HeaderFooterKind,
        _text: &str,
    ) -> HostResult<()> {
        Err(HostError::unsupported("footers.text"))
    }

    /// Shrink the first header paragraph to 1 pt with no spacing before or
    /// after, so it takes no room when pages are measured.
    fn adjust_first_header(&mut self) -> HostResult<()> {
        Err(HostError::unsupported("headers.adjust"))
    }

    /// Restart numbering at a section's primary header and set its starting number.
    fn set_page_numbering(&mut self, _section: usize, _restart: bool, _start: u32) -> HostResult<()> {
        Err(HostError::unsupported("page_numbers"))
    }

    /// Save a PDF rendition of the document.
    fn export_pdf(&mut self, _path: &Path) -> HostResult<()> {
        Err(HostError::unsupported("export_pdf"))
    }
}

/// Index of the paragraph whose range contains the start of `range`.
///
/// Paragraph ranges ascend in document order, so this bisects them.
pub fn paragraph_index_at<D: HostDocument + ?Sized>(
    doc: &D,
    range: TextRange,
) -> HostResult<Option<usize>> {
    let (mut lo, mut hi) = (0, doc.paragraph_count()?);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let candidate = doc.paragraph_range(mid)?;
        if range.start < candidate.start {
            hi = mid;
        } else if range.start >= candidate.end {
            lo = mid + 1;
        } else {
            return Ok(Some(mid));
        }
    }
    Ok(None)
}

/// The host application: opens and closes documents.
pub trait HostApplication: Send + Sync {
    /// Document handle type.
    type Document: HostDocument;

    /// Open a document from disk.
    fn open(&self, path: &Path) -> HostResult<Self::Document>;

    /// Close a document, optionally saving changes.
    fn close(&self, document: Self::Document, save: bool) -> HostResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_range_new_orders_bounds() {
        let r = TextRange::new(10, 4);
        assert_eq!(r.start, 4);
        assert_eq!(r.end, 10);
        assert_eq!(r.len(), 6);
    }

    #[test]
    fn test_text_range_intersects() {
        let a = TextRange::new(0, 10);
        assert!(a.intersects(&TextRange::new(9, 12)));
        assert!(!a.intersects(&TextRange::new(10, 12)));
        assert!(a.intersects(&TextRange::new(5, 5)));
        assert!(!a.intersects(&TextRange::new(11, 11)));
    }

    #[test]
    fn test_text_range_display() {
        assert_eq!(TextRange::new(3, 17).to_string(), "[3, 17]");
    }

    #[test]
    fn test_paragraph_index_at() {
        let mut doc = MemoryDocument::new("a.docx");
        for text in ["Title", "", "Body text here", "cell", "end"] {
            doc = doc.with_paragraph(MemoryParagraph::new(text));
        }
        // [0,6) [6,7) [7,22) [22,27) [27,31)
        let at = |start: usize| paragraph_index_at(&doc, TextRange::new(start, start + 1)).unwrap();
        assert_eq!(at(0), Some(0));
        assert_eq!(at(5), Some(0));
        assert_eq!(at(6), Some(1));
        assert_eq!(at(7), Some(2));
        assert_eq!(at(21), Some(2));
        assert_eq!(at(22), Some(3));
        assert_eq!(at(30), Some(4));
        assert_eq!(at(31), None);
        assert_eq!(
            paragraph_index_at(&MemoryDocument::new("empty"), TextRange::new(0, 0)).unwrap(),
            None
        );
    }

    #[test]
    fn test_tab_alignment_parse() {
        assert_eq!(TabAlignment::parse("Right"), Some(TabAlignment::Right));
        assert_eq!(TabAlignment::parse("centre"), Some(TabAlignment::Center));
        assert_eq!(TabAlignment::parse("diagonal"), None);
    }
}
