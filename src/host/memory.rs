//! In-memory host backed by JSON document snapshots.
//!
//! A snapshot is a JSON file describing paragraphs, tables, sections and page
//! statistics. [`MemoryApplication`] opens snapshots from disk and writes them
//! back on a saving close, which makes it a complete stand-in for a live
//! automation host in the CLI and in tests.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::{
    FontInfo, HeaderFooterKind, HostApplication, HostDocument, HostError, HostResult, ListFormat,
    ParagraphFormat, RangeCounts, TabAlignment, TabStop, TableProperties, TextRange,
};

/// Paragraph mark as the host reports it.
const PARAGRAPH_MARK: char = '\r';

/// Paragraphs that fit on a page when the snapshot does not state a page count.
const PARAGRAPHS_PER_PAGE: usize = 30;

/// EMU per point.
const EMU_PER_POINT: f64 = 12_700.0;

fn default_style() -> String {
    "Normal".to_string()
}

fn default_font() -> FontInfo {
    FontInfo {
        name: "Calibri".to_string(),
        size: 11.0,
        bold: false,
        italic: false,
    }
}

fn default_sections() -> Vec<MemorySection> {
    vec![MemorySection::default()]
}

fn default_starting_number() -> u32 {
    1
}

/// A paragraph in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryParagraph {
    /// Text without the paragraph mark
    pub text: String,

    /// Style name
    #[serde(default = "default_style")]
    pub style: String,

    /// Indents and spacing in points
    #[serde(default)]
    pub format: ParagraphFormat,

    /// Character formatting
    #[serde(default = "default_font")]
    pub font: FontInfo,

    /// List numbering
    #[serde(default)]
    pub list: ListFormat,

    /// Declared tab stops
    #[serde(default)]
    pub tab_stops: Vec<TabStop>,

    /// Index into the snapshot's tables when the paragraph sits in a table cell
    #[serde(default)]
    pub table: Option<usize>,
}

impl MemoryParagraph {
    /// Create a paragraph with default formatting.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: default_style(),
            format: ParagraphFormat::default(),
            font: default_font(),
            list: ListFormat::default(),
            tab_stops: Vec::new(),
            table: None,
        }
    }

    /// Set the style name.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// Set first-line and left indents in points.
    pub fn with_indents(mut self, first_line: f64, left: f64) -> Self {
        self.format.first_line_indent = first_line;
        self.format.left_indent = left;
        self
    }

    /// Set the font.
    pub fn with_font(mut self, name: impl Into<String>, size: f64) -> Self {
        self.font.name = name.into();
        self.font.size = size;
        self
    }

    /// Mark bold and/or italic.
    pub fn with_emphasis(mut self, bold: bool, italic: bool) -> Self {
        self.font.bold = bold;
        self.font.italic = italic;
        self
    }

    /// Make the paragraph a list item.
    pub fn with_list(mut self, list_type: i32, list_value: i64) -> Self {
        self.list = ListFormat {
            list_type,
            list_value,
        };
        self
    }

    /// Add a tab stop (position in EMU).
    pub fn with_tab_stop(mut self, position: f64, alignment: TabAlignment) -> Self {
        self.tab_stops.push(TabStop {
            position,
            alignment,
        });
        self
    }

    /// Place the paragraph in a table.
    pub fn in_table(mut self, table: usize) -> Self {
        self.table = Some(table);
        self
    }
}

/// Header or footer texts of a section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderFooterSet {
    /// Primary (odd pages)
    #[serde(default)]
    pub primary: String,
    /// Even pages
    #[serde(default)]
    pub even_pages: String,
    /// First page
    #[serde(default)]
    pub first_page: String,
}

impl HeaderFooterSet {
    fn get(&self, kind: HeaderFooterKind) -> &str {
        match kind {
            HeaderFooterKind::Primary => &self.primary,
            HeaderFooterKind::EvenPages => &self.even_pages,
            HeaderFooterKind::FirstPage => &self.first_page,
        }
    }

    fn get_mut(&mut self, kind: HeaderFooterKind) -> &mut String {
        match kind {
            HeaderFooterKind::Primary => &mut self.primary,
            HeaderFooterKind::EvenPages => &mut self.even_pages,
            HeaderFooterKind::FirstPage => &mut self.first_page,
        }
    }
}

/// Size and spacing of a section's first header paragraph, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeaderParagraph {
    /// Font size
    pub font_size: f64,
    /// Space before
    #[serde(default)]
    pub space_before: f64,
    /// Space after
    #[serde(default)]
    pub space_after: f64,
}

impl Default for HeaderParagraph {
    fn default() -> Self {
        Self {
            font_size: 11.0,
            space_before: 0.0,
            space_after: 0.0,
        }
    }
}

/// A section in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySection {
    /// Headers
    #[serde(default)]
    pub headers: HeaderFooterSet,
    /// First header paragraph
    #[serde(default)]
    pub header_paragraph: HeaderParagraph,
    /// Footers
    #[serde(default)]
    pub footers: HeaderFooterSet,
    /// Whether page numbering restarts at this section
    #[serde(default)]
    pub restart_numbering: bool,
    /// Starting page number when numbering restarts
    #[serde(default = "default_starting_number")]
    pub starting_number: u32,
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            headers: HeaderFooterSet::default(),
            header_paragraph: HeaderParagraph::default(),
            footers: HeaderFooterSet::default(),
            restart_numbering: false,
            starting_number: default_starting_number(),
        }
    }
}

/// A document snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryDocument {
    /// Document name
    #[serde(default)]
    pub name: String,

    /// Paragraphs in document order
    ///
    /// Text edits go through [`HostDocument::set_range_text`]; changing a
    /// paragraph's text in place leaves the measured offsets stale.
    #[serde(default)]
    pub paragraphs: Vec<MemoryParagraph>,

    /// Tables referenced by paragraphs
    #[serde(default)]
    pub tables: Vec<TableProperties>,

    /// Sections (at least one)
    #[serde(default = "default_sections")]
    pub sections: Vec<MemorySection>,

    /// Total page count; derived from the paragraph count when absent
    #[serde(default)]
    pub pages: Option<u32>,

    /// Last rendered page number reported after layout, when it differs from the computed one
    #[serde(default)]
    pub rendered_last_page: Option<u32>,

    #[serde(skip)]
    path: Option<PathBuf>,

    #[serde(skip)]
    selection: Option<TextRange>,

    #[serde(skip)]
    exported: Vec<PathBuf>,

    #[serde(skip)]
    layout: OnceLock<Layout>,
}

/// Paragraph offsets and the content stream, measured once per text change.
#[derive(Debug, Clone, Default)]
struct Layout {
    ranges: Vec<TextRange>,
    content: Vec<char>,
}

impl Layout {
    fn measure(paragraphs: &[MemoryParagraph]) -> Self {
        let mut ranges = Vec::with_capacity(paragraphs.len());
        let mut content = Vec::new();
        for p in paragraphs {
            let start = content.len();
            content.extend(p.text.chars());
            content.push(PARAGRAPH_MARK);
            ranges.push(TextRange::new(start, content.len()));
        }
        Self { ranges, content }
    }

    /// Paragraphs whose ranges intersect `range`, found by binary search.
    fn touching(&self, range: TextRange) -> std::ops::Range<usize> {
        let first = self.ranges.partition_point(|r| {
            if range.is_empty() {
                r.end < range.start
            } else {
                r.end <= range.start
            }
        });
        let mut last = first;
        while last < self.ranges.len() && self.ranges[last].intersects(&range) {
            last += 1;
        }
        first..last
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new("")
    }
}

impl MemoryDocument {
    /// Create an empty document.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            paragraphs: Vec::new(),
            tables: Vec::new(),
            sections: default_sections(),
            pages: None,
            rendered_last_page: None,
            path: None,
            selection: None,
            exported: Vec::new(),
            layout: OnceLock::new(),
        }
    }

    /// Append a paragraph.
    pub fn with_paragraph(mut self, paragraph: MemoryParagraph) -> Self {
        self.paragraphs.push(paragraph);
        self.layout = OnceLock::new();
        self
    }

    /// Append a table definition.
    pub fn with_table(mut self, table: TableProperties) -> Self {
        self.tables.push(table);
        self
    }

    /// Set the total page count.
    pub fn with_pages(mut self, pages: u32) -> Self {
        self.pages = Some(pages);
        self
    }

    /// Parse a snapshot from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialize the snapshot to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Path the snapshot was loaded from.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Range last selected through [`HostDocument::select`].
    pub fn selection(&self) -> Option<TextRange> {
        self.selection
    }

    /// PDF files written through [`HostDocument::export_pdf`].
    pub fn exported(&self) -> &[PathBuf] {
        &self.exported
    }

    /// Full content stream, paragraph marks included.
    pub fn content(&self) -> String {
        self.layout().content.iter().collect()
    }

    fn layout(&self) -> &Layout {
        self.layout.get_or_init(|| Layout::measure(&self.paragraphs))
    }

    fn content_len(&self) -> usize {
        self.layout().content.len()
    }

    fn paragraph(&self, index: usize, operation: &str) -> HostResult<&MemoryParagraph> {
        self.paragraphs.get(index).ok_or_else(|| {
            HostError::new(
                operation,
                format!(
                    "paragraph {} out of range ({} paragraphs)",
                    index,
                    self.paragraphs.len()
                ),
            )
        })
    }

    /// Indices of the paragraphs a range touches.
    fn paragraphs_in(&self, range: TextRange, operation: &str) -> HostResult<Vec<usize>> {
        let hits: Vec<usize> = self.layout().touching(range).collect();
        if hits.is_empty() {
            return Err(HostError::new(
                operation,
                format!("range {} is outside the document", range),
            ));
        }
        Ok(hits)
    }

    fn for_each_paragraph<F>(&mut self, range: TextRange, operation: &str, mut f: F) -> HostResult<()>
    where
        F: FnMut(&mut MemoryParagraph),
    {
        for index in self.paragraphs_in(range, operation)? {
            f(&mut self.paragraphs[index]);
        }
        Ok(())
    }

    fn section(&self, section: usize, operation: &str) -> HostResult<&MemorySection> {
        section
            .checked_sub(1)
            .and_then(|i| self.sections.get(i))
            .ok_or_else(|| HostError::new(operation, format!("no section {}", section)))
    }

    fn section_mut(&mut self, section: usize, operation: &str) -> HostResult<&mut MemorySection> {
        section
            .checked_sub(1)
            .and_then(|i| self.sections.get_mut(i))
            .ok_or_else(|| HostError::new(operation, format!("no section {}", section)))
    }

    fn computed_pages(&self) -> u32 {
        self.pages.unwrap_or_else(|| {
            let pages = self.paragraphs.len().div_ceil(PARAGRAPHS_PER_PAGE).max(1);
            pages as u32
        })
    }

    fn first_page_number(&self) -> u32 {
        match self.sections.first() {
            Some(section) if section.restart_numbering => section.starting_number,
            _ => 1,
        }
    }
}

impl HostDocument for MemoryDocument {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn paragraph_count(&self) -> HostResult<usize> {
        Ok(self.paragraphs.len())
    }

    fn paragraph_range(&self, index: usize) -> HostResult<TextRange> {
        self.paragraph(index, "paragraph.range")?;
        Ok(self.layout().ranges[index])
    }

    fn range_text(&self, range: TextRange) -> HostResult<String> {
        let content = &self.layout().content;
        if range.end > content.len() {
            return Err(HostError::new(
                "range.text",
                format!("range {} exceeds document length {}", range, content.len()),
            ));
        }
        Ok(content[range.start..range.end].iter().collect())
    }

    fn paragraph_style(&self, index: usize) -> HostResult<String> {
        Ok(self.paragraph(index, "paragraph.style")?.style.clone())
    }

    fn paragraph_format(&self, index: usize) -> HostResult<ParagraphFormat> {
        Ok(self.paragraph(index, "paragraph.format")?.format)
    }

    fn range_font(&self, range: TextRange) -> HostResult<FontInfo> {
        let indices = self.paragraphs_in(range, "range.font")?;
        let first = &self.paragraphs[indices[0]].font;
        let mut font = first.clone();
        for &i in &indices[1..] {
            let other = &self.paragraphs[i].font;
            if other.name != font.name {
                font.name.clear();
            }
            if other.size != font.size {
                font.size = 0.0;
            }
            font.bold &= other.bold;
            font.italic &= other.italic;
        }
        Ok(font)
    }

    fn range_counts(&self, range: TextRange) -> HostResult<RangeCounts> {
        let text = self.range_text(range)?;
        Ok(RangeCounts {
            characters: text.chars().count(),
            words: text.split_whitespace().count(),
        })
    }

    fn list_format(&self, index: usize) -> HostResult<ListFormat> {
        Ok(self.paragraph(index, "list_format")?.list)
    }

    fn tables_in_range(&self, range: TextRange) -> HostResult<Vec<TableProperties>> {
        let mut seen = BTreeSet::new();
        let mut tables = Vec::new();
        for index in self.paragraphs_in(range, "tables")? {
            if let Some(t) = self.paragraphs[index].table {
                if seen.insert(t) {
                    let props = self.tables.get(t).cloned().ok_or_else(|| {
                        HostError::new("tables", format!("table {} is not defined", t))
                    })?;
                    tables.push(props);
                }
            }
        }
        Ok(tables)
    }

    fn tab_stops(&self, index: usize) -> HostResult<Vec<TabStop>> {
        Ok(self.paragraph(index, "tab_stops")?.tab_stops.clone())
    }

    fn section_count(&self) -> HostResult<usize> {
        Ok(self.sections.len())
    }

    fn header_text(&self, section: usize, kind: HeaderFooterKind) -> HostResult<String> {
        Ok(self.section(section, "headers")?.headers.get(kind).to_string())
    }

    fn footer_text(&self, section: usize, kind: HeaderFooterKind) -> HostResult<String> {
        Ok(self.section(section, "footers")?.footers.get(kind).to_string())
    }

    fn page_count(&self) -> HostResult<u32> {
        Ok(self.computed_pages())
    }

    fn first_rendered_page(&mut self) -> HostResult<u32> {
        Ok(self.first_page_number())
    }

    fn last_rendered_page(&mut self) -> HostResult<u32> {
        if let Some(page) = self.rendered_last_page {
            return Ok(page);
        }
        let first = self.first_page_number();
        let pages = self.computed_pages();
        first
            .checked_add(pages.saturating_sub(1))
            .ok_or_else(|| {
                HostError::new(
                    "page_numbers",
                    format!("{} pages starting at {} overflow the page counter", pages, first),
                )
            })
    }

    fn select(&mut self, range: TextRange) -> HostResult<()> {
        let total = self.content_len();
        if range.end > total {
            return Err(HostError::new(
                "select",
                format!("range {} exceeds document length {}", range, total),
            ));
        }
        self.selection = Some(range);
        Ok(())
    }

    fn set_font_name(&mut self, range: TextRange, name: &str) -> HostResult<()> {
        self.for_each_paragraph(range, "font.name", |p| p.font.name = name.to_string())
    }

    fn set_font_size(&mut self, range: TextRange, size: f64) -> HostResult<()> {
        if !(size > 0.0 && size <= 1638.0) {
            return Err(HostError::new(
                "font.size",
                format!("size {} is out of range", size),
            ));
        }
        self.for_each_paragraph(range, "font.size", |p| p.font.size = size)
    }

    fn set_style(&mut self, range: TextRange, style: &str) -> HostResult<()> {
        if style.trim().is_empty() {
            return Err(HostError::new("style", "style name is empty"));
        }
        self.for_each_paragraph(range, "style", |p| p.style = style.to_string())
    }

    fn set_left_indent(&mut self, range: TextRange, points: f64) -> HostResult<()> {
        self.for_each_paragraph(range, "paragraph_format.left_indent", |p| {
            p.format.left_indent = points
        })
    }

    fn set_first_line_indent(&mut self, range: TextRange, points: f64) -> HostResult<()> {
        self.for_each_paragraph(range, "paragraph_format.first_line_indent", |p| {
            p.format.first_line_indent = points
        })
    }

    fn set_right_indent(&mut self, range: TextRange, points: f64) -> HostResult<()> {
        self.for_each_paragraph(range, "paragraph_format.right_indent", |p| {
            p.format.right_indent = points
        })
    }

    fn replace_tab_stops(&mut self, range: TextRange, positions: &[f64]) -> HostResult<()> {
        let stops: Vec<TabStop> = positions
            .iter()
            .map(|&pt| TabStop {
                position: pt * EMU_PER_POINT,
                alignment: TabAlignment::Left,
            })
            .collect();
        self.for_each_paragraph(range, "tab_stops", |p| p.tab_stops = stops.clone())
    }

    fn set_range_text(&mut self, range: TextRange, text: &str) -> HostResult<()> {
        if text.contains(PARAGRAPH_MARK) {
            return Err(HostError::new(
                "range.text",
                "replacement text may not contain paragraph marks",
            ));
        }
        let layout = self.layout();
        // The range must sit inside one paragraph, before its mark.
        let index = Some(layout.ranges.partition_point(|r| r.end <= range.start))
            .filter(|&i| i < layout.ranges.len() && range.end < layout.ranges[i].end)
            .ok_or_else(|| {
                HostError::new(
                    "range.text",
                    format!("range {} does not lie within a single paragraph", range),
                )
            })?;
        let base = layout.ranges[index].start;
        self.layout = OnceLock::new();
        let paragraph = &mut self.paragraphs[index];
        let chars: Vec<char> = paragraph.text.chars().collect();
        let mut replaced: String = chars[..range.start - base].iter().collect();
        replaced.push_str(text);
        replaced.extend(&chars[range.end - base..]);
        paragraph.text = replaced;
        Ok(())
    }

    fn set_header_text(
        &mut self,
        section: usize,
        kind: HeaderFooterKind,
        text: &str,
    ) -> HostResult<()> {
        *self.section_mut(section, "headers")?.headers.get_mut(kind) = text.to_string();
        Ok(())
    }

    fn set_footer_text(
        &mut self,
        section: usize,
        kind: HeaderFooterKind,
        text: &str,
    ) -> HostResult<()> {
        *self.section_mut(section, "footers")?.footers.get_mut(kind) = text.to_string();
        Ok(())
    }

    fn adjust_first_header(&mut self) -> HostResult<()> {
        self.section_mut(1, "headers.adjust")?.header_paragraph = HeaderParagraph {
            font_size: 1.0,
            space_before: 0.0,
            space_after: 0.0,
        };
        Ok(())
    }

    fn set_page_numbering(&mut self, section: usize, restart: bool, start: u32) -> HostResult<()> {
        let section = self.section_mut(section, "page_numbers")?;
        section.restart_numbering = restart;
        section.starting_number = start;
        Ok(())
    }

    fn export_pdf(&mut self, path: &Path) -> HostResult<()> {
        let bytes = render_pdf(self);
        fs::File::create(path)
            .and_then(|mut f| f.write_all(&bytes))
            .map_err(|e| HostError::new("export_pdf", e.to_string()))?;
        self.exported.push(path.to_path_buf());
        Ok(())
    }
}

/// Opens and saves JSON snapshots on disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryApplication {
    _private: (),
}

impl MemoryApplication {
    /// Create a new snapshot host.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl HostApplication for MemoryApplication {
    type Document = MemoryDocument;

    fn open(&self, path: &Path) -> HostResult<MemoryDocument> {
        let json = fs::read_to_string(path).map_err(|e| HostError::new("open", e.to_string()))?;
        let mut doc =
            MemoryDocument::from_json(&json).map_err(|e| HostError::new("open", e.to_string()))?;
        if doc.name.is_empty() {
            doc.name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        doc.path = Some(path.to_path_buf());
        log::debug!("Opened snapshot {}", path.display());
        Ok(doc)
    }

    fn close(&self, document: MemoryDocument, save: bool) -> HostResult<()> {
        if !save {
            return Ok(());
        }
        let path = document
            .path
            .clone()
            .ok_or_else(|| HostError::new("close", "document has no backing file"))?;
        let json = document
            .to_json()
            .map_err(|e| HostError::new("close", e.to_string()))?;
        fs::write(&path, json).map_err(|e| HostError::new("close", e.to_string()))?;
        log::debug!("Saved snapshot {}", path.display());
        Ok(())
    }
}

/// Render a one-page PDF listing the document's paragraphs.
fn render_pdf(doc: &MemoryDocument) -> Vec<u8> {
    let mut stream = String::from("BT /F1 11 Tf 56 780 Td 14 TL\n");
    for p in doc.paragraphs.iter().take(50) {
        let line: String = p
            .text
            .chars()
            .filter(|c| c.is_ascii() && !c.is_ascii_control())
            .collect();
        let escaped = line
            .replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)");
        stream.push_str(&format!("({}) Tj T*\n", escaped));
    }
    stream.push_str("ET");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 595 842] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>".to_string(),
        format!("<< /Length {} >>\nstream\n{}\nendstream", stream.len(), stream),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }
    let xref = out.len();
    out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        out.push_str(&format!("{:010} 00000 n \n", offset));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref
    ));
    out.into_bytes()
}
