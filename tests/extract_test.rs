//! Integration tests for paragraph extraction.

use paragrid::extract::{extract_records, ExtractOptions};
use paragrid::host::{
    FontInfo, HeaderFooterKind, HostDocument, HostError, HostResult, ListFormat, MemoryDocument,
    MemoryParagraph, ParagraphFormat, RangeCounts, TabAlignment, TabStop, TableProperties,
    TextRange,
};
use paragrid::model::NumberingValue;
use paragrid::units::{cm_to_points, points_to_cm};
use paragrid::Error;

/// Wraps a snapshot and fails one kind of host call.
struct FlakyDocument {
    inner: MemoryDocument,
    failing: &'static str,
}

impl FlakyDocument {
    fn new(inner: MemoryDocument, failing: &'static str) -> Self {
        Self { inner, failing }
    }

    fn check(&self, operation: &'static str) -> HostResult<()> {
        if self.failing == operation {
            Err(HostError::new(operation, "call was rejected"))
        } else {
            Ok(())
        }
    }
}

impl HostDocument for FlakyDocument {
    fn name(&self) -> String {
        self.inner.name()
    }

    fn paragraph_count(&self) -> HostResult<usize> {
        self.inner.paragraph_count()
    }

    fn paragraph_range(&self, index: usize) -> HostResult<TextRange> {
        self.check("paragraph.range")?;
        self.inner.paragraph_range(index)
    }

    fn range_text(&self, range: TextRange) -> HostResult<String> {
        self.inner.range_text(range)
    }

    fn paragraph_style(&self, index: usize) -> HostResult<String> {
        self.check("style")?;
        self.inner.paragraph_style(index)
    }

    fn paragraph_format(&self, index: usize) -> HostResult<ParagraphFormat> {
        self.inner.paragraph_format(index)
    }

    fn range_font(&self, range: TextRange) -> HostResult<FontInfo> {
        self.check("font")?;
        self.inner.range_font(range)
    }

    fn range_counts(&self, range: TextRange) -> HostResult<RangeCounts> {
        self.inner.range_counts(range)
    }

    fn list_format(&self, index: usize) -> HostResult<ListFormat> {
        self.inner.list_format(index)
    }

    fn tables_in_range(&self, range: TextRange) -> HostResult<Vec<TableProperties>> {
        self.inner.tables_in_range(range)
    }

    fn tab_stops(&self, index: usize) -> HostResult<Vec<TabStop>> {
        self.check("tab_stops")?;
        self.inner.tab_stops(index)
    }

    fn section_count(&self) -> HostResult<usize> {
        self.inner.section_count()
    }

    fn header_text(&self, section: usize, kind: HeaderFooterKind) -> HostResult<String> {
        self.inner.header_text(section, kind)
    }

    fn footer_text(&self, section: usize, kind: HeaderFooterKind) -> HostResult<String> {
        self.inner.footer_text(section, kind)
    }

    fn page_count(&self) -> HostResult<u32> {
        self.inner.page_count()
    }

    fn first_rendered_page(&mut self) -> HostResult<u32> {
        self.inner.first_rendered_page()
    }

    fn last_rendered_page(&mut self) -> HostResult<u32> {
        self.inner.last_rendered_page()
    }
}

fn lesson() -> MemoryDocument {
    MemoryDocument::new("Unit 1.docx")
        .with_paragraph(
            MemoryParagraph::new("Unit 1: Fractions")
                .with_style("Heading 1")
                .with_font("Arial", 16.0)
                .with_emphasis(true, false),
        )
        .with_paragraph(
            MemoryParagraph::new("1.\tAdd 1/2, 1/4 = ?")
                .with_style("List Paragraph")
                .with_indents(-18.0, 36.0)
                .with_list(3, 1)
                .with_tab_stop(453_600.0, TabAlignment::Left)
                .with_tab_stop(3_787_140.0, TabAlignment::Right),
        )
        .with_paragraph(MemoryParagraph::new("x = 3").in_table(0))
        .with_paragraph(MemoryParagraph::new("Check your answer."))
        .with_table(TableProperties {
            width: 400.0,
            font: "Calibri".into(),
            ..Default::default()
        })
}

#[test]
fn test_full_record() {
    let records = extract_records(&lesson(), &ExtractOptions::default()).unwrap();
    assert_eq!(records.len(), 4);

    let heading = &records[0];
    assert_eq!(heading.number, 1);
    assert_eq!(heading.style, "Heading 1");
    assert_eq!(heading.font_name, "Arial");
    assert_eq!(heading.font_size, 16.0);
    assert!(heading.bold);
    assert!(!heading.italic);
    assert_eq!(heading.list_value, NumberingValue::Unnumbered);

    let item = &records[1];
    assert_eq!(item.text, "1.\tAdd 1/2 1/4 = ?");
    assert_eq!(item.tab_count, 1);
    assert_eq!(item.equals_count, 1);
    assert_eq!(item.first_line_indent, -0.63);
    assert_eq!(item.hanging_indent, 1.27);
    assert_eq!(item.numbering_type, 3);
    assert_eq!(item.list_value, NumberingValue::Value(1));
    assert_eq!(item.tab_positions.len(), 2);
    assert_eq!(item.tab_positions[0].position, 1.25);
    assert_eq!(item.tab_positions[1].position, 10.5);
    assert_eq!(item.tab_positions[1].alignment, TabAlignment::Right);
    assert_eq!(item.tab_indices, vec![2]);
}

#[test]
fn test_table_paragraphs_share_ordinal() {
    let records = extract_records(&lesson(), &ExtractOptions::default()).unwrap();
    let numbers: Vec<u32> = records.iter().map(|r| r.number).collect();
    assert_eq!(numbers, [1, 2, 2, 3]);
    assert!(records[2].within_table);
    assert_eq!(records[2].table.as_ref().map(|t| t.width), Some(400.0));

    let sequential = extract_records(&lesson(), &ExtractOptions::new().sequential()).unwrap();
    let numbers: Vec<u32> = sequential.iter().map(|r| r.number).collect();
    assert_eq!(numbers, [1, 2, 3, 4]);
}

#[test]
fn test_ranges_are_monotonic() {
    let records = extract_records(&lesson(), &ExtractOptions::default()).unwrap();
    for pair in records.windows(2) {
        assert!(pair[0].range.start <= pair[0].range.end);
        assert_eq!(pair[0].range.end, pair[1].range.start);
    }
}

#[test]
fn test_paragraphs_without_tabs_have_no_tab_info() {
    let records = extract_records(&lesson(), &ExtractOptions::default()).unwrap();
    for record in records.iter().filter(|r| !r.text.contains('\t')) {
        assert!(record.tab_positions.is_empty(), "paragraph {}", record.number);
        assert!(record.tab_indices.is_empty(), "paragraph {}", record.number);
    }
}

#[test]
fn test_lenient_substitutes_defaults() {
    let doc = FlakyDocument::new(lesson(), "font");
    let records = extract_records(&doc, &ExtractOptions::new().lenient()).unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records[0].font_name, "");
    assert_eq!(records[0].font_size, 0.0);
    // Other fields are still read.
    assert_eq!(records[0].style, "Heading 1");
}

#[test]
fn test_strict_propagates_host_errors() {
    let doc = FlakyDocument::new(lesson(), "style");
    let result = extract_records(&doc, &ExtractOptions::new().strict());
    match result {
        Err(Error::HostCall(e)) => assert_eq!(e.operation, "style"),
        other => panic!("expected host error, got {:?}", other.map(|r| r.len())),
    }
}

#[test]
fn test_range_failure_aborts_in_any_mode() {
    let doc = FlakyDocument::new(lesson(), "paragraph.range");
    assert!(extract_records(&doc, &ExtractOptions::new().lenient()).is_err());
}

#[test]
fn test_tab_stop_failure_is_soft_even_when_strict() {
    let doc = FlakyDocument::new(lesson(), "tab_stops");
    let records = extract_records(&doc, &ExtractOptions::new().strict()).unwrap();
    assert_eq!(records[1].tab_count, 1);
    assert!(records[1].tab_positions.is_empty());
    assert!(records[1].tab_indices.is_empty());
}

#[test]
fn test_indent_round_trip_within_tolerance() {
    for points in [-36.0, -18.0, 0.0, 14.2, 36.0, 72.0, 113.4, 200.5] {
        let back = cm_to_points(points_to_cm(points));
        // 0.05 cm expressed in points
        assert!((back - points).abs() <= 0.05 * 28.35, "{} -> {}", points, back);
    }
}
