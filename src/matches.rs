//! Pattern search across paragraphs and edits at the hits.
//!
//! Hits are addressed by [`MatchPosition`], which stays valid only until the
//! document changes length before it. [`relocate`] finds a stale hit again
//! inside its paragraph.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::host::{paragraph_index_at, HostDocument, TextRange};
use crate::model::MatchPosition;
use crate::units::points_to_cm_precise;

/// A pattern hit with the formatting of its paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Where the hit is
    pub position: MatchPosition,
    /// Text of the containing paragraph, paragraph marks as `\n`
    pub paragraph_text: String,
    /// Paragraph style
    pub style: String,
    /// First-line indent in cm
    pub first_line_indent: f64,
    /// Left indent in cm
    pub left_indent: f64,
    /// Right indent in cm
    pub right_indent: f64,
}

/// Searches paragraphs for a regular expression.
#[derive(Debug, Clone)]
pub struct MatchFinder {
    regex: Regex,
}

impl MatchFinder {
    /// Search for a regular expression.
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// Search for literal text (surrounding whitespace ignored).
    pub fn literal(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::InvalidValue {
                column: "pattern".to_string(),
                value: String::new(),
            });
        }
        Self::new(&regex::escape(text))
    }

    /// Use the regular expression when given, otherwise the selected text as a literal.
    pub fn from_input(pattern: Option<&str>, selected: Option<&str>) -> Result<Self> {
        match (pattern.filter(|p| !p.is_empty()), selected) {
            (Some(pattern), _) => Self::new(pattern),
            (None, Some(selected)) => Self::literal(selected),
            (None, None) => Err(Error::InvalidValue {
                column: "pattern".to_string(),
                value: String::new(),
            }),
        }
    }

    /// The compiled pattern.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Find every hit, paragraph by paragraph, in document order.
    pub fn find<D: HostDocument + ?Sized>(&self, doc: &D) -> Result<Vec<MatchRecord>> {
        let mut records = Vec::new();
        for index in 0..doc.paragraph_count()? {
            let range = doc.paragraph_range(index)?;
            let text = normalized_text(doc, range)?;

            let hits: Vec<(usize, usize, String)> = self
                .regex
                .find_iter(&text)
                .map(|m| {
                    let start = char_offset(&text, m.start());
                    let end = start + m.as_str().chars().count();
                    (start, end, m.as_str().to_string())
                })
                .collect();
            if hits.is_empty() {
                continue;
            }

            let style = doc.paragraph_style(index)?;
            let format = doc.paragraph_format(index)?;
            for (start, end, matched) in hits {
                records.push(MatchRecord {
                    position: MatchPosition {
                        start: range.start + start,
                        end: range.start + end,
                        matched,
                    },
                    paragraph_text: text.clone(),
                    style: style.clone(),
                    first_line_indent: points_to_cm_precise(format.first_line_indent),
                    left_indent: points_to_cm_precise(format.left_indent),
                    right_indent: points_to_cm_precise(format.right_indent),
                });
            }
        }
        log::info!("Pattern {} matched {} times", self.pattern(), records.len());
        Ok(records)
    }
}

/// Compile `pattern` and find every hit in a document.
pub fn find_matches<D: HostDocument + ?Sized>(doc: &D, pattern: &str) -> Result<Vec<MatchRecord>> {
    MatchFinder::new(pattern)?.find(doc)
}

/// Text of a range with paragraph marks as `\n`. Offsets are unchanged.
fn normalized_text<D: HostDocument + ?Sized>(doc: &D, range: TextRange) -> Result<String> {
    Ok(doc.range_text(range)?.replace('\r', "\n"))
}

fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

/// Find a hit again after edits moved it.
///
/// Returns the position unchanged when the document still holds the matched
/// text there, the corrected position when the text is found elsewhere in
/// the same paragraph, and `None` otherwise.
pub fn relocate<D: HostDocument + ?Sized>(
    doc: &D,
    position: &MatchPosition,
) -> Result<Option<MatchPosition>> {
    if let Ok(current) = normalized_text(doc, position.range()) {
        if current == position.matched {
            return Ok(Some(position.clone()));
        }
    }

    let Some(index) = paragraph_index_at(doc, position.range())? else {
        return Ok(None);
    };
    let paragraph = doc.paragraph_range(index)?;
    let text = normalized_text(doc, paragraph)?;
    Ok(text.find(&position.matched).map(|byte| {
        let start = paragraph.start + char_offset(&text, byte);
        MatchPosition {
            start,
            end: start + position.matched.chars().count(),
            matched: position.matched.clone(),
        }
    }))
}

/// Relocate a hit and select it in the host.
pub fn goto_match<D: HostDocument + ?Sized>(
    doc: &mut D,
    position: &MatchPosition,
) -> Result<MatchPosition> {
    let found = relocate(&*doc, position)?.unwrap_or_else(|| position.clone());
    doc.select(found.range())?;
    Ok(found)
}

/// New indents (points), tab stops (points) and optional replacement text for a hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndentUpdate {
    /// Left indent
    pub left: f64,
    /// First-line indent
    pub first_line: f64,
    /// Right indent
    pub right: f64,
    /// Tab-stop positions replacing all existing stops
    pub tab_stops: Vec<f64>,
    /// Replacement for the matched text
    pub text: Option<String>,
}

impl IndentUpdate {
    /// Create an update with the three indents.
    pub fn new(left: f64, first_line: f64, right: f64) -> Self {
        Self {
            left,
            first_line,
            right,
            ..Self::default()
        }
    }

    /// Set the tab stops.
    pub fn with_tab_stops(mut self, stops: Vec<f64>) -> Self {
        self.tab_stops = stops;
        self
    }

    /// Parse comma-separated tab stops such as `"36, 72.5"`.
    pub fn with_tab_list(self, list: &str) -> Result<Self> {
        let stops = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse().map_err(|_| Error::InvalidValue {
                    column: "tab stops".to_string(),
                    value: s.to_string(),
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        Ok(self.with_tab_stops(stops))
    }

    /// Replace the matched text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Apply indents, tab stops and optional text at a hit.
pub fn apply_indents<D: HostDocument + ?Sized>(
    doc: &mut D,
    position: &MatchPosition,
    update: &IndentUpdate,
) -> Result<()> {
    let range = position.range();
    doc.set_left_indent(range, update.left)?;
    doc.set_first_line_indent(range, update.first_line)?;
    doc.set_right_indent(range, update.right)?;
    doc.replace_tab_stops(range, &update.tab_stops)?;
    if let Some(text) = &update.text {
        doc.set_range_text(range, text)?;
    }
    log::info!("Updated indents at {}", range);
    Ok(())
}

/// Assign a style to the paragraph of a hit.
pub fn set_style<D: HostDocument + ?Sized>(
    doc: &mut D,
    position: &MatchPosition,
    style: &str,
) -> Result<()> {
    let range = position.range();
    doc.select(range).ok();
    doc.set_style(range, style)?;
    Ok(())
}

/// Replace the whole text of the paragraph containing a hit.
pub fn replace_text<D: HostDocument + ?Sized>(
    doc: &mut D,
    position: &MatchPosition,
    text: &str,
) -> Result<()> {
    let index = paragraph_index_at(&*doc, position.range())?.ok_or_else(|| {
        Error::Other(format!("no paragraph at {}", position.range()))
    })?;
    let paragraph = doc.paragraph_range(index)?;
    // Keep the paragraph mark.
    let body = TextRange::new(paragraph.start, paragraph.end.saturating_sub(1).max(paragraph.start));
    doc.set_range_text(body, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryDocument, MemoryParagraph};

    fn document() -> MemoryDocument {
        MemoryDocument::new("doc.docx")
            .with_paragraph(MemoryParagraph::new("Exercise 1.1").with_style("Heading 2"))
            .with_paragraph(
                MemoryParagraph::new("Solve exercise 1.2 and exercise 1.3").with_indents(36.0, 72.0),
            )
    }

    #[test]
    fn test_find_regex_across_paragraphs() {
        let doc = document();
        let finder = MatchFinder::new(r"[Ee]xercise \d\.\d").unwrap();
        let hits = finder.find(&doc).unwrap();
        assert_eq!(hits.len(), 3);

        assert_eq!(hits[0].position.start, 0);
        assert_eq!(hits[0].position.matched, "Exercise 1.1");
        assert_eq!(hits[0].style, "Heading 2");
        assert_eq!(hits[0].paragraph_text, "Exercise 1.1\n");

        // Second paragraph starts at 13.
        assert_eq!(hits[1].position.start, 13 + 6);
        assert_eq!(hits[1].left_indent, 2.54);
        assert_eq!(hits[1].first_line_indent, 1.27);
    }

    #[test]
    fn test_find_matches() {
        let doc = document();
        assert_eq!(find_matches(&doc, "exercise").unwrap().len(), 2);
        assert!(find_matches(&doc, "[").is_err());
    }

    #[test]
    fn test_literal_pattern_is_escaped() {
        let doc = document();
        let hits = MatchFinder::literal(" 1.2 ").unwrap().find(&doc).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].position.matched, "1.2");
        assert!(MatchFinder::literal("  ").is_err());
    }

    #[test]
    fn test_from_input_prefers_regex() {
        let finder = MatchFinder::from_input(Some(r"\d"), Some("x")).unwrap();
        assert_eq!(finder.pattern(), r"\d");
        let finder = MatchFinder::from_input(Some(""), Some("a.b")).unwrap();
        assert_eq!(finder.pattern(), r"a\.b");
        assert!(MatchFinder::from_input(None, None).is_err());
        assert!(matches!(
            MatchFinder::new("("),
            Err(Error::Pattern(_))
        ));
    }

    #[test]
    fn test_relocate_after_edit() {
        let mut doc = document();
        let hits = MatchFinder::new("exercise 1.3").unwrap().find(&doc).unwrap();
        let stale = hits[0].position.clone();

        // Shift the second paragraph's text by three characters.
        doc.set_range_text(TextRange::new(13, 18), "Now solve").unwrap();
        let found = relocate(&doc, &stale).unwrap().unwrap();
        assert_eq!(found.start, stale.start + 4);
        assert_eq!(doc.range_text(found.range()).unwrap(), "exercise 1.3");
    }

    #[test]
    fn test_relocate_hit_spanning_paragraph_mark() {
        let mut doc = document();
        let hit = MatchFinder::new(r"1\.3\n").unwrap().find(&doc).unwrap().remove(0);
        assert_eq!(hit.position.matched, "1.3\n");
        assert_eq!(relocate(&doc, &hit.position).unwrap(), Some(hit.position.clone()));

        doc.set_range_text(TextRange::new(13, 18), "Now solve").unwrap();
        let found = relocate(&doc, &hit.position).unwrap().unwrap();
        assert_eq!(found.start, hit.position.start + 4);
        assert_eq!(doc.range_text(found.range()).unwrap(), "1.3\r");
    }

    #[test]
    fn test_relocate_unchanged() {
        let doc = document();
        let hit = MatchFinder::new("1.1").unwrap().find(&doc).unwrap().remove(0);
        assert_eq!(relocate(&doc, &hit.position).unwrap(), Some(hit.position));
    }

    #[test]
    fn test_apply_indents_and_text() {
        let mut doc = document();
        let hit = MatchFinder::new("1.2").unwrap().find(&doc).unwrap().remove(0);
        let update = IndentUpdate::new(10.0, -5.0, 2.0)
            .with_tab_list("36, 72")
            .unwrap()
            .with_text("2.2");
        apply_indents(&mut doc, &hit.position, &update).unwrap();

        let p = &doc.paragraphs[1];
        assert_eq!(p.format.left_indent, 10.0);
        assert_eq!(p.format.first_line_indent, -5.0);
        assert_eq!(p.format.right_indent, 2.0);
        assert_eq!(p.tab_stops.len(), 2);
        assert_eq!(p.text, "Solve exercise 2.2 and exercise 1.3");
    }

    #[test]
    fn test_bad_tab_list() {
        assert!(IndentUpdate::default().with_tab_list("1, x").is_err());
    }

    #[test]
    fn test_replace_text_and_style() {
        let mut doc = document();
        let hit = MatchFinder::new("1.3").unwrap().find(&doc).unwrap().remove(0);
        set_style(&mut doc, &hit.position, "Quote").unwrap();
        replace_text(&mut doc, &hit.position, "Rewritten").unwrap();
        assert_eq!(doc.paragraphs[1].style, "Quote");
        assert_eq!(doc.paragraphs[1].text, "Rewritten");
        assert_eq!(doc.paragraphs.len(), 2);
    }
}
