//! Paragraph feature extraction.

use crate::error::Result;
use crate::host::{HostDocument, HostResult, TabStop};
use crate::model::{NumberingValue, ParagraphRecord, TabPosition};
use crate::units::{emu_to_cm, points_to_cm};

use super::options::{ErrorMode, ExtractOptions, OrdinalMode};

/// Walks a document's paragraphs and builds one record per paragraph.
///
/// Extraction is read-only. Per-field host failures follow the configured
/// [`ErrorMode`]; failures reading a paragraph's range or text always abort
/// the pass.
pub struct Extractor<'a, D: HostDocument + ?Sized> {
    doc: &'a D,
    options: ExtractOptions,
}

impl<'a, D: HostDocument + ?Sized> Extractor<'a, D> {
    /// Create an extractor over a document.
    pub fn new(doc: &'a D, options: ExtractOptions) -> Self {
        Self { doc, options }
    }

    /// Get the extraction options.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract all paragraphs in document order.
    pub fn extract(&self) -> Result<Vec<ParagraphRecord>> {
        self.extract_with_progress(|_| {})
    }

    /// Extract all paragraphs, reporting the completed fraction after each one.
    pub fn extract_with_progress<F>(&self, mut progress: F) -> Result<Vec<ParagraphRecord>>
    where
        F: FnMut(f64),
    {
        let total = self.doc.paragraph_count()?;
        log::info!(
            "Extracting {} paragraphs from {}",
            total,
            self.doc.name()
        );

        let mut records = Vec::with_capacity(total);
        let mut ordinal = 0u32;
        for index in 0..total {
            let record = self.extract_paragraph(index, &mut ordinal)?;
            records.push(record);
            progress((index + 1) as f64 / total as f64);
        }

        log::info!("Extraction completed: {} records", records.len());
        Ok(records)
    }

    fn extract_paragraph(&self, index: usize, ordinal: &mut u32) -> Result<ParagraphRecord> {
        let range = self.doc.paragraph_range(index)?;
        let raw = self.doc.range_text(range)?;
        let body = strip_paragraph_mark(&raw);

        let tables = self.field(index, "tables", self.doc.tables_in_range(range))?;
        let within_table = !tables.is_empty();

        if !within_table || self.options.ordinal_mode == OrdinalMode::Sequential {
            *ordinal += 1;
        }

        let mut record = ParagraphRecord::new(*ordinal, range);
        record.within_table = within_table;
        if self.options.capture_tables {
            record.table = tables.into_iter().next();
        }

        record.text = body.replace(',', "");
        record.tab_count = body.matches('\t').count();
        record.equals_count = body.matches('=').count();

        record.style = self.field(index, "style", self.doc.paragraph_style(index))?;

        let format = self.field(index, "paragraph_format", self.doc.paragraph_format(index))?;
        record.first_line_indent = points_to_cm(format.first_line_indent);
        record.hanging_indent = points_to_cm(format.left_indent);
        record.spacing_before = format.space_before;
        record.spacing_after = format.space_after;

        let font = self.field(index, "font", self.doc.range_font(range))?;
        record.font_name = font.name;
        record.font_size = font.size;
        record.bold = font.bold;
        record.italic = font.italic;

        let counts = self.field(index, "counts", self.doc.range_counts(range))?;
        record.character_count = counts.characters;
        record.word_count = counts.words;

        let list = self.field(index, "list_format", self.doc.list_format(index))?;
        record.numbering_type = list.list_type;
        record.list_value = NumberingValue::from_list(list.list_type, list.list_value);

        if self.options.tab_info && record.tab_count > 0 {
            match self.doc.tab_stops(index) {
                Ok(stops) => {
                    record.tab_positions = tab_positions(&stops);
                    record.tab_indices = tab_character_indices(body);
                }
                Err(e) => {
                    log::warn!("Failed to read tab stops of paragraph {}: {}", index + 1, e);
                }
            }
        }

        Ok(record)
    }

    /// Apply the error mode to a single field read.
    fn field<T: Default>(&self, index: usize, what: &str, result: HostResult<T>) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                if self.options.error_mode == ErrorMode::Strict {
                    return Err(e.into());
                }
                log::warn!("Failed to read {} of paragraph {}: {}", what, index + 1, e);
                Ok(T::default())
            }
        }
    }
}

/// Extract all paragraph records of a document.
pub fn extract_records<D: HostDocument + ?Sized>(
    doc: &D,
    options: &ExtractOptions,
) -> Result<Vec<ParagraphRecord>> {
    Extractor::new(doc, options.clone()).extract()
}

/// Remove the trailing paragraph or cell mark.
pub fn strip_paragraph_mark(text: &str) -> &str {
    text.trim_end_matches(['\r', '\n', '\u{7}'])
}

/// Convert declared tab stops to centimeters on the 0.05 grid.
pub fn tab_positions(stops: &[TabStop]) -> Vec<TabPosition> {
    stops
        .iter()
        .map(|s| TabPosition {
            position: emu_to_cm(s.position),
            alignment: s.alignment,
        })
        .collect()
}

/// Character indices of every tab in the text.
pub fn tab_character_indices(text: &str) -> Vec<usize> {
    text.chars()
        .enumerate()
        .filter(|(_, c)| *c == '\t')
        .map(|(i, _)| i)
        .collect()
}
