//! # paragrid
//!
//! Paragraph metadata extraction, tabular editing and batch processing for
//! word-processing documents.
//!
//! The library drives a host application through the [`HostDocument`] and
//! [`HostApplication`] traits. It reads one flat [`ParagraphRecord`] per
//! paragraph (style, indents, fonts, tab stops, numbering, table membership),
//! holds the records in a [`Projection`] that can be filtered, searched,
//! sorted and edited, and writes edits back into the document.
//!
//! ## Quick Start
//!
//! ```no_run
//! use paragrid::{extract_file, Projection};
//!
//! fn main() -> paragrid::Result<()> {
//!     let records = extract_file("Unit 1.docx")?;
//!
//!     let mut projection = Projection::new();
//!     projection.load(&records);
//!     projection.filter("`Font Size` > 12 and `Is Bold` == True")?;
//!     println!("{} rows", projection.view().frame().map_or(0, |f| f.len()));
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Paragraph records**: indents in cm, tab stops on a 0.05 cm grid, list numbering
//! - **Projection**: column filter expressions, search, sort, revert, CSV export/import
//! - **Write-back**: edits are committed in memory, then pushed to the host
//! - **Pattern matches**: regex search with indent, tab-stop and style updates
//! - **Batch processing**: page continuation, header copy and PDF export across folders
//! - **Snapshot host**: JSON documents stand in for a live application

pub mod batch;
pub mod config;
pub mod detect;
pub mod error;
pub mod extract;
pub mod grid;
pub mod host;
pub mod matches;
pub mod model;
pub mod render;
pub mod session;
pub mod units;

// Re-export commonly used types
pub use batch::{
    continue_page_numbers, copy_headers, export_pdfs, scan_directory, set_header_footer_text,
    spawn_walk, BatchEvent, BatchReport, DocumentProperties, HeaderInfo, PageNumbering,
    WalkOptions,
};
pub use config::Settings;
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf, DocumentKind};
pub use error::{Error, Result};
pub use extract::{extract_records, ErrorMode, ExtractOptions, Extractor, OrdinalMode};
pub use grid::{
    EditOutcome, Filter, FilterError, FilterHistory, FilterOutcome, Frame, Projection, RowChanges,
    View,
};
pub use host::{
    HostApplication, HostDocument, HostError, MemoryApplication, MemoryDocument, TextRange,
};
pub use matches::{find_matches, IndentUpdate, MatchFinder, MatchRecord};
pub use model::{Column, Field, MatchPosition, NumberingValue, ParagraphRecord, Value};
pub use render::{JsonFormat, TableOptions};
pub use session::{DocumentGuard, Session};

use std::path::Path;

/// Extract paragraph records from a JSON document snapshot.
///
/// # Example
///
/// ```no_run
/// use paragrid::extract_file;
///
/// let records = extract_file("Unit 1.docx").unwrap();
/// println!("Paragraphs: {}", records.len());
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<Vec<ParagraphRecord>> {
    extract_file_with_options(path, &ExtractOptions::default())
}

/// Extract paragraph records from a JSON document snapshot with custom options.
///
/// # Example
///
/// ```no_run
/// use paragrid::{extract_file_with_options, ExtractOptions};
///
/// let options = ExtractOptions::new().strict().sequential();
/// let records = extract_file_with_options("Unit 1.docx", &options).unwrap();
/// ```
pub fn extract_file_with_options<P: AsRef<Path>>(
    path: P,
    options: &ExtractOptions,
) -> Result<Vec<ParagraphRecord>> {
    let app = MemoryApplication::new();
    let doc = DocumentGuard::open(&app, path)?;
    let records = extract_records(&*doc, options)?;
    doc.close(false)?;
    Ok(records)
}

/// Extract a snapshot and render its records as JSON.
///
/// # Example
///
/// ```no_run
/// use paragrid::{to_json, JsonFormat};
///
/// let json = to_json("Unit 1.docx", JsonFormat::Pretty).unwrap();
/// std::fs::write("records.json", json).unwrap();
/// ```
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let records = extract_file(path)?;
    render::to_json(&records, format)
}

/// Builder for extracting a document into a projection.
///
/// # Example
///
/// ```no_run
/// use paragrid::Paragrid;
///
/// let projection = Paragrid::new()
///     .strict()
///     .sequential()
///     .with_history("Data/filter_history.json")
///     .load("Unit 1.docx")?;
/// # Ok::<(), paragrid::Error>(())
/// ```
pub struct Paragrid {
    options: ExtractOptions,
    history: Option<std::path::PathBuf>,
}

impl Paragrid {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            options: ExtractOptions::default(),
            history: None,
        }
    }

    /// Fail on the first host error.
    pub fn strict(mut self) -> Self {
        self.options = self.options.strict();
        self
    }

    /// Log host errors and substitute defaults.
    pub fn lenient(mut self) -> Self {
        self.options = self.options.lenient();
        self
    }

    /// Give every paragraph its own ordinal, including those in tables.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Skip table properties.
    pub fn without_tables(mut self) -> Self {
        self.options = self.options.with_tables(false);
        self
    }

    /// Load filter history from this file.
    pub fn with_history(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.history = Some(path.into());
        self
    }

    /// Extraction options in effect.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract records from an open document.
    pub fn extract<D: HostDocument + ?Sized>(&self, doc: &D) -> Result<Vec<ParagraphRecord>> {
        extract_records(doc, &self.options)
    }

    /// Extract a JSON snapshot into a loaded projection.
    pub fn load<P: AsRef<Path>>(self, path: P) -> Result<Projection> {
        let records = extract_file_with_options(path, &self.options)?;
        let mut projection = match &self.history {
            Some(path) => Projection::with_history(FilterHistory::load(path)),
            None => Projection::new(),
        };
        projection.load(&records);
        Ok(projection)
    }
}

impl Default for Paragrid {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryParagraph;

    fn snapshot(dir: &Path) -> std::path::PathBuf {
        let doc = MemoryDocument::new("a.docx")
            .with_paragraph(MemoryParagraph::new("Title").with_style("Heading 1"))
            .with_paragraph(MemoryParagraph::new("Body, text"));
        let path = dir.join("a.docx");
        std::fs::write(&path, doc.to_json().unwrap()).unwrap();
        path
    }

    #[test]
    fn test_extract_file() {
        let dir = tempfile::tempdir().unwrap();
        let records = extract_file(snapshot(dir.path())).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].style, "Heading 1");
        assert_eq!(records[1].text, "Body text");
    }

    #[test]
    fn test_to_json() {
        let dir = tempfile::tempdir().unwrap();
        let json = to_json(snapshot(dir.path()), JsonFormat::Compact).unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains("Heading 1"));
    }

    #[test]
    fn test_builder_load() {
        let dir = tempfile::tempdir().unwrap();
        let projection = Paragrid::new()
            .strict()
            .with_history(dir.path().join("history.json"))
            .load(snapshot(dir.path()))
            .unwrap();
        assert!(projection.is_loaded());
        assert!(projection.history().is_empty());
    }

    #[test]
    fn test_missing_file() {
        let result = extract_file("/nonexistent/a.docx");
        assert!(matches!(result, Err(Error::Open { .. })));
    }
}
