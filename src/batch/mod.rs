//! Batch processing of document folders.
//!
//! Lists the documents of a directory in natural "Unit N" order and runs one
//! operation per file: measuring pages and headers, continuing page numbers,
//! copying headers, or exporting PDFs. A file that fails is logged and
//! recorded, never aborting the batch.

pub mod headers;
pub mod pages;
pub mod pdf;
pub mod sort;
pub mod walker;
pub mod worker;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::host::HostDocument;

pub use headers::{
    copy_headers, set_header_footer_text, CopyReport, HeaderFooterReport, SectionHeaders,
};
pub use pages::{continue_page_numbers, next_start, PageNumbering, PagedFile, PaginationReport};
pub use pdf::{export_pdfs, pdf_path, ExportReport};
pub use sort::{natural_sort_key, sort_natural, SortKey};
pub use walker::{
    extract_properties, list_documents, scan_directory, BatchReport, DocumentProperties,
    FileOutcome, FileReport, HeaderInfo, WalkOptions, Walker,
};
pub use worker::{spawn_walk, BatchEvent};

/// A file a batch operation had to skip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    /// File name
    pub file: String,
    /// What went wrong
    pub reason: String,
}

impl SkippedFile {
    /// Record a skipped file.
    pub fn new(file: impl Into<String>, error: &Error) -> Self {
        Self {
            file: file.into(),
            reason: error.to_string(),
        }
    }
}

/// Shrink the first header paragraph before pages are measured.
///
/// A host that cannot reach the header is measured as it is.
pub(crate) fn prepare_layout<D: HostDocument + ?Sized>(doc: &mut D) {
    if let Err(e) = doc.adjust_first_header() {
        log::warn!("{}: header left as is: {}", doc.name(), e);
    }
}

/// File name of a path, or the whole path when it has none.
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
