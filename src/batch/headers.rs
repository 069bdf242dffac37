//! Copying first-section headers between documents and setting header and
//! footer texts across whole documents.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::host::{HeaderFooterKind, HostApplication, HostDocument};
use crate::session::DocumentGuard;

use super::{display_name, SkippedFile};

/// Even-page and primary header texts of a section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionHeaders {
    /// Even-page header
    pub even: String,
    /// Primary (odd-page) header
    pub odd: String,
}

impl SectionHeaders {
    /// Read the headers of the first section.
    pub fn read<D: HostDocument + ?Sized>(doc: &D) -> Result<Self> {
        Ok(Self {
            even: strip_marks(&doc.header_text(1, HeaderFooterKind::EvenPages)?),
            odd: strip_marks(&doc.header_text(1, HeaderFooterKind::Primary)?),
        })
    }

    /// Write them into the first section.
    pub fn write<D: HostDocument + ?Sized>(&self, doc: &mut D) -> Result<()> {
        doc.set_header_text(1, HeaderFooterKind::EvenPages, &self.even)?;
        doc.set_header_text(1, HeaderFooterKind::Primary, &self.odd)?;
        Ok(())
    }
}

fn strip_marks(text: &str) -> String {
    text.trim_end_matches(['\r', '\n']).to_string()
}

/// Result of a header copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyReport {
    /// Headers that were copied
    pub headers: SectionHeaders,
    /// Destinations that received them
    pub copied: Vec<String>,
    /// Destinations that could not be opened or updated
    pub skipped: Vec<SkippedFile>,
}

/// Copy the source's first-section headers into every destination.
///
/// The source is closed without saving; each destination is saved on close.
/// Failing to open the source is an error, failing destinations are skipped.
pub fn copy_headers<A, S, P>(app: &A, source: S, destinations: &[P]) -> Result<CopyReport>
where
    A: HostApplication + ?Sized,
    S: AsRef<Path>,
    P: AsRef<Path>,
{
    let headers = {
        let doc = DocumentGuard::open(app, source.as_ref())?;
        let headers = SectionHeaders::read(&*doc)?;
        doc.close(false)?;
        headers
    };

    let mut report = CopyReport {
        headers,
        ..Default::default()
    };
    for path in destinations {
        let path = path.as_ref();
        let name = display_name(path);
        match write_headers(app, path, &report.headers) {
            Ok(()) => {
                log::info!("Copied headers to {}", name);
                report.copied.push(name);
            }
            Err(e) => {
                log::error!("Skipping {}: {}", name, e);
                report.skipped.push(SkippedFile::new(name, &e));
            }
        }
    }
    Ok(report)
}

fn write_headers<A: HostApplication + ?Sized>(
    app: &A,
    path: &Path,
    headers: &SectionHeaders,
) -> Result<()> {
    let mut doc = DocumentGuard::open(app, path)?;
    headers.write(&mut *doc)?;
    doc.close(true)
}

/// Result of a header and footer update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderFooterReport {
    /// Files that were updated
    pub updated: Vec<String>,
    /// Files that could not be opened or updated
    pub skipped: Vec<SkippedFile>,
}

/// Set every header and every footer of every section in each file.
///
/// A `None` or empty text leaves that side as it is. Files are saved on
/// close; failing files are skipped.
pub fn set_header_footer_text<A, P>(
    app: &A,
    files: &[P],
    header: Option<&str>,
    footer: Option<&str>,
) -> HeaderFooterReport
where
    A: HostApplication + ?Sized,
    P: AsRef<Path>,
{
    let header = header.filter(|t| !t.is_empty());
    let footer = footer.filter(|t| !t.is_empty());

    let mut report = HeaderFooterReport::default();
    for path in files {
        let path = path.as_ref();
        let name = display_name(path);
        let result = DocumentGuard::open(app, path).and_then(|mut doc| {
            replace_header_footer(&mut *doc, header, footer)?;
            doc.close(true)
        });
        match result {
            Ok(()) => {
                log::info!("Successfully updated header/footer in {}", name);
                report.updated.push(name);
            }
            Err(e) => {
                log::error!("Error updating header/footer of {}: {}", name, e);
                report.skipped.push(SkippedFile::new(name, &e));
            }
        }
    }
    report
}

/// Write header and footer texts into all sections and kinds of one document.
pub fn replace_header_footer<D: HostDocument + ?Sized>(
    doc: &mut D,
    header: Option<&str>,
    footer: Option<&str>,
) -> Result<()> {
    for section in 1..=doc.section_count()? {
        for kind in HeaderFooterKind::ALL {
            if let Some(text) = header {
                doc.set_header_text(section, kind, text)?;
            }
            if let Some(text) = footer {
                doc.set_footer_text(section, kind, text)?;
            }
        }
    }
    Ok(())
}
