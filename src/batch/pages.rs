//! Page-number continuation across a sequence of documents.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::host::{HostApplication, HostDocument};
use crate::session::DocumentGuard;

use super::{display_name, prepare_layout, SkippedFile};

/// Page numbers assigned to one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageNumbering {
    /// Number given to the first page
    pub starting_page: u32,
    /// Number the host shows on the last page after re-layout
    pub ending_page: u32,
    /// Total pages of the document
    pub total_pages: u32,
}

/// Starting number for the document after this one.
///
/// When the host's last rendered page is below its page count the numbering
/// continues from that page; otherwise the page count is added to the
/// current start.
pub fn next_start(numbering: &PageNumbering) -> u32 {
    if numbering.ending_page < numbering.total_pages {
        numbering.ending_page + 1
    } else {
        numbering.starting_page.saturating_add(numbering.total_pages)
    }
}

/// Restart numbering of a document at `start` and read back its page numbers.
///
/// The first header paragraph is shrunk before the pages are read.
pub fn apply_start<D: HostDocument + ?Sized>(doc: &mut D, start: u32) -> Result<PageNumbering> {
    prepare_layout(doc);
    doc.set_page_numbering(1, true, start)?;
    let ending_page = doc.last_rendered_page()?;
    let total_pages = doc.page_count()?;
    Ok(PageNumbering {
        starting_page: start,
        ending_page,
        total_pages,
    })
}

/// Numbering applied to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedFile {
    /// File name
    pub file: String,
    /// Applied numbering
    #[serde(flatten)]
    pub numbering: PageNumbering,
}

/// Result of a continuation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationReport {
    /// Renumbered files, in processing order
    pub files: Vec<PagedFile>,
    /// Files that could not be opened or renumbered
    pub skipped: Vec<SkippedFile>,
    /// Start the next document in the sequence would get
    pub next_start: u32,
}

/// Number the pages of `files` consecutively, beginning at `first_page`.
///
/// Files are processed in the given order and saved on close. A file that
/// fails is skipped and does not advance the numbering.
pub fn continue_page_numbers<A, P>(app: &A, files: &[P], first_page: u32) -> PaginationReport
where
    A: HostApplication + ?Sized,
    P: AsRef<Path>,
{
    let mut report = PaginationReport {
        next_start: first_page,
        ..Default::default()
    };

    for path in files {
        let path = path.as_ref();
        let name = display_name(path);
        match renumber(app, path, report.next_start) {
            Ok(numbering) => {
                log::info!(
                    "{}: pages {}..{} of {}",
                    name,
                    numbering.starting_page,
                    numbering.ending_page,
                    numbering.total_pages
                );
                report.next_start = next_start(&numbering);
                report.files.push(PagedFile {
                    file: name,
                    numbering,
                });
            }
            Err(e) => {
                log::error!("Skipping {}: {}", name, e);
                report.skipped.push(SkippedFile::new(name, &e));
            }
        }
    }
    report
}

fn renumber<A: HostApplication + ?Sized>(app: &A, path: &Path, start: u32) -> Result<PageNumbering> {
    let mut doc = DocumentGuard::open(app, path)?;
    let numbering = apply_start(&mut *doc, start)?;
    doc.close(true)?;
    Ok(numbering)
}

/// Join file names to a directory.
pub fn in_directory<S: AsRef<str>>(dir: &Path, names: &[S]) -> Vec<PathBuf> {
    names.iter().map(|n| dir.join(n.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryDocument;

    fn numbering(start: u32, end: u32, total: u32) -> PageNumbering {
        PageNumbering {
            starting_page: start,
            ending_page: end,
            total_pages: total,
        }
    }

    #[test]
    fn test_next_start() {
        // Last rendered page below the page count continues from it.
        assert_eq!(next_start(&numbering(1, 3, 5)), 4);
        // Otherwise the page count is added.
        assert_eq!(next_start(&numbering(1, 5, 5)), 6);
        assert_eq!(next_start(&numbering(6, 8, 3)), 9);
        assert_eq!(next_start(&numbering(u32::MAX - 1, u32::MAX, 5)), u32::MAX);
    }

    #[test]
    fn test_apply_start() {
        let mut doc = MemoryDocument::new("a.docx").with_pages(3);
        let applied = apply_start(&mut doc, 6).unwrap();
        assert_eq!(applied, numbering(6, 8, 3));
        assert!(doc.sections[0].restart_numbering);
        assert_eq!(doc.sections[0].starting_number, 6);
        assert_eq!(doc.sections[0].header_paragraph.font_size, 1.0);
    }

    #[test]
    fn test_apply_start_at_page_bounds() {
        let mut empty = MemoryDocument::new("a.docx").with_pages(0);
        assert_eq!(apply_start(&mut empty, 0).unwrap(), numbering(0, 0, 0));

        let mut long = MemoryDocument::new("b.docx").with_pages(3);
        assert!(apply_start(&mut long, u32::MAX).is_err());
    }

    #[test]
    fn test_in_directory() {
        let paths = in_directory(Path::new("/d"), &["a.docx", "b.docx"]);
        assert_eq!(paths, [PathBuf::from("/d/a.docx"), PathBuf::from("/d/b.docx")]);
    }
}
