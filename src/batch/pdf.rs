//! PDF export of document batches.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::detect::is_pdf;
use crate::error::{Error, Result};
use crate::host::{HostApplication, HostDocument};
use crate::session::DocumentGuard;

use super::{display_name, SkippedFile};

/// Result of a PDF export run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReport {
    /// Written PDF files
    pub exported: Vec<PathBuf>,
    /// Files that could not be converted
    pub skipped: Vec<SkippedFile>,
}

/// Output path for a document: `out_dir/<stem>.pdf`.
pub fn pdf_path(out_dir: &Path, document: &Path) -> PathBuf {
    let stem = document
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    out_dir.join(format!("{}.pdf", stem))
}

/// Export each document to `out_dir/<stem>.pdf`.
///
/// The output directory is created if needed. Documents that fail are
/// logged and skipped.
pub fn export_pdfs<A, P, O>(app: &A, files: &[P], out_dir: O) -> Result<ExportReport>
where
    A: HostApplication + ?Sized,
    P: AsRef<Path>,
    O: AsRef<Path>,
{
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir)?;

    let mut report = ExportReport::default();
    for path in files {
        let path = path.as_ref();
        let target = pdf_path(out_dir, path);
        match export_one(app, path, &target) {
            Ok(()) => {
                log::info!("Converted {} to {}", path.display(), target.display());
                report.exported.push(target);
            }
            Err(e) => {
                log::error!("Failed to convert {}: {}", path.display(), e);
                report.skipped.push(SkippedFile::new(display_name(path), &e));
            }
        }
    }
    Ok(report)
}

fn export_one<A: HostApplication + ?Sized>(app: &A, path: &Path, target: &Path) -> Result<()> {
    let mut doc = DocumentGuard::open(app, path)?;
    doc.export_pdf(target)?;
    doc.close(false)?;
    if !is_pdf(target) {
        return Err(Error::Other(format!(
            "{} is not a PDF after export",
            target.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_path() {
        assert_eq!(
            pdf_path(Path::new("out"), Path::new("/docs/Unit 1.docx")),
            PathBuf::from("out/Unit 1.pdf")
        );
        assert_eq!(
            pdf_path(Path::new("out"), Path::new("notes")),
            PathBuf::from("out/notes.pdf")
        );
    }
}
