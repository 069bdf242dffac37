//! Document format detection.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Kinds of files the batch tools handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Legacy binary Word document (OLE compound file)
    Doc,
    /// Office Open XML document (ZIP container)
    Docx,
    /// JSON document snapshot
    Snapshot,
    /// PDF rendition
    Pdf,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentKind::Doc => "DOC",
            DocumentKind::Docx => "DOCX",
            DocumentKind::Snapshot => "snapshot",
            DocumentKind::Pdf => "PDF",
        };
        f.write_str(name)
    }
}

const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const PDF_MAGIC: &[u8] = b"%PDF-";

impl DocumentKind {
    /// Kind implied by a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "doc" => Some(DocumentKind::Doc),
            "docx" => Some(DocumentKind::Docx),
            "json" => Some(DocumentKind::Snapshot),
            "pdf" => Some(DocumentKind::Pdf),
            _ => None,
        }
    }

    /// Kind implied by a path's extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Detect the kind of a file from its leading bytes.
pub fn detect_format_from_bytes(data: &[u8]) -> Option<DocumentKind> {
    if data.starts_with(OLE_MAGIC) {
        return Some(DocumentKind::Doc);
    }
    if data.starts_with(ZIP_MAGIC) {
        return Some(DocumentKind::Docx);
    }
    if data.starts_with(PDF_MAGIC) {
        return Some(DocumentKind::Pdf);
    }
    let text = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    match text.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => Some(DocumentKind::Snapshot),
        _ => None,
    }
}

/// Detect the kind of a file from its leading bytes.
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<Option<DocumentKind>> {
    let mut header = Vec::with_capacity(64);
    File::open(path)?.take(64).read_to_end(&mut header)?;
    Ok(detect_format_from_bytes(&header))
}

/// Check if a file is a PDF.
pub fn is_pdf<P: AsRef<Path>>(path: P) -> bool {
    matches!(detect_format_from_path(path), Ok(Some(DocumentKind::Pdf)))
}
