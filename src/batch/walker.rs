//! Directory scanning and per-file document properties.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detect::{detect_format_from_path, DocumentKind};
use crate::error::Result;
use crate::host::{HeaderFooterKind, HostApplication, HostDocument};
use crate::session::DocumentGuard;

use super::prepare_layout;
use super::sort::sort_natural;

/// Which files a directory walk picks up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkOptions {
    /// Accepted extensions, compared case-insensitively
    pub extensions: Vec<String>,
    /// File-name prefixes that mark temporary or hidden files
    pub excluded_prefixes: Vec<String>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["doc".to_string(), "docx".to_string()],
            excluded_prefixes: vec!["~".to_string(), ".".to_string()],
        }
    }
}

impl WalkOptions {
    /// Create default walk options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the accepted extensions.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Add an excluded prefix.
    pub fn exclude_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.excluded_prefixes.push(prefix.into());
        self
    }

    /// Whether a file name passes the filters.
    pub fn accepts(&self, name: &str) -> bool {
        if self
            .excluded_prefixes
            .iter()
            .any(|p| !p.is_empty() && name.starts_with(p.as_str()))
        {
            return false;
        }
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|a| a.eq_ignore_ascii_case(ext)))
    }
}

/// List candidate documents of a directory in natural order.
pub fn list_documents<P: AsRef<Path>>(dir: P, options: &WalkOptions) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if options.accepts(&name) {
            names.push(name);
        }
    }
    sort_natural(&mut names);
    Ok(names)
}

/// Header or footer text of the first section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderInfo {
    /// Both the even-page and the primary text are empty
    NotDeclared,
    /// At least one of them has text
    Declared {
        /// Even-page text
        even: String,
        /// Primary (odd-page) text
        odd: String,
    },
}

impl HeaderInfo {
    /// Classify a pair of texts. Surrounding whitespace and paragraph marks are ignored.
    pub fn from_texts(even: &str, odd: &str) -> Self {
        let (even, odd) = (even.trim(), odd.trim());
        if even.is_empty() && odd.is_empty() {
            HeaderInfo::NotDeclared
        } else {
            HeaderInfo::Declared {
                even: even.to_string(),
                odd: odd.to_string(),
            }
        }
    }

    /// Whether any text is present.
    pub fn is_declared(&self) -> bool {
        matches!(self, HeaderInfo::Declared { .. })
    }
}

impl fmt::Display for HeaderInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderInfo::NotDeclared => f.write_str("Not declared"),
            HeaderInfo::Declared { .. } => f.write_str("Headers"),
        }
    }
}

/// Page and header facts of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentProperties {
    /// Total pages
    pub pages: u32,
    /// Number of sections
    pub sections: usize,
    /// Headers of the first section
    pub headers: HeaderInfo,
    /// Footers of the first section
    pub footers: HeaderInfo,
    /// Page number shown on the first page
    pub starting_page: u32,
    /// Page number shown on the last page
    pub ending_page: u32,
    /// When the document was measured
    pub processed_at: DateTime<Utc>,
}

/// Read page counts, section count, header/footer texts and rendered page numbers.
///
/// The first header paragraph is shrunk before anything is measured.
pub fn extract_properties<D: HostDocument + ?Sized>(doc: &mut D) -> Result<DocumentProperties> {
    prepare_layout(doc);
    let pages = doc.page_count()?;
    let sections = doc.section_count()?;
    let starting_page = doc.first_rendered_page()?;
    let ending_page = doc.last_rendered_page()?;
    log::debug!("{}: last page number {}", doc.name(), ending_page);

    let headers = HeaderInfo::from_texts(
        &doc.header_text(1, HeaderFooterKind::EvenPages)?,
        &doc.header_text(1, HeaderFooterKind::Primary)?,
    );
    let footers = HeaderInfo::from_texts(
        &doc.footer_text(1, HeaderFooterKind::EvenPages)?,
        &doc.footer_text(1, HeaderFooterKind::Primary)?,
    );

    Ok(DocumentProperties {
        pages,
        sections,
        headers,
        footers,
        starting_page,
        ending_page,
        processed_at: Utc::now(),
    })
}

/// Result of processing one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Properties were read
    Processed(DocumentProperties),
    /// The file could not be opened or measured
    Failed {
        /// What went wrong
        reason: String,
    },
}

/// One file of a directory scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    /// File name within the scanned directory
    pub file: String,
    /// Container format sniffed from the file's bytes
    pub kind: Option<DocumentKind>,
    /// Outcome
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

impl FileReport {
    /// Properties, if the file was processed.
    pub fn properties(&self) -> Option<&DocumentProperties> {
        match &self.outcome {
            FileOutcome::Processed(props) => Some(props),
            FileOutcome::Failed { .. } => None,
        }
    }
}

/// Result of a directory scan, files in processing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Scanned directory
    pub directory: PathBuf,
    /// Per-file results
    pub files: Vec<FileReport>,
    /// Scan start
    pub started_at: DateTime<Utc>,
    /// Scan end
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    /// Files that were processed.
    pub fn processed(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.properties().is_some())
    }

    /// Files that failed.
    pub fn failed(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.properties().is_none())
    }

    /// Names in processing order.
    pub fn file_names(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.file.as_str()).collect()
    }
}

/// Walks a directory and measures each document.
pub struct Walker<'a, A: HostApplication + ?Sized> {
    app: &'a A,
    options: WalkOptions,
}

impl<'a, A: HostApplication + ?Sized> Walker<'a, A> {
    /// Create a walker over a host.
    pub fn new(app: &'a A, options: WalkOptions) -> Self {
        Self { app, options }
    }

    /// Walk options.
    pub fn options(&self) -> &WalkOptions {
        &self.options
    }

    /// Candidate documents of a directory, in processing order.
    pub fn list<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<String>> {
        list_documents(dir, &self.options)
    }

    /// Open, measure and close one file. Failures are recorded, not returned.
    pub fn process_file(&self, dir: &Path, name: &str) -> FileReport {
        let path = dir.join(name);
        let kind = detect_format_from_path(&path)
            .ok()
            .flatten()
            .or_else(|| DocumentKind::from_path(&path));
        let outcome = match self.measure(&path) {
            Ok(props) => {
                log::info!(
                    "{}: {} pages, {} sections, headers {}",
                    name,
                    props.pages,
                    props.sections,
                    props.headers
                );
                FileOutcome::Processed(props)
            }
            Err(e) => {
                log::error!("Skipping {}: {}", path.display(), e);
                FileOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };
        FileReport {
            file: name.to_string(),
            kind,
            outcome,
        }
    }

    fn measure(&self, path: &Path) -> Result<DocumentProperties> {
        let mut doc = DocumentGuard::open(self.app, path)?;
        let props = extract_properties(&mut *doc)?;
        doc.close(false)?;
        Ok(props)
    }

    /// Process every candidate document of a directory.
    pub fn scan<P: AsRef<Path>>(&self, dir: P) -> Result<BatchReport> {
        self.scan_with(dir, |_| {})
    }

    /// Process every candidate document, calling `on_file` after each one.
    pub fn scan_with<P, F>(&self, dir: P, mut on_file: F) -> Result<BatchReport>
    where
        P: AsRef<Path>,
        F: FnMut(&FileReport),
    {
        let dir = dir.as_ref();
        let started_at = Utc::now();
        let names = self.list(dir)?;
        log::info!("Processing {} documents in {}", names.len(), dir.display());

        let mut files = Vec::with_capacity(names.len());
        for name in &names {
            let report = self.process_file(dir, name);
            on_file(&report);
            files.push(report);
        }

        Ok(BatchReport {
            directory: dir.to_path_buf(),
            files,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

/// Scan a directory with the given host and options.
pub fn scan_directory<A, P>(app: &A, dir: P, options: &WalkOptions) -> Result<BatchReport>
where
    A: HostApplication + ?Sized,
    P: AsRef<Path>,
{
    Walker::new(app, options.clone()).scan(dir)
}
