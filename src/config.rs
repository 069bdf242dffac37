//! Persistent settings.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::batch::WalkOptions;
use crate::error::Result;
use crate::extract::ExtractOptions;

/// Default location of the filter history file.
pub const DEFAULT_HISTORY_PATH: &str = "Data/filter_history.json";

/// Default location of the CSV export.
pub const DEFAULT_CSV_PATH: &str = "Data/exported_data.csv";

/// Default directory for PDF renditions.
pub const DEFAULT_PDF_DIR: &str = "output";

/// Paths and options shared by every operation of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Filter history file
    pub history_path: PathBuf,
    /// CSV export/import file
    pub csv_path: PathBuf,
    /// Output directory for PDF export
    pub pdf_dir: PathBuf,
    /// Paragraph extraction options
    pub extract: ExtractOptions,
    /// Directory walking options
    pub walk: WalkOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_path: PathBuf::from(DEFAULT_HISTORY_PATH),
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            pdf_dir: PathBuf::from(DEFAULT_PDF_DIR),
            extract: ExtractOptions::default(),
            walk: WalkOptions::default(),
        }
    }
}

impl Settings {
    /// Create default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filter history file.
    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = path.into();
        self
    }

    /// Set the CSV file.
    pub fn with_csv_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.csv_path = path.into();
        self
    }

    /// Set the PDF output directory.
    pub fn with_pdf_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.pdf_dir = path.into();
        self
    }

    /// Set extraction options.
    pub fn with_extract(mut self, options: ExtractOptions) -> Self {
        self.extract = options;
        self
    }

    /// Set walk options.
    pub fn with_walk(mut self, options: WalkOptions) -> Self {
        self.walk = options;
        self
    }

    /// Load settings from a JSON file. Missing keys take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let settings = serde_json::from_str(&text)?;
        log::debug!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Load settings, or the defaults when the file does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write settings as pretty JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ErrorMode;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.history_path, PathBuf::from("Data/filter_history.json"));
        assert_eq!(settings.csv_path, PathBuf::from("Data/exported_data.csv"));
        assert_eq!(settings.extract.error_mode, ErrorMode::Lenient);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"csv_path": "out/table.csv"}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.csv_path, PathBuf::from("out/table.csv"));
        assert_eq!(settings.history_path, PathBuf::from(DEFAULT_HISTORY_PATH));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("settings.json");
        let settings = Settings::new()
            .with_pdf_dir("pdfs")
            .with_extract(ExtractOptions::new().strict());
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_load_or_default_missing() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_or_default(dir.path().join("none.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        assert!(Settings::load(&path).is_err());
    }
}
