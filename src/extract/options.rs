//! Extraction options and configuration.

use serde::{Deserialize, Serialize};

/// Options for extracting paragraph records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// How paragraph ordinals are assigned
    pub ordinal_mode: OrdinalMode,

    /// Whether to capture the properties of the first intersecting table
    pub capture_tables: bool,

    /// Whether to read tab stops for paragraphs containing tab characters
    pub tab_info: bool,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Fail on the first host error.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Log per-field host errors and continue with defaults.
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Set ordinal mode.
    pub fn with_ordinal_mode(mut self, mode: OrdinalMode) -> Self {
        self.ordinal_mode = mode;
        self
    }

    /// Number every paragraph, table cells included.
    pub fn sequential(mut self) -> Self {
        self.ordinal_mode = OrdinalMode::Sequential;
        self
    }

    /// Enable or disable table property capture.
    pub fn with_tables(mut self, capture: bool) -> Self {
        self.capture_tables = capture;
        self
    }

    /// Enable or disable tab-stop extraction.
    pub fn with_tab_info(mut self, enabled: bool) -> Self {
        self.tab_info = enabled;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Lenient,
            ordinal_mode: OrdinalMode::SkipTables,
            capture_tables: true,
            tab_info: true,
        }
    }
}

/// Error handling mode during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Fail on any host error
    Strict,
    /// Log and default the failing field
    #[default]
    Lenient,
}

/// How paragraph ordinals advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrdinalMode {
    /// Paragraphs inside tables share the ordinal of the preceding body paragraph
    #[default]
    SkipTables,
    /// Every paragraph gets its own ordinal
    Sequential,
}
