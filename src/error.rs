//! Error types for paragrid.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::grid::FilterError;
use crate::host::HostError;

/// Result type alias for paragrid operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting, editing or batch-processing documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV (de)serialization error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// No active document, or the host application cannot be reached.
    #[error("Host unavailable: {0}")]
    HostUnavailable(String),

    /// A single property get/set against the host failed.
    #[error(transparent)]
    HostCall(#[from] HostError),

    /// A document could not be opened.
    #[error("Failed to open {path}: {reason}")]
    Open {
        /// Path of the document
        path: PathBuf,
        /// Host-reported reason
        reason: String,
    },

    /// An operation was invoked before any data was loaded.
    #[error("No data available")]
    NoData,

    /// No row carries the given paragraph number.
    #[error("No row with paragraph number {0}")]
    RowNotFound(u32),

    /// A row position is outside the table.
    #[error("Row {0} is out of range (table has {1} rows)")]
    RowOutOfRange(usize, usize),

    /// A column name does not exist in the table.
    #[error("Unknown column: {0}")]
    ColumnNotFound(String),

    /// A value could not be interpreted for its column.
    #[error("Invalid value {value:?} for column {column}")]
    InvalidValue {
        /// Column display name
        column: String,
        /// Rejected input
        value: String,
    },

    /// Filter expression could not be parsed or evaluated.
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    /// Invalid search pattern.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error stems from user input rather than the host or the filesystem.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            Error::RowNotFound(_)
                | Error::RowOutOfRange(..)
                | Error::ColumnNotFound(_)
                | Error::InvalidValue { .. }
                | Error::Filter(_)
                | Error::Pattern(_)
        )
    }
}
