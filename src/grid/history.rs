//! Persistent list of applied filter expressions.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Ordered, duplicate-free filter history stored as a JSON array of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterHistory {
    entries: Vec<String>,
}

impl FilterHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a history file.
    ///
    /// A missing, unreadable or malformed file yields an empty history.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No filter history at {}", path.display());
                return Self::new();
            }
            Err(e) => {
                log::warn!("Failed to read filter history {}: {}", path.display(), e);
                return Self::new();
            }
        };

        if content.trim().is_empty() {
            return Self::new();
        }

        match serde_json::from_str(&content) {
            Ok(history) => {
                log::info!("Filter history loaded.");
                history
            }
            Err(e) => {
                log::warn!("Ignoring malformed filter history {}: {}", path.display(), e);
                Self::new()
            }
        }
    }

    /// Write the history, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string(&self.entries)?)?;
        log::info!("Filter history saved.");
        Ok(())
    }

    /// Append an expression unless already present. Returns whether it was added.
    pub fn push(&mut self, expression: impl Into<String>) -> bool {
        let expression = expression.into();
        if self.contains(&expression) {
            return false;
        }
        self.entries.push(expression);
        true
    }

    /// Check if an expression is recorded.
    pub fn contains(&self, expression: &str) -> bool {
        self.entries.iter().any(|e| e == expression)
    }

    /// Recorded expressions, oldest first.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Number of recorded expressions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the history is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
