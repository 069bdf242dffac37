//! Table rendering options.

/// Options for rendering a frame as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    /// Columns to show, by name; all columns when empty
    pub columns: Vec<String>,

    /// Maximum characters per cell (0 = unlimited)
    pub max_cell_width: usize,

    /// Maximum rows to show (0 = all)
    pub max_rows: usize,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            max_cell_width: 40,
            max_rows: 0,
        }
    }
}

impl TableOptions {
    /// Create new table options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Show only these columns.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Truncate cells to this many characters.
    pub fn with_max_cell_width(mut self, width: usize) -> Self {
        self.max_cell_width = width;
        self
    }

    /// Show at most this many rows.
    pub fn with_max_rows(mut self, rows: usize) -> Self {
        self.max_rows = rows;
        self
    }
}
