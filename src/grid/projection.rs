//! In-memory projection of extracted records with search, filter, sort and edit.

use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::host::{paragraph_index_at, HostDocument, HostResult, TextRange};
use crate::model::{Column, Field, ParagraphRecord, Value};
use crate::units::{cm_to_points, points_to_cm};

use super::filter::Filter;
use super::frame::{Frame, Row};
use super::history::FilterHistory;
use super::table_io;

/// Row count above which search and filter evaluate rows in parallel.
const PARALLEL_THRESHOLD: usize = 2048;

/// What the projection currently displays.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// A set of rows
    Rows(Frame),
    /// A rejected filter, shown in place of the rows
    Error {
        /// Evaluation error message
        message: String,
    },
}

impl View {
    /// The displayed frame, unless an error is shown.
    pub fn frame(&self) -> Option<&Frame> {
        match self {
            View::Rows(frame) => Some(frame),
            View::Error { .. } => None,
        }
    }

    /// Check if an error row is displayed.
    pub fn is_error(&self) -> bool {
        matches!(self, View::Error { .. })
    }
}

/// Result of applying a filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    /// The displayed set now holds the matching rows.
    Applied {
        /// Number of matching rows
        rows: usize,
    },
    /// The expression failed; the displayed set shows the error.
    Rejected {
        /// Error message shown in the view
        message: String,
    },
}

/// Result of pushing an edit to the host document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Memory and host were both updated.
    Applied,
    /// The column has no host counterpart; only memory was updated.
    DisplayOnly,
    /// Memory was updated but the host push failed.
    Failed(String),
}

impl EditOutcome {
    /// Check if the host holds the new value.
    pub fn is_applied(&self) -> bool {
        matches!(self, EditOutcome::Applied)
    }
}

/// Attributes applied to several paragraphs at once. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowChanges {
    /// Font name
    pub font_name: Option<String>,
    /// Font size in points
    pub font_size: Option<f64>,
    /// Paragraph style
    pub style: Option<String>,
    /// Left (hanging) indent in cm
    pub hanging_indent: Option<f64>,
    /// First-line indent in cm
    pub first_line_indent: Option<f64>,
}

impl RowChanges {
    /// Create an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the font name.
    pub fn with_font_name(mut self, name: impl Into<String>) -> Self {
        self.font_name = Some(name.into());
        self
    }

    /// Set the font size.
    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }

    /// Set the paragraph style.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// Set the hanging indent in cm.
    pub fn with_hanging_indent(mut self, cm: f64) -> Self {
        self.hanging_indent = Some(cm);
        self
    }

    /// Set the first-line indent in cm.
    pub fn with_first_line_indent(mut self, cm: f64) -> Self {
        self.first_line_indent = Some(cm);
        self
    }

    /// Check if nothing is set.
    pub fn is_empty(&self) -> bool {
        self.font_name.is_none()
            && self.font_size.is_none()
            && self.style.is_none()
            && self.hanging_indent.is_none()
            && self.first_line_indent.is_none()
    }
}

/// The tabular projection.
///
/// Holds three states: the `original` snapshot taken at load time, the
/// active `data` that edits and reorders mutate, and the displayed `view`
/// that filter, search and sort replace.
#[derive(Debug, Clone)]
pub struct Projection {
    original: Option<Frame>,
    data: Option<Frame>,
    view: View,
    history: FilterHistory,
}

impl Default for Projection {
    fn default() -> Self {
        Self::new()
    }
}

impl Projection {
    /// Create an empty projection.
    pub fn new() -> Self {
        Self::with_history(FilterHistory::new())
    }

    /// Create an empty projection with a previously saved filter history.
    pub fn with_history(history: FilterHistory) -> Self {
        Self {
            original: None,
            data: None,
            view: View::Rows(Frame::default()),
            history,
        }
    }

    /// Replace all state with freshly extracted records.
    pub fn load(&mut self, records: &[ParagraphRecord]) {
        self.load_frame(Frame::from_records(records));
    }

    /// Replace all state with a frame.
    pub fn load_frame(&mut self, frame: Frame) {
        log::info!("Loaded {} rows", frame.len());
        self.original = Some(frame.clone());
        self.view = View::Rows(frame.clone());
        self.data = Some(frame);
    }

    /// Check if data has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    /// Snapshot taken at load time.
    pub fn original(&self) -> Option<&Frame> {
        self.original.as_ref()
    }

    /// Active data.
    pub fn data(&self) -> Option<&Frame> {
        self.data.as_ref()
    }

    /// Displayed set.
    pub fn view(&self) -> &View {
        &self.view
    }

    /// Filter history.
    pub fn history(&self) -> &FilterHistory {
        &self.history
    }

    /// Mutable filter history.
    pub fn history_mut(&mut self) -> &mut FilterHistory {
        &mut self.history
    }

    fn data_ref(&self) -> Result<&Frame> {
        self.data.as_ref().ok_or(Error::NoData)
    }

    fn data_mut(&mut self) -> Result<&mut Frame> {
        self.data.as_mut().ok_or(Error::NoData)
    }

    /// Display the rows of the active data matching a filter expression.
    ///
    /// A failing expression is not an error for the caller: the view shows
    /// the message and the active data stays as it was.
    pub fn filter(&mut self, expression: &str) -> Result<FilterOutcome> {
        let data = self.data_ref()?;

        let result = Filter::compile(expression, data.columns()).and_then(|filter| {
            let keep: Vec<bool> = if data.len() >= PARALLEL_THRESHOLD {
                data.rows()
                    .par_iter()
                    .map(|row| filter.matches(&row.cells))
                    .collect::<std::result::Result<_, _>>()?
            } else {
                data.rows()
                    .iter()
                    .map(|row| filter.matches(&row.cells))
                    .collect::<std::result::Result<_, _>>()?
            };
            let rows = data
                .rows()
                .iter()
                .zip(keep)
                .filter(|(_, keep)| *keep)
                .map(|(row, _)| row.clone())
                .collect();
            Ok(data.with_rows(rows))
        });

        match result {
            Ok(frame) => {
                let rows = frame.len();
                self.view = View::Rows(frame);
                if self.history.push(expression) {
                    log::debug!("Added '{}' to filter history", expression);
                }
                Ok(FilterOutcome::Applied { rows })
            }
            Err(e) => {
                let message = format!("Error in filter expression: {}", e);
                log::error!("{}", message);
                self.view = View::Error {
                    message: message.clone(),
                };
                Ok(FilterOutcome::Rejected { message })
            }
        }
    }

    /// Display the rows of the active data containing a term in any cell
    /// (case-insensitive). Returns the number of matching rows.
    pub fn search(&mut self, term: &str) -> Result<usize> {
        let data = self.data_ref()?;
        if term.is_empty() {
            return Err(Error::InvalidValue {
                column: "search".to_string(),
                value: term.to_string(),
            });
        }

        let needle = term.to_lowercase();
        let hit = |row: &Row| row.cells.iter().any(|v| v.contains_lowercase(&needle));
        let rows: Vec<Row> = if data.len() >= PARALLEL_THRESHOLD {
            data.rows().par_iter().filter(|r| hit(r)).cloned().collect()
        } else {
            data.rows().iter().filter(|r| hit(r)).cloned().collect()
        };

        let count = rows.len();
        self.view = View::Rows(data.with_rows(rows));
        Ok(count)
    }

    /// Stable ascending sort of the displayed rows by a column.
    ///
    /// Does nothing while an error row is displayed.
    pub fn sort(&mut self, column: &str) -> Result<()> {
        self.data_ref()?;
        let View::Rows(frame) = &mut self.view else {
            return Ok(());
        };
        let index = frame
            .column_index(column)
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))?;
        frame.rows_mut().sort_by(|a, b| {
            let empty = Value::Empty;
            let left = a.get(index).unwrap_or(&empty);
            let right = b.get(index).unwrap_or(&empty);
            left.sort_cmp(right)
        });
        Ok(())
    }

    /// Display the snapshot taken at load time.
    pub fn revert(&mut self) -> Result<()> {
        let original = self.original.as_ref().ok_or(Error::NoData)?;
        self.view = View::Rows(original.clone());
        log::info!("Reverted to original data.");
        Ok(())
    }

    /// Edit a cell of every row carrying a paragraph number, then push the
    /// value to the host where the column has a host counterpart.
    ///
    /// The value is validated against the column type first; an invalid
    /// value changes nothing. Once validated, the in-memory change is kept
    /// whatever happens to the host push.
    pub fn edit_cell<D: HostDocument + ?Sized>(
        &mut self,
        doc: &mut D,
        number: u32,
        column: &str,
        new_value: &str,
    ) -> Result<EditOutcome> {
        let data = self.data_ref()?;
        let rows = data.rows_with_number(number);
        let Some(&first) = rows.first() else {
            return Err(Error::RowNotFound(number));
        };
        let range = data.range_of(first);

        let target = Column::from_name(column);
        let value = target.kind().parse(new_value).ok_or_else(|| Error::InvalidValue {
            column: target.name().to_string(),
            value: new_value.to_string(),
        })?;

        self.commit(number, &target, &value);
        log::info!("Updated paragraph {} {} = {}", number, target, value);

        let Some(push) = HostPush::for_column(&target, &value) else {
            return Ok(EditOutcome::DisplayOnly);
        };
        let Some(range) = range else {
            let reason = format!("paragraph {} has no stored range", number);
            log::error!("Error updating document: {}", reason);
            return Ok(EditOutcome::Failed(reason));
        };

        match push.apply(doc, range) {
            Ok(()) => Ok(EditOutcome::Applied),
            Err(e) => {
                log::error!(
                    "Error updating document for paragraph {} with {}: {}",
                    number,
                    target,
                    e
                );
                Ok(EditOutcome::Failed(e.to_string()))
            }
        }
    }

    /// Write a value into the active data and the displayed rows.
    fn commit(&mut self, number: u32, column: &Column, value: &Value) {
        if let Some(data) = self.data.as_mut() {
            let index = data.ensure_column(column.clone());
            data.set_by_number(number, index, value);
        }
        if let View::Rows(frame) = &mut self.view {
            let index = frame.ensure_column(column.clone());
            frame.set_by_number(number, index, value);
        }
    }

    /// Apply a change set to several paragraphs, then refresh their rows from the host.
    ///
    /// Returns one outcome per requested paragraph number, in order.
    pub fn modify_rows<D: HostDocument + ?Sized>(
        &mut self,
        doc: &mut D,
        numbers: &[u32],
        changes: &RowChanges,
    ) -> Result<Vec<(u32, EditOutcome)>> {
        self.data_ref()?;
        let pushes = HostPush::from_changes(changes);

        let mut outcomes = Vec::with_capacity(numbers.len());
        for &number in numbers {
            let data = self.data_ref()?;
            let Some(&first) = data.rows_with_number(number).first() else {
                return Err(Error::RowNotFound(number));
            };
            let Some(range) = data.range_of(first) else {
                outcomes.push((
                    number,
                    EditOutcome::Failed(format!("paragraph {} has no stored range", number)),
                ));
                continue;
            };

            let mut applied = pushes.iter().try_for_each(|push| push.apply(doc, range));
            if applied.is_ok() {
                applied = self.refresh_row(doc, number, range);
            }

            match applied {
                Ok(()) => {
                    log::info!("Applied changes to paragraph {}", number);
                    outcomes.push((number, EditOutcome::Applied));
                }
                Err(e) => {
                    log::error!("Error modifying paragraph {}: {}", number, e);
                    outcomes.push((number, EditOutcome::Failed(e.to_string())));
                }
            }
        }
        Ok(outcomes)
    }

    /// Re-read the editable attributes of a paragraph into its rows.
    fn refresh_row<D: HostDocument + ?Sized>(
        &mut self,
        doc: &mut D,
        number: u32,
        range: TextRange,
    ) -> HostResult<()> {
        let font = doc.range_font(range)?;
        let mut values = vec![
            (Field::FontName, Value::Text(font.name)),
            (Field::FontSize, Value::Float(font.size)),
        ];
        if let Some(index) = paragraph_index_at(&*doc, range)? {
            let format = doc.paragraph_format(index)?;
            values.push((Field::ParagraphStyle, Value::Text(doc.paragraph_style(index)?)));
            values.push((
                Field::HangingIndent,
                Value::Float(points_to_cm(format.left_indent)),
            ));
            values.push((
                Field::FirstLineIndent,
                Value::Float(points_to_cm(format.first_line_indent)),
            ));
        }

        for (field, value) in values {
            self.commit(number, &Column::Known(field), &value);
        }
        Ok(())
    }

    /// Select a paragraph's stored range in the host.
    pub fn goto<D: HostDocument + ?Sized>(&self, doc: &mut D, number: u32) -> Result<TextRange> {
        let data = self.data_ref()?;
        let range = data
            .rows_with_number(number)
            .first()
            .and_then(|&row| data.range_of(row))
            .ok_or(Error::RowNotFound(number))?;
        doc.select(range)?;
        log::info!("Moved to paragraph {}", number);
        Ok(range)
    }

    /// Move a row of the active data from one position to another.
    ///
    /// Only the in-memory order changes; the host document is not reordered.
    /// The displayed set becomes the reordered data.
    pub fn reorder(&mut self, old_index: usize, new_index: usize) -> Result<()> {
        let data = self.data_mut()?;
        let len = data.len();
        for index in [old_index, new_index] {
            if index >= len {
                return Err(Error::RowOutOfRange(index, len));
            }
        }
        if old_index != new_index {
            let row = data.rows_mut().remove(old_index);
            data.rows_mut().insert(new_index, row);
            log::warn!("Row order changed in memory only; the host document keeps its order");
        }
        self.view = View::Rows(data.clone());
        Ok(())
    }

    /// Export the active data as CSV.
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        table_io::export_csv(self.data_ref()?, path)
    }

    /// Import CSV as the active and displayed data.
    ///
    /// The original snapshot is kept when one exists, otherwise the import becomes it.
    pub fn import_csv<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let frame = table_io::import_csv(path)?;
        if self.original.is_none() {
            self.original = Some(frame.clone());
        }
        self.view = View::Rows(frame.clone());
        self.data = Some(frame);
        Ok(())
    }
}

/// A single host mutation derived from an edit.
#[derive(Debug, Clone, PartialEq)]
enum HostPush {
    FontName(String),
    FontSize(f64),
    Style(String),
    LeftIndent(f64),
    FirstLineIndent(f64),
}

impl HostPush {
    fn for_column(column: &Column, value: &Value) -> Option<Self> {
        let field = column.field()?;
        match (field, value) {
            (Field::FontName, Value::Text(s)) => Some(HostPush::FontName(s.clone())),
            (Field::ParagraphStyle, Value::Text(s)) => Some(HostPush::Style(s.clone())),
            (Field::FontSize, v) => v.as_f64().map(HostPush::FontSize),
            (Field::HangingIndent, v) => v.as_f64().map(|cm| HostPush::LeftIndent(cm_to_points(cm))),
            (Field::FirstLineIndent, v) => v
                .as_f64()
                .map(|cm| HostPush::FirstLineIndent(cm_to_points(cm))),
            _ => None,
        }
    }

    fn from_changes(changes: &RowChanges) -> Vec<Self> {
        let mut pushes = Vec::new();
        if let Some(name) = &changes.font_name {
            pushes.push(HostPush::FontName(name.clone()));
        }
        if let Some(size) = changes.font_size {
            pushes.push(HostPush::FontSize(size));
        }
        if let Some(style) = &changes.style {
            pushes.push(HostPush::Style(style.clone()));
        }
        if let Some(cm) = changes.hanging_indent {
            pushes.push(HostPush::LeftIndent(cm_to_points(cm)));
        }
        if let Some(cm) = changes.first_line_indent {
            pushes.push(HostPush::FirstLineIndent(cm_to_points(cm)));
        }
        pushes
    }

    fn apply<D: HostDocument + ?Sized>(&self, doc: &mut D, range: TextRange) -> HostResult<()> {
        doc.select(range).ok();
        match self {
            HostPush::FontName(name) => doc.set_font_name(range, name),
            HostPush::FontSize(size) => doc.set_font_size(range, *size),
            HostPush::Style(style) => doc.set_style(range, style),
            HostPush::LeftIndent(points) => doc.set_left_indent(range, *points),
            HostPush::FirstLineIndent(points) => doc.set_first_line_indent(range, *points),
        }
    }
}
