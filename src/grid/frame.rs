//! Column-typed table of paragraph rows.

use serde::{Deserialize, Serialize};

use crate::host::TextRange;
use crate::model::{Column, Field, ParagraphRecord, Value};

/// One row of cells, aligned with the frame's columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Cells in column order
    pub cells: Vec<Value>,
}

impl Row {
    /// Create a row from cells.
    pub fn new(cells: Vec<Value>) -> Self {
        Self { cells }
    }

    /// Cell at a column index.
    pub fn get(&self, column: usize) -> Option<&Value> {
        self.cells.get(column)
    }
}

/// An ordered list of columns and rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Frame {
    /// Create an empty frame with the given columns.
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a frame with every known field from extracted records.
    pub fn from_records(records: &[ParagraphRecord]) -> Self {
        let columns = Field::ALL.iter().copied().map(Column::Known).collect();
        let rows = records
            .iter()
            .map(|r| Row::new(Field::ALL.iter().map(|f| f.value_of(r)).collect()))
            .collect();
        Self { columns, rows }
    }

    /// Columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Rows in order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Mutable rows.
    pub fn rows_mut(&mut self) -> &mut Vec<Row> {
        &mut self.rows
    }

    /// Append a row, padding or truncating it to the column count.
    pub fn push_row(&mut self, mut row: Row) {
        row.cells.resize(self.columns.len(), Value::Empty);
        self.rows.push(row);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by header, key or alias.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.matches(name))
    }

    /// Index of a known field's column.
    pub fn field_index(&self, field: Field) -> Option<usize> {
        self.columns.iter().position(|c| c.field() == Some(field))
    }

    /// Index of a column, adding it (with empty cells) when missing.
    pub fn ensure_column(&mut self, column: Column) -> usize {
        if let Some(i) = self.columns.iter().position(|c| *c == column) {
            return i;
        }
        self.columns.push(column);
        for row in &mut self.rows {
            row.cells.push(Value::Empty);
        }
        self.columns.len() - 1
    }

    /// Cell at row and column.
    pub fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Paragraph number of a row.
    pub fn number_of(&self, row: usize) -> Option<i64> {
        let col = self.field_index(Field::ParagraphNumber)?;
        self.cell(row, col).and_then(Value::as_i64)
    }

    /// Stored paragraph range of a row.
    pub fn range_of(&self, row: usize) -> Option<TextRange> {
        let col = self.field_index(Field::ParagraphRange)?;
        match self.cell(row, col) {
            Some(Value::Range(r)) => Some(*r),
            _ => None,
        }
    }

    /// Positions of all rows carrying a paragraph number.
    pub fn rows_with_number(&self, number: u32) -> Vec<usize> {
        (0..self.rows.len())
            .filter(|&i| self.number_of(i) == Some(i64::from(number)))
            .collect()
    }

    /// Set a cell in every row carrying a paragraph number. Returns the count updated.
    pub fn set_by_number(&mut self, number: u32, column: usize, value: &Value) -> usize {
        let rows = self.rows_with_number(number);
        for &i in &rows {
            if let Some(cell) = self.rows[i].cells.get_mut(column) {
                *cell = value.clone();
            }
        }
        rows.len()
    }

    /// A frame with the same columns and the selected rows.
    pub fn with_rows(&self, rows: Vec<Row>) -> Self {
        Self {
            columns: self.columns.clone(),
            rows,
        }
    }
}
