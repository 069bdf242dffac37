//! CSV export and import of frames.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};

use crate::error::Result;
use crate::model::{Column, Field, FieldKind, Value};

use super::frame::{Frame, Row};

/// Write a frame as CSV: one header row of column names, then every row.
pub fn write_csv<W: Write>(frame: &Frame, writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(frame.columns().iter().map(|c| c.name()))?;
    for row in frame.rows() {
        wtr.write_record(row.cells.iter().map(|v| v.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read a frame written by [`write_csv`].
///
/// Headers map back to known fields where possible; other headers become
/// custom columns. Cells are parsed by their column's kind and fall back to
/// text when they do not fit.
pub fn read_csv<R: Read>(reader: R) -> Result<Frame> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns: Vec<Column> = rdr.headers()?.iter().map(Column::from_name).collect();
    let kinds: Vec<(FieldKind, bool)> = columns
        .iter()
        .map(|c| (c.kind(), blank_is_empty(c)))
        .collect();

    let mut frame = Frame::new(columns);
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let cells = kinds
            .iter()
            .enumerate()
            .map(|(i, &(kind, blank))| {
                let raw = record.get(i).unwrap_or("");
                if raw.is_empty() && blank {
                    Value::Empty
                } else {
                    parse_cell(kind, raw, line + 2)
                }
            })
            .collect();
        frame.push_row(Row::new(cells));
    }

    restore_numbering_sentinel(&mut frame);
    Ok(frame)
}

/// Export a frame to a CSV file, creating parent directories.
pub fn export_csv<P: AsRef<Path>>(frame: &Frame, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_csv(frame, File::create(path)?)?;
    log::info!("Data exported to {}", path.display());
    Ok(())
}

/// Import a frame from a CSV file.
pub fn import_csv<P: AsRef<Path>>(path: P) -> Result<Frame> {
    let path = path.as_ref();
    let frame = read_csv(File::open(path)?)?;
    log::info!("Data imported from {}", path.display());
    Ok(frame)
}

/// Whether a blank cell of this column reads back as [`Value::Empty`].
///
/// Typed columns and user-added columns have no meaningful empty text.
fn blank_is_empty(column: &Column) -> bool {
    match column {
        Column::Custom(_) => true,
        Column::Known(_) => matches!(
            column.kind(),
            FieldKind::Int
                | FieldKind::Float
                | FieldKind::Bool
                | FieldKind::Range
                | FieldKind::Numbering
        ),
    }
}

fn parse_cell(kind: FieldKind, raw: &str, line: usize) -> Value {
    kind.parse(raw).unwrap_or_else(|| {
        log::debug!("Line {}: keeping {:?} as text", line, raw);
        Value::Text(raw.to_string())
    })
}

/// Unnumbered paragraphs carry the text `"0"` as list value.
fn restore_numbering_sentinel(frame: &mut Frame) {
    let (Some(kind_col), Some(value_col)) = (
        frame.field_index(Field::NumberingType),
        frame.field_index(Field::ListValue),
    ) else {
        return;
    };

    for row in frame.rows_mut() {
        if row.cells.get(kind_col).and_then(Value::as_i64) == Some(0) {
            row.cells[value_col] = Value::Text("0".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{TableProperties, TextRange};
    use crate::model::{NumberingValue, ParagraphRecord};

    fn sample() -> Frame {
        let mut a = ParagraphRecord::new(1, TextRange::new(0, 12));
        a.style = "Heading 1".to_string();
        a.text = "Intro \"quoted\"".to_string();
        a.font_size = 14.5;
        a.bold = true;

        let mut b = ParagraphRecord::new(2, TextRange::new(12, 30));
        b.numbering_type = 1;
        b.list_value = NumberingValue::Value(0);
        b.within_table = true;
        b.table = Some(TableProperties {
            width: 200.0,
            ..Default::default()
        });
        Frame::from_records(&[a, b])
    }

    #[test]
    fn test_csv_round_trip_preserves_types() {
        let frame = sample();
        let mut buf = Vec::new();
        write_csv(&frame, &mut buf).unwrap();
        let back = read_csv(buf.as_slice()).unwrap();
        assert_eq!(back, frame);
    }

    #[test]
    fn test_range_written_as_literal() {
        let mut buf = Vec::new();
        write_csv(&sample(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.lines().next().unwrap().ends_with("Paragraph Range"));
        assert!(text.contains("\"[0, 12]\""));
    }

    #[test]
    fn test_unknown_headers_become_custom_columns() {
        let csv = "Paragraph Number,Reviewer\n1,ann\nx,bob\n";
        let frame = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(frame.columns()[1], Column::Custom("Reviewer".into()));
        assert_eq!(frame.cell(0, 0), Some(&Value::Int(1)));
        // Unparseable numbers fall back to text.
        assert_eq!(frame.cell(1, 0), Some(&Value::Text("x".into())));
    }

    #[test]
    fn test_blank_custom_cells_stay_empty() {
        let mut frame = sample();
        let col = frame.ensure_column(Column::Custom("Reviewer".into()));
        frame.rows_mut()[0].cells[col] = Value::from("ann");

        let mut buf = Vec::new();
        write_csv(&frame, &mut buf).unwrap();
        let back = read_csv(buf.as_slice()).unwrap();
        assert_eq!(back.cell(0, col), Some(&Value::from("ann")));
        assert_eq!(back.cell(1, col), Some(&Value::Empty));
        assert_eq!(back, frame);
    }

    #[test]
    fn test_unnumbered_list_value_restored() {
        let csv = "Numbering Type,List Value\n0,0\n3,0\n";
        let frame = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(frame.cell(0, 1), Some(&Value::Text("0".into())));
        assert_eq!(frame.cell(1, 1), Some(&Value::Int(0)));
    }

    #[test]
    fn test_export_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Data").join("exported_data.csv");
        export_csv(&sample(), &path).unwrap();
        assert_eq!(import_csv(&path).unwrap().len(), 2);
    }
}
