//! JSON rendering of records, frames and reports.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::Result;
use crate::grid::Frame;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize any value.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value)?,
        JsonFormat::Compact => serde_json::to_string(value)?,
    };
    Ok(json)
}

/// Rows of a frame as objects keyed by column name.
pub fn frame_records(frame: &Frame) -> Result<Vec<Map<String, JsonValue>>> {
    frame
        .rows()
        .iter()
        .map(|row| {
            let mut object = Map::new();
            for (column, cell) in frame.columns().iter().zip(&row.cells) {
                object.insert(column.name().to_string(), serde_json::to_value(cell)?);
            }
            Ok(object)
        })
        .collect()
}

/// Render a frame as a JSON array of row objects.
pub fn frame_to_json(frame: &Frame, format: JsonFormat) -> Result<String> {
    to_json(&frame_records(frame)?, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::TextRange;
    use crate::model::ParagraphRecord;

    fn frame() -> Frame {
        let mut record = ParagraphRecord::new(1, TextRange::new(0, 6));
        record.text = "Hello".to_string();
        record.style = "Title".to_string();
        Frame::from_records(&[record])
    }

    #[test]
    fn test_to_json_pretty() {
        let json = frame_to_json(&frame(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"Paragraph Style\": \"Title\""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let json = frame_to_json(&frame(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.starts_with("[{"));
    }

    #[test]
    fn test_frame_records_keys() {
        let records = frame_records(&frame()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["Text"], "Hello");
        assert_eq!(records[0]["Paragraph Number"], 1);
    }
}
