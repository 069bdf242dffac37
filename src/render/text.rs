//! Plain text and Markdown rendering of frames.

use crate::grid::{Frame, View};

use super::TableOptions;

/// Header and cell strings of the selected columns.
fn layout(frame: &Frame, options: &TableOptions) -> (Vec<String>, Vec<Vec<String>>) {
    let selected: Vec<usize> = if options.columns.is_empty() {
        (0..frame.columns().len()).collect()
    } else {
        options
            .columns
            .iter()
            .filter_map(|name| frame.column_index(name))
            .collect()
    };

    let headers = selected
        .iter()
        .map(|&i| frame.columns()[i].name().to_string())
        .collect();

    let limit = if options.max_rows == 0 {
        frame.len()
    } else {
        options.max_rows
    };
    let rows = frame
        .rows()
        .iter()
        .take(limit)
        .map(|row| {
            selected
                .iter()
                .map(|&i| {
                    let text = row.get(i).map(|v| v.to_string()).unwrap_or_default();
                    truncate(&text.replace(['\n', '\r'], " "), options.max_cell_width)
                })
                .collect()
        })
        .collect();

    (headers, rows)
}

fn truncate(text: &str, width: usize) -> String {
    if width == 0 || text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// Render a frame as an aligned text table.
pub fn to_text(frame: &Frame, options: &TableOptions) -> String {
    let (headers, rows) = layout(frame, options);
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    push_line(&mut output, &headers, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut output, &rule, &widths);
    for row in &rows {
        push_line(&mut output, row, &widths);
    }
    if rows.len() < frame.len() {
        output.push_str(&format!("... {} more rows\n", frame.len() - rows.len()));
    }
    output
}

fn push_line(output: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
        .collect();
    output.push_str(line.join("  ").trim_end());
    output.push('\n');
}

/// Render a frame as a Markdown table.
pub fn to_markdown(frame: &Frame, options: &TableOptions) -> String {
    let (headers, rows) = layout(frame, options);
    if headers.is_empty() {
        return String::new();
    }

    let mut output = String::new();
    output.push('|');
    for header in &headers {
        output.push_str(&format!(" {} |", escape_pipe(header)));
    }
    output.push('\n');
    output.push('|');
    for _ in &headers {
        output.push_str(" --- |");
    }
    output.push('\n');
    for row in &rows {
        output.push('|');
        for cell in row {
            output.push_str(&format!(" {} |", escape_pipe(cell.trim())));
        }
        output.push('\n');
    }
    output
}

fn escape_pipe(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Render the visible state of a projection.
pub fn view_to_text(view: &View, options: &TableOptions) -> String {
    match view {
        View::Rows(frame) => to_text(frame, options),
        View::Error { message } => format!("Error\n-----\n{}\n", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::TextRange;
    use crate::model::ParagraphRecord;

    fn frame() -> Frame {
        let mut a = ParagraphRecord::new(1, TextRange::new(0, 6));
        a.text = "Hello".to_string();
        let mut b = ParagraphRecord::new(2, TextRange::new(6, 40));
        b.text = "A much longer paragraph | with a pipe".to_string();
        Frame::from_records(&[a, b])
    }

    #[test]
    fn test_to_text_selected_columns() {
        let options = TableOptions::new().with_columns(["Paragraph Number", "Text", "Nope"]);
        let text = to_text(&frame(), &options);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Paragraph Number  Text");
        assert!(lines[1].starts_with("----------------  ----"));
        assert!(lines[2].starts_with("1                 Hello"));
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_truncation_and_row_limit() {
        let options = TableOptions::new()
            .with_columns(["Text"])
            .with_max_cell_width(10)
            .with_max_rows(1);
        let text = to_text(&frame(), &options);
        assert!(text.contains("Hello"));
        assert!(!text.contains("A much"));
        assert!(text.ends_with("... 1 more rows\n"));
        assert_eq!(truncate("abcdefghijkl", 10), "abcdefg...");
    }

    #[test]
    fn test_to_markdown_escapes_pipes() {
        let options = TableOptions::new()
            .with_columns(["Text"])
            .with_max_cell_width(0);
        let md = to_markdown(&frame(), &options);
        assert!(md.starts_with("| Text |\n| --- |\n"));
        assert!(md.contains("paragraph \\| with a pipe"));
    }

    #[test]
    fn test_error_view() {
        let view = View::Error {
            message: "Error in filter expression: name 'x' is not defined".into(),
        };
        assert!(view_to_text(&view, &TableOptions::default()).contains("not defined"));
    }
}
