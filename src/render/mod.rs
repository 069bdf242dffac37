//! Rendering of frames and reports for output.

mod json;
mod options;
mod text;

pub use json::{frame_records, frame_to_json, to_json, JsonFormat};
pub use options::TableOptions;
pub use text::{to_markdown, to_text, view_to_text};
