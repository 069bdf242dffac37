//! Paragraph feature extraction module.

mod extractor;
mod options;

pub use extractor::{
    extract_records, strip_paragraph_mark, tab_character_indices, tab_positions, Extractor,
};
pub use options::{ErrorMode, ExtractOptions, OrdinalMode};
