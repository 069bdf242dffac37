//! Data model for extracted paragraph metadata.
//!
//! [`ParagraphRecord`] is the flat per-paragraph row produced by extraction.
//! [`Field`], [`Column`] and [`Value`] describe how records are laid out as
//! typed cells in the projection.

mod field;
mod record;
mod value;

pub use field::{numbering_cell, Column, Field, FieldKind};
pub use record::{
    format_tab_indices, format_tab_positions, parse_tab_indices, parse_tab_positions,
    MatchPosition, NumberingValue, ParagraphRecord, TabPosition,
};
pub use value::{parse_range, Value};
