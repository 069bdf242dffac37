//! Tabular projection of paragraph records.
//!
//! A [`Projection`] holds extracted records as a typed [`Frame`] and offers
//! filter, search, sort, revert, edit and reorder. Edits are written back to
//! the host document one field at a time.

mod filter;
mod frame;
mod history;
mod projection;
mod table_io;

pub use filter::{parse_filter, CompareOp, Expr, Filter, FilterError};
pub use frame::{Frame, Row};
pub use history::FilterHistory;
pub use projection::{EditOutcome, FilterOutcome, Projection, RowChanges, View};
pub use table_io::{export_csv, import_csv, read_csv, write_csv};
