//! HTTP handlers for the database/table/record resource tree.

pub mod records;
pub use records::*;
