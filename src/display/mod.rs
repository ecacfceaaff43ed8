//! Terminal output formatting

pub mod entry;

pub use entry::{format_amount, format_entry_row, format_register};
