//! Storage layer for Tally
//!
//! JSON file storage with atomic writes, a backup copy on every save, and
//! automatic directory creation.

pub mod entries;
pub mod file_io;

pub use entries::{EntryFilter, EntryRepository};
pub use file_io::{read_json, write_json_atomic};
