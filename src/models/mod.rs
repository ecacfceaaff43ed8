//! Core data models for Tally
//!
//! This module contains the data structures that represent the ledger
//! domain: entries and their categories.

pub mod entry;

pub use entry::{Category, Entry, DEFAULT_DESCRIPTION};
