//! Entry display formatting
//!
//! Formats ledger entries for terminal output: register rows, the full
//! register listing, and signed amounts with the configured currency symbol.

use crate::models::Entry;

/// Format an amount with a currency symbol, sign first
pub fn format_amount(amount: f64, symbol: &str) -> String {
    if amount < 0.0 {
        format!("-{}{:.2}", symbol, -amount)
    } else {
        format!("{}{:.2}", symbol, amount)
    }
}

/// Format a single entry for display (register row)
pub fn format_entry_row(entry: &Entry, symbol: &str) -> String {
    format!(
        "{} {:10} {:>12} {}",
        entry.date.format("%Y-%m-%d"),
        entry.category.to_string(),
        format_amount(entry.amount, symbol),
        entry.description
    )
}

/// Format a list of entries as a register
pub fn format_register(entries: &[&Entry], symbol: &str) -> String {
    if entries.is_empty() {
        return "No entries found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:10} {:10} {:>12} {}\n",
        "Date", "Category", "Amount", "Description"
    ));
    output.push_str(&"-".repeat(50));
    output.push('\n');

    for entry in entries {
        output.push_str(&format_entry_row(entry, symbol));
        output.push('\n');
    }

    output
}
