//! CLI command handlers
//!
//! This module bridges clap argument parsing with the entry repository,
//! turning arguments into store calls and store results into terminal
//! output.

use chrono::NaiveDate;

use crate::config::Settings;
use crate::display::{format_amount, format_entry_row, format_register};
use crate::error::{TallyError, TallyResult};
use crate::models::Category;
use crate::storage::{EntryFilter, EntryRepository};

/// Parse a strict `YYYY-MM-DD` date argument
pub fn parse_date(s: &str) -> TallyResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| TallyError::Validation(format!("invalid date {:?}, expected YYYY-MM-DD", s)))
}

/// Handle `tally add`
pub fn handle_add(
    repo: &mut EntryRepository,
    settings: &Settings,
    date: Option<String>,
    category: Category,
    amount: f64,
    description: Option<String>,
) -> TallyResult<()> {
    let date = match date {
        Some(ref s) => parse_date(s)?,
        None => chrono::Local::now().date_naive(),
    };

    let entry = repo.add(date, category, amount, description.unwrap_or_default())?;
    println!("Added {}", format_entry_row(entry, &settings.currency_symbol));
    Ok(())
}

/// Handle `tally query`
pub fn handle_query(
    repo: &EntryRepository,
    settings: &Settings,
    from: Option<String>,
    to: Option<String>,
    category: Option<Category>,
) -> TallyResult<()> {
    let mut filter = EntryFilter::new();
    if let Some(ref s) = from {
        filter = filter.since(parse_date(s)?);
    }
    if let Some(ref s) = to {
        filter = filter.until(parse_date(s)?);
    }
    if let Some(category) = category {
        filter = filter.category(category);
    }

    let entries = repo.query(&filter);
    print!("{}", format_register(&entries, &settings.currency_symbol));
    Ok(())
}

/// Handle `tally total`
pub fn handle_total(
    repo: &EntryRepository,
    settings: &Settings,
    category: Option<Category>,
) -> TallyResult<()> {
    let total = repo.calculate_total(category.as_ref());
    println!("Total: {}", format_amount(total, &settings.currency_symbol));
    Ok(())
}
