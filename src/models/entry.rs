//! Ledger entry model
//!
//! An entry is one immutable line of the ledger: a date, a category, a
//! positive amount, and a free-text description. Entries are owned by the
//! repository's collection and are never mutated after construction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder description applied when an entry is created without one
pub const DEFAULT_DESCRIPTION: &str = "(none)";

/// Category of a ledger entry
///
/// `Income` and `Expense` are the two recognized categories; only they are
/// accepted by [`crate::storage::EntryRepository::add`] and tracked in the
/// category index. Records written by other tools may carry arbitrary
/// category strings: those load as `Other`, stay out of the index, contribute
/// nothing to totals, and round-trip unchanged on save.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Income,
    Expense,
    Other(String),
}

impl Category {
    /// Check whether this is one of the two recognized categories
    pub fn is_recognized(&self) -> bool {
        matches!(self, Self::Income | Self::Expense)
    }

    /// The persisted string form
    pub fn as_str(&self) -> &str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "income" => Self::Income,
            "expense" => Self::Expense,
            _ => Self::Other(s),
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => write!(f, "Income"),
            Self::Expense => write!(f, "Expense"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A single ledger entry
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Calendar date, no time component
    pub date: NaiveDate,

    /// Entry category
    pub category: Category,

    /// Positive magnitude; the sign comes from the category
    pub amount: f64,

    /// Free-text description
    pub description: String,
}

impl Entry {
    /// Create a new entry, substituting the placeholder for a blank description
    pub fn new(
        date: NaiveDate,
        category: Category,
        amount: f64,
        description: impl Into<String>,
    ) -> Self {
        let description = description.into();
        let description = if description.trim().is_empty() {
            DEFAULT_DESCRIPTION.to_string()
        } else {
            description
        };

        Self {
            date,
            category,
            amount,
            description,
        }
    }

    /// Month bucket key for the date index ("YYYY-MM")
    pub fn month_key(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }

    /// The amount this entry contributes to a net total
    ///
    /// Income adds, Expense subtracts, anything else contributes nothing.
    pub fn signed_amount(&self) -> f64 {
        match self.category {
            Category::Income => self.amount,
            Category::Expense => -self.amount,
            Category::Other(_) => 0.0,
        }
    }
}
