//! Entry repository: the indexed record store
//!
//! Owns the ordered entry collection together with two derived indexes
//! (month bucket and category), keeps the indexes in sync with every add,
//! serves range and category queries from the indexes instead of scanning
//! everything, and persists the collection to a JSON file with a `.bak`
//! copy after each successful write.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{TallyError, TallyResult};
use crate::models::{Category, Entry};

use super::file_io::{copy_backup, read_json, write_json_atomic};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// On-disk record shape
///
/// The date stays a string here so that a record lacking the field, or
/// carrying one that fails strict `YYYY-MM-DD` parsing, can be dropped on
/// load without failing the rest of the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedRecord {
    #[serde(default)]
    date: Option<String>,
    category: Category,
    amount: f64,
    #[serde(default)]
    description: String,
}

impl PersistedRecord {
    fn from_entry(entry: &Entry) -> Self {
        Self {
            date: Some(entry.date.format(DATE_FORMAT).to_string()),
            category: entry.category.clone(),
            amount: entry.amount,
            description: entry.description.clone(),
        }
    }

    /// Parse into an [`Entry`], or explain why the record must be dropped
    fn into_entry(self) -> Result<Entry, String> {
        let date_str = match self.date {
            Some(s) => s,
            None => return Err("record is missing the date field".to_string()),
        };

        let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
            .map_err(|_| format!("record has unparsable date {:?}", date_str))?;

        Ok(Entry::new(date, self.category, self.amount, self.description))
    }
}

/// Optional constraints for [`EntryRepository::query`]
///
/// Absent fields mean "no constraint on that dimension". All active filters
/// intersect.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Inclusive lower date bound
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper date bound
    pub end_date: Option<NaiveDate>,
    /// Category to match
    pub category: Option<Category>,
}

impl EntryFilter {
    /// Create a new empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep entries dated `date` or later
    pub fn since(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    /// Keep entries dated `date` or earlier
    pub fn until(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    /// Keep entries in `category`
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    fn matches(&self, entry: &Entry) -> bool {
        if let Some(start) = self.start_date {
            if entry.date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if entry.date > end {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if entry.category != *category {
                return false;
            }
        }
        true
    }
}

/// Repository for ledger entries with month and category indexes
///
/// The entry vector is the source of truth; both indexes hold positions into
/// it and must always equal what a full replay of the vector would rebuild.
/// Entries are append-only within a session, so positions stay stable.
pub struct EntryRepository {
    path: PathBuf,
    entries: Vec<Entry>,
    /// Index: "YYYY-MM" bucket -> entry positions, insertion order preserved
    month_index: HashMap<String, Vec<usize>>,
    /// Index: recognized category -> entry positions, insertion order preserved
    category_index: HashMap<Category, Vec<usize>>,
}

impl EntryRepository {
    /// Create an empty repository bound to `path` without touching the disk
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            entries: Vec::new(),
            month_index: HashMap::new(),
            category_index: HashMap::new(),
        }
    }

    /// Open the store: load whatever `path` holds and return a ready handle
    ///
    /// A missing or unreadable file yields an empty store, never an error.
    pub fn open(path: PathBuf) -> Self {
        let mut repo = Self::new(path);
        repo.load();
        repo
    }

    /// Load entries from the backing file and rebuild both indexes
    ///
    /// A missing file is an empty ledger. A file that cannot be read or
    /// parsed as a whole degrades to an empty ledger with a warning. A
    /// record with a missing or malformed date is dropped with a warning
    /// while the rest of the file loads. Returns the number of entries
    /// loaded.
    pub fn load(&mut self) -> usize {
        let records: Vec<PersistedRecord> = match read_json(&self.path) {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    "could not read {}: {}; starting with an empty ledger",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        };

        self.entries.clear();
        for record in records {
            match record.into_entry() {
                Ok(entry) => self.entries.push(entry),
                Err(reason) => warn!("skipping record: {}", reason),
            }
        }

        self.rebuild_indexes();
        debug!(
            "loaded {} entries from {}",
            self.entries.len(),
            self.path.display()
        );
        self.entries.len()
    }

    /// Persist the full entry sequence, then refresh the `.bak` sibling
    ///
    /// The write is atomic (temp file plus rename); the backup copy is
    /// best-effort and a failure there only logs a warning.
    pub fn save(&self) -> TallyResult<()> {
        let records: Vec<PersistedRecord> =
            self.entries.iter().map(PersistedRecord::from_entry).collect();

        write_json_atomic(&self.path, &records)?;

        if let Err(e) = copy_backup(&self.path) {
            warn!("backup copy failed: {}", e);
        }

        debug!("saved {} entries to {}", records.len(), self.path.display());
        Ok(())
    }

    /// Validate, append, index, and persist a new entry
    ///
    /// Validation failures leave the store untouched. Every successful add
    /// rewrites the whole file so the snapshot on disk is always complete
    /// as of the last add. A save failure propagates to the caller; the
    /// entry stays in memory so a later save can retry.
    pub fn add(
        &mut self,
        date: NaiveDate,
        category: Category,
        amount: f64,
        description: impl Into<String>,
    ) -> TallyResult<&Entry> {
        if !category.is_recognized() {
            return Err(TallyError::Validation(format!(
                "category must be income or expense, got {:?}",
                category.as_str()
            )));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(TallyError::Validation(format!(
                "amount must be a positive number, got {}",
                amount
            )));
        }

        let entry = Entry::new(date, category, amount, description);
        let position = self.entries.len();

        self.month_index
            .entry(entry.month_key())
            .or_default()
            .push(position);
        self.category_index
            .entry(entry.category.clone())
            .or_default()
            .push(position);
        self.entries.push(entry);

        self.save()?;
        Ok(&self.entries[position])
    }

    /// Query entries by optional date bounds and category
    ///
    /// A recognized category narrows the candidate set to its index bucket.
    /// When both date bounds are present the candidates come instead from
    /// the month buckets spanning the range, a superset of the day-level
    /// answer. The final pass filters by the exact bounds and re-applies
    /// the category, so all active filters intersect.
    ///
    /// Returns references into the store, in the order of the consulted
    /// source structure. Never an error: no matches is an empty result.
    pub fn query(&self, filter: &EntryFilter) -> Vec<&Entry> {
        let candidates: Vec<usize> = match (filter.start_date, filter.end_date) {
            (Some(start), Some(end)) => month_span(start, end)
                .into_iter()
                .filter_map(|key| self.month_index.get(&key))
                .flatten()
                .copied()
                .collect(),
            _ => match &filter.category {
                Some(category) if category.is_recognized() => self
                    .category_index
                    .get(category)
                    .cloned()
                    .unwrap_or_default(),
                _ => (0..self.entries.len()).collect(),
            },
        };

        candidates
            .into_iter()
            .map(|position| &self.entries[position])
            .filter(|entry| filter.matches(entry))
            .collect()
    }

    /// Net total over the collection: income adds, expense subtracts
    ///
    /// A single linear pass over the full vector; a total touches every
    /// entry anyway, so the indexes buy nothing here. Entries outside the
    /// two recognized categories contribute nothing. When a category filter
    /// is given, only matching entries are counted.
    pub fn calculate_total(&self, category: Option<&Category>) -> f64 {
        let mut total = 0.0;
        for entry in &self.entries {
            if let Some(wanted) = category {
                if entry.category != *wanted {
                    continue;
                }
            }
            total += entry.signed_amount();
        }
        total
    }

    /// All entries in insertion order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the ledger is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Derive both indexes from scratch with one full pass over the vector
    fn rebuild_indexes(&mut self) {
        self.month_index.clear();
        self.category_index.clear();

        for (position, entry) in self.entries.iter().enumerate() {
            self.month_index
                .entry(entry.month_key())
                .or_default()
                .push(position);
            if entry.category.is_recognized() {
                self.category_index
                    .entry(entry.category.clone())
                    .or_default()
                    .push(position);
            }
        }
    }
}

/// Enumerate "YYYY-MM" keys from the month containing `start` through the
/// month containing `end` inclusive, stepping one calendar month at a time
fn month_span(start: NaiveDate, end: NaiveDate) -> Vec<String> {
    let mut keys = Vec::new();
    let (mut year, mut month) = (start.year(), start.month());
    let stop = (end.year(), end.month());

    while (year, month) <= stop {
        keys.push(format!("{:04}-{:02}", year, month));
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }

    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_repo() -> (TempDir, EntryRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");
        let repo = EntryRepository::open(path);
        (temp_dir, repo)
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let (_temp_dir, repo) = create_test_repo();
        assert!(repo.is_empty());
        assert_eq!(repo.len(), 0);
    }

    #[test]
    fn test_add_and_count() {
        let (_temp_dir, mut repo) = create_test_repo();

        repo.add(date(2024, 1, 15), Category::Expense, 100.0, "groceries")
            .unwrap();
        repo.add(date(2024, 1, 20), Category::Income, 500.0, "salary")
            .unwrap();

        assert_eq!(repo.len(), 2);
        assert_eq!(repo.entries()[0].description, "groceries");
    }

    #[test]
    fn test_add_rejects_unknown_category() {
        let (_temp_dir, mut repo) = create_test_repo();

        let result = repo.add(
            date(2024, 1, 15),
            Category::Other("Gift".to_string()),
            50.0,
            "",
        );

        assert!(matches!(result, Err(TallyError::Validation(_))));
        assert_eq!(repo.len(), 0);
    }

    #[test]
    fn test_add_rejects_non_positive_amount() {
        let (_temp_dir, mut repo) = create_test_repo();

        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let result = repo.add(date(2024, 1, 15), Category::Expense, amount, "");
            assert!(matches!(result, Err(TallyError::Validation(_))));
        }
        assert_eq!(repo.len(), 0);
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let (temp_dir, mut repo) = create_test_repo();

        repo.add(date(2024, 1, 15), Category::Expense, 100.5, "groceries")
            .unwrap();
        repo.add(date(2024, 3, 10), Category::Income, 200.0, "refund")
            .unwrap();

        let reloaded = EntryRepository::open(temp_dir.path().join("records.json"));
        assert_eq!(reloaded.entries(), repo.entries());
    }

    #[test]
    fn test_add_persists_immediately() {
        let (temp_dir, mut repo) = create_test_repo();

        repo.add(date(2024, 1, 15), Category::Income, 500.0, "salary")
            .unwrap();

        // Every add rewrites the file, no explicit save needed
        let reloaded = EntryRepository::open(temp_dir.path().join("records.json"));
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.entries()[0].amount, 500.0);
    }

    #[test]
    fn test_save_writes_backup_sibling() {
        let (temp_dir, mut repo) = create_test_repo();

        repo.add(date(2024, 1, 15), Category::Income, 500.0, "salary")
            .unwrap();

        let bak = temp_dir.path().join("records.json.bak");
        assert!(bak.exists());

        // The backup holds the snapshot as of the last save
        let reloaded = EntryRepository::open(bak);
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn test_query_by_category() {
        let (_temp_dir, mut repo) = create_test_repo();

        repo.add(date(2024, 1, 10), Category::Income, 500.0, "salary")
            .unwrap();
        repo.add(date(2024, 1, 15), Category::Expense, 100.0, "groceries")
            .unwrap();

        let incomes = repo.query(&EntryFilter::new().category(Category::Income));
        assert_eq!(incomes.len(), 1);
        assert_eq!(incomes[0].description, "salary");
    }

    #[test]
    fn test_query_by_date_range() {
        let (_temp_dir, mut repo) = create_test_repo();

        repo.add(date(2024, 1, 15), Category::Expense, 100.0, "groceries")
            .unwrap();
        repo.add(date(2024, 3, 10), Category::Income, 200.0, "refund")
            .unwrap();

        let hits = repo.query(
            &EntryFilter::new()
                .since(date(2024, 2, 1))
                .until(date(2024, 4, 1)),
        );

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].date, date(2024, 3, 10));
    }

    #[test]
    fn test_query_single_bound() {
        let (_temp_dir, mut repo) = create_test_repo();

        repo.add(date(2024, 1, 15), Category::Expense, 100.0, "groceries")
            .unwrap();
        repo.add(date(2024, 3, 10), Category::Income, 200.0, "refund")
            .unwrap();

        let from_feb = repo.query(&EntryFilter::new().since(date(2024, 2, 1)));
        assert_eq!(from_feb.len(), 1);
        assert_eq!(from_feb[0].date, date(2024, 3, 10));

        let until_feb = repo.query(&EntryFilter::new().until(date(2024, 2, 1)));
        assert_eq!(until_feb.len(), 1);
        assert_eq!(until_feb[0].date, date(2024, 1, 15));
    }

    #[test]
    fn test_query_date_bounds_are_day_precise() {
        let (_temp_dir, mut repo) = create_test_repo();

        // Same month bucket, outside the day-level bounds
        repo.add(date(2024, 2, 1), Category::Expense, 10.0, "early")
            .unwrap();
        repo.add(date(2024, 2, 15), Category::Expense, 20.0, "inside")
            .unwrap();
        repo.add(date(2024, 2, 28), Category::Expense, 30.0, "late")
            .unwrap();

        let hits = repo.query(
            &EntryFilter::new()
                .since(date(2024, 2, 10))
                .until(date(2024, 2, 20)),
        );

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].description, "inside");
    }

    // Pins the composed behavior: category and date-range filters intersect,
    // even though the month buckets are taken from the global index.
    #[test]
    fn test_query_category_intersects_date_range() {
        let (_temp_dir, mut repo) = create_test_repo();

        repo.add(date(2024, 3, 5), Category::Income, 500.0, "salary")
            .unwrap();
        repo.add(date(2024, 3, 10), Category::Expense, 100.0, "groceries")
            .unwrap();
        repo.add(date(2024, 5, 1), Category::Expense, 200.0, "rent")
            .unwrap();

        let hits = repo.query(
            &EntryFilter::new()
                .category(Category::Expense)
                .since(date(2024, 3, 1))
                .until(date(2024, 3, 31)),
        );

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].description, "groceries");
    }

    #[test]
    fn test_query_no_filters_returns_everything() {
        let (_temp_dir, mut repo) = create_test_repo();

        repo.add(date(2024, 1, 10), Category::Income, 500.0, "salary")
            .unwrap();
        repo.add(date(2024, 1, 15), Category::Expense, 100.0, "groceries")
            .unwrap();

        let all = repo.query(&EntryFilter::new());
        assert_eq!(all.len(), 2);
        // Insertion order preserved
        assert_eq!(all[0].description, "salary");
        assert_eq!(all[1].description, "groceries");
    }

    #[test]
    fn test_calculate_total() {
        let (_temp_dir, mut repo) = create_test_repo();

        repo.add(date(2024, 1, 10), Category::Income, 500.0, "salary")
            .unwrap();
        repo.add(date(2024, 1, 15), Category::Expense, 200.0, "rent")
            .unwrap();

        assert_eq!(repo.calculate_total(None), 300.0);
        assert_eq!(repo.calculate_total(Some(&Category::Expense)), -200.0);
        assert_eq!(repo.calculate_total(Some(&Category::Income)), 500.0);
    }

    #[test]
    fn test_total_ignores_unrecognized_categories() {
        let (temp_dir, _) = create_test_repo();
        let path = temp_dir.path().join("records.json");

        fs::write(
            &path,
            r#"[
                {"date": "2024-01-10", "category": "income", "amount": 500.0, "description": "salary"},
                {"date": "2024-01-12", "category": "Gift", "amount": 50.0, "description": "birthday"}
            ]"#,
        )
        .unwrap();

        let repo = EntryRepository::open(path);
        assert_eq!(repo.len(), 2);
        assert_eq!(repo.calculate_total(None), 500.0);
    }

    #[test]
    fn test_unrecognized_category_round_trips() {
        let (temp_dir, _) = create_test_repo();
        let path = temp_dir.path().join("records.json");

        fs::write(
            &path,
            r#"[{"date": "2024-01-12", "category": "Gift", "amount": 50.0, "description": "birthday"}]"#,
        )
        .unwrap();

        let mut repo = EntryRepository::open(path.clone());
        assert_eq!(
            repo.entries()[0].category,
            Category::Other("Gift".to_string())
        );

        repo.save().unwrap();
        let reloaded = EntryRepository::open(path);
        assert_eq!(
            reloaded.entries()[0].category,
            Category::Other("Gift".to_string())
        );
    }

    #[test]
    fn test_load_skips_record_missing_date() {
        let (temp_dir, _) = create_test_repo();
        let path = temp_dir.path().join("records.json");

        fs::write(
            &path,
            r#"[
                {"date": "2024-01-10", "category": "income", "amount": 500.0, "description": "salary"},
                {"category": "expense", "amount": 100.0, "description": "no date"}
            ]"#,
        )
        .unwrap();

        let repo = EntryRepository::open(path);
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.entries()[0].description, "salary");
    }

    #[test]
    fn test_load_skips_record_with_malformed_date() {
        let (temp_dir, _) = create_test_repo();
        let path = temp_dir.path().join("records.json");

        fs::write(
            &path,
            r#"[
                {"date": "2024-13-45", "category": "expense", "amount": 100.0, "description": "bad"},
                {"date": "15/01/2024", "category": "expense", "amount": 100.0, "description": "wrong format"},
                {"date": "2024-01-10", "category": "income", "amount": 500.0, "description": "salary"}
            ]"#,
        )
        .unwrap();

        let repo = EntryRepository::open(path);
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_load_degrades_to_empty_on_malformed_container() {
        let (temp_dir, _) = create_test_repo();
        let path = temp_dir.path().join("records.json");

        fs::write(&path, "this is not json").unwrap();

        let repo = EntryRepository::open(path);
        assert!(repo.is_empty());
    }

    #[test]
    fn test_index_collection_equivalence() {
        let (temp_dir, mut repo) = create_test_repo();

        repo.add(date(2023, 11, 5), Category::Income, 1.0, "a").unwrap();
        repo.add(date(2023, 12, 31), Category::Expense, 2.0, "b").unwrap();
        repo.add(date(2024, 1, 1), Category::Expense, 3.0, "c").unwrap();
        repo.add(date(2023, 11, 20), Category::Income, 4.0, "d").unwrap();

        let check = |repo: &EntryRepository| {
            let from_months: HashSet<usize> = repo
                .month_index
                .values()
                .flatten()
                .copied()
                .collect();
            let month_total: usize = repo.month_index.values().map(Vec::len).sum();
            assert_eq!(from_months, (0..repo.len()).collect::<HashSet<_>>());
            assert_eq!(month_total, repo.len());

            let from_categories: HashSet<usize> = repo
                .category_index
                .values()
                .flatten()
                .copied()
                .collect();
            let recognized: HashSet<usize> = repo
                .entries
                .iter()
                .enumerate()
                .filter(|(_, e)| e.category.is_recognized())
                .map(|(i, _)| i)
                .collect();
            assert_eq!(from_categories, recognized);
        };

        // Incrementally maintained indexes...
        check(&repo);

        // ...match a full rebuild after reload
        let reloaded = EntryRepository::open(temp_dir.path().join("records.json"));
        check(&reloaded);
    }

    #[test]
    fn test_month_span_within_year() {
        assert_eq!(
            month_span(date(2024, 2, 10), date(2024, 4, 3)),
            vec!["2024-02", "2024-03", "2024-04"]
        );
    }

    #[test]
    fn test_month_span_year_rollover() {
        assert_eq!(
            month_span(date(2023, 11, 5), date(2024, 2, 3)),
            vec!["2023-11", "2023-12", "2024-01", "2024-02"]
        );
    }

    #[test]
    fn test_month_span_single_month_and_inverted() {
        assert_eq!(month_span(date(2024, 2, 1), date(2024, 2, 29)), vec!["2024-02"]);
        assert!(month_span(date(2024, 3, 1), date(2024, 2, 1)).is_empty());
    }
}
