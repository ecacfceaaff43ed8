//! User settings for Tally
//!
//! A small JSON settings file next to the data directory. Missing fields
//! fall back to defaults so older config files keep working.

use std::fs;

use serde::{Deserialize, Serialize};

use super::paths::TallyPaths;
use crate::error::TallyError;

/// User settings for Tally
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Currency symbol used when printing amounts
    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Date format used when printing dates (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "$".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            currency_symbol: default_currency(),
            date_format: default_date_format(),
        }
    }
}

impl Settings {
    /// Load settings from disk, writing the defaults on first run
    pub fn load_or_create(paths: &TallyPaths) -> Result<Self, TallyError> {
        let path = paths.settings_file();

        if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| {
                TallyError::Config(format!("Failed to read {}: {}", path.display(), e))
            })?;
            serde_json::from_str(&contents).map_err(|e| {
                TallyError::Config(format!("Failed to parse {}: {}", path.display(), e))
            })
        } else {
            paths.ensure_directories()?;
            let settings = Self::default();
            let json = serde_json::to_string_pretty(&settings)
                .map_err(|e| TallyError::Config(format!("Failed to serialize settings: {}", e)))?;
            fs::write(&path, json).map_err(|e| {
                TallyError::Config(format!("Failed to write {}: {}", path.display(), e))
            })?;
            Ok(settings)
        }
    }
}
