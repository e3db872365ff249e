//! Storage module for persisting harvest records
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Idempotent, uniquely keyed inserts of candidate URLs and extracted items
//! - The "already done" sets that make resumption correct
//! - Aggregations for exhaustion markers and statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::config::StoreConfig;
use crate::url::normalize_key;
use crate::HarvestError;
use chrono::Utc;
use std::collections::BTreeMap;

/// Opens the store described by the configuration
///
/// Creates the parent directory when needed. Failing here is fatal for a run: without
/// the store there is no ground truth to resume from.
pub fn open_storage(config: &StoreConfig) -> Result<SqliteStorage, HarvestError> {
    if config.is_in_memory() {
        return SqliteStorage::new_in_memory();
    }

    std::fs::create_dir_all(&config.connection)?;
    SqliteStorage::new(&config.database_path())
}

/// A discovered item page
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateUrl {
    /// Normalized URL (the unique key)
    pub url: String,

    /// Category under which the URL was discovered
    pub category: String,

    /// RFC 3339 discovery timestamp
    pub discovered_at: String,
}

impl CandidateUrl {
    /// Creates a candidate, normalizing the URL
    pub fn new(url: &str, category: &str) -> Self {
        Self {
            url: normalize_key(url),
            category: category.to_string(),
            discovered_at: Utc::now().to_rfc3339(),
        }
    }
}

/// A fully scraped item page
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedItem {
    /// Normalized source URL (the unique key)
    pub url: String,

    /// Display name, "Unknown" when the page had no heading
    pub name: String,

    /// Category label, "Unknown" when nothing better was available
    pub category: String,

    /// Accord label -> weight (percentage-like, not guaranteed to sum to 100)
    pub attributes: BTreeMap<String, f64>,

    /// RFC 3339 extraction timestamp
    pub extracted_at: String,
}

impl ExtractedItem {
    /// Creates an item, normalizing the source URL
    pub fn new(url: &str, name: &str, category: &str, attributes: BTreeMap<String, f64>) -> Self {
        Self {
            url: normalize_key(url),
            name: name.to_string(),
            category: category.to_string(),
            attributes,
            extracted_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Result of an idempotent insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was written
    Inserted,
    /// A record with the same key already existed; nothing changed
    Duplicate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_url_is_normalized() {
        let candidate = CandidateUrl::new("https://x.test/perfume/A-1.html/?ref=foo", "Acme");
        assert_eq!(candidate.url, "https://x.test/perfume/A-1.html");
        assert_eq!(candidate.category, "Acme");
        assert!(chrono::DateTime::parse_from_rfc3339(&candidate.discovered_at).is_ok());
    }

    #[test]
    fn test_extracted_item_is_normalized() {
        let item = ExtractedItem::new("https://x.test/perfume/A-1.html/", "One", "Acme", BTreeMap::new());
        assert_eq!(item.url, "https://x.test/perfume/A-1.html");
    }

    #[test]
    fn test_open_in_memory_storage() {
        let config = StoreConfig {
            connection: ":memory:".to_string(),
            database: "unused".to_string(),
        };
        assert!(open_storage(&config).is_ok());
    }

    #[test]
    fn test_open_storage_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            connection: dir.path().join("nested").to_string_lossy().to_string(),
            database: "accords".to_string(),
        };
        assert!(open_storage(&config).is_ok());
        assert!(config.database_path().exists());
    }

    #[test]
    fn test_open_storage_fails_when_connection_is_a_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = StoreConfig {
            connection: file.path().to_string_lossy().to_string(),
            database: "accords".to_string(),
        };
        assert!(matches!(open_storage(&config), Err(HarvestError::Io(_))));
    }
}
