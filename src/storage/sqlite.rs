//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageResult};
use crate::storage::{CandidateUrl, ExtractedItem, InsertOutcome};
use crate::url::normalize_key;
use crate::HarvestError;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn collect_keys(&self, sql: &str) -> StorageResult<HashSet<String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(keys)
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl Storage for SqliteStorage {
    // ===== Candidate URLs =====

    fn seen_urls(&self) -> StorageResult<HashSet<String>> {
        self.collect_keys("SELECT url FROM candidate_urls")
    }

    fn insert_url(&mut self, candidate: &CandidateUrl) -> StorageResult<InsertOutcome> {
        // The UNIQUE constraint decides; a single statement is atomic
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO candidate_urls (url, category, discovered_at) VALUES (?1, ?2, ?3)",
            params![
                normalize_key(&candidate.url),
                candidate.category,
                candidate.discovered_at
            ],
        )?;

        Ok(if changed == 0 {
            InsertOutcome::Duplicate
        } else {
            InsertOutcome::Inserted
        })
    }

    fn load_candidates(&self) -> StorageResult<Vec<CandidateUrl>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, category, discovered_at FROM candidate_urls ORDER BY id")?;

        let candidates = stmt
            .query_map([], |row| {
                Ok(CandidateUrl {
                    url: row.get(0)?,
                    category: row.get(1)?,
                    discovered_at: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(candidates)
    }

    fn count_by_category(&self) -> StorageResult<HashMap<String, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT category, COUNT(*) FROM candidate_urls GROUP BY category")?;

        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(counts)
    }

    fn count_urls(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM candidate_urls")
    }

    fn reset_urls(&mut self) -> StorageResult<u64> {
        let removed = self.conn.execute("DELETE FROM candidate_urls", [])?;
        Ok(removed as u64)
    }

    // ===== Extracted Items =====

    fn seen_items(&self) -> StorageResult<HashSet<String>> {
        self.collect_keys("SELECT url FROM extracted_items")
    }

    fn insert_item(&mut self, item: &ExtractedItem) -> StorageResult<InsertOutcome> {
        let attributes = serde_json::to_string(&item.attributes)?;

        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO extracted_items (url, name, category, attributes, extracted_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                normalize_key(&item.url),
                item.name,
                item.category,
                attributes,
                item.extracted_at
            ],
        )?;

        Ok(if changed == 0 {
            InsertOutcome::Duplicate
        } else {
            InsertOutcome::Inserted
        })
    }

    fn get_item(&self, url: &str) -> StorageResult<Option<ExtractedItem>> {
        let row = self
            .conn
            .query_row(
                "SELECT url, name, category, attributes, extracted_at FROM extracted_items WHERE url = ?1",
                params![normalize_key(url)],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((url, name, category, attributes, extracted_at)) => {
                let attributes: BTreeMap<String, f64> = serde_json::from_str(&attributes)?;
                Ok(Some(ExtractedItem {
                    url,
                    name,
                    category,
                    attributes,
                    extracted_at,
                }))
            }
            None => Ok(None),
        }
    }

    fn count_items(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM extracted_items")
    }

    fn reset_items(&mut self) -> StorageResult<u64> {
        let removed = self.conn.execute("DELETE FROM extracted_items", [])?;
        Ok(removed as u64)
    }

    // ===== Statistics =====

    fn top_categories(&self, limit: usize) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, COUNT(*) AS n FROM candidate_urls
             GROUP BY category ORDER BY n DESC, category ASC LIMIT ?1",
        )?;

        let top = stmt
            .query_map(params![limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(top)
    }

    fn count_remaining(&self) -> StorageResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM candidate_urls c
             WHERE NOT EXISTS (SELECT 1 FROM extracted_items i WHERE i.url = c.url)",
        )
    }

    fn count_uncovered_candidates(&self) -> StorageResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM candidate_urls c
             WHERE NOT EXISTS (SELECT 1 FROM extracted_items i WHERE i.category = c.category)",
        )
    }
}
