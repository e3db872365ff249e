//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{CandidateUrl, ExtractedItem, InsertOutcome};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Uniqueness of both record kinds is enforced by the backend itself, so callers may
/// insert the same record any number of times: the first call writes it, later calls
/// report [`InsertOutcome::Duplicate`] and change nothing.
pub trait Storage {
    // ===== Candidate URLs =====

    /// Returns every normalized URL already recorded
    fn seen_urls(&self) -> StorageResult<HashSet<String>>;

    /// Inserts a candidate URL unless one with the same key exists
    fn insert_url(&mut self, candidate: &CandidateUrl) -> StorageResult<InsertOutcome>;

    /// Loads all candidate URLs with their categories
    fn load_candidates(&self) -> StorageResult<Vec<CandidateUrl>>;

    /// Counts candidate URLs per category
    ///
    /// This is the aggregation behind the exhaustion markers.
    fn count_by_category(&self) -> StorageResult<HashMap<String, u64>>;

    /// Gets total candidate URL count
    fn count_urls(&self) -> StorageResult<u64>;

    /// Deletes every candidate URL, returning how many were removed
    fn reset_urls(&mut self) -> StorageResult<u64>;

    // ===== Extracted Items =====

    /// Returns every source URL already extracted
    fn seen_items(&self) -> StorageResult<HashSet<String>>;

    /// Inserts an extracted item unless one with the same source URL exists
    fn insert_item(&mut self, item: &ExtractedItem) -> StorageResult<InsertOutcome>;

    /// Gets an item by its source URL
    fn get_item(&self, url: &str) -> StorageResult<Option<ExtractedItem>>;

    /// Gets total extracted item count
    fn count_items(&self) -> StorageResult<u64>;

    /// Deletes every extracted item, returning how many were removed
    fn reset_items(&mut self) -> StorageResult<u64>;

    // ===== Statistics =====

    /// Categories ordered by candidate URL count, largest first
    fn top_categories(&self, limit: usize) -> StorageResult<Vec<(String, u64)>>;

    /// Number of candidate URLs that have no extracted item yet
    fn count_remaining(&self) -> StorageResult<u64>;

    /// Number of candidate URLs whose category has no extracted item at all
    fn count_uncovered_candidates(&self) -> StorageResult<u64>;
}
