//! Per-run snapshot of persisted crawl state

use crate::storage::{CandidateUrl, Storage, StorageResult};
use std::collections::{HashMap, HashSet};

/// What the store already knew when a phase started
///
/// Loaded once at phase start and owned by the frontier for the rest of the phase.
#[derive(Debug, Clone, Default)]
pub struct RunSnapshot {
    /// Normalized URLs of every candidate recorded so far
    pub known_urls: HashSet<String>,

    /// Candidate count per category (the exhaustion markers)
    pub category_counts: HashMap<String, u64>,
}

impl RunSnapshot {
    /// Loads the snapshot from the store
    pub fn load(storage: &dyn Storage) -> StorageResult<Self> {
        Ok(Self {
            known_urls: storage.seen_urls()?,
            category_counts: storage.count_by_category()?,
        })
    }

    /// Returns true when a category already holds `cap` or more candidates
    pub fn is_exhausted(&self, category: &str, cap: u64) -> bool {
        self.category_counts
            .get(category)
            .is_some_and(|count| *count >= cap)
    }

    /// Returns true when the URL was recorded before this run
    pub fn is_known(&self, url: &str) -> bool {
        self.known_urls.contains(url)
    }
}

/// Number of categories at or over the cap
pub fn count_exhausted(category_counts: &HashMap<String, u64>, cap: u64) -> usize {
    category_counts.values().filter(|count| **count >= cap).count()
}

/// Candidates that have no extracted item yet, in discovery order
pub fn remaining_work(storage: &dyn Storage) -> StorageResult<Vec<CandidateUrl>> {
    let done = storage.seen_items()?;
    Ok(storage
        .load_candidates()?
        .into_iter()
        .filter(|candidate| !done.contains(&candidate.url))
        .collect())
}
