//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::frontier::count_exhausted;
use crate::storage::Storage;
use crate::HarvestError;

/// Number of categories listed in the "top categories" table
pub const TOP_CATEGORIES: usize = 5;

/// Harvest statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestStatistics {
    /// Candidate URLs collected
    pub urls_collected: u64,

    /// Items extracted
    pub items_extracted: u64,

    /// Candidates without an extracted item
    pub remaining: u64,

    /// Number of distinct categories among candidates
    pub categories: u64,

    /// Categories at or over the per-category cap
    pub exhausted_categories: u64,

    /// Largest categories by candidate count
    pub top_categories: Vec<(String, u64)>,

    /// Candidates whose category has no extracted item yet
    pub uncovered_candidates: u64,
}

impl HarvestStatistics {
    /// Share of collected URLs that have been extracted, in percent
    pub fn progress_percent(&self) -> f64 {
        if self.urls_collected == 0 {
            return 0.0;
        }
        let done = self.urls_collected.saturating_sub(self.remaining);
        (done as f64 / self.urls_collected as f64) * 100.0
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `cap` - The per-category cap used to count exhausted categories
pub fn load_statistics(storage: &dyn Storage, cap: u32) -> Result<HarvestStatistics, HarvestError> {
    let by_category = storage.count_by_category()?;

    Ok(HarvestStatistics {
        urls_collected: storage.count_urls()?,
        items_extracted: storage.count_items()?,
        remaining: storage.count_remaining()?,
        categories: by_category.len() as u64,
        exhausted_categories: count_exhausted(&by_category, cap as u64) as u64,
        top_categories: storage.top_categories(TOP_CATEGORIES)?,
        uncovered_candidates: storage.count_uncovered_candidates()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  URLs collected: {}", stats.urls_collected);
    println!("  Items extracted: {}", stats.items_extracted);
    println!("  Remaining to extract: {}", stats.remaining);
    println!("  Progress: {:.1}%", stats.progress_percent());
    println!();

    println!("Categories:");
    println!("  Total: {}", stats.categories);
    println!("  Exhausted: {}", stats.exhausted_categories);
    println!(
        "  URLs in categories with no items yet: {}",
        stats.uncovered_candidates
    );
    println!();

    if !stats.top_categories.is_empty() {
        println!("Top Categories by URL count:");
        for (category, count) in &stats.top_categories {
            println!("  {}: {}", category, count);
        }
        println!();
    }
}
