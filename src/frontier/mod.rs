//! URL frontier
//!
//! This module enumerates the work still to do in a run:
//! - Category pages listed on the index, minus exhausted categories
//! - Item pages listed on category pages, minus URLs already recorded
//! - The remaining extraction work (candidates without an extracted item)

mod discovery;
mod snapshot;

pub use discovery::{CategoryDiscovery, CategoryRef, Frontier, ItemDiscovery};
pub use snapshot::{count_exhausted, remaining_work, RunSnapshot};
