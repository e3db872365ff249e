//! Crawler module for fetching and processing pages
//!
//! This module contains the core harvesting logic, including:
//! - Request pacing, adaptive throttling and halting (the rate governor)
//! - HTTP fetching with identity rotation and error classification
//! - Item page extraction
//! - Phase coordination over a bounded worker pool

mod coordinator;
mod extractor;
mod fetcher;
mod governor;

pub use coordinator::{Coordinator, Phase, PhaseOutcome, PhaseReport};
pub use extractor::{
    category_from_heading, extract, extract_attributes, extract_best_effort,
    parse_width_percent, primary_heading, resolve_category, resolve_name, DiscoveryContext,
    ExtractionError, UNKNOWN,
};
pub use fetcher::{build_http_client, FetchError, FetchedPage, PageFetcher};
pub use governor::{HaltReason, RateGovernor};
