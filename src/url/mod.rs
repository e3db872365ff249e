//! URL handling module for Accord-Harvest
//!
//! This module owns the single normalization rule used wherever URLs are compared or
//! stored, link resolution, and the link-shape matchers for the site hierarchy.

mod matcher;
mod normalize;

pub use matcher::{is_category_link, is_item_link};
pub use normalize::{normalize_key, parse_http_url, resolve_link};
