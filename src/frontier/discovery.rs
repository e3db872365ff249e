//! Category and item link discovery

use crate::config::SiteConfig;
use crate::crawler::{category_from_heading, primary_heading, UNKNOWN};
use crate::frontier::RunSnapshot;
use crate::storage::CandidateUrl;
use crate::url::{is_category_link, is_item_link, normalize_key, parse_http_url, resolve_link};
use crate::UrlError;
use rand::seq::SliceRandom;
use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet};
use url::Url;

/// A category page found on the index
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRef {
    /// Display name taken from the index link text; may be empty
    pub name: String,
    /// Absolute category page URL
    pub url: Url,
}

/// Categories found on the index page
#[derive(Debug, Clone, Default)]
pub struct CategoryDiscovery {
    /// Categories still to be visited, in index order
    pub to_visit: Vec<CategoryRef>,
    /// Categories skipped because they already reached the cap
    pub exhausted: Vec<CategoryRef>,
}

/// Items found on one category page
#[derive(Debug, Clone, Default)]
pub struct ItemDiscovery {
    /// Category label the candidates are recorded under
    pub category: String,
    /// New candidates to insert
    pub candidates: Vec<CandidateUrl>,
    /// Distinct item links on the page
    pub found: usize,
    /// Links dropped by the per-category cap
    pub over_cap: usize,
    /// Links already recorded before or during this run
    pub already_known: usize,
}

/// Enumerates category and item URLs that still need work
///
/// Owns the run snapshot plus the set of URLs emitted so far this run, so an item
/// listed under two categories is offered once.
#[derive(Debug)]
pub struct Frontier {
    snapshot: RunSnapshot,
    index_url: Url,
    category_prefix: String,
    item_marker: String,
    cap: usize,
    fresh: bool,
    emitted: HashSet<String>,
}

impl Frontier {
    /// Creates a frontier
    ///
    /// With `fresh` set the snapshot is ignored: no category counts as exhausted and
    /// no URL counts as known. The store still drops duplicates on insert.
    pub fn new(
        snapshot: RunSnapshot,
        site: &SiteConfig,
        cap: u32,
        fresh: bool,
    ) -> Result<Self, UrlError> {
        Ok(Self {
            snapshot,
            index_url: parse_http_url(&site.index_url)?,
            category_prefix: site.category_prefix.clone(),
            item_marker: site.item_marker.clone(),
            cap: cap as usize,
            fresh,
            emitted: HashSet::new(),
        })
    }

    /// The category index page
    pub fn index_url(&self) -> &Url {
        &self.index_url
    }

    /// Parses the index page into categories to visit and exhausted categories
    pub fn discover_categories(&self, index_body: &str) -> CategoryDiscovery {
        let document = Html::parse_document(index_body);
        let mut categories: Vec<CategoryRef> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        if let Ok(selector) = Selector::parse("a[href]") {
            for anchor in document.select(&selector) {
                let Some(href) = anchor.value().attr("href") else {
                    continue;
                };
                let Some(link) = resolve_link(href, &self.index_url) else {
                    continue;
                };
                if !is_category_link(&link, &self.index_url, &self.category_prefix) {
                    continue;
                }

                let name = anchor.text().collect::<Vec<_>>().join(" ");
                let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
                let key = normalize_key(link.as_str());

                match positions.get(&key) {
                    // Image links often precede the text link for the same category
                    Some(&idx) => {
                        if categories[idx].name.is_empty() && !name.is_empty() {
                            categories[idx].name = name;
                        }
                    }
                    None => {
                        positions.insert(key, categories.len());
                        categories.push(CategoryRef { name, url: link });
                    }
                }
            }
        }

        let mut discovery = CategoryDiscovery::default();
        for category in categories {
            if !self.fresh
                && !category.name.is_empty()
                && self.snapshot.is_exhausted(&category.name, self.cap as u64)
            {
                discovery.exhausted.push(category);
            } else {
                discovery.to_visit.push(category);
            }
        }
        discovery
    }

    /// Parses a category page into new item candidates
    ///
    /// Item links are deduplicated, shuffled and cut to the per-category cap before
    /// known URLs are filtered out.
    pub fn discover_items(&mut self, body: &str, category: &CategoryRef) -> ItemDiscovery {
        let document = Html::parse_document(body);
        let label = self.category_label(&document, category);

        let mut seen = HashSet::new();
        let mut links: Vec<String> = Vec::new();
        if let Ok(selector) = Selector::parse("a[href]") {
            for href in document
                .select(&selector)
                .filter_map(|anchor| anchor.value().attr("href"))
            {
                let Some(link) = resolve_link(href, &category.url) else {
                    continue;
                };
                if !is_item_link(&link, &self.item_marker) {
                    continue;
                }
                let key = normalize_key(link.as_str());
                if seen.insert(key.clone()) {
                    links.push(key);
                }
            }
        }

        let found = links.len();
        links.shuffle(&mut rand::thread_rng());
        links.truncate(self.cap);

        let mut discovery = ItemDiscovery {
            category: label,
            found,
            over_cap: found - links.len(),
            ..Default::default()
        };

        for url in links {
            let known = !self.fresh && self.snapshot.is_known(&url);
            if known || self.emitted.contains(&url) {
                discovery.already_known += 1;
                continue;
            }
            self.emitted.insert(url.clone());
            discovery
                .candidates
                .push(CandidateUrl::new(&url, &discovery.category));
        }

        discovery
    }

    /// Label for a category: the index link text, else the page heading
    fn category_label(&self, document: &Html, category: &CategoryRef) -> String {
        if !category.name.is_empty() {
            return category.name.clone();
        }

        primary_heading(document)
            .and_then(|heading| category_from_heading(&heading))
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}
