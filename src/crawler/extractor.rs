//! Attribute extractor for item pages
//!
//! Turns an item page into an [`ExtractedItem`]: the display name from the primary
//! heading, a category label, and the weighted accord bars. Markup drift never aborts
//! extraction; missing pieces fall back to empty or "Unknown" values.

use crate::storage::ExtractedItem;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;

/// Label used when no better name or category is available
pub const UNKNOWN: &str = "Unknown";

/// Suffix carried by category page headings
const HEADING_SUFFIX: &str = " perfumes and colognes";

const BAR_SELECTOR: &str = "div.flex.flex-col.w-full > div.w-full > div";
const LABEL_SELECTOR: &str = "span.truncate";

/// What discovery knew about an item URL
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryContext {
    /// The item page URL
    pub url: String,
    /// Category the URL was discovered under, if recorded
    pub category: Option<String>,
}

impl DiscoveryContext {
    pub fn new(url: &str, category: Option<&str>) -> Self {
        Self {
            url: url.to_string(),
            category: category.map(str::to_string),
        }
    }
}

/// Extraction errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Item page has no primary heading")]
    MissingTitle,
}

/// Extracts an item, failing when the page has no primary heading
pub fn extract(body: &str, context: &DiscoveryContext) -> Result<ExtractedItem, ExtractionError> {
    let document = Html::parse_document(body);
    let title = primary_heading(&document).ok_or(ExtractionError::MissingTitle)?;

    let category = resolve_category(context.category.as_deref(), Some(title.as_str()));
    let attributes = extract_attributes(&document);

    Ok(ExtractedItem::new(&context.url, &title, &category, attributes))
}

/// Extracts an item, degrading to a record named "Unknown" instead of failing
///
/// Attribute bars and the discovery category are still kept on the fallback record.
pub fn extract_best_effort(body: &str, context: &DiscoveryContext) -> ExtractedItem {
    match extract(body, context) {
        Ok(item) => item,
        Err(e) => {
            tracing::warn!("{} at {}, storing fallback record", e, context.url);
            let document = Html::parse_document(body);
            ExtractedItem::new(
                &context.url,
                &resolve_name(None),
                &resolve_category(context.category.as_deref(), None),
                extract_attributes(&document),
            )
        }
    }
}

/// Returns the display name, "Unknown" when the page had no heading
pub fn resolve_name(title: Option<&str>) -> String {
    title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

/// Resolves the category label
///
/// Order: the discovery category, then the first word of the title, then "Unknown".
pub fn resolve_category(discovered: Option<&str>, title: Option<&str>) -> String {
    if let Some(category) = discovered.map(str::trim).filter(|c| !c.is_empty()) {
        return category.to_string();
    }

    title
        .and_then(|t| t.split_whitespace().next())
        .unwrap_or(UNKNOWN)
        .to_string()
}

/// Derives a category label from a category page heading
///
/// "Chanel perfumes and colognes" becomes "Chanel". Headings without the suffix are
/// returned trimmed. Returns `None` for an empty heading.
pub fn category_from_heading(heading: &str) -> Option<String> {
    let heading = heading.split_whitespace().collect::<Vec<_>>().join(" ");
    let lower = heading.to_lowercase();

    let cleaned = if lower.ends_with(HEADING_SUFFIX) && lower.len() == heading.len() {
        heading[..heading.len() - HEADING_SUFFIX.len()].trim()
    } else {
        heading.trim()
    };

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// First non-empty `h1` text on the page, trimmed
pub fn primary_heading(document: &Html) -> Option<String> {
    let selector = Selector::parse("h1").ok()?;

    document
        .select(&selector)
        .flat_map(|element| element.text())
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

/// Collects accord label -> weight pairs from the page's attribute bars
///
/// Bars with an empty label or no parseable `width: <n>%` are skipped. A repeated
/// label keeps the last weight seen.
pub fn extract_attributes(document: &Html) -> BTreeMap<String, f64> {
    let mut attributes = BTreeMap::new();

    let (Ok(bar_selector), Ok(label_selector)) =
        (Selector::parse(BAR_SELECTOR), Selector::parse(LABEL_SELECTOR))
    else {
        return attributes;
    };

    for bar in document.select(&bar_selector) {
        let Some(label) = bar
            .select(&label_selector)
            .next()
            .map(|span| span.text().collect::<String>().trim().to_string())
            .filter(|label| !label.is_empty())
        else {
            continue;
        };

        match bar_weight(&bar) {
            Some(weight) => {
                attributes.insert(label, weight);
            }
            None => tracing::trace!("Skipping accord bar '{}' without a width", label),
        }
    }

    attributes
}

/// Reads the width percentage from a bar's inline style
fn bar_weight(bar: &ElementRef<'_>) -> Option<f64> {
    bar.value().attr("style").and_then(parse_width_percent)
}

/// Parses `width: <n>%` out of an inline style
pub fn parse_width_percent(style: &str) -> Option<f64> {
    static WIDTH: OnceLock<Option<Regex>> = OnceLock::new();
    let re = WIDTH
        .get_or_init(|| Regex::new(r"width:\s*([\d.]+)%").ok())
        .as_ref()?;

    re.captures(style)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|w| w.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITEM_PAGE: &str = r#"
        <html><body>
          <h1>  Bleu de Chanel Chanel for men </h1>
          <div class="flex flex-col w-full">
            <div class="w-full">
              <div style="background: #c9a; width: 100%;"><span class="truncate">woody</span></div>
              <div style="width:72.5%"><span class="truncate"> citrus </span></div>
              <div style="width: abc%"><span class="truncate">broken</span></div>
              <div style="width: 30%"><span class="truncate">  </span></div>
            </div>
          </div>
        </body></html>
    "#;

    fn context(category: Option<&str>) -> DiscoveryContext {
        DiscoveryContext::new("https://x.test/perfume/Chanel/Bleu-1.html?ref=x", category)
    }

    #[test]
    fn test_extract_full_page() {
        let item = extract(ITEM_PAGE, &context(Some("Chanel"))).unwrap();

        assert_eq!(item.url, "https://x.test/perfume/Chanel/Bleu-1.html");
        assert_eq!(item.name, "Bleu de Chanel Chanel for men");
        assert_eq!(item.category, "Chanel");
        assert_eq!(item.attributes.len(), 2);
        assert_eq!(item.attributes["woody"], 100.0);
        assert_eq!(item.attributes["citrus"], 72.5);
    }

    #[test]
    fn test_extract_without_heading_fails() {
        let body = "<html><body><p>nothing here</p></body></html>";
        assert_eq!(
            extract(body, &context(None)).unwrap_err(),
            ExtractionError::MissingTitle
        );
    }

    #[test]
    fn test_best_effort_without_heading() {
        let body = "<html><body><p>nothing here</p></body></html>";
        let item = extract_best_effort(body, &context(None));

        assert_eq!(item.name, "Unknown");
        assert_eq!(item.category, "Unknown");
        assert!(item.attributes.is_empty());
    }

    #[test]
    fn test_best_effort_keeps_discovery_category() {
        let body = "<html><body></body></html>";
        let item = extract_best_effort(body, &context(Some("Dior")));
        assert_eq!(item.name, "Unknown");
        assert_eq!(item.category, "Dior");
    }

    #[test]
    fn test_category_falls_back_to_first_title_word() {
        let item = extract(ITEM_PAGE, &context(None)).unwrap();
        assert_eq!(item.category, "Bleu");
    }

    #[test]
    fn test_resolve_category_order() {
        assert_eq!(resolve_category(Some("Acme"), Some("Other Name")), "Acme");
        assert_eq!(resolve_category(Some("  "), Some("Other Name")), "Other");
        assert_eq!(resolve_category(None, None), "Unknown");
    }

    #[test]
    fn test_resolve_name() {
        assert_eq!(resolve_name(Some(" Aventus ")), "Aventus");
        assert_eq!(resolve_name(Some("")), "Unknown");
        assert_eq!(resolve_name(None), "Unknown");
    }

    #[test]
    fn test_duplicate_labels_last_wins() {
        let body = r#"
            <div class="flex flex-col w-full"><div class="w-full">
              <div style="width: 10%"><span class="truncate">amber</span></div>
              <div style="width: 40%"><span class="truncate">amber</span></div>
            </div></div>
        "#;
        let attributes = extract_attributes(&Html::parse_document(body));
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes["amber"], 40.0);
    }

    #[test]
    fn test_bars_outside_container_are_ignored() {
        let body = r#"<div style="width: 50%"><span class="truncate">stray</span></div>"#;
        assert!(extract_attributes(&Html::parse_document(body)).is_empty());
    }

    #[test]
    fn test_parse_width_percent() {
        assert_eq!(parse_width_percent("width: 55%"), Some(55.0));
        assert_eq!(parse_width_percent("opacity: 1; width:12.25%;"), Some(12.25));
        assert_eq!(parse_width_percent("width: 55px"), None);
        assert_eq!(parse_width_percent(""), None);
    }

    #[test]
    fn test_category_from_heading() {
        assert_eq!(
            category_from_heading("Chanel perfumes and colognes"),
            Some("Chanel".to_string())
        );
        assert_eq!(
            category_from_heading("  Maison   Margiela Perfumes and Colognes "),
            Some("Maison Margiela".to_string())
        );
        assert_eq!(category_from_heading("Acme"), Some("Acme".to_string()));
        assert_eq!(category_from_heading("   "), None);
    }

    #[test]
    fn test_primary_heading_skips_empty_h1() {
        let document = Html::parse_document("<h1> </h1><h1>Second</h1>");
        assert_eq!(primary_heading(&document), Some("Second".to_string()));
    }
}
