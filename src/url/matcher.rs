use url::Url;

/// Checks whether a resolved link has the shape of a category (designer) page
///
/// A category link lives on the same host as the index page, its path starts with
/// `prefix`, and it points to an `.html` document. The bare prefix itself (the index
/// page) never matches.
///
/// # Examples
///
/// ```
/// use accord_harvest::url::is_category_link;
/// use url::Url;
///
/// let index = Url::parse("https://x.test/designers/").unwrap();
/// let link = Url::parse("https://x.test/designers/Acme.html").unwrap();
/// assert!(is_category_link(&link, &index, "/designers/"));
/// ```
pub fn is_category_link(link: &Url, index: &Url, prefix: &str) -> bool {
    if link.host_str() != index.host_str() || link.port() != index.port() {
        return false;
    }

    let path = link.path();
    path.starts_with(prefix) && path.len() > prefix.len() && path.contains(".html")
}

/// Checks whether a resolved link has the shape of an item page
///
/// The marker is matched anywhere in the path, so relative and absolute item links
/// are treated the same once resolved.
pub fn is_item_link(link: &Url, marker: &str) -> bool {
    link.path().contains(marker)
}
