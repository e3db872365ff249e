use crate::UrlError;
use url::Url;

/// Normalizes a URL into the key used for every comparison and every stored record
///
/// # Normalization Steps
///
/// 1. Drop everything from the first `?` or `#` onward (query and fragment)
/// 2. Drop trailing `/` characters
///
/// Two URLs that are equal after these steps are the same candidate. The function is
/// purely textual and idempotent, so it can be applied again by the store without
/// changing an already-normalized key.
///
/// # Examples
///
/// ```
/// use accord_harvest::url::normalize_key;
///
/// assert_eq!(
///     normalize_key("https://x.test/perfume/A-1.html/?ref=foo"),
///     "https://x.test/perfume/A-1.html"
/// );
/// ```
pub fn normalize_key(raw: &str) -> String {
    let raw = raw.trim();
    let without_tail = match raw.find(|c: char| c == '?' || c == '#') {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    without_tail.trim_end_matches('/').to_string()
}

/// Parses an absolute URL, accepting only HTTP(S)
///
/// Plain HTTP is accepted so mock servers can be used in tests.
pub fn parse_http_url(raw: &str) -> Result<Url, UrlError> {
    let url = Url::parse(raw).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

/// Resolves a link href against the page it was found on
///
/// The fragment is dropped from the resolved URL.
///
/// Returns None if the link should be ignored:
/// - javascript:, mailto:, tel:, data: schemes
/// - fragment-only links
/// - links that do not resolve to HTTP(S)
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(mut absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            absolute.set_fragment(None);
            Some(absolute)
        }
        _ => None,
    }
}
