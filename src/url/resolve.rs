use crate::{UrlError, UrlResult};
use url::Url;

/// Parses a base URL, accepting only HTTP and HTTPS
pub fn parse_base(base: &str) -> UrlResult<Url> {
    let url = Url::parse(base).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    Ok(url)
}

/// Resolves an href found on a page to an absolute URL
///
/// Returns None if the link should be ignored:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel:, data: schemes
/// - anything that does not resolve to HTTP(S)
///
/// # Examples
///
/// ```
/// use book_ingest::url::resolve_link;
/// use url::Url;
///
/// let page = Url::parse("https://books.example.com/catalogue/page-2.html").unwrap();
/// assert_eq!(
///     resolve_link("dune_12/index.html", &page),
///     Some("https://books.example.com/catalogue/dune_12/index.html".to_string())
/// );
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
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

    let absolute = base_url.join(href).ok()?;
    if absolute.scheme() == "http" || absolute.scheme() == "https" {
        Some(absolute.to_string())
    } else {
        None
    }
}

/// Builds the URL of listing page `page`
///
/// Page 1 is the entry URL (`entry_path` relative to the base); later pages
/// substitute the page number into `pattern`.
pub fn listing_page_url(base: &Url, entry_path: &str, pattern: &str, page: u32) -> UrlResult<Url> {
    let relative = if page <= 1 {
        entry_path.to_string()
    } else {
        if !pattern.contains("{n}") {
            return Err(UrlError::MissingPagePlaceholder(pattern.to_string()));
        }
        pattern.replace("{n}", &page.to_string())
    };

    base.join(&relative)
        .map_err(|e| UrlError::Parse(format!("{}: {}", relative, e)))
}
