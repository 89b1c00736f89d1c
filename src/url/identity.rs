use url::Url;
use uuid::Uuid;

/// Trailing path segments that name a document rather than an entry
const DOCUMENT_NAMES: &[&str] = &["index.html", "index.htm", "index.php", "default.html"];

/// Derives a stable record identifier from a detail-page URL
///
/// The identifier is the last meaningful path segment, skipping document
/// names such as `index.html`. Returns None when the path carries no usable
/// segment.
///
/// # Examples
///
/// ```
/// use book_ingest::url::record_id_from_url;
///
/// assert_eq!(
///     record_id_from_url("https://books.example.com/catalogue/dune_12/index.html"),
///     Some("dune_12".to_string())
/// );
/// assert_eq!(
///     record_id_from_url("https://openlibrary.org/works/OL45804W"),
///     Some("OL45804W".to_string())
/// );
/// ```
pub fn record_id_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segments = parsed.path_segments()?;

    segments
        .filter(|s| !s.is_empty())
        .filter(|s| !DOCUMENT_NAMES.contains(&s.to_ascii_lowercase().as_str()))
        .last()
        .map(|s| s.to_string())
}

/// Random fallback identifier for entries without a usable link path
pub fn fallback_record_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Derives a record identifier, falling back to a random token
pub fn derive_record_id(url: Option<&str>) -> String {
    url.and_then(record_id_from_url)
        .unwrap_or_else(fallback_record_id)
}
