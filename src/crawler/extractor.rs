//! Listing page extractor
//!
//! Turns the serialized document of one listing page into candidate records.
//! This is a pure function of the page content: it does not touch the
//! session or any orchestration state, and it never fails. Entries that
//! cannot be minimally parsed are skipped and logged.

use crate::config::SelectorConfig;
use crate::model::{CandidateRecord, UNKNOWN_AUTHOR};
use crate::url::{derive_record_id, resolve_link};
use crate::ParseError;
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Compiled selectors for listing pages
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    entry: Selector,
    link: Selector,
    image: Selector,
    rating: Selector,
    availability: Selector,
    next_page: Selector,
}

impl ListingSelectors {
    pub fn from_config(config: &SelectorConfig) -> Result<Self, ParseError> {
        Ok(Self {
            entry: compile(&config.entry)?,
            link: compile(&config.link)?,
            image: compile(&config.image)?,
            rating: compile(&config.rating)?,
            availability: compile(&config.availability)?,
            next_page: compile(&config.next_page)?,
        })
    }
}

pub(crate) fn compile(selector: &str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|_| ParseError::InvalidSelector(selector.to_string()))
}

/// Records extracted from one listing page
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    /// Parsed records in document order
    pub records: Vec<CandidateRecord>,

    /// Whether the page links to a following listing page
    pub has_next: bool,

    /// Entries that were dropped because they could not be parsed
    pub skipped: usize,
}

/// Extracts candidate records from a listing page
///
/// # Field rules
///
/// - `title`: the detail link's `title` attribute, else its text. Required.
/// - `source_url` / `id`: the detail link resolved against `page_url`; the
///   id is its last meaningful path segment (random token if none).
/// - `cover_url`: the entry image resolved against `page_url`, if any.
/// - `subjects`: rating and availability descriptors, standing in for genre
///   data the listing does not carry.
/// - `authors`: the unknown-author placeholder until enrichment.
///
/// # Example
///
/// ```
/// use book_ingest::config::SelectorConfig;
/// use book_ingest::crawler::{extract_listing, ListingSelectors};
/// use url::Url;
///
/// let html = r#"<article class="product_pod">
///   <h3><a href="dune_12/index.html" title="Dune">Dune</a></h3>
/// </article>"#;
/// let page_url = Url::parse("https://books.example.com/catalogue/page-2.html").unwrap();
/// let selectors = ListingSelectors::from_config(&SelectorConfig::default()).unwrap();
///
/// let page = extract_listing(html, &page_url, &selectors);
/// assert_eq!(page.records[0].id, "dune_12");
/// ```
pub fn extract_listing(html: &str, page_url: &Url, selectors: &ListingSelectors) -> ListingPage {
    let document = Html::parse_document(html);
    let now = Utc::now();

    let mut page = ListingPage {
        has_next: document.select(&selectors.next_page).next().is_some(),
        ..ListingPage::default()
    };

    for (index, entry) in document.select(&selectors.entry).enumerate() {
        match extract_entry(entry, page_url, selectors, now) {
            Ok(record) => page.records.push(record),
            Err(e) => {
                tracing::debug!("Skipping entry {} on {}: {}", index, page_url, e);
                page.skipped += 1;
            }
        }
    }

    if page.skipped > 0 {
        tracing::warn!(
            "Skipped {} malformed entr{} on {}",
            page.skipped,
            if page.skipped == 1 { "y" } else { "ies" },
            page_url
        );
    }

    page
}

fn extract_entry(
    entry: ElementRef<'_>,
    page_url: &Url,
    selectors: &ListingSelectors,
    now: DateTime<Utc>,
) -> Result<CandidateRecord, ParseError> {
    let link = entry.select(&selectors.link).next();

    let title = link
        .and_then(|a| {
            a.value()
                .attr("title")
                .map(clean_text)
                .filter(|t| !t.is_empty())
                .or_else(|| Some(element_text(a)).filter(|t| !t.is_empty()))
        })
        .ok_or(ParseError::MissingField("title"))?;

    let detail_url = link
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| resolve_link(href, page_url));

    let id = derive_record_id(detail_url.as_deref());
    let source_url = detail_url.unwrap_or_else(|| page_url.to_string());

    let cover_url = entry
        .select(&selectors.image)
        .next()
        .and_then(|img| img.value().attr("src"))
        .and_then(|src| resolve_link(src, page_url));

    let mut subjects = Vec::new();
    if let Some(rating) = entry.select(&selectors.rating).next().and_then(rating_word) {
        subjects.push(format!("Rating: {}", rating));
    }
    if let Some(availability) = entry
        .select(&selectors.availability)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
    {
        subjects.push(availability);
    }

    Ok(CandidateRecord {
        id,
        title,
        authors: vec![UNKNOWN_AUTHOR.to_string()],
        cover_url,
        year_published: None,
        subjects,
        source_url,
        discovered_at: now,
    })
}

/// Reads a star rating from `class="star-rating Three"` style markup,
/// falling back to the element's text
fn rating_word(element: ElementRef<'_>) -> Option<String> {
    element
        .value()
        .classes()
        .find(|class| !class.eq_ignore_ascii_case("star-rating"))
        .map(|class| class.to_string())
        .or_else(|| Some(element_text(element)).filter(|t| !t.is_empty()))
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

/// Trims and collapses internal whitespace
pub(crate) fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
