//! Sequential listing traversal inside one crawl session

use crate::config::{CrawlerConfig, SourceConfig};
use crate::crawler::extractor::{extract_listing, ListingSelectors};
use crate::model::CandidateRecord;
use crate::session::CrawlSession;
use crate::url::{listing_page_url, parse_base};
use crate::{NavigationError, ParseError, UrlResult};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Why a crawl attempt could not finish its listing traversal
///
/// Both variants are answered by a whole-session retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttemptError {
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Records gathered by one complete traversal
#[derive(Debug, Clone, Default)]
pub struct ListingResult {
    pub records: Vec<CandidateRecord>,
    pub pages_fetched: u32,
}

/// Walks listing pages in order, accumulating records up to the cap
pub struct ListingWalker {
    base: Url,
    entry_path: String,
    page_url_pattern: String,
    readiness_selector: String,
    max_pages: u32,
    max_records: usize,
    timeout: Duration,
    selectors: ListingSelectors,
}

impl ListingWalker {
    pub fn new(
        source: &SourceConfig,
        crawler: &CrawlerConfig,
        selectors: ListingSelectors,
    ) -> UrlResult<Self> {
        Ok(Self {
            base: parse_base(&source.base_url)?,
            entry_path: source.entry_path.clone(),
            page_url_pattern: source.page_url_pattern.clone(),
            readiness_selector: source.readiness_selector.clone(),
            max_pages: crawler.max_pages,
            max_records: crawler.max_records,
            timeout: crawler.navigation_timeout(),
            selectors,
        })
    }

    /// URL of listing page `page` (1-based)
    pub fn page_url(&self, page: u32) -> Result<Url, ParseError> {
        listing_page_url(&self.base, &self.entry_path, &self.page_url_pattern, page).map_err(
            |e| ParseError::PageUrl {
                page,
                reason: e.to_string(),
            },
        )
    }

    /// Traverses pages `1..=max_pages` in `session`
    ///
    /// Stops early once `max_records` records are held (the last page is
    /// truncated), or when a page yields nothing or has no next-page link.
    /// Any page failure fails the whole traversal; records gathered so far
    /// are discarded.
    pub async fn walk(&self, session: &mut CrawlSession) -> Result<ListingResult, AttemptError> {
        let mut result = ListingResult::default();

        for page in 1..=self.max_pages {
            let url = self.page_url(page)?;
            let loaded = session
                .load(url.as_str(), &self.readiness_selector, self.timeout)
                .await?;
            result.pages_fetched += 1;

            let page_url = Url::parse(&loaded.url).unwrap_or(url);
            let listing = extract_listing(&loaded.html, &page_url, &self.selectors);

            tracing::debug!(
                "Page {} of attempt {}: {} record(s)",
                page,
                session.attempt(),
                listing.records.len()
            );

            if listing.records.is_empty() {
                tracing::info!("Page {} has no records, end of catalog", page);
                break;
            }

            let remaining = self.max_records - result.records.len();
            if listing.records.len() >= remaining {
                result
                    .records
                    .extend(listing.records.into_iter().take(remaining));
                tracing::info!(
                    "Record cap of {} reached on page {}",
                    self.max_records,
                    page
                );
                break;
            }

            result.records.extend(listing.records);

            if !listing.has_next {
                tracing::info!("Page {} has no next-page link, end of catalog", page);
                break;
            }
        }

        Ok(result)
    }
}
