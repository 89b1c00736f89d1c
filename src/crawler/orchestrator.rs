//! Crawl orchestration: session lifecycle, retries and the state machine

use crate::config::Config;
use crate::crawler::detail::DetailSelectors;
use crate::crawler::enrichment::Enricher;
use crate::crawler::extractor::ListingSelectors;
use crate::crawler::listing::ListingWalker;
use crate::model::CandidateRecord;
use crate::session::{Browser, CrawlSession};
use crate::state::{CrawlState, RetryPolicy};
use crate::{ConfigError, IngestError};

/// Result of one orchestrated crawl
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Final records in page-then-entry order; empty when retries ran out
    pub records: Vec<CandidateRecord>,
    pub final_state: CrawlState,
    /// Attempts started, including the successful one
    pub attempts: u32,
    /// Backoff sleeps taken between attempts
    pub backoffs: u32,
    /// Listing pages loaded across all attempts
    pub pages_fetched: u32,
}

/// Drives a crawl from `Idle` to `Success` or `Exhausted`
///
/// Each attempt opens a fresh session, walks the listing and releases the
/// session before anything else happens, whether the walk succeeded or not.
/// A failed walk is retried from scratch after a fixed delay until the
/// attempt budget runs out.
pub struct Orchestrator<'a> {
    browser: &'a dyn Browser,
    walker: ListingWalker,
    enricher: Enricher<'a>,
    retry: RetryPolicy,
    state: CrawlState,
}

impl<'a> Orchestrator<'a> {
    pub fn new(browser: &'a dyn Browser, config: &Config) -> Result<Self, IngestError> {
        let listing_selectors = ListingSelectors::from_config(&config.selectors)
            .map_err(|e| ConfigError::InvalidSelector(e.to_string()))?;
        let detail_selectors = DetailSelectors::from_config(&config.selectors)
            .map_err(|e| ConfigError::InvalidSelector(e.to_string()))?;

        Ok(Self {
            browser,
            walker: ListingWalker::new(&config.source, &config.crawler, listing_selectors)?,
            enricher: Enricher::new(
                browser,
                &config.enrichment,
                &config.source,
                config.crawler.navigation_timeout(),
                detail_selectors,
            ),
            retry: RetryPolicy::from_config(&config.crawler),
            state: CrawlState::Idle,
        })
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    fn transition(&mut self, next: CrawlState) -> Result<(), IngestError> {
        if !self.state.can_transition_to(next) {
            return Err(IngestError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!("Crawl state {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Runs the crawl to a terminal state
    ///
    /// Running out of attempts is not an error: it yields an `Exhausted`
    /// outcome with no records. Failing to open a browsing context is.
    pub async fn run(mut self) -> Result<CrawlOutcome, IngestError> {
        let mut attempts = 0u32;
        let mut backoffs = 0u32;
        let mut pages_fetched = 0u32;
        let mut records = Vec::new();

        while !self.state.is_terminal() {
            attempts += 1;
            self.transition(CrawlState::SessionStarting)?;
            let mut session = CrawlSession::open(self.browser, attempts).await?;

            let walked = match self.transition(CrawlState::Listing) {
                Ok(()) => Ok(self.walker.walk(&mut session).await),
                Err(e) => Err(e),
            };
            pages_fetched += session.pages_loaded();
            session.release().await;

            match walked? {
                Ok(listing) => {
                    tracing::info!(
                        "Attempt {} collected {} record(s) from {} page(s)",
                        attempts,
                        listing.records.len(),
                        listing.pages_fetched
                    );

                    records = listing.records;
                    if self.enricher.is_enabled() && !records.is_empty() {
                        self.transition(CrawlState::Enriching)?;
                        records = self.enricher.enrich(records).await;
                    }
                    self.transition(CrawlState::Success)?;
                }
                Err(e) if self.retry.should_retry(attempts) => {
                    tracing::warn!(
                        "Attempt {}/{} failed: {}; retrying in {:?}",
                        attempts,
                        self.retry.max_attempts(),
                        e,
                        self.retry.delay()
                    );
                    self.transition(CrawlState::Retrying)?;
                    backoffs += 1;
                    tokio::time::sleep(self.retry.delay()).await;
                }
                Err(e) => {
                    tracing::error!(
                        "Attempt {}/{} failed: {}; giving up",
                        attempts,
                        self.retry.max_attempts(),
                        e
                    );
                    self.transition(CrawlState::Exhausted)?;
                }
            }
        }

        Ok(CrawlOutcome {
            records,
            final_state: self.state,
            attempts,
            backoffs,
            pages_fetched,
        })
    }
}
