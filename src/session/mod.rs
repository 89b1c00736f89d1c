//! Browsing session module
//!
//! This module drives page loads for the crawler:
//! - `Browser` / `BrowsingContext` abstract over the browsing engine
//! - `HttpBrowser` is the reqwest-backed engine used in production
//! - `load_page` loads one page under a timeout and checks for readiness
//! - `CrawlSession` owns the single context used by one crawl attempt

mod crawl_session;
mod fetcher;
mod http;
#[cfg(test)]
pub(crate) mod scripted;

pub use crawl_session::CrawlSession;
pub use fetcher::load_page;
pub use http::{build_http_client, HttpBrowser};

use crate::{IngestError, NavigationError};
use async_trait::async_trait;

/// A page that finished loading in a browsing context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPage {
    /// URL the content was served from (after redirects)
    pub url: String,

    /// HTTP status code of the final response
    pub status: u16,

    /// Serialized document content
    pub html: String,
}

/// A browsing engine that hands out independent contexts
#[async_trait]
pub trait Browser: Send + Sync {
    /// Opens a fresh context (tab) with no page loaded
    async fn new_context(&self) -> Result<Box<dyn BrowsingContext>, IngestError>;

    /// Number of contexts currently open
    fn active_contexts(&self) -> usize;
}

/// A single stateful context: it remembers the page it last navigated to
#[async_trait]
pub trait BrowsingContext: Send + Sync {
    /// Navigates to `url`, replacing the current page
    ///
    /// The caller enforces the overall timeout; implementations only need to
    /// report failures they observe.
    async fn navigate(&mut self, url: &str) -> Result<LoadedPage, NavigationError>;

    /// The page currently shown, if any
    fn current_page(&self) -> Option<&LoadedPage>;

    /// Closes the context and releases its resources
    async fn close(self: Box<Self>);
}
