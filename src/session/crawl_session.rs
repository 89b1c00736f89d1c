use crate::session::{load_page, Browser, BrowsingContext, LoadedPage};
use crate::{IngestError, NavigationError};
use std::time::Duration;

/// The browsing session of one crawl attempt
///
/// Owns exactly one context, opened by `open` and given back by `release`.
/// A session is never reused: the orchestrator opens a new one for every
/// attempt. If a session is dropped without `release`, the context is still
/// dropped (and its engine resources freed) but a warning is logged.
pub struct CrawlSession {
    attempt: u32,
    context: Option<Box<dyn BrowsingContext>>,
    pages_loaded: u32,
}

impl CrawlSession {
    /// Acquires a fresh context for `attempt`
    ///
    /// Failure here is a resource-acquisition failure and is not retried.
    pub async fn open(browser: &dyn Browser, attempt: u32) -> Result<Self, IngestError> {
        let context = browser.new_context().await?;
        tracing::debug!("Session opened for attempt {}", attempt);

        Ok(Self {
            attempt,
            context: Some(context),
            pages_loaded: 0,
        })
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Number of pages successfully loaded under this session
    pub fn pages_loaded(&self) -> u32 {
        self.pages_loaded
    }

    /// Loads a page in the session's context
    pub async fn load(
        &mut self,
        url: &str,
        readiness_selector: &str,
        timeout: Duration,
    ) -> Result<LoadedPage, NavigationError> {
        let context = self
            .context
            .as_deref_mut()
            .ok_or_else(|| NavigationError::Aborted {
                url: url.to_string(),
                reason: "session already released".to_string(),
            })?;

        let page = load_page(context, url, readiness_selector, timeout).await?;
        self.pages_loaded += 1;
        Ok(page)
    }

    /// Releases the session's context
    pub async fn release(mut self) {
        if let Some(context) = self.context.take() {
            context.close().await;
            tracing::debug!(
                "Session for attempt {} released after {} page(s)",
                self.attempt,
                self.pages_loaded
            );
        }
    }
}

impl Drop for CrawlSession {
    fn drop(&mut self) {
        if self.context.is_some() {
            tracing::warn!(
                "Session for attempt {} dropped without release",
                self.attempt
            );
        }
    }
}
