//! Single-page loading with readiness detection
//!
//! `load_page` is the only place that talks to a browsing context on behalf
//! of the crawler. It never retries: every failure is returned to the caller
//! as a `NavigationError`.

use crate::session::{BrowsingContext, LoadedPage};
use crate::NavigationError;
use scraper::{Html, Selector};
use std::time::Duration;

/// Loads `url` in `context` and checks the readiness marker
///
/// `timeout` bounds navigation only. The marker is matched once against the
/// document navigation returned.
///
/// # Errors
///
/// | Condition | Error |
/// |-----------|-------|
/// | Navigation exceeds `timeout` | `Timeout` |
/// | Transport failure | `Network` |
/// | Non-success HTTP status | `Status` |
/// | `readiness_selector` absent from the loaded document | `NotReady` |
/// | `readiness_selector` does not parse | `Aborted` |
pub async fn load_page(
    context: &mut dyn BrowsingContext,
    url: &str,
    readiness_selector: &str,
    timeout: Duration,
) -> Result<LoadedPage, NavigationError> {
    let selector = Selector::parse(readiness_selector).map_err(|_| NavigationError::Aborted {
        url: url.to_string(),
        reason: format!("invalid readiness selector '{}'", readiness_selector),
    })?;

    tracing::debug!("Loading {}", url);

    let page = match tokio::time::timeout(timeout, context.navigate(url)).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(NavigationError::Timeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
        }
    };

    if !document_matches(&page.html, &selector) {
        return Err(NavigationError::NotReady {
            url: url.to_string(),
            selector: readiness_selector.to_string(),
        });
    }

    Ok(page)
}

fn document_matches(html: &str, selector: &Selector) -> bool {
    Html::parse_document(html).select(selector).next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Context serving one fixed document, optionally after a delay
    struct FixedContext {
        html: String,
        delay: Duration,
        current: Option<LoadedPage>,
    }

    #[async_trait]
    impl BrowsingContext for FixedContext {
        async fn navigate(&mut self, url: &str) -> Result<LoadedPage, NavigationError> {
            tokio::time::sleep(self.delay).await;
            let page = LoadedPage {
                url: url.to_string(),
                status: 200,
                html: self.html.clone(),
            };
            self.current = Some(page.clone());
            Ok(page)
        }

        fn current_page(&self) -> Option<&LoadedPage> {
            self.current.as_ref()
        }

        async fn close(self: Box<Self>) {}
    }

    fn context(html: &str, delay_ms: u64) -> FixedContext {
        FixedContext {
            html: html.to_string(),
            delay: Duration::from_millis(delay_ms),
            current: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_marker_checked_after_navigation_completes() {
        let mut ctx = context("<p>loading...</p>", 90);
        let err = load_page(
            &mut ctx,
            "https://example.com/late",
            ".ready",
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, NavigationError::NotReady { .. }));
        assert!(ctx.current_page().is_some());
    }

    #[tokio::test]
    async fn test_load_ready_page() {
        let mut ctx = context(r#"<div class="ready">x</div>"#, 0);
        let page = load_page(&mut ctx, "https://example.com/", ".ready", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(page.url, "https://example.com/");
        assert!(ctx.current_page().is_some());
    }

    #[tokio::test]
    async fn test_missing_marker_is_not_ready() {
        let mut ctx = context("<p>loading...</p>", 0);
        let err = load_page(&mut ctx, "https://example.com/", ".ready", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, NavigationError::NotReady { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_navigation_times_out() {
        let mut ctx = context(r#"<div class="ready"></div>"#, 5_000);
        let err = load_page(
            &mut ctx,
            "https://example.com/slow",
            ".ready",
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();

        assert_eq!(
            err,
            NavigationError::Timeout {
                url: "https://example.com/slow".to_string(),
                timeout_ms: 100,
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_selector_aborts() {
        let mut ctx = context("<p></p>", 0);
        let err = load_page(&mut ctx, "https://example.com/", "div[", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, NavigationError::Aborted { .. }));
        assert!(ctx.current_page().is_none());
    }
}
