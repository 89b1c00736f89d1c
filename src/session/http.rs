//! reqwest-backed browsing engine
//!
//! Each context is a "tab" that keeps the last page it loaded. All contexts
//! share one connection pool; the engine counts open contexts so session
//! leaks show up in tests and logs.

use crate::config::UserAgentConfig;
use crate::session::{Browser, BrowsingContext, LoadedPage};
use crate::{IngestError, NavigationError};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Example
///
/// ```no_run
/// use book_ingest::config::UserAgentConfig;
/// use book_ingest::session::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "BookIngest".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Browsing engine that loads pages over plain HTTP
pub struct HttpBrowser {
    client: Client,
    timeout: Duration,
    open_contexts: Arc<AtomicUsize>,
}

impl HttpBrowser {
    pub fn new(config: &UserAgentConfig, timeout: Duration) -> Result<Self, IngestError> {
        let client = build_http_client(config, timeout)?;
        Ok(Self::with_client(client, timeout))
    }

    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            open_contexts: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn new_context(&self) -> Result<Box<dyn BrowsingContext>, IngestError> {
        let open = self.open_contexts.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!("Opened browsing context ({} open)", open);

        Ok(Box::new(HttpContext {
            client: self.client.clone(),
            timeout: self.timeout,
            current: None,
            open_contexts: Arc::clone(&self.open_contexts),
        }))
    }

    fn active_contexts(&self) -> usize {
        self.open_contexts.load(Ordering::SeqCst)
    }
}

/// One HTTP "tab"
struct HttpContext {
    client: Client,
    timeout: Duration,
    current: Option<LoadedPage>,
    open_contexts: Arc<AtomicUsize>,
}

impl HttpContext {
    /// Maps a transport failure onto the navigation error taxonomy
    fn classify(&self, url: &str, error: reqwest::Error) -> NavigationError {
        if error.is_timeout() {
            NavigationError::Timeout {
                url: url.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else if error.is_connect() {
            NavigationError::Network {
                url: url.to_string(),
                message: "Connection refused".to_string(),
            }
        } else if error.is_redirect() {
            NavigationError::Aborted {
                url: url.to_string(),
                reason: "Too many redirects".to_string(),
            }
        } else {
            NavigationError::Network {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl BrowsingContext for HttpContext {
    async fn navigate(&mut self, url: &str) -> Result<LoadedPage, NavigationError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return Err(NavigationError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await.map_err(|e| self.classify(url, e))?;

        let page = LoadedPage {
            url: final_url,
            status: status.as_u16(),
            html,
        };
        self.current = Some(page.clone());
        Ok(page)
    }

    fn current_page(&self) -> Option<&LoadedPage> {
        self.current.as_ref()
    }

    async fn close(self: Box<Self>) {
        tracing::trace!(
            "Closing browsing context at {}",
            self.current
                .as_ref()
                .map(|p| p.url.as_str())
                .unwrap_or("about:blank")
        );
    }
}

impl Drop for HttpContext {
    fn drop(&mut self) {
        self.open_contexts.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestIngest".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&create_test_config(), Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[test]
    fn test_user_agent_format() {
        assert_eq!(
            create_test_config().header_value(),
            "TestIngest/1.0 (+https://example.com/about; admin@example.com)"
        );
    }

    #[tokio::test]
    async fn test_context_keeps_current_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/catalogue"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let browser = HttpBrowser::new(&create_test_config(), Duration::from_secs(5)).unwrap();
        let mut context = browser.new_context().await.unwrap();
        assert!(context.current_page().is_none());

        let url = format!("{}/catalogue", server.uri());
        let page = context.navigate(&url).await.unwrap();

        assert_eq!(page.status, 200);
        assert_eq!(page.html, "<html>ok</html>");
        assert_eq!(context.current_page(), Some(&page));
    }

    #[tokio::test]
    async fn test_error_status_is_navigation_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let browser = HttpBrowser::new(&create_test_config(), Duration::from_secs(5)).unwrap();
        let mut context = browser.new_context().await.unwrap();
        let url = format!("{}/down", server.uri());

        let err = context.navigate(&url).await.unwrap_err();
        assert_eq!(err, NavigationError::Status { url, status: 503 });
        assert!(context.current_page().is_none());
    }

    #[tokio::test]
    async fn test_contexts_are_counted_until_closed() {
        let browser = HttpBrowser::new(&create_test_config(), Duration::from_secs(5)).unwrap();

        let first = browser.new_context().await.unwrap();
        let second = browser.new_context().await.unwrap();
        assert_eq!(browser.active_contexts(), 2);

        first.close().await;
        assert_eq!(browser.active_contexts(), 1);

        drop(second);
        assert_eq!(browser.active_contexts(), 0);
    }
}
