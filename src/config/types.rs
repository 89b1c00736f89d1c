use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure for Book-Ingest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// Where the catalog lives and how its pages are addressed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL every relative link is resolved against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the first listing page, relative to the base URL
    #[serde(rename = "entry-path", default)]
    pub entry_path: String,

    /// Relative URL of listing page N; `{n}` is replaced by the page number
    #[serde(rename = "page-url-pattern")]
    pub page_url_pattern: String,

    /// CSS selector that marks a listing page as ready for extraction
    #[serde(rename = "readiness-selector")]
    pub readiness_selector: String,

    /// CSS selector that marks a detail page as ready
    #[serde(rename = "detail-readiness-selector", default = "default_detail_ready")]
    pub detail_readiness_selector: String,
}

/// Crawl orchestration limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Number of listing pages walked per attempt
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Hard cap on records returned by one crawl
    #[serde(rename = "max-records", default = "default_max_records")]
    pub max_records: usize,

    /// Whole-session attempts before giving up with an empty result
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between session attempts (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Per-navigation timeout (milliseconds)
    #[serde(rename = "navigation-timeout-ms", default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,
}

impl CrawlerConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            max_records: default_max_records(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
        }
    }
}

/// Detail-page enrichment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Skip the stage entirely when false
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Records whose detail pages are fetched concurrently
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches (milliseconds)
    #[serde(rename = "batch-delay-ms", default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

impl EnrichmentConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// CSS selectors used by the listing and detail extractors
///
/// Defaults match the markup of books.toscrape.com style catalogs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SelectorConfig {
    #[serde(default = "default_entry")]
    pub entry: String,
    #[serde(default = "default_link")]
    pub link: String,
    #[serde(default = "default_image")]
    pub image: String,
    #[serde(default = "default_rating")]
    pub rating: String,
    #[serde(default = "default_availability")]
    pub availability: String,
    #[serde(default = "default_next_page")]
    pub next_page: String,
    #[serde(default = "default_detail_author")]
    pub detail_author: String,
    #[serde(default = "default_detail_year")]
    pub detail_year: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            entry: default_entry(),
            link: default_link(),
            image: default_image(),
            rating: default_rating(),
            availability: default_availability(),
            next_page: default_next_page(),
            detail_author: default_detail_author(),
            detail_year: default_detail_year(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_pages() -> u32 {
    3
}

fn default_max_records() -> usize {
    50
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_navigation_timeout_ms() -> u64 {
    10_000
}

fn default_batch_size() -> usize {
    10
}

fn default_batch_delay_ms() -> u64 {
    200
}

fn default_detail_ready() -> String {
    ".product_main".to_string()
}

fn default_entry() -> String {
    "article.product_pod".to_string()
}

fn default_link() -> String {
    "h3 a".to_string()
}

fn default_image() -> String {
    ".image_container img".to_string()
}

fn default_rating() -> String {
    "p.star-rating".to_string()
}

fn default_availability() -> String {
    ".availability".to_string()
}

fn default_next_page() -> String {
    "li.next a".to_string()
}

fn default_detail_author() -> String {
    "[itemprop='author'], .author a, .author".to_string()
}

fn default_detail_year() -> String {
    "[itemprop='datePublished'], .publish-year".to_string()
}
