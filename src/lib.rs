//! Book-Ingest: a catalog listing ingestion pipeline
//!
//! This crate crawls a paginated book catalog under a stateful browsing
//! session, enriches the discovered records from their detail pages, and
//! upserts them idempotently into a SQLite store that exposes a small read
//! contract (keyed lookup, substring search, statistics).

pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod session;
pub mod sink;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Book-Ingest operations
///
/// Only conditions the pipeline cannot degrade around end up here. Source
/// content irregularities are handled by the narrower error types below and
/// never reach the caller of an ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to acquire browsing session: {0}")]
    SessionAcquisition(String),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Invalid crawl state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlState,
        to: state::CrawlState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Page URL pattern '{0}' has no {{n}} placeholder")]
    MissingPagePlaceholder(String),
}

/// A page failed to load or become ready
///
/// Transient by nature: the orchestrator answers it with a whole-session
/// retry, bounded by the configured attempt count.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Timed out after {timeout_ms}ms loading {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Network failure loading {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} loading {url}")]
    Status { url: String, status: u16 },

    #[error("Page {url} never matched readiness selector '{selector}'")]
    NotReady { url: String, selector: String },

    #[error("Navigation to {url} aborted: {reason}")]
    Aborted { url: String, reason: String },
}

/// Malformed source structure
///
/// Record-level instances are skipped by the extractor. Page-level instances
/// (a listing page URL that cannot be built) fail the crawl attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Entry is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Cannot build listing URL for page {page}: {reason}")]
    PageUrl { page: u32, reason: String },

    #[error("Invalid selector '{0}'")]
    InvalidSelector(String),
}

/// A single record's detail page could not be fetched or parsed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnrichmentError {
    #[error("Detail page for '{id}' failed: {source}")]
    Navigation {
        id: String,
        #[source]
        source: NavigationError,
    },

    #[error("Could not open a browsing context for '{id}': {reason}")]
    Context { id: String, reason: String },
}

/// Result type alias for Book-Ingest operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_ingestion, CrawlOutcome, IngestReport, Orchestrator};
pub use model::{CandidateRecord, StoredBook};
pub use state::CrawlState;
