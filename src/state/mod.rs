//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: the orchestrator's state machine (idle, session start,
//!   listing, enrichment, retry, and the two terminal outcomes)
//! - `RetryPolicy`: the fixed attempt bound and backoff delay driving the
//!   `Retrying` state

mod crawl_state;
mod retry;

// Re-export main types
pub use crawl_state::CrawlState;
pub use retry::RetryPolicy;
