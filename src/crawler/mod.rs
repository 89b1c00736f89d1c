//! Crawler module: from listing pages to stored books
//!
//! This module contains the ingestion pipeline:
//! - Listing extraction and sequential traversal under one session
//! - Detail page enrichment in concurrent batches
//! - Orchestration with whole-session retries
//! - The `run_ingestion` entry point tying crawl and store together

mod detail;
mod enrichment;
mod extractor;
mod listing;
mod orchestrator;
#[cfg(test)]
pub(crate) mod test_pages;

pub use detail::{extract_detail, DetailSelectors};
pub use enrichment::Enricher;
pub use extractor::{extract_listing, ListingPage, ListingSelectors};
pub use listing::{AttemptError, ListingResult, ListingWalker};
pub use orchestrator::{CrawlOutcome, Orchestrator};

use crate::config::{config_fingerprint, Config};
use crate::session::HttpBrowser;
use crate::sink::persist_records;
use crate::state::CrawlState;
use crate::storage::{open_storage, BookStore, RunSummary};
use crate::IngestError;
use serde::Serialize;
use std::path::Path;

/// Summary of one ingestion run, as reported to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub run_id: i64,
    /// Records the crawl produced
    pub records_found: usize,
    /// Records written to the store
    pub records_ingested: usize,
    /// Records dropped during normalization or upsert
    pub records_failed: usize,
    pub attempts: u32,
    pub pages_fetched: u32,
    pub final_state: CrawlState,
}

/// Crawls the configured source over HTTP without touching the store
pub async fn crawl(config: &Config) -> Result<CrawlOutcome, IngestError> {
    let browser = HttpBrowser::new(&config.user_agent, config.crawler.navigation_timeout())?;
    Orchestrator::new(&browser, config)?.run().await
}

/// Runs one complete ingestion: crawl, normalize, upsert, record the run
///
/// A crawl that exhausts its retries still completes the run with zero
/// records. Hard failures (session acquisition, database) mark the run
/// failed and are returned.
pub async fn run_ingestion(config: &Config) -> Result<IngestReport, IngestError> {
    let mut storage = open_storage(Path::new(&config.output.database_path))?;
    let run_id = storage.create_run(&config_fingerprint(config))?;
    tracing::info!("Starting ingest run {}", run_id);

    let outcome = match crawl(config).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Ingest run {} failed: {}", run_id, e);
            if let Err(mark_err) = storage.fail_run(run_id, &e.to_string()) {
                tracing::warn!("Could not mark run {} as failed: {}", run_id, mark_err);
            }
            return Err(e);
        }
    };

    let persisted = persist_records(&mut storage, &outcome.records);

    storage.complete_run(
        run_id,
        &RunSummary {
            final_state: outcome.final_state,
            records_found: outcome.records.len() as u64,
            records_ingested: persisted.persisted as u64,
            attempts: outcome.attempts,
        },
    )?;

    let report = IngestReport {
        run_id,
        records_found: outcome.records.len(),
        records_ingested: persisted.persisted,
        records_failed: persisted.failed,
        attempts: outcome.attempts,
        pages_fetched: outcome.pages_fetched,
        final_state: outcome.final_state,
    };

    tracing::info!(
        "Ingest run {} finished ({}): {} record(s) ingested",
        run_id,
        report.final_state,
        report.records_ingested
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_wire_shape() {
        let report = IngestReport {
            run_id: 7,
            records_found: 40,
            records_ingested: 39,
            records_failed: 1,
            attempts: 1,
            pages_fetched: 2,
            final_state: CrawlState::Success,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["recordsIngested"], 39);
        assert_eq!(json["recordsFound"], 40);
        assert_eq!(json["finalState"], "success");
        assert_eq!(json["runId"], 7);
    }
}
