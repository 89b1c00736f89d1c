//! Detail page enrichment in bounded-concurrency batches

use crate::config::{EnrichmentConfig, SourceConfig};
use crate::crawler::detail::{extract_detail, DetailSelectors};
use crate::model::CandidateRecord;
use crate::session::{load_page, Browser};
use crate::EnrichmentError;
use futures::future::join_all;
use std::time::Duration;

/// Fetches each record's detail page and fills in what it carries
///
/// Records are processed in batches of `batch_size`. Inside a batch all
/// fetches run concurrently, each in a context of its own that is closed
/// once its page is read. A failed fetch leaves that record as it was.
pub struct Enricher<'a> {
    browser: &'a dyn Browser,
    config: EnrichmentConfig,
    readiness_selector: String,
    timeout: Duration,
    selectors: DetailSelectors,
}

impl<'a> Enricher<'a> {
    pub fn new(
        browser: &'a dyn Browser,
        config: &EnrichmentConfig,
        source: &SourceConfig,
        timeout: Duration,
        selectors: DetailSelectors,
    ) -> Self {
        Self {
            browser,
            config: config.clone(),
            readiness_selector: source.detail_readiness_selector.clone(),
            timeout,
            selectors,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Returns the records in the same order, enriched where possible
    pub async fn enrich(&self, records: Vec<CandidateRecord>) -> Vec<CandidateRecord> {
        if !self.config.enabled || records.is_empty() {
            return records;
        }

        let batch_size = self.config.batch_size.max(1);
        let batch_count = records.len().div_ceil(batch_size);
        let mut enriched = Vec::with_capacity(records.len());
        let mut failures = 0usize;

        for (index, batch) in records.chunks(batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.batch_delay()).await;
            }

            tracing::debug!(
                "Enriching batch {}/{} ({} record(s))",
                index + 1,
                batch_count,
                batch.len()
            );

            let results = join_all(batch.iter().map(|record| self.enrich_one(record))).await;

            for (record, result) in batch.iter().zip(results) {
                match result {
                    Ok(updated) => enriched.push(updated),
                    Err(e) => {
                        tracing::warn!("{}", e);
                        failures += 1;
                        enriched.push(record.clone());
                    }
                }
            }
        }

        tracing::info!(
            "Enriched {} record(s) in {} batch(es), {} kept as listed",
            enriched.len() - failures,
            batch_count,
            failures
        );

        enriched
    }

    async fn enrich_one(
        &self,
        record: &CandidateRecord,
    ) -> Result<CandidateRecord, EnrichmentError> {
        let mut context = self
            .browser
            .new_context()
            .await
            .map_err(|e| EnrichmentError::Context {
                id: record.id.clone(),
                reason: e.to_string(),
            })?;

        let loaded = load_page(
            context.as_mut(),
            &record.source_url,
            &self.readiness_selector,
            self.timeout,
        )
        .await;
        context.close().await;

        let page = loaded.map_err(|source| EnrichmentError::Navigation {
            id: record.id.clone(),
            source,
        })?;

        let mut updated = record.clone();
        extract_detail(&page.html, &self.selectors).apply_to(&mut updated);
        Ok(updated)
    }
}
