//! Normalization and persistence of crawl results
//!
//! Each candidate record is cleaned into a `StoredBook` and upserted on its
//! own. There is no enclosing transaction: a record that fails is logged
//! and counted while the others are still written.

use crate::model::{CandidateRecord, StoredBook, UNKNOWN_AUTHOR};
use crate::storage::{BookStore, StorageError, UpsertOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of persisting one batch of records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistReport {
    /// Records written (inserted plus updated)
    pub persisted: usize,
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Cleans a candidate into its canonical stored form
///
/// Text fields are trimmed with internal whitespace collapsed. Authors and
/// subjects lose blanks and duplicates (first occurrence wins), and an empty
/// author list becomes the unknown-author placeholder. A record without
/// id, title or source URL is rejected.
pub fn normalize(
    record: &CandidateRecord,
    ingested_at: DateTime<Utc>,
) -> Result<StoredBook, StorageError> {
    let id = record.id.trim().to_string();
    let title = collapse(&record.title);
    let source_url = record.source_url.trim().to_string();

    for (field, value) in [("id", &id), ("title", &title), ("sourceUrl", &source_url)] {
        if value.is_empty() {
            return Err(StorageError::ConstraintViolation(format!(
                "record '{}' has an empty {}",
                record.id, field
            )));
        }
    }

    let mut authors = dedupe(&record.authors);
    if authors.is_empty() {
        authors.push(UNKNOWN_AUTHOR.to_string());
    }

    Ok(StoredBook {
        id,
        title,
        authors,
        cover_url: record
            .cover_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string),
        year_published: record.year_published,
        subjects: dedupe(&record.subjects),
        source_url,
        ingested_at,
    })
}

/// Normalizes and upserts every record, one at a time
pub fn persist_records(store: &mut dyn BookStore, records: &[CandidateRecord]) -> PersistReport {
    let mut report = PersistReport::default();
    let now = Utc::now();

    for record in records {
        let result = normalize(record, now).and_then(|book| store.upsert_book(&book));

        match result {
            Ok(UpsertOutcome::Inserted) => report.inserted += 1,
            Ok(UpsertOutcome::Updated) => report.updated += 1,
            Err(e) => {
                tracing::error!("Failed to persist record '{}': {}", record.id, e);
                report.failed += 1;
            }
        }
    }
    report.persisted = report.inserted + report.updated;

    tracing::info!(
        "Persisted {} of {} record(s) ({} new, {} updated, {} failed)",
        report.persisted,
        records.len(),
        report.inserted,
        report.updated,
        report.failed
    );

    report
}

fn collapse(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn dedupe(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values.iter().map(|v| collapse(v)) {
        if !value.is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}
