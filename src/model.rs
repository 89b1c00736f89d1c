//! Record types shared by the pipeline stages and the store
//!
//! `CandidateRecord` is what the crawl produces; `StoredBook` is the
//! canonical persisted form. Both serialize with camelCase keys, which is the
//! wire shape consumers of the store see.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder used when no author is known for a record
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// A parsed, not-yet-persisted catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub cover_url: Option<String>,
    pub year_published: Option<i32>,
    pub subjects: Vec<String>,
    pub source_url: String,
    pub discovered_at: DateTime<Utc>,
}

/// Fields a detail page can contribute to a record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailInfo {
    pub authors: Vec<String>,
    pub year_published: Option<i32>,
}

impl DetailInfo {
    pub fn is_empty(&self) -> bool {
        self.authors.is_empty() && self.year_published.is_none()
    }

    /// Applies detail data to a record without touching its identity
    ///
    /// Only `authors` and `year_published` are ever written; `id` and
    /// `source_url` stay as the listing produced them.
    pub fn apply_to(self, record: &mut CandidateRecord) {
        if !self.authors.is_empty() {
            record.authors = self.authors;
        }
        if self.year_published.is_some() {
            record.year_published = self.year_published;
        }
    }
}

/// Canonical persisted form of a book, keyed by `id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBook {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub cover_url: Option<String>,
    pub year_published: Option<i32>,
    pub subjects: Vec<String>,
    pub source_url: String,
    pub ingested_at: DateTime<Utc>,
}
