//! Storage traits and error types
//!
//! This module defines the trait interface for book store backends and
//! associated error types.

use crate::model::StoredBook;
use crate::storage::{RunRecord, RunSummary};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// What an upsert did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Trait for book store implementations
///
/// Writes are keyed by book id and idempotent: upserting the same record
/// twice leaves one row whose `ingested_at` is the later of the two.
pub trait BookStore {
    // ===== Books =====

    /// Inserts a book or replaces the stored row with the same id
    fn upsert_book(&mut self, book: &StoredBook) -> StorageResult<UpsertOutcome>;

    /// Gets a book by id
    fn get_book(&self, id: &str) -> StorageResult<Option<StoredBook>>;

    /// Case-insensitive substring search over title, authors and subjects
    ///
    /// Results are most recently ingested first. A blank query behaves
    /// like `recent_books`.
    fn search_books(&self, query: &str, limit: usize) -> StorageResult<Vec<StoredBook>>;

    /// Most recently ingested books first
    fn recent_books(&self, limit: usize) -> StorageResult<Vec<StoredBook>>;

    /// Total number of stored books
    fn count_books(&self) -> StorageResult<u64>;

    /// Newest `ingested_at` in the store
    fn latest_ingest(&self) -> StorageResult<Option<DateTime<Utc>>>;

    /// Book counts per publication year, newest year first, unknown last
    fn books_by_year(&self) -> StorageResult<Vec<(Option<i32>, u64)>>;

    // ===== Run Management =====

    /// Records the start of an ingestion run and returns its id
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Marks a run as completed with its final counts
    fn complete_run(&mut self, run_id: i64, summary: &RunSummary) -> StorageResult<()>;

    /// Marks a run as failed
    fn fail_run(&mut self, run_id: i64, error: &str) -> StorageResult<()>;

    /// Most recent runs first
    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>>;
}
