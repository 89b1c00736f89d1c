//! Storage module for persisting ingested books
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Idempotent book upserts keyed by record id
//! - The read contract used by consumers (lookup, search, statistics)
//! - Ingest run tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{BookStore, StorageError, StorageResult, UpsertOutcome};

use crate::state::CrawlState;
use crate::IngestError;

use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, IngestError> {
    SqliteStorage::new(path)
}

/// Represents an ingestion run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub final_state: Option<CrawlState>,
    pub records_found: u64,
    pub records_ingested: u64,
    pub attempts: u32,
    pub error_message: Option<String>,
}

/// Final counts of a run that reached the end of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub final_state: CrawlState,
    pub records_found: u64,
    pub records_ingested: u64,
    pub attempts: u32,
}

/// Status of an ingestion run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
