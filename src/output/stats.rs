//! Statistics generation from the book store
//!
//! This module provides functionality for extracting and displaying
//! ingestion statistics from the storage layer.

use crate::storage::{BookStore, RunRecord, StorageResult};
use chrono::{DateTime, Utc};

/// Number of past runs shown in statistics
pub const RECENT_RUN_LIMIT: usize = 5;

/// Ingestion statistics summary
#[derive(Debug, Clone)]
pub struct IngestStatistics {
    /// Total number of stored books
    pub total_books: u64,

    /// Most recent `ingested_at` across the store
    pub latest_ingest: Option<DateTime<Utc>>,

    /// Book counts per known publication year, newest first
    pub books_by_year: Vec<(i32, u64)>,

    /// Books with no known publication year
    pub books_without_year: u64,

    /// Latest runs, newest first
    pub recent_runs: Vec<RunRecord>,
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn BookStore) -> StorageResult<IngestStatistics> {
    let total_books = storage.count_books()?;
    let latest_ingest = storage.latest_ingest()?;

    let mut books_by_year = Vec::new();
    let mut books_without_year = 0;
    for (year, count) in storage.books_by_year()? {
        match year {
            Some(year) => books_by_year.push((year, count)),
            None => books_without_year += count,
        }
    }

    let recent_runs = storage.recent_runs(RECENT_RUN_LIMIT)?;

    Ok(IngestStatistics {
        total_books,
        latest_ingest,
        books_by_year,
        books_without_year,
        recent_runs,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &IngestStatistics) {
    println!("=== Ingest Statistics ===\n");

    println!("Overview:");
    println!("  Total books: {}", stats.total_books);
    match stats.latest_ingest {
        Some(ts) => println!("  Latest ingest: {}", ts.to_rfc3339()),
        None => println!("  Latest ingest: never"),
    }
    println!();

    if !stats.books_by_year.is_empty() {
        println!("Books by Year:");
        for (year, count) in &stats.books_by_year {
            println!("  {}: {}", year, count);
        }
        if stats.books_without_year > 0 {
            println!("  (unknown): {}", stats.books_without_year);
        }
        println!();
    }

    if !stats.recent_runs.is_empty() {
        println!("Recent Runs:");
        for run in &stats.recent_runs {
            let state = run
                .final_state
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  #{} {} [{} / {}] found {}, ingested {}, {} attempt(s)",
                run.id,
                run.started_at,
                run.status.to_db_string(),
                state,
                run.records_found,
                run.records_ingested,
                run.attempts
            );
            if let Some(err) = &run.error_message {
                println!("      error: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StoredBook;
    use crate::state::CrawlState;
    use crate::storage::{RunSummary, SqliteStorage};

    fn book(id: &str, year: Option<i32>) -> StoredBook {
        StoredBook {
            id: id.to_string(),
            title: id.to_uppercase(),
            authors: vec!["Unknown".to_string()],
            cover_url: None,
            year_published: year,
            subjects: vec![],
            source_url: format!("https://books.example.com/{}", id),
            ingested_at: Utc::now(),
        }
    }

    #[test]
    fn test_load_statistics() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.upsert_book(&book("a", Some(1999))).unwrap();
        storage.upsert_book(&book("b", Some(1999))).unwrap();
        storage.upsert_book(&book("c", Some(2010))).unwrap();
        storage.upsert_book(&book("d", None)).unwrap();

        let run_id = storage.create_run("hash").unwrap();
        storage
            .complete_run(
                run_id,
                &RunSummary {
                    final_state: CrawlState::Success,
                    records_found: 4,
                    records_ingested: 4,
                    attempts: 1,
                },
            )
            .unwrap();

        let stats = load_statistics(&storage).unwrap();

        assert_eq!(stats.total_books, 4);
        assert!(stats.latest_ingest.is_some());
        assert_eq!(stats.books_by_year, vec![(2010, 1), (1999, 2)]);
        assert_eq!(stats.books_without_year, 1);
        assert_eq!(stats.recent_runs.len(), 1);
        assert_eq!(stats.recent_runs[0].records_ingested, 4);
    }

    #[test]
    fn test_statistics_of_empty_store() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let stats = load_statistics(&storage).unwrap();

        assert_eq!(stats.total_books, 0);
        assert!(stats.latest_ingest.is_none());
        assert!(stats.books_by_year.is_empty());
        assert!(stats.recent_runs.is_empty());
    }
}
