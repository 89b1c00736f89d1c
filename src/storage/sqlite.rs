//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the BookStore trait.

use crate::model::StoredBook;
use crate::state::CrawlState;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{BookStore, StorageError, StorageResult, UpsertOutcome};
use crate::storage::{RunRecord, RunStatus, RunSummary};
use crate::IngestError;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const BOOK_COLUMNS: &str =
    "id, title, authors, cover_url, year_published, subjects, source_url, ingested_at";

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, status, final_state, \
     records_found, records_ingested, attempts, error_message";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> Result<Self, IngestError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, IngestError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn query_books(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> StorageResult<Vec<StoredBook>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, BookRow::from_row)?;

        let mut books = Vec::new();
        for row in rows {
            books.push(row?.into_book()?);
        }
        Ok(books)
    }

    fn book_exists(&self, id: &str) -> StorageResult<bool> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM books WHERE id = ?1", params![id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }
}

/// Timestamps are stored in one fixed RFC 3339 shape so text order is time order
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StorageError::Serialization(format!("bad timestamp '{}': {}", raw, e)))
}

/// Case-folded text the search query is matched against
///
/// SQLite's `LOWER()` only folds ASCII, so folding happens here. Fields are
/// joined by newlines, keeping the JSON column encoding out of matches.
fn search_text(book: &StoredBook) -> String {
    std::iter::once(&book.title)
        .chain(&book.authors)
        .chain(&book.subjects)
        .map(|field| field.to_lowercase())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escapes LIKE wildcards so user input matches literally
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// A `books` row before its JSON and timestamp columns are decoded
struct BookRow {
    id: String,
    title: String,
    authors: String,
    cover_url: Option<String>,
    year_published: Option<i32>,
    subjects: String,
    source_url: String,
    ingested_at: String,
}

impl BookRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            authors: row.get(2)?,
            cover_url: row.get(3)?,
            year_published: row.get(4)?,
            subjects: row.get(5)?,
            source_url: row.get(6)?,
            ingested_at: row.get(7)?,
        })
    }

    fn into_book(self) -> StorageResult<StoredBook> {
        Ok(StoredBook {
            authors: serde_json::from_str(&self.authors)?,
            subjects: serde_json::from_str(&self.subjects)?,
            ingested_at: parse_timestamp(&self.ingested_at)?,
            id: self.id,
            title: self.title,
            cover_url: self.cover_url,
            year_published: self.year_published,
            source_url: self.source_url,
        })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    let final_state: Option<String> = row.get(5)?;
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?).unwrap_or(RunStatus::Running),
        final_state: final_state.as_deref().and_then(CrawlState::from_db_string),
        records_found: row.get::<_, i64>(6)? as u64,
        records_ingested: row.get::<_, i64>(7)? as u64,
        attempts: row.get(8)?,
        error_message: row.get(9)?,
    })
}

impl BookStore for SqliteStorage {
    // ===== Books =====

    fn upsert_book(&mut self, book: &StoredBook) -> StorageResult<UpsertOutcome> {
        if book.id.is_empty() {
            return Err(StorageError::ConstraintViolation("book id is empty".to_string()));
        }

        let existed = self.book_exists(&book.id)?;

        self.conn.execute(
            "INSERT INTO books (id, title, authors, cover_url, year_published, subjects,
                                source_url, ingested_at, search_text)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                authors = excluded.authors,
                cover_url = excluded.cover_url,
                year_published = excluded.year_published,
                subjects = excluded.subjects,
                source_url = excluded.source_url,
                ingested_at = excluded.ingested_at,
                search_text = excluded.search_text",
            params![
                book.id,
                book.title,
                serde_json::to_string(&book.authors)?,
                book.cover_url,
                book.year_published,
                serde_json::to_string(&book.subjects)?,
                book.source_url,
                format_timestamp(&book.ingested_at),
                search_text(book),
            ],
        )?;

        Ok(if existed {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    fn get_book(&self, id: &str) -> StorageResult<Option<StoredBook>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM books WHERE id = ?1", BOOK_COLUMNS),
                params![id],
                BookRow::from_row,
            )
            .optional()?;

        row.map(BookRow::into_book).transpose()
    }

    fn search_books(&self, query: &str, limit: usize) -> StorageResult<Vec<StoredBook>> {
        let query = query.trim();
        if query.is_empty() {
            return self.recent_books(limit);
        }

        self.query_books(
            &format!(
                "SELECT {} FROM books
                 WHERE search_text LIKE ?1 ESCAPE '\\'
                 ORDER BY ingested_at DESC, id
                 LIMIT ?2",
                BOOK_COLUMNS
            ),
            params![like_pattern(query), limit as i64],
        )
    }

    fn recent_books(&self, limit: usize) -> StorageResult<Vec<StoredBook>> {
        self.query_books(
            &format!(
                "SELECT {} FROM books ORDER BY ingested_at DESC, id LIMIT ?1",
                BOOK_COLUMNS
            ),
            params![limit as i64],
        )
    }

    fn count_books(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn latest_ingest(&self) -> StorageResult<Option<DateTime<Utc>>> {
        let latest: Option<String> = self
            .conn
            .query_row("SELECT MAX(ingested_at) FROM books", [], |row| row.get(0))?;

        latest.as_deref().map(parse_timestamp).transpose()
    }

    fn books_by_year(&self) -> StorageResult<Vec<(Option<i32>, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT year_published, COUNT(*) FROM books
             GROUP BY year_published
             ORDER BY year_published IS NULL, year_published DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, Option<i32>>(0)?, row.get::<_, i64>(1)? as u64))
        })?;

        let mut years = Vec::new();
        for row in rows {
            years.push(row?);
        }
        Ok(years)
    }

    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = format_timestamp(&Utc::now());
        self.conn.execute(
            "INSERT INTO ingest_runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM ingest_runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn complete_run(&mut self, run_id: i64, summary: &RunSummary) -> StorageResult<()> {
        let now = format_timestamp(&Utc::now());
        let updated = self.conn.execute(
            "UPDATE ingest_runs
             SET status = ?1, finished_at = ?2, final_state = ?3,
                 records_found = ?4, records_ingested = ?5, attempts = ?6
             WHERE id = ?7",
            params![
                RunStatus::Completed.to_db_string(),
                now,
                summary.final_state.to_db_string(),
                summary.records_found as i64,
                summary.records_ingested as i64,
                summary.attempts,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn fail_run(&mut self, run_id: i64, error: &str) -> StorageResult<()> {
        let now = format_timestamp(&Utc::now());
        let updated = self.conn.execute(
            "UPDATE ingest_runs SET status = ?1, finished_at = ?2, error_message = ?3 WHERE id = ?4",
            params![RunStatus::Failed.to_db_string(), now, error, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM ingest_runs ORDER BY id DESC LIMIT ?1",
            RUN_COLUMNS
        ))?;

        let rows = stmt.query_map(params![limit as i64], run_from_row)?;

        let mut runs = Vec::new();
        for row in rows {
            runs.push(row?);
        }
        Ok(runs)
    }
}
