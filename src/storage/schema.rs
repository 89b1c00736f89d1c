//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Book-Ingest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Canonical book records, one row per source id
CREATE TABLE IF NOT EXISTS books (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL CHECK (length(title) > 0),
    authors TEXT NOT NULL,
    cover_url TEXT,
    year_published INTEGER,
    subjects TEXT NOT NULL,
    source_url TEXT NOT NULL,
    ingested_at TEXT NOT NULL,
    -- Lowercased title, authors and subjects, one per line
    search_text TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_books_year ON books(year_published);
CREATE INDEX IF NOT EXISTS idx_books_ingested_at ON books(ingested_at);

-- One row per ingestion run
CREATE TABLE IF NOT EXISTS ingest_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    final_state TEXT,
    records_found INTEGER NOT NULL DEFAULT 0,
    records_ingested INTEGER NOT NULL DEFAULT 0,
    attempts INTEGER NOT NULL DEFAULT 0,
    error_message TEXT
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).unwrap();
        let result = initialize_schema(&conn);

        assert!(result.is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["books", "ingest_runs"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_empty_title_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO books (id, title, authors, subjects, source_url, ingested_at)
             VALUES ('x', '', '[]', '[]', 'https://example.com/', '2024-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err());
    }
}
