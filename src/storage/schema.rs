//! SQLite schema definition
//!
//! A single `articles` table keyed by canonical URL. The UNIQUE constraint on
//! `url` backs the insert-if-absent contract; `INSERT OR IGNORE` resolves
//! races between concurrent ingestion attempts without errors.

use rusqlite::Connection;

/// Initializes the database schema (idempotent)
pub fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS articles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            url TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            summary TEXT NOT NULL,
            topics TEXT NOT NULL,
            source_domain TEXT NOT NULL,
            fetched_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_articles_domain ON articles(source_domain);
        CREATE INDEX IF NOT EXISTS idx_articles_fetched_at ON articles(fetched_at);
        ",
    )
}
