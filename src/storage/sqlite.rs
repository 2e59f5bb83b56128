//! SQLite article store implementation

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ArticleStore, StorageError, StorageResult};
use crate::storage::ArticleRecord;
use crate::PolwatchError;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite-backed article store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database at the given path
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(PolwatchError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, PolwatchError> {
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

    /// Creates an in-memory store (for testing)
    pub fn new_in_memory() -> Result<Self, PolwatchError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl ArticleStore for SqliteStore {
    fn exists(&self, url: &str) -> StorageResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM articles WHERE url = ?1",
            params![url],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn insert_if_absent(&mut self, article: &ArticleRecord) -> StorageResult<bool> {
        let topics = serde_json::to_string(&article.topics)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        // INSERT OR IGNORE is the race arbiter: a concurrent attempt that
        // lost the race sees 0 rows changed, which is a no-op, not an error.
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO articles
             (url, title, content, summary, topics, source_domain, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                article.url,
                article.title,
                article.content,
                article.summary,
                topics,
                article.source_domain,
                article.fetched_at.to_rfc3339(),
            ],
        )?;

        Ok(changed > 0)
    }

    fn article_count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn counts_by_domain(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_domain, COUNT(*) AS n FROM articles
             GROUP BY source_domain ORDER BY n DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }
}
