//! Storage traits and error types
//!
//! The pipeline consumes the persistent store exclusively through this
//! contract: an existence check by unique URL key and an insert-if-absent
//! write. The store's uniqueness constraint on the URL is the final arbiter
//! between concurrent ingestion attempts.

use crate::storage::ArticleRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for article store backends
///
/// Implementations must enforce uniqueness on the article URL. Records are
/// created once and never mutated by this pipeline afterwards.
pub trait ArticleStore: Send {
    /// Checks whether a record exists for the given URL
    fn exists(&self, url: &str) -> StorageResult<bool>;

    /// Inserts the record only if no record exists for its URL
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The record was created
    /// * `Ok(false)` - A record for this URL already existed; no-op
    fn insert_if_absent(&mut self, article: &ArticleRecord) -> StorageResult<bool>;

    /// Total number of stored articles
    fn article_count(&self) -> StorageResult<u64>;

    /// Article counts per source domain, most populous first
    fn counts_by_domain(&self) -> StorageResult<Vec<(String, u64)>>;
}
