//! Storage module for Polwatch
//!
//! Defines the article record, the `ArticleStore` contract, and the SQLite
//! backend. The pipeline only ever checks existence and inserts-if-absent;
//! records are never updated once written.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{ArticleStore, StorageError, StorageResult};

use chrono::{DateTime, Utc};

/// A processed article, persisted exactly once per canonical URL
#[derive(Debug, Clone)]
pub struct ArticleRecord {
    /// Canonical URL; the store's unique key
    pub url: String,

    /// Article title (derived, never empty; "Untitled" in the worst case)
    pub title: String,

    /// Plain-text article body
    pub content: String,

    /// Generated summary, or a content prefix when generation yielded nothing
    pub summary: String,

    /// Extracted topics; set semantics with first-seen order preserved
    pub topics: Vec<String>,

    /// Host the article was fetched from
    pub source_domain: String,

    /// When the article was fetched
    pub fetched_at: DateTime<Utc>,
}
