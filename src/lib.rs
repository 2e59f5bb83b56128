//! Polwatch: an unattended news-ingestion pipeline
//!
//! This crate discovers, fetches, deduplicates, and enriches articles on
//! government and politics, tolerating failures of the paid services it
//! depends on (search API quotas, generative-service rate limits, render
//! faults) while running for long periods without supervision.

pub mod config;
pub mod discovery;
pub mod enrich;
pub mod fetch;
pub mod ingest;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Polwatch operations
#[derive(Debug, Error)]
pub enum PolwatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Render error for {url}: {message}")]
    Render { url: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Search API error: {0}")]
    Search(String),

    #[error("All search credentials are rate limited")]
    SearchKeysExhausted,

    #[error("All keys and models exhausted for {operation}")]
    Exhausted { operation: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Polwatch operations
pub type Result<T> = std::result::Result<T, PolwatchError>;

// Re-export commonly used types
pub use config::Config;
pub use fetch::{FetchedPage, Fetcher};
pub use ingest::Ingestor;
pub use storage::{ArticleRecord, ArticleStore, SqliteStore};
