//! Configuration module for Polwatch
//!
//! Startup-time configuration only: store path, credential lists, seed
//! homepages, search query, generative-service tuning, and fetch thresholds.
//! Nothing in here changes at runtime.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{
    Config, CrawlerConfig, FetchConfig, GenerativeConfig, SearchConfig, StoreConfig,
};
pub use validation::validate;

/// Shared config constructor for unit tests across the crate
#[cfg(test)]
pub mod test_support {
    use super::*;

    pub fn create_test_config() -> Config {
        Config {
            store: StoreConfig {
                database_path: "./test_articles.db".to_string(),
            },
            crawler: CrawlerConfig {
                seeds: vec!["https://example.gov/".to_string()],
                keywords: vec!["politics".to_string(), "government".to_string()],
                max_links: 10,
                max_depth: 2,
                concurrency: 4,
                interval_secs: 1800,
            },
            search: SearchConfig {
                endpoint: "https://newsapi.example/v2".to_string(),
                keys: vec!["sk-one".to_string(), "sk-two".to_string()],
                query: "politics OR government".to_string(),
                language: "en".to_string(),
                page_size: 50,
                max_pages: 3,
                poll_interval_secs: 300,
                overlap_secs: 60,
                cooldown_secs: 900,
                backfill_window_hours: 24,
                ingest_concurrency: 4,
            },
            generative: GenerativeConfig {
                endpoint: "https://genai.example/v1beta".to_string(),
                keys: vec!["gk-one".to_string(), "gk-two".to_string()],
                system_instruction: "You summarize political news.".to_string(),
                temperature: 0.2,
                max_output_tokens: 512,
                max_input_chars: 12_000,
                attempts_per_pair: 2,
                backoff_base_ms: 10,
                model_override: None,
                model_cache_ttl_secs: 600,
            },
            fetch: FetchConfig {
                request_timeout_secs: 5,
                thin_threshold: 300,
                min_content_chars: 200,
                retry_count: 2,
                retry_delay_ms: 10,
                render_enabled: false,
                render_timeout_secs: 5,
            },
        }
    }
}
