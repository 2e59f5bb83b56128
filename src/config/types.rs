use serde::Deserialize;

/// Main configuration structure for Polwatch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub crawler: CrawlerConfig,
    pub search: SearchConfig,
    pub generative: GenerativeConfig,
    pub fetch: FetchConfig,
}

/// Persistent store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Homepage crawler configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Seed homepage URLs to crawl for article links
    pub seeds: Vec<String>,

    /// Keywords that mark a URL as topically relevant
    pub keywords: Vec<String>,

    /// Maximum number of article links to collect per crawl pass
    #[serde(rename = "max-links", default = "default_max_links")]
    pub max_links: usize,

    /// Maximum link depth to follow from a seed homepage
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Number of crawl workers draining the shared queue
    #[serde(default = "default_crawl_concurrency")]
    pub concurrency: usize,

    /// Seconds between crawl passes in long-running mode
    #[serde(rename = "interval-secs", default = "default_crawl_interval")]
    pub interval_secs: u64,
}

/// Search-API discovery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the search API (overridable for tests)
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Ordered credential list, rotated on 401/429
    pub keys: Vec<String>,

    /// Search query for the topical domain
    pub query: String,

    /// Result language filter
    #[serde(default = "default_language")]
    pub language: String,

    /// Results per page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Page-count cap per window scan
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Seconds between fresh-poll ticks
    #[serde(rename = "poll-interval-secs", default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Overlap subtracted from the poll checkpoint to avoid boundary misses
    #[serde(rename = "overlap-secs", default = "default_overlap")]
    pub overlap_secs: i64,

    /// Cooldown after a full credential rotation cycle fails
    #[serde(rename = "cooldown-secs", default = "default_cooldown")]
    pub cooldown_secs: u64,

    /// Width of each backfill window in hours
    #[serde(rename = "backfill-window-hours", default = "default_backfill_window")]
    pub backfill_window_hours: i64,

    /// Concurrent ingestions spawned by the fresh-poll loop
    #[serde(rename = "ingest-concurrency", default = "default_ingest_concurrency")]
    pub ingest_concurrency: usize,
}

/// Generative text service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GenerativeConfig {
    /// Base URL of the generative API (overridable for tests)
    #[serde(default = "default_generative_endpoint")]
    pub endpoint: String,

    /// Ordered credential list for the generative service
    pub keys: Vec<String>,

    /// Free-text system instruction sent with every call
    #[serde(rename = "system-instruction")]
    pub system_instruction: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output token budget per call
    #[serde(rename = "max-output-tokens", default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Input truncated to this many characters before sending
    #[serde(rename = "max-input-chars", default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// Attempts per (key, model) pair before advancing
    #[serde(rename = "attempts-per-pair", default = "default_attempts")]
    pub attempts_per_pair: u32,

    /// Base of the linear backoff applied on quota-class errors
    #[serde(rename = "backoff-base-ms", default = "default_backoff_base")]
    pub backoff_base_ms: u64,

    /// Manual model override; when set, model resolution is skipped entirely
    #[serde(rename = "model-override")]
    pub model_override: Option<String>,

    /// Model-listing cache TTL in seconds
    #[serde(rename = "model-cache-ttl-secs", default = "default_model_ttl")]
    pub model_cache_ttl_secs: u64,
}

/// Fetch layer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Static content below this length triggers the render fallback
    #[serde(rename = "thin-threshold", default = "default_thin_threshold")]
    pub thin_threshold: usize,

    /// Articles below this length are abandoned by the coordinator
    #[serde(rename = "min-content-chars", default = "default_min_content")]
    pub min_content_chars: usize,

    /// Retries for connection-reset/abort errors on the static path
    #[serde(rename = "retry-count", default = "default_retry_count")]
    pub retry_count: u32,

    /// Fixed delay between static-path retries
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Whether the headless-render fallback is available
    #[serde(rename = "render-enabled", default)]
    pub render_enabled: bool,

    /// Render navigation timeout in seconds
    #[serde(rename = "render-timeout-secs", default = "default_render_timeout")]
    pub render_timeout_secs: u64,
}

fn default_max_links() -> usize {
    50
}

fn default_max_depth() -> u32 {
    2
}

fn default_crawl_concurrency() -> usize {
    8
}

fn default_crawl_interval() -> u64 {
    1800
}

fn default_search_endpoint() -> String {
    "https://newsapi.org/v2".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_max_pages() -> u32 {
    5
}

fn default_poll_interval() -> u64 {
    300
}

fn default_overlap() -> i64 {
    60
}

fn default_cooldown() -> u64 {
    900
}

fn default_backfill_window() -> i64 {
    24
}

fn default_ingest_concurrency() -> usize {
    8
}

fn default_generative_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_output_tokens() -> u32 {
    512
}

fn default_max_input_chars() -> usize {
    12_000
}

fn default_attempts() -> u32 {
    3
}

fn default_backoff_base() -> u64 {
    2_000
}

fn default_model_ttl() -> u64 {
    600
}

fn default_request_timeout() -> u64 {
    20
}

fn default_thin_threshold() -> usize {
    300
}

fn default_min_content() -> usize {
    200
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    1_000
}

fn default_render_timeout() -> u64 {
    30
}
