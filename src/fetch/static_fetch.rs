//! Static HTTP fetch path
//!
//! The cheap first tier of the fetch strategy: a timed GET with plain-text
//! stripping. Connection-reset/abort errors are retried a bounded number of
//! times with a fixed delay. HTTP 403 is treated as anti-scraping rather
//! than transient, so it skips retries and signals an immediate render
//! fallback.

use crate::config::FetchConfig;
use crate::fetch::text::{derive_title, extract_title, html_to_text};
use crate::fetch::FetchedPage;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::time::sleep;

/// Failure modes of the static path, used to pick the fallback behavior
#[derive(Debug)]
pub enum StaticFetchError {
    /// HTTP 403; likely anti-scraping, no point retrying the static path
    Forbidden,

    /// Any other non-success status
    Http(u16),

    /// Timeout, connection failure, or body read failure (after retries)
    Network(String),
}

impl std::fmt::Display for StaticFetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaticFetchError::Forbidden => write!(f, "HTTP 403 (anti-scraping)"),
            StaticFetchError::Http(code) => write!(f, "HTTP {}", code),
            StaticFetchError::Network(msg) => write!(f, "network error: {}", msg),
        }
    }
}

/// Builds the shared HTTP client for the pipeline
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(format!("polwatch/{}", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL over plain HTTP and strips it to text
///
/// # Retry Policy
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 403 | No retry; caller falls back to render immediately |
/// | Other non-2xx | No retry; caller decides |
/// | Connection reset / abort | Retry up to `retry-count` times, fixed delay |
/// | Timeout / other network | No retry |
pub async fn fetch_static(
    client: &Client,
    url: &str,
    config: &FetchConfig,
) -> Result<FetchedPage, StaticFetchError> {
    let mut attempt = 0u32;

    loop {
        match try_fetch(client, url).await {
            Ok(page) => return Ok(page),
            Err(StaticFetchError::Network(msg)) if is_reset(&msg) && attempt < config.retry_count => {
                attempt += 1;
                tracing::debug!(
                    "Connection reset fetching {} (attempt {}/{}), retrying",
                    url,
                    attempt,
                    config.retry_count
                );
                sleep(Duration::from_millis(config.retry_delay_ms)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn try_fetch(client: &Client, url: &str) -> Result<FetchedPage, StaticFetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| StaticFetchError::Network(describe(&e)))?;

    let status = response.status();
    if status == StatusCode::FORBIDDEN {
        return Err(StaticFetchError::Forbidden);
    }
    if !status.is_success() {
        return Err(StaticFetchError::Http(status.as_u16()));
    }

    let body = response
        .text()
        .await
        .map_err(|e| StaticFetchError::Network(describe(&e)))?;

    let content = html_to_text(&body);
    let title = derive_title(extract_title(&body), &content);

    Ok(FetchedPage { title, content })
}

fn describe(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    }
}

/// Matches the reset/abort class of connection failures worth retrying
fn is_reset(message: &str) -> bool {
    let lowered = message.to_lowercase();
    lowered.contains("reset") || lowered.contains("abort") || lowered.contains("connection failed")
}
