//! Search-API discovery: fresh polling and historical backfill
//!
//! Both modes share one windowed, paged client with credential rotation.
//! Fresh-poll scans `[last_checked, now]` on a fixed interval and advances
//! its checkpoint with a small overlap; backfill walks backward through
//! history one window at a time, indefinitely. The provider's "maximum
//! results for this window" signal is handled differently per mode: polling
//! just waits for the next tick, backfill slides its window's upper bound to
//! just before the oldest item it has seen and restarts from page 1.

use crate::config::SearchConfig;
use crate::enrich::KeyPool;
use crate::ingest::Ingestor;
use crate::{PolwatchError, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::sleep;

/// One qualifying item from a search page
#[derive(Debug, Clone)]
pub struct SearchItem {
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Outcome of fetching one search page
#[derive(Debug)]
pub enum PageOutcome {
    /// A page of items; may be short or empty
    Items(Vec<SearchItem>),

    /// The provider refuses to page deeper into this time window
    WindowCapped,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<WireArticle>,
}

#[derive(Debug, Deserialize)]
struct WireArticle {
    url: String,
    #[serde(rename = "publishedAt")]
    published_at: Option<DateTime<Utc>>,
}

/// Windowed, paged search client with key rotation
pub struct SearchClient {
    http: Client,
    base_url: String,
    keys: Arc<KeyPool>,
    query: String,
    language: String,
    page_size: u32,
}

impl SearchClient {
    pub fn new(http: Client, config: &SearchConfig) -> Self {
        Self {
            http,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            keys: Arc::new(KeyPool::new(config.keys.clone())),
            query: config.query.clone(),
            language: config.language.clone(),
            page_size: config.page_size,
        }
    }

    /// Fetches one page of results for a time window
    ///
    /// On 401/429 (or their body-level equivalents) the key rotates and the
    /// same page is retried. A full rotation cycle of failures surfaces as
    /// `SearchKeysExhausted`; the calling loop owns the cooldown.
    pub async fn fetch_page(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        page: u32,
    ) -> Result<PageOutcome> {
        for _ in 0..self.keys.len() {
            let key = self.keys.current();

            let response = match self.request(&key, from, to, page).await {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!("Search request failed: {}, rotating key", e);
                    self.keys.rotate();
                    continue;
                }
            };

            match classify(&response) {
                PageClass::Ok => {
                    let items = response
                        .articles
                        .into_iter()
                        .map(|a| SearchItem {
                            url: a.url,
                            published_at: a.published_at,
                        })
                        .collect();
                    return Ok(PageOutcome::Items(items));
                }
                PageClass::AuthOrQuota => {
                    tracing::debug!("Search key rejected (auth/quota), rotating");
                    self.keys.rotate();
                }
                PageClass::WindowCapped => return Ok(PageOutcome::WindowCapped),
                PageClass::Other => {
                    return Err(PolwatchError::Search(
                        response
                            .message
                            .unwrap_or_else(|| "unknown search API error".to_string()),
                    ));
                }
            }
        }

        Err(PolwatchError::SearchKeysExhausted)
    }

    async fn request(
        &self,
        key: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        page: u32,
    ) -> std::result::Result<SearchResponse, reqwest::Error> {
        let url = format!("{}/everything", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("q", self.query.as_str()),
                ("language", self.language.as_str()),
                ("sortBy", "publishedAt"),
                ("page", &page.to_string()),
                ("pageSize", &self.page_size.to_string()),
                ("from", &from.to_rfc3339()),
                ("to", &to.to_rfc3339()),
                ("apiKey", key),
            ])
            .send()
            .await?;

        let status = response.status().as_u16();
        let body: SearchResponse = response.json().await?;

        // Any 401/429 must rotate to the next key, whatever error code the
        // body carries (providers emit apiKeyDisabled, apiKeyMissing and
        // others beyond the quota family), so fold the HTTP status into the
        // classification unconditionally
        if status == 401 || status == 429 {
            return Ok(SearchResponse {
                status: "error".to_string(),
                code: Some("rateLimited".to_string()),
                message: body.message,
                articles: Vec::new(),
            });
        }

        Ok(body)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }
}

enum PageClass {
    Ok,
    AuthOrQuota,
    WindowCapped,
    Other,
}

fn classify(response: &SearchResponse) -> PageClass {
    if response.status == "ok" {
        return PageClass::Ok;
    }

    let code = response.code.as_deref().unwrap_or("");
    let message = response.message.as_deref().unwrap_or("");

    if matches!(code, "rateLimited" | "apiKeyExhausted" | "apiKeyInvalid") {
        return PageClass::AuthOrQuota;
    }

    // Providers are inconsistent: match the message text as a fallback
    if code == "maximumResultsReached" || message.to_lowercase().contains("maximum") {
        return PageClass::WindowCapped;
    }

    PageClass::Other
}

/// Upper bound for the next backfill request after a window-cap signal
///
/// Strictly earlier than the oldest item seen, so paging can never stall at
/// a provider tier cap.
pub fn slide_upper_bound(oldest_seen: DateTime<Utc>) -> DateTime<Utc> {
    oldest_seen - ChronoDuration::seconds(1)
}

/// Fresh-poll loop: scans `[last_checked, now]` every tick, forever
///
/// Qualifying URLs are handed to the coordinator as detached tasks bounded
/// by a semaphore; the loop itself never waits on ingestion.
pub async fn poll_loop(search: Arc<SearchClient>, ingestor: Arc<Ingestor>, config: SearchConfig) {
    let semaphore = Arc::new(Semaphore::new(config.ingest_concurrency));
    let mut last_checked = Utc::now();

    loop {
        sleep(Duration::from_secs(config.poll_interval_secs)).await;
        let now = Utc::now();
        let mut page = 1u32;

        loop {
            match search.fetch_page(last_checked, now, page).await {
                Ok(PageOutcome::Items(items)) => {
                    let short_page = (items.len() as u32) < search.page_size();
                    tracing::info!(
                        "Fresh poll page {} returned {} items",
                        page,
                        items.len()
                    );

                    for item in items {
                        let ingestor = Arc::clone(&ingestor);
                        let semaphore = Arc::clone(&semaphore);
                        tokio::spawn(async move {
                            // The semaphore is never closed, so this cannot fail
                            let _permit = match semaphore.acquire_owned().await {
                                Ok(permit) => permit,
                                Err(_) => return,
                            };
                            ingestor.ingest(&item.url).await;
                        });
                    }

                    if short_page || page >= config.max_pages {
                        break;
                    }
                    page += 1;
                }
                Ok(PageOutcome::WindowCapped) => {
                    tracing::info!("Fresh poll hit the window cap, waiting for next tick");
                    break;
                }
                Err(PolwatchError::SearchKeysExhausted) => {
                    tracing::warn!(
                        "All search keys rate limited, cooling down {}s",
                        config.cooldown_secs
                    );
                    sleep(Duration::from_secs(config.cooldown_secs)).await;
                    // Resume the same page after the cooldown
                }
                Err(e) => {
                    tracing::warn!("Fresh poll failed on page {}: {}", page, e);
                    break;
                }
            }
        }

        // Small overlap absorbs clock skew and indexing lag at the provider;
        // downstream URL dedup eats the re-discovered duplicates
        last_checked = now - ChronoDuration::seconds(config.overlap_secs);
    }
}

/// Backfill loop: walks backward from now one window at a time, forever
///
/// Ingestion is awaited sequentially to bound the resource draw of this
/// permanently running miner.
pub async fn backfill_loop(
    search: Arc<SearchClient>,
    ingestor: Arc<Ingestor>,
    config: SearchConfig,
) {
    let window = ChronoDuration::hours(config.backfill_window_hours);
    let mut upper = Utc::now();

    loop {
        let lower = upper - window;
        tracing::info!("Backfilling window {} .. {}", lower, upper);

        let mut window_upper = upper;
        let mut oldest_seen: Option<DateTime<Utc>> = None;
        let mut page = 1u32;

        loop {
            match search.fetch_page(lower, window_upper, page).await {
                Ok(PageOutcome::Items(items)) => {
                    let short_page = (items.len() as u32) < search.page_size();

                    for item in &items {
                        if let Some(published) = item.published_at {
                            if oldest_seen.map_or(true, |oldest| published < oldest) {
                                oldest_seen = Some(published);
                            }
                        }
                    }

                    for item in items {
                        ingestor.ingest(&item.url).await;
                    }

                    if short_page || page >= config.max_pages {
                        break;
                    }
                    page += 1;
                }
                Ok(PageOutcome::WindowCapped) => match oldest_seen.take() {
                    Some(oldest) => {
                        window_upper = slide_upper_bound(oldest);
                        page = 1;
                        tracing::info!(
                            "Window cap hit, sliding upper bound to {}",
                            window_upper
                        );
                    }
                    None => {
                        tracing::warn!("Window cap hit before any items, skipping window");
                        break;
                    }
                },
                Err(PolwatchError::SearchKeysExhausted) => {
                    tracing::warn!(
                        "All search keys rate limited, cooling down {}s",
                        config.cooldown_secs
                    );
                    sleep(Duration::from_secs(config.cooldown_secs)).await;
                }
                Err(e) => {
                    tracing::warn!("Backfill failed on page {}: {}", page, e);
                    break;
                }
            }
        }

        upper = lower;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_slide_upper_bound_strictly_earlier() {
        let oldest = Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap();
        let slid = slide_upper_bound(oldest);
        assert!(slid < oldest);
        assert_eq!(oldest - slid, ChronoDuration::seconds(1));
    }

    #[test]
    fn test_classify_ok() {
        let response = SearchResponse {
            status: "ok".to_string(),
            code: None,
            message: None,
            articles: Vec::new(),
        };
        assert!(matches!(classify(&response), PageClass::Ok));
    }

    #[test]
    fn test_classify_auth_codes() {
        for code in ["rateLimited", "apiKeyExhausted", "apiKeyInvalid"] {
            let response = SearchResponse {
                status: "error".to_string(),
                code: Some(code.to_string()),
                message: None,
                articles: Vec::new(),
            };
            assert!(matches!(classify(&response), PageClass::AuthOrQuota));
        }
    }

    #[test]
    fn test_classify_window_cap_by_code_and_message() {
        let by_code = SearchResponse {
            status: "error".to_string(),
            code: Some("maximumResultsReached".to_string()),
            message: None,
            articles: Vec::new(),
        };
        assert!(matches!(classify(&by_code), PageClass::WindowCapped));

        let by_message = SearchResponse {
            status: "error".to_string(),
            code: Some("unexpected".to_string()),
            message: Some("You have requested the maximum results for this window".to_string()),
            articles: Vec::new(),
        };
        assert!(matches!(classify(&by_message), PageClass::WindowCapped));
    }

    #[test]
    fn test_classify_other_errors() {
        let response = SearchResponse {
            status: "error".to_string(),
            code: Some("parameterInvalid".to_string()),
            message: Some("bad query".to_string()),
            articles: Vec::new(),
        };
        assert!(matches!(classify(&response), PageClass::Other));
    }
}
