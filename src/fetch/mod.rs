//! Fetch layer: static-first with rendered-browser fallback
//!
//! The static path is cheap and handles most sites; the render path is slow
//! and expensive but survives script-heavy pages and some anti-scraping
//! measures. Ordering is strict: render is attempted only when the static
//! result is thin or the static path failed.

mod render;
mod static_fetch;
mod text;

pub use render::{ChromeRenderer, Render};
pub use static_fetch::{build_http_client, fetch_static, StaticFetchError};
pub use text::{derive_title, extract_title, html_to_text};

use crate::config::FetchConfig;
use crate::{PolwatchError, Result};
use reqwest::Client;

/// Result of a successful fetch
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Derived title; never empty
    pub title: String,

    /// Collapsed plain text of the page
    pub content: String,
}

/// Two-tier page fetcher
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
    renderer: Option<Box<dyn Render>>,
}

impl Fetcher {
    /// Creates a fetcher with an optional render fallback
    pub fn new(config: FetchConfig, renderer: Option<Box<dyn Render>>) -> Result<Self> {
        let client = build_http_client(&config)?;
        Ok(Self {
            client,
            config,
            renderer,
        })
    }

    /// Creates a fetcher reusing an existing HTTP client (for tests)
    pub fn with_client(
        config: FetchConfig,
        client: Client,
        renderer: Option<Box<dyn Render>>,
    ) -> Self {
        Self {
            client,
            config,
            renderer,
        }
    }

    /// Fetches a page, static-first with render fallback
    ///
    /// The render path is triggered when the static path fails or when its
    /// content falls below the thin threshold. When the render path also
    /// fails, a usable static result (thin but present) is still returned;
    /// the coordinator applies its own minimum-length gate.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let mut thin_page = None;
        let mut static_error = None;

        match fetch_static(&self.client, url, &self.config).await {
            // Count chars, not bytes, so the gate agrees with the
            // coordinator's minimum-content check on non-ASCII pages
            Ok(page) if page.content.chars().count() >= self.config.thin_threshold => {
                return Ok(page)
            }
            Ok(page) => {
                tracing::debug!(
                    "Static content for {} is thin ({} chars), trying render",
                    url,
                    page.content.chars().count()
                );
                thin_page = Some(page);
            }
            Err(e) => {
                tracing::debug!("Static fetch failed for {}: {}, trying render", url, e);
                static_error = Some(e);
            }
        }

        if let Some(renderer) = &self.renderer {
            match renderer.render(url).await {
                Ok(page) => return Ok(page),
                Err(e) => {
                    tracing::debug!("Render failed for {}: {}", url, e);
                }
            }
        }

        // No renderer or render failed: a thin static result is still the
        // best we have; a failed static path is terminal.
        if let Some(page) = thin_page {
            return Ok(page);
        }

        match static_error {
            Some(StaticFetchError::Network(msg)) if msg.contains("timeout") => {
                Err(PolwatchError::Timeout {
                    url: url.to_string(),
                })
            }
            Some(e) => Err(PolwatchError::Render {
                url: url.to_string(),
                message: format!("static path failed ({}) and no render result", e),
            }),
            None => Err(PolwatchError::Render {
                url: url.to_string(),
                message: "static path failed and no render result".to_string(),
            }),
        }
    }
}
