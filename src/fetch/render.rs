//! Headless-render fetch path
//!
//! The expensive second tier: a headless Chromium session driven through
//! chromiumoxide. Used only when the static path returned thin content or
//! failed outright. The browser is launched per render and closed after use
//! so a crashed render never poisons later fetches.

use crate::fetch::text::derive_title;
use crate::fetch::FetchedPage;
use crate::{PolwatchError, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// Seam for the render fallback, so callers and tests can substitute the
/// browser with a counting stub
#[async_trait]
pub trait Render: Send + Sync {
    /// Renders the page and extracts its visible text
    async fn render(&self, url: &str) -> Result<FetchedPage>;
}

/// Chromium-backed renderer
pub struct ChromeRenderer {
    /// Primary wait-strategy timeout for page navigation
    navigation_timeout: Duration,
}

impl ChromeRenderer {
    pub fn new(navigation_timeout: Duration) -> Self {
        Self { navigation_timeout }
    }
}

#[async_trait]
impl Render for ChromeRenderer {
    async fn render(&self, url: &str) -> Result<FetchedPage> {
        let render_err = |message: String| PolwatchError::Render {
            url: url.to_string(),
            message,
        };

        let browser_config = BrowserConfig::builder()
            .build()
            .map_err(|e| render_err(e.to_string()))?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| render_err(e.to_string()))?;

        // The handler stream must be polled for the CDP connection to make
        // progress; aborted once the session is done.
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let result = render_page(&browser, url, self.navigation_timeout).await;

        // Release the browser after each use regardless of outcome
        let _ = browser.close().await;
        handler_task.abort();

        result.map_err(|e| render_err(e.to_string()))
    }
}

async fn render_page(
    browser: &Browser,
    url: &str,
    navigation_timeout: Duration,
) -> std::result::Result<FetchedPage, chromiumoxide::error::CdpError> {
    let page = browser.new_page(url).await?;

    // Primary wait strategy: full navigation. On timeout, fall back to the
    // lenient strategy of letting the page settle and taking what rendered.
    if timeout(navigation_timeout, page.wait_for_navigation())
        .await
        .is_err()
    {
        tracing::debug!("Navigation timeout for {}, taking settled content", url);
        sleep(Duration::from_secs(2)).await;
    }

    let text: String = page
        .evaluate("document.body ? document.body.innerText : ''")
        .await?
        .into_value()?;

    let document_title = page.get_title().await.unwrap_or(None);
    let content = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let title = derive_title(document_title, &content);

    let _ = page.close().await;

    Ok(FetchedPage { title, content })
}
