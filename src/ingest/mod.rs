//! Ingest coordinator
//!
//! Single entry point both discovery sources feed. For each candidate URL:
//! - drop it if another worker is already processing it (working set)
//! - drop it if it fails the fetchability or topical keyword gates
//! - drop it if the store already holds it
//! - fetch, enrich, and persist the survivors
//!
//! Ingestion never propagates errors to the caller; every failure is logged
//! and the URL is abandoned. The working-set entry is released on every exit
//! path via an RAII guard, so a panicking or failing ingest never wedges a
//! URL out of future attempts.

use crate::enrich::Enricher;
use crate::fetch::Fetcher;
use crate::storage::{ArticleRecord, ArticleStore};
use crate::url::{extract_domain, is_fetchable, is_topical};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use url::Url;

/// Longest summary we will synthesize locally when the generative
/// service cannot produce one
const FALLBACK_SUMMARY_CHARS: usize = 400;

/// Coordinates fetch, enrichment, and storage for one URL at a time
pub struct Ingestor {
    store: Arc<Mutex<dyn ArticleStore + Send>>,
    fetcher: Arc<Fetcher>,
    enricher: Arc<Enricher>,
    working: Mutex<HashSet<String>>,
    keywords: Vec<String>,
    min_content_chars: usize,
}

/// Releases a working-set entry when dropped
struct WorkingSetGuard<'a> {
    working: &'a Mutex<HashSet<String>>,
    url: String,
}

impl Drop for WorkingSetGuard<'_> {
    fn drop(&mut self) {
        self.working
            .lock()
            .expect("working set lock poisoned")
            .remove(&self.url);
    }
}

impl Ingestor {
    pub fn new(
        store: Arc<Mutex<dyn ArticleStore + Send>>,
        fetcher: Arc<Fetcher>,
        enricher: Arc<Enricher>,
        keywords: Vec<String>,
        min_content_chars: usize,
    ) -> Self {
        Self {
            store,
            fetcher,
            enricher,
            working: Mutex::new(HashSet::new()),
            keywords,
            min_content_chars,
        }
    }

    /// Processes one candidate URL end to end
    ///
    /// Safe to call concurrently and repeatedly with the same URL: the
    /// working set collapses concurrent attempts and the store's
    /// insert-if-absent collapses repeated ones.
    pub async fn ingest(&self, url: &str) {
        if !is_fetchable(url) {
            tracing::debug!("Skipping non-fetchable URL: {}", url);
            return;
        }
        if !is_topical(url, &self.keywords) {
            tracing::debug!("Skipping off-topic URL: {}", url);
            return;
        }

        let _guard = {
            let mut working = self.working.lock().expect("working set lock poisoned");
            if !working.insert(url.to_string()) {
                tracing::debug!("URL already in flight, skipping: {}", url);
                return;
            }
            WorkingSetGuard {
                working: &self.working,
                url: url.to_string(),
            }
        };

        let already_stored = match self
            .store
            .lock()
            .expect("store lock poisoned")
            .exists(url)
        {
            Ok(exists) => exists,
            Err(e) => {
                tracing::warn!("Existence check failed for {}: {}", url, e);
                return;
            }
        };
        if already_stored {
            tracing::debug!("URL already stored, skipping: {}", url);
            return;
        }

        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Fetch failed for {}: {}", url, e);
                return;
            }
        };

        if page.content.chars().count() < self.min_content_chars {
            tracing::info!(
                "Abandoning {} with only {} chars of content",
                url,
                page.content.chars().count()
            );
            return;
        }

        // Topics are required; an article without them is not worth keeping
        let topics = match self.enricher.extract_topics(&page.content).await {
            Ok(topics) => topics,
            Err(e) => {
                tracing::warn!("Topic extraction failed for {}, abandoning: {}", url, e);
                return;
            }
        };

        // A missing summary degrades to a content prefix rather than
        // abandoning the article
        let summary = match self.enricher.summarize(&page.content).await {
            Ok(s) if !s.trim().is_empty() => s,
            Ok(_) => {
                tracing::info!("Empty summary for {}, using content prefix", url);
                fallback_summary(&page.content)
            }
            Err(e) => {
                tracing::warn!("Summarization failed for {}, using content prefix: {}", url, e);
                fallback_summary(&page.content)
            }
        };

        let source_domain = Url::parse(url)
            .ok()
            .and_then(|u| extract_domain(&u))
            .unwrap_or_default();

        let record = ArticleRecord {
            url: url.to_string(),
            title: page.title,
            content: page.content,
            summary,
            topics,
            source_domain,
            fetched_at: Utc::now(),
        };

        match self
            .store
            .lock()
            .expect("store lock poisoned")
            .insert_if_absent(&record)
        {
            Ok(true) => tracing::info!("Stored article: {}", url),
            Ok(false) => tracing::debug!("Article landed concurrently, dropped: {}", url),
            Err(e) => tracing::warn!("Store insert failed for {}: {}", url, e),
        }
    }

}

fn fallback_summary(content: &str) -> String {
    let truncated: String = content.chars().take(FALLBACK_SUMMARY_CHARS).collect();
    if truncated.len() < content.len() {
        format!("{}...", truncated.trim_end())
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_summary_short_content_untouched() {
        let content = "A short article body.";
        assert_eq!(fallback_summary(content), content);
    }

    #[test]
    fn test_fallback_summary_truncates_long_content() {
        let content = "word ".repeat(200);
        let summary = fallback_summary(&content);
        assert!(summary.ends_with("..."));
        assert!(summary.chars().count() <= FALLBACK_SUMMARY_CHARS + 3);
    }

    #[test]
    fn test_working_set_guard_releases_on_drop() {
        let working = Mutex::new(HashSet::new());
        working.lock().unwrap().insert("https://e.com/a".to_string());
        {
            let _guard = WorkingSetGuard {
                working: &working,
                url: "https://e.com/a".to_string(),
            };
        }
        assert!(working.lock().unwrap().is_empty());
    }
}
