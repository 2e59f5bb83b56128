//! Enrichment: summarization and topic extraction
//!
//! Both operations share an exhaustive search over credential x model x
//! attempt: quota-class errors back off linearly and retry the same pair,
//! anything else advances immediately, and the first non-empty response
//! short-circuits all remaining combinations. Running out of combinations
//! raises a terminal exhaustion error for that one call; the ingest
//! coordinator decides what that means for the article.

mod client;
mod keys;
mod provider;

pub use client::{is_quota_class, GenError, GenerativeClient};
pub use keys::KeyPool;
pub use provider::{is_usable_model, ModelProvider};

use crate::config::GenerativeConfig;
use crate::{PolwatchError, Result};
use rand::Rng;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Enrichment operations backed by the generative service
pub struct Enricher {
    client: GenerativeClient,
    keys: Arc<KeyPool>,
    provider: ModelProvider,
    attempts_per_pair: u32,
    backoff_base: Duration,
}

impl Enricher {
    pub fn new(http: Client, config: &GenerativeConfig) -> Self {
        let keys = Arc::new(KeyPool::new(config.keys.clone()));
        Self {
            client: GenerativeClient::new(http.clone(), config),
            keys: Arc::clone(&keys),
            provider: ModelProvider::new(http, config, keys),
            attempts_per_pair: config.attempts_per_pair,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
        }
    }

    /// Summarizes article text into a few sentences
    pub async fn summarize(&self, text: &str) -> Result<String> {
        let prompt = format!(
            "Summarize the following news article in two to three sentences. \
             Respond with the summary only.\n\n{}",
            text
        );
        self.generate("summarize", &prompt).await
    }

    /// Extracts a normalized, order-preserving topic list from article text
    pub async fn extract_topics(&self, text: &str) -> Result<Vec<String>> {
        let prompt = format!(
            "List the main topics of the following news article as short \
             lowercase phrases, one per line. Respond with the topics only.\n\n{}",
            text
        );
        let raw = self.generate("extract_topics", &prompt).await?;
        Ok(normalize_topics(&raw))
    }

    /// Exhaustive credential x model x attempt search
    ///
    /// With K keys, M models, and R attempts per pair, at most K*M*R calls
    /// are made before the terminal exhaustion error. A credential that
    /// fails every model is rotated past, so later calls start at the last
    /// credential that produced output.
    async fn generate(&self, operation: &str, prompt: &str) -> Result<String> {
        let models = self.provider.models().await;

        for _ in 0..self.keys.len() {
            let key = self.keys.current();
            for model in &models {
                let mut attempt = 0u32;
                while attempt < self.attempts_per_pair {
                    match self.client.generate(&key, model, prompt).await {
                        Ok(text) if !text.is_empty() => {
                            tracing::debug!(
                                "{} succeeded on model {} (attempt {})",
                                operation,
                                model,
                                attempt + 1
                            );
                            return Ok(text);
                        }
                        Ok(_) => {
                            // Empty output is a content problem, not a quota
                            // problem: this pair will not do better
                            tracing::debug!("{}: empty response from {}", operation, model);
                            break;
                        }
                        Err(GenError::RateLimited(msg)) => {
                            attempt += 1;
                            if attempt >= self.attempts_per_pair {
                                tracing::debug!(
                                    "{}: {} exhausted attempts on {}, advancing",
                                    operation,
                                    msg,
                                    model
                                );
                                break;
                            }
                            let delay = self.linear_backoff(attempt);
                            tracing::debug!(
                                "{}: rate limited on {} ({}), backing off {:?}",
                                operation,
                                model,
                                msg,
                                delay
                            );
                            sleep(delay).await;
                        }
                        Err(GenError::Other(msg)) => {
                            tracing::debug!(
                                "{}: error on {} ({}), advancing",
                                operation,
                                model,
                                msg
                            );
                            break;
                        }
                    }
                }
            }
            // Every model failed on this credential; advance the shared
            // rotation so the next call does not start at a known-bad key.
            // Returning on success above leaves the pool parked on the
            // credential that worked.
            self.keys.rotate();
        }

        Err(PolwatchError::Exhausted {
            operation: operation.to_string(),
        })
    }

    /// Linear backoff in the attempt index, with a little jitter
    fn linear_backoff(&self, attempt: u32) -> Duration {
        let jitter_ms: u64 = rand::thread_rng().gen_range(0..=250);
        self.backoff_base * attempt + Duration::from_millis(jitter_ms)
    }
}

/// Normalizes raw model output into a topic list
///
/// Splits on newlines and commas, trims, lowercases, drops empties, and
/// de-duplicates preserving first-seen order.
pub fn normalize_topics(raw: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for piece in raw.split(['\n', ',']) {
        let topic = piece.trim().to_lowercase();
        if topic.is_empty() || seen.contains(&topic) {
            continue;
        }
        seen.push(topic);
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_topics_splits_trims_and_dedups() {
        assert_eq!(
            normalize_topics("Economy, Trade , economy\nPolicy"),
            vec!["economy", "trade", "policy"]
        );
    }

    #[test]
    fn test_normalize_topics_drops_empties() {
        assert_eq!(normalize_topics(",,\n  \n"), Vec::<String>::new());
    }

    #[test]
    fn test_normalize_topics_preserves_first_seen_order() {
        assert_eq!(
            normalize_topics("zebra\napple\nZebra\nmango"),
            vec!["zebra", "apple", "mango"]
        );
    }
}
