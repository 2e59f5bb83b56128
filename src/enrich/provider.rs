//! Model provider resolution and cache
//!
//! Discovers which generative-model identifiers are currently usable.
//! Resolution priority: manual override, unexpired cache, per-key queries to
//! the provider's model-listing endpoint, and finally a small built-in
//! static list so the result is never empty.
//!
//! Concurrent cache-miss callers share one in-flight resolution: the cache
//! mutex is held across the network call, so the second caller blocks until
//! the first has refreshed the cache and then reads it without issuing its
//! own query.

use crate::config::GenerativeConfig;
use crate::enrich::keys::KeyPool;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Built-in fallback when every key fails to list models
const FALLBACK_MODELS: &[&str] = &["gemini-2.0-flash", "gemini-2.5-flash", "gemini-flash-latest"];

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
    #[serde(rename = "supportedGenerationMethods", default)]
    supported_generation_methods: Vec<String>,
}

/// Cached resolution result with its refresh time
#[derive(Debug, Clone)]
struct CachedModels {
    models: Vec<String>,
    refreshed_at: Instant,
}

impl CachedModels {
    fn is_stale(&self, ttl: Duration) -> bool {
        self.refreshed_at.elapsed() > ttl
    }
}

/// Resolves and caches the set of usable model identifiers
pub struct ModelProvider {
    http: Client,
    base_url: String,
    keys: Arc<KeyPool>,
    override_model: Option<String>,
    ttl: Duration,
    cache: Mutex<Option<CachedModels>>,
}

impl ModelProvider {
    pub fn new(http: Client, config: &GenerativeConfig, keys: Arc<KeyPool>) -> Self {
        Self {
            http,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            keys,
            override_model: config.model_override.clone(),
            ttl: Duration::from_secs(config.model_cache_ttl_secs),
            cache: Mutex::new(None),
        }
    }

    /// Returns the current list of usable model identifiers; never empty
    ///
    /// # Resolution order
    ///
    /// 1. Manual override (no network, no cache)
    /// 2. Unexpired cache
    /// 3. Model-listing endpoint, each key in order, first non-empty wins
    /// 4. Built-in static fallback
    pub async fn models(&self) -> Vec<String> {
        if let Some(model) = &self.override_model {
            return vec![model.clone()];
        }

        // Holding the lock across the refresh is what makes concurrent
        // cache misses share one resolution.
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if !cached.is_stale(self.ttl) {
                return cached.models.clone();
            }
        }

        let models = match self.resolve().await {
            Some(models) => {
                tracing::info!("Resolved {} usable models from provider", models.len());
                models
            }
            None => {
                tracing::warn!("All keys failed to list models, using static fallback");
                FALLBACK_MODELS.iter().map(|m| m.to_string()).collect()
            }
        };

        *cache = Some(CachedModels {
            models: models.clone(),
            refreshed_at: Instant::now(),
        });

        models
    }

    /// Queries the listing endpoint with each key in order
    async fn resolve(&self) -> Option<Vec<String>> {
        for key in self.keys.cycle() {
            match self.list_models(&key).await {
                Ok(models) if !models.is_empty() => return Some(models),
                Ok(_) => {
                    tracing::debug!("Model listing returned no usable models for a key");
                }
                Err(e) => {
                    tracing::debug!("Model listing failed for a key: {}", e);
                }
            }
        }
        None
    }

    async fn list_models(&self, key: &str) -> Result<Vec<String>, reqwest::Error> {
        let url = format!("{}/models?key={}", self.base_url, key);
        let response = self.http.get(&url).send().await?.error_for_status()?;
        let parsed: ListModelsResponse = response.json().await?;

        Ok(parsed
            .models
            .into_iter()
            .filter(|entry| {
                is_usable_model(&entry.name, &entry.supported_generation_methods)
            })
            .map(|entry| {
                entry
                    .name
                    .strip_prefix("models/")
                    .unwrap_or(&entry.name)
                    .to_string()
            })
            .collect())
    }
}

/// Filter for the generation family the pipeline can afford to call
///
/// Keeps models whose name implies the family, drops embedding-only models
/// and the heavier "pro" tier, and requires the text-generation capability
/// when the provider reports capabilities at all.
pub fn is_usable_model(name: &str, methods: &[String]) -> bool {
    let lowered = name.to_lowercase();

    if !lowered.contains("gemini") {
        return false;
    }
    if lowered.contains("embedding") {
        return false;
    }
    if lowered.contains("pro") {
        return false;
    }
    if !methods.is_empty() && !methods.iter().any(|m| m == "generateContent") {
        return false;
    }

    true
}
