//! Integration tests for the enrichment layer
//!
//! These tests use wiremock to stand in for the generative service and
//! verify credential/model rotation, the bounded retry budget, and
//! single-flight model resolution.

use polwatch::config::GenerativeConfig;
use polwatch::enrich::{Enricher, KeyPool, ModelProvider};
use polwatch::PolwatchError;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn generative_config(endpoint: &str, keys: &[&str]) -> GenerativeConfig {
    GenerativeConfig {
        endpoint: endpoint.to_string(),
        keys: keys.iter().map(|k| k.to_string()).collect(),
        system_instruction: "You summarize political news.".to_string(),
        temperature: 0.2,
        max_output_tokens: 256,
        max_input_chars: 12_000,
        attempts_per_pair: 2,
        backoff_base_ms: 1,
        model_override: Some("gemini-test".to_string()),
        model_cache_ttl_secs: 600,
    }
}

fn candidate_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {
                "parts": [{"text": text}],
                "role": "model"
            }
        }]
    })
}

#[tokio::test]
async fn test_exhaustion_after_full_rotation() {
    let server = MockServer::start().await;
    let config = generative_config(&server.uri(), &["k1", "k2"]);

    // 2 keys x 1 pinned model x 2 attempts per pair
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": {"message": "Resource exhausted"}
        })))
        .expect(4)
        .mount(&server)
        .await;

    let enricher = Enricher::new(reqwest::Client::new(), &config);
    let result = enricher.summarize("The committee voted on the budget.").await;

    assert!(matches!(result, Err(PolwatchError::Exhausted { .. })));
}

#[tokio::test]
async fn test_rotation_recovers_on_second_key() {
    let server = MockServer::start().await;
    let mut config = generative_config(&server.uri(), &["k1", "k2"]);
    config.attempts_per_pair = 1;

    Mock::given(method("POST"))
        .and(query_param("key", "k1"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": {"message": "Quota exceeded"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(query_param("key", "k2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(candidate_body("A concise summary.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let enricher = Enricher::new(reqwest::Client::new(), &config);
    let summary = enricher
        .summarize("The committee voted on the budget.")
        .await
        .expect("second key should succeed");

    assert_eq!(summary, "A concise summary.");
}

#[tokio::test]
async fn test_later_calls_start_at_last_good_key() {
    let server = MockServer::start().await;
    let mut config = generative_config(&server.uri(), &["k1", "k2"]);
    config.attempts_per_pair = 1;

    // k1 quota-fails once and must not be retried by the second call
    Mock::given(method("POST"))
        .and(query_param("key", "k1"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": {"message": "Quota exceeded"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(query_param("key", "k2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(candidate_body("A concise summary.")),
        )
        .expect(2)
        .mount(&server)
        .await;

    let enricher = Enricher::new(reqwest::Client::new(), &config);
    enricher
        .summarize("The committee voted on the budget.")
        .await
        .expect("second key should succeed");
    enricher
        .summarize("The amendment passed the floor vote.")
        .await
        .expect("pool should start at the key that last worked");
}

#[tokio::test]
async fn test_topic_extraction_normalizes_output() {
    let server = MockServer::start().await;
    let mut config = generative_config(&server.uri(), &["k1"]);
    config.attempts_per_pair = 1;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate_body(
            "Economy, Trade , economy\nPolicy",
        )))
        .mount(&server)
        .await;

    let enricher = Enricher::new(reqwest::Client::new(), &config);
    let topics = enricher
        .extract_topics("Tariff talks resumed this week.")
        .await
        .expect("extraction should succeed");

    assert_eq!(topics, vec!["economy", "trade", "policy"]);
}

#[tokio::test]
async fn test_model_listing_is_single_flight_and_filtered() {
    let server = MockServer::start().await;
    let mut config = generative_config(&server.uri(), &["k1"]);
    config.model_override = None;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "models": [
                {"name": "models/gemini-2.0-flash", "supportedGenerationMethods": ["generateContent"]},
                {"name": "models/gemini-2.5-pro", "supportedGenerationMethods": ["generateContent"]},
                {"name": "models/gemini-embedding-001", "supportedGenerationMethods": ["embedContent"]}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let keys = Arc::new(KeyPool::new(config.keys.clone()));
    let provider = ModelProvider::new(reqwest::Client::new(), &config, keys);

    // Concurrent cache misses must share one listing request
    let (first, second) = tokio::join!(provider.models(), provider.models());

    assert_eq!(first, vec!["gemini-2.0-flash"]);
    assert_eq!(second, first);

    // A warm cache serves later callers without another request
    assert_eq!(provider.models().await, first);
}
