//! Integration tests for the ingest coordinator
//!
//! These tests wire a real fetcher, enricher, and in-memory store against
//! wiremock servers and verify the dedup layers and the abandonment gates
//! end to end.

use polwatch::config::{FetchConfig, GenerativeConfig};
use polwatch::enrich::Enricher;
use polwatch::fetch::Fetcher;
use polwatch::ingest::Ingestor;
use polwatch::storage::{ArticleStore, SqliteStore};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetch_config() -> FetchConfig {
    FetchConfig {
        request_timeout_secs: 5,
        thin_threshold: 50,
        min_content_chars: 200,
        retry_count: 0,
        retry_delay_ms: 10,
        render_enabled: false,
        render_timeout_secs: 5,
    }
}

fn generative_config(endpoint: &str) -> GenerativeConfig {
    GenerativeConfig {
        endpoint: endpoint.to_string(),
        keys: vec!["k1".to_string()],
        system_instruction: "You summarize political news.".to_string(),
        temperature: 0.2,
        max_output_tokens: 256,
        max_input_chars: 12_000,
        attempts_per_pair: 1,
        backoff_base_ms: 1,
        model_override: Some("gemini-test".to_string()),
        model_cache_ttl_secs: 600,
    }
}

fn article_html() -> String {
    let paragraph = "The finance committee spent a third day debating the draft \
                     budget, with opposition members pressing for amendments to \
                     the infrastructure allocations and the majority defending \
                     the existing spending plan. A final vote is expected before \
                     the chamber adjourns for the autumn recess."
        .repeat(2);
    format!(
        "<html><head><title>Budget Debate Continues</title></head><body><p>{}</p></body></html>",
        paragraph
    )
}

fn gen_response(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {"parts": [{"text": text}], "role": "model"}
        }]
    })
}

struct Pipeline {
    ingestor: Arc<Ingestor>,
    store: Arc<Mutex<dyn ArticleStore + Send>>,
}

fn build_pipeline(gen_endpoint: &str) -> Pipeline {
    let store: Arc<Mutex<dyn ArticleStore + Send>> = Arc::new(Mutex::new(
        SqliteStore::new_in_memory().expect("in-memory store"),
    ));
    let fetcher = Arc::new(Fetcher::with_client(
        fetch_config(),
        reqwest::Client::new(),
        None,
    ));
    let enricher = Arc::new(Enricher::new(
        reqwest::Client::new(),
        &generative_config(gen_endpoint),
    ));
    let ingestor = Arc::new(Ingestor::new(
        Arc::clone(&store),
        fetcher,
        enricher,
        vec!["politics".to_string()],
        fetch_config().min_content_chars,
    ));
    Pipeline { ingestor, store }
}

async fn mount_generative(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gen_response("economy\npolicy")))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_ingest_stores_article_exactly_once() {
    let server = MockServer::start().await;
    mount_generative(&server).await;

    Mock::given(method("GET"))
        .and(path("/politics/budget-vote"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_html()))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = build_pipeline(&server.uri());
    let url = format!("{}/politics/budget-vote", server.uri());

    pipeline.ingestor.ingest(&url).await;
    // A repeat arrival is dropped at the store-existence gate without a fetch
    pipeline.ingestor.ingest(&url).await;

    let store = pipeline.store.lock().unwrap();
    assert_eq!(store.article_count().unwrap(), 1);
    assert!(store.exists(&url).unwrap());
}

#[tokio::test]
async fn test_ingest_record_carries_enrichment() {
    let server = MockServer::start().await;
    mount_generative(&server).await;

    Mock::given(method("GET"))
        .and(path("/politics/cabinet"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_html()))
        .mount(&server)
        .await;

    let pipeline = build_pipeline(&server.uri());
    let url = format!("{}/politics/cabinet", server.uri());

    pipeline.ingestor.ingest(&url).await;

    let store = pipeline.store.lock().unwrap();
    let counts = store.counts_by_domain().unwrap();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0].0, "127.0.0.1");
    assert_eq!(counts[0].1, 1);
}

#[tokio::test]
async fn test_off_topic_and_malformed_urls_are_dropped() {
    let server = MockServer::start().await;
    mount_generative(&server).await;

    Mock::given(method("GET"))
        .and(path("/sports/final"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_html()))
        .expect(0)
        .mount(&server)
        .await;

    let pipeline = build_pipeline(&server.uri());

    pipeline
        .ingestor
        .ingest(&format!("{}/sports/final", server.uri()))
        .await;
    pipeline.ingestor.ingest("not a url").await;
    pipeline
        .ingestor
        .ingest("ftp://archive.example/politics/file")
        .await;

    assert_eq!(pipeline.store.lock().unwrap().article_count().unwrap(), 0);
}

#[tokio::test]
async fn test_thin_article_is_abandoned_before_enrichment() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gen_response("economy")))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/politics/stub"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><p>Too short to keep.</p></body></html>"),
        )
        .mount(&server)
        .await;

    let pipeline = build_pipeline(&server.uri());
    pipeline
        .ingestor
        .ingest(&format!("{}/politics/stub", server.uri()))
        .await;

    assert_eq!(pipeline.store.lock().unwrap().article_count().unwrap(), 0);
}

#[tokio::test]
async fn test_concurrent_ingest_of_same_url_fetches_once() {
    let server = MockServer::start().await;
    mount_generative(&server).await;

    // A slow response keeps the first ingest in flight while the second
    // arrives, exercising the working-set gate rather than the store gate
    Mock::given(method("GET"))
        .and(path("/politics/slow-story"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_html())
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = build_pipeline(&server.uri());
    let url = format!("{}/politics/slow-story", server.uri());

    tokio::join!(pipeline.ingestor.ingest(&url), pipeline.ingestor.ingest(&url));

    assert_eq!(pipeline.store.lock().unwrap().article_count().unwrap(), 1);
}

#[tokio::test]
async fn test_failed_topic_extraction_abandons_article() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {"message": "invalid argument"}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/politics/unlucky"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_html()))
        .mount(&server)
        .await;

    let pipeline = build_pipeline(&server.uri());
    pipeline
        .ingestor
        .ingest(&format!("{}/politics/unlucky", server.uri()))
        .await;

    assert_eq!(pipeline.store.lock().unwrap().article_count().unwrap(), 0);
}
