//! Topical homepage crawler
//!
//! A bounded-concurrency BFS over configured seed homepages. All workers
//! drain one shared queue rather than owning a seed each, so link-dense and
//! link-sparse sites balance naturally across the pool. This is a
//! best-effort discovery pass: every failure is local and silent, never
//! retried, never propagated.

use crate::url::{extract_domain, is_fetchable, is_topical};
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Shared crawl state drained by the worker pool
struct CrawlState {
    queue: Mutex<VecDeque<(Url, u32)>>,
    visited: Mutex<HashSet<String>>,
    found: Mutex<HashSet<String>>,
    in_flight: AtomicUsize,
}

/// Crawls seed homepages for topically relevant article links
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `seeds` - Homepage URLs seeding the shared queue
/// * `keywords` - Topical keywords matched against discovered URLs
/// * `max_links` - Bound on the result set
/// * `max_depth` - Depth bound; links at depth `d` enqueue children only
///   while `d + 1 < max_depth`
/// * `concurrency` - Number of workers draining the shared queue
///
/// # Returns
///
/// The set of topically matching, same-domain URLs discovered before the
/// queue drained or the bound was reached.
pub async fn crawl(
    client: &Client,
    seeds: &[String],
    keywords: &[String],
    max_links: usize,
    max_depth: u32,
    concurrency: usize,
) -> HashSet<String> {
    let mut queue = VecDeque::new();
    for seed in seeds {
        match Url::parse(seed) {
            Ok(url) => queue.push_back((url, 0)),
            Err(e) => tracing::debug!("Skipping unparseable seed {}: {}", seed, e),
        }
    }

    let state = Arc::new(CrawlState {
        queue: Mutex::new(queue),
        visited: Mutex::new(HashSet::new()),
        found: Mutex::new(HashSet::new()),
        in_flight: AtomicUsize::new(0),
    });

    let mut workers = Vec::new();
    for worker_id in 0..concurrency.max(1) {
        let state = Arc::clone(&state);
        let client = client.clone();
        let keywords = keywords.to_vec();
        workers.push(tokio::spawn(async move {
            crawl_worker(worker_id, state, client, keywords, max_links, max_depth).await;
        }));
    }

    for worker in workers {
        let _ = worker.await;
    }

    let found = state.found.lock().expect("crawl found mutex poisoned").clone();
    tracing::info!("Homepage crawl found {} topical links", found.len());
    found
}

async fn crawl_worker(
    worker_id: usize,
    state: Arc<CrawlState>,
    client: Client,
    keywords: Vec<String>,
    max_links: usize,
    max_depth: u32,
) {
    loop {
        if state.found.lock().expect("found mutex poisoned").len() >= max_links {
            return;
        }

        // Pop and mark in-flight under the same lock so idle workers cannot
        // observe an empty queue while a peer is about to refill it.
        let next = {
            let mut queue = state.queue.lock().expect("queue mutex poisoned");
            match queue.pop_front() {
                Some(item) => {
                    state.in_flight.fetch_add(1, Ordering::SeqCst);
                    Some(item)
                }
                None => None,
            }
        };

        match next {
            Some((url, depth)) => {
                process_page(&state, &client, &keywords, url, depth, max_links, max_depth).await;
                state.in_flight.fetch_sub(1, Ordering::SeqCst);
            }
            None => {
                if state.in_flight.load(Ordering::SeqCst) == 0 {
                    tracing::trace!("Crawl worker {} exiting, queue drained", worker_id);
                    return;
                }
                tokio::time::sleep(Duration::from_millis(25)).await;
            }
        }
    }
}

async fn process_page(
    state: &CrawlState,
    client: &Client,
    keywords: &[String],
    url: Url,
    depth: u32,
    max_links: usize,
    max_depth: u32,
) {
    // Exact-URL dedup at pop time
    {
        let mut visited = state.visited.lock().expect("visited mutex poisoned");
        if !visited.insert(url.to_string()) {
            return;
        }
    }

    if !is_fetchable(url.as_str()) {
        return;
    }

    // Any fetch failure is a silent skip; discovery is not correctness-critical
    let body = match fetch_html(client, &url).await {
        Some(body) => body,
        None => return,
    };

    for link in extract_same_domain_links(&body, &url) {
        let link_str = link.to_string();
        if !is_fetchable(&link_str) {
            continue;
        }

        if is_topical(&link_str, keywords) {
            let mut found = state.found.lock().expect("found mutex poisoned");
            if found.len() < max_links {
                found.insert(link_str);
            }
        } else if depth + 1 < max_depth {
            let visited = state.visited.lock().expect("visited mutex poisoned");
            if !visited.contains(&link_str) {
                drop(visited);
                state
                    .queue
                    .lock()
                    .expect("queue mutex poisoned")
                    .push_back((link, depth + 1));
            }
        }
    }
}

async fn fetch_html(client: &Client, url: &Url) -> Option<String> {
    let response = match client.get(url.clone()).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("Crawl fetch failed for {}: {}", url, e);
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!("Crawl fetch for {} returned {}", url, response.status());
        return None;
    }

    match response.text().await {
        Ok(body) => Some(body),
        Err(e) => {
            tracing::debug!("Crawl body read failed for {}: {}", url, e);
            None
        }
    }
}

/// Extracts same-domain anchors, resolved against the page URL
fn extract_same_domain_links(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    let anchor_selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return links,
    };

    let base_domain = extract_domain(base_url);

    for element in document.select(&anchor_selector) {
        let href = match element.value().attr("href") {
            Some(h) => h.trim(),
            None => continue,
        };

        if href.is_empty() || href.starts_with('#') {
            continue;
        }

        if let Ok(absolute) = base_url.join(href) {
            if extract_domain(&absolute) == base_domain {
                links.push(absolute);
            }
        }
    }

    links
}
