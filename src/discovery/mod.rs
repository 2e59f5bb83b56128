//! Article discovery
//!
//! Two independent sources feed the pipeline:
//! - a topical homepage crawler that walks outlet front pages
//! - a windowed search-API client driving a fresh-poll loop and a
//!   historical backfill loop
//!
//! Both hand bare URLs to the ingest coordinator, which owns all
//! dedup and enrichment from that point on.

pub mod crawler;
pub mod search;

pub use crawler::crawl;
pub use search::{backfill_loop, poll_loop, PageOutcome, SearchClient, SearchItem};
