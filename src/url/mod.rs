//! URL handling module for Polwatch
//!
//! Provides domain extraction, fetchability filtering (scheme, fragments,
//! static assets), and the topical keyword match shared by the homepage
//! crawler and the ingest coordinator's exclusion gate.

mod domain;

pub use domain::extract_domain;

use url::Url;

/// File extensions that mark a URL as a static asset rather than an article
const ASSET_EXTENSIONS: &[&str] = &[
    ".css", ".js", ".json", ".xml", ".rss", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico",
    ".webp", ".avif", ".woff", ".woff2", ".ttf", ".otf", ".mp3", ".mp4", ".webm", ".zip", ".gz",
    ".pdf",
];

/// Checks whether a URL is worth fetching at all
///
/// Rejects non-http(s) schemes, fragment-only links, and static assets.
/// These never hold article text, so both discovery and ingestion drop them
/// before any network activity.
pub fn is_fetchable(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return false;
    }

    let url = match Url::parse(trimmed) {
        Ok(u) => u,
        Err(_) => return false,
    };

    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }

    if url.host_str().is_none() {
        return false;
    }

    let path = url.path().to_lowercase();
    !ASSET_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Checks whether a URL looks topically relevant
///
/// Case-insensitive substring match of any configured keyword against the
/// full URL. Homepage sections and article slugs both carry their topic in
/// the path, so this cheap check filters most off-topic links without
/// fetching them.
pub fn is_topical(raw: &str, keywords: &[String]) -> bool {
    let lowered = raw.to_lowercase();
    keywords.iter().any(|k| lowered.contains(&k.to_lowercase()))
}
