//! Plain-text and title extraction from HTML
//!
//! Strips script/style/markup down to readable text and derives a title
//! through a fixed fallback chain:
//! 1. The document `<title>`
//! 2. A 10-120 character text span ending in terminal punctuation
//! 3. The first ~10 words of the content
//! 4. The literal "Untitled"

use scraper::{ElementRef, Html, Selector};

/// Elements whose text content is never article prose
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "head", "iframe",
];

/// Converts an HTML document to collapsed plain text
///
/// Walks the DOM collecting text nodes, skipping script/style and other
/// non-prose elements, then collapses all whitespace runs to single spaces.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::new();
    collect_text(document.root_element(), &mut out);
    collapse_whitespace(&out)
}

fn collect_text(element: ElementRef, out: &mut String) {
    for node in element.children() {
        if let Some(child) = ElementRef::wrap(node) {
            if SKIPPED_ELEMENTS.contains(&child.value().name()) {
                continue;
            }
            collect_text(child, out);
            out.push(' ');
        } else if let Some(text) = node.value().as_text() {
            out.push_str(text);
            out.push(' ');
        }
    }
}

/// Extracts the `<title>` element's text, if present and non-empty
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Derives a title from an optional document title and the page text
///
/// Applies the full fallback chain; the result is never empty.
pub fn derive_title(document_title: Option<String>, content: &str) -> String {
    if let Some(title) = document_title {
        let trimmed = title.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    if let Some(span) = sentence_like_span(content) {
        return span;
    }

    let prefix = first_words(content, 10);
    if !prefix.is_empty() {
        return prefix;
    }

    "Untitled".to_string()
}

/// Finds the first 10-120 character span ending in terminal punctuation
fn sentence_like_span(content: &str) -> Option<String> {
    let mut start = 0usize;
    for (idx, ch) in content.char_indices() {
        if matches!(ch, '.' | '!' | '?') {
            let end = idx + ch.len_utf8();
            let candidate = content[start..end].trim();
            let len = candidate.chars().count();
            if (10..=120).contains(&len) {
                return Some(candidate.to_string());
            }
            start = end;
        }
    }
    None
}

/// Joins the first `n` whitespace-separated words of the content
fn first_words(content: &str, n: usize) -> String {
    content
        .split_whitespace()
        .take(n)
        .collect::<Vec<_>>()
        .join(" ")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
