//! Rich-content text helpers: tag stripping, read-time estimation,
//! excerpt derivation.

use std::sync::LazyLock;

use regex::Regex;

/// Reading rate used for read-time estimation.
const WORDS_PER_MINUTE: usize = 200;

/// Excerpt length in characters, before the ellipsis marker.
const EXCERPT_LEN: usize = 160;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Strip all markup tags from an HTML fragment.
#[must_use]
pub fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, "").into_owned()
}

/// Estimate the reading time of rich content, in whole minutes.
///
/// Strips markup, counts whitespace-delimited words, divides by 200 words
/// per minute rounding up, and floors the result at 1. Pure and
/// deterministic: re-estimating unchanged content always yields the same
/// value.
#[must_use]
pub fn estimate_read_time(html: &str) -> u32 {
    let text = strip_tags(html);
    let words = text.split_whitespace().count();
    (words.div_ceil(WORDS_PER_MINUTE).max(1)) as u32
}

/// Derive an excerpt from rich content.
///
/// Strips markup and truncates to 160 characters (on a character boundary)
/// plus an ellipsis marker.
#[must_use]
pub fn derive_excerpt(html: &str) -> String {
    let text = strip_tags(html);
    let truncated: String = text.chars().take(EXCERPT_LEN).collect();
    format!("{truncated}...")
}
