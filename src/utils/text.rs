//! Text Utilities
//!
//! Deterministic truncation and keyword helpers shared by the fact store
//! and the agent context builder.

/// Marker appended when a value is truncated for context assembly
pub const TRUNCATION_MARKER: &str = "…[truncated]";

/// Truncate a string to at most `max_chars` characters, appending a marker
/// when anything was cut. Counts chars, not bytes, so multi-byte text never
/// splits mid-character. Deterministic for identical inputs.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars).collect();
    format!("{}{}", kept, TRUNCATION_MARKER)
}

/// Extract simple keywords from a query string.
///
/// Splits on whitespace and non-alphanumeric characters, lowercases,
/// filters out short tokens (< 3 chars).
pub fn extract_keywords(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|s| s.len() >= 3)
        .map(|s| s.to_string())
        .collect()
}

/// Count how many of `keywords` occur in `text` (already-lowercased check
/// happens here, callers pass raw text).
pub fn keyword_hits(keywords: &[String], text: &str) -> usize {
    let haystack = text.to_lowercase();
    keywords.iter().filter(|k| haystack.contains(k.as_str())).count()
}

/// True when `needle` occurs in `haystack` ignoring case
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
