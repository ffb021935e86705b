//! Utility functions for string handling in requests, logs, and rendering.
//!
//! This module provides helper functions used throughout the application:
//! - Percent-encoding of the search query component
//! - String truncation for logging
//! - JSON error detection for truncated response bodies
//! - Markup stripping for article descriptions

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Percent-encode a value for use as a single query-string component.
///
/// Only `A-Z a-z 0-9 - _ . ~` are left as is; a space becomes `%20`, not `+`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(encode_component("New Zealand"), "New%20Zealand");
/// ```
pub fn encode_component(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes (backed off to a character
/// boundary) with an ellipsis and byte count indicator appended.
///
/// # Arguments
///
/// * `s` - The string to potentially truncate
/// * `max` - Maximum number of bytes to keep
///
/// # Returns
///
/// The original string if shorter than `max`, otherwise a truncated version
/// with `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// A body cut off mid-transfer fails to parse with an EOF error rather than a
/// syntax error, which is worth distinguishing in logs.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Reduce an HTML fragment to a single line of plain text.
///
/// Strips tags, decodes the handful of entities news APIs commonly leave in
/// descriptions, and collapses runs of whitespace.
pub fn plain_text(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, " ");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    SPACE_RE.replace_all(decoded.trim(), " ").into_owned()
}

/// Shorten `s` to at most `width` characters, ending with `…` when cut.
pub fn ellipsize(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = s.chars().take(width - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_component() {
        assert_eq!(encode_component("Japan"), "Japan");
        assert_eq!(encode_component("New Zealand"), "New%20Zealand");
        assert_eq!(encode_component("a&b=c"), "a%26b%3Dc");
        assert_eq!(encode_component("Côte d'Ivoire"), "C%C3%B4te%20d%27Ivoire");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let s = "ééééé";
        let result = truncate_for_log(s, 3);
        assert!(result.starts_with('é'));
        assert!(result.contains("…(+8 bytes)"));
    }

    #[test]
    fn test_looks_truncated() {
        let json_eof = r#"{"field": "value"#;
        let err = serde_json::from_str::<serde_json::Value>(json_eof).unwrap_err();
        assert!(looks_truncated(&err));

        let json_bad = r#"{"field": nope}"#;
        let err = serde_json::from_str::<serde_json::Value>(json_bad).unwrap_err();
        assert!(!looks_truncated(&err));
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(plain_text("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(plain_text("Tom &amp; Jerry\n\n  again"), "Tom & Jerry again");
        assert_eq!(plain_text("plain"), "plain");
    }

    #[test]
    fn test_ellipsize() {
        assert_eq!(ellipsize("short", 10), "short");
        assert_eq!(ellipsize("abcdefghij", 5), "abcd…");
        assert_eq!(ellipsize("abc", 0), "");
    }
}
