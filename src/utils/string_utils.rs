//! UTF-8-safe string truncation utilities
//!
//! Rewritten documents can be arbitrarily large; log messages only ever carry a
//! bounded excerpt of them. Slicing must respect UTF-8 character boundaries so that
//! excerpts of documents full of multi-byte characters never panic.

/// Safely truncate a string to a maximum number of CHARACTERS (not bytes).
///
/// # Arguments
/// * `s` - String slice to truncate
/// * `max_chars` - Maximum number of Unicode characters (not bytes)
///
/// # Returns
/// * String slice containing at most `max_chars` characters, or the full string
///   if it's shorter than `max_chars`
///
/// # Examples
/// ```
/// # use kodegen_tools_zimrewrite::utils::string_utils::safe_truncate_chars;
/// assert_eq!(safe_truncate_chars("p { color: red; }", 1), "p");
/// assert_eq!(safe_truncate_chars("exémple", 3), "exé");
/// assert_eq!(safe_truncate_chars("Hi", 100), "Hi");
/// ```
#[inline]
#[must_use]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}

/// Excerpt of `s` suitable for a log line: truncated and marked when cut.
#[must_use]
pub fn log_excerpt(s: &str, max_chars: usize) -> String {
    let truncated = safe_truncate_chars(s, max_chars);
    if truncated.len() == s.len() {
        truncated.to_string()
    } else {
        format!("{truncated}…")
    }
}
