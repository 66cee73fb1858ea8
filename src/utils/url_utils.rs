//! URL component helpers.
//!
//! This module provides the small, allocation-light URL splitting and encoding
//! primitives shared by the value types and the article rewriter. Splitting is
//! deliberately lenient: it never fails, it only reports which components are present.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static SUBSEQUENT_SLASHES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"//+").expect("SUBSEQUENT_SLASHES: hardcoded regex is valid")
});

/// Components of a `//`-introduced authority section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authority<'a> {
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
    /// Host without brackets or port, possibly empty
    pub hostname: &'a str,
}

/// Split a leading `scheme:` off a URL-ish string.
///
/// A scheme is an ASCII letter followed by letters, digits, `+`, `-` or `.`,
/// terminated by the first `:`. Returns the scheme (as written) and the remainder.
///
/// # Examples
/// ```
/// # use kodegen_tools_zimrewrite::utils::url_utils::split_scheme;
/// assert_eq!(split_scheme("mailto:bob@acme.com"), Some(("mailto", "bob@acme.com")));
/// assert_eq!(split_scheme("foo.html?a=b:c"), None);
/// assert_eq!(split_scheme("_zim_static/x.js"), None);
/// ```
#[must_use]
pub fn split_scheme(value: &str) -> Option<(&str, &str)> {
    let colon = value.find(':')?;
    let candidate = &value[..colon];
    let mut chars = candidate.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        Some((candidate, &value[colon + 1..]))
    } else {
        None
    }
}

/// Extract the authority of a scheme-less remainder starting with `//`.
#[must_use]
pub fn split_authority(rest: &str) -> Option<Authority<'_>> {
    let after = rest.strip_prefix("//")?;
    let end = after.find(['/', '?', '#']).unwrap_or(after.len());
    let netloc = &after[..end];

    let (userinfo, hostinfo) = match netloc.rfind('@') {
        Some(at) => (Some(&netloc[..at]), &netloc[at + 1..]),
        None => (None, netloc),
    };

    let (username, password) = match userinfo {
        Some(info) => match info.split_once(':') {
            Some((user, pass)) => (Some(user), Some(pass)),
            None => (Some(info), None),
        },
        None => (None, None),
    };

    let hostname = if let Some(bracketed) = hostinfo.strip_prefix('[') {
        bracketed.split(']').next().unwrap_or_default()
    } else {
        hostinfo.split(':').next().unwrap_or_default()
    };

    Some(Authority {
        username,
        password,
        hostname,
    })
}

/// Percent-decode a string; invalid escapes are kept, invalid UTF-8 is replaced.
#[must_use]
pub fn percent_decode_lossy(value: &str) -> String {
    let decoded = urlencoding::decode_binary(value.as_bytes());
    String::from_utf8_lossy(&decoded).into_owned()
}

/// Replace every run of two or more `/` by a single one.
#[must_use]
pub fn collapse_slashes(value: &str) -> Cow<'_, str> {
    SUBSEQUENT_SLASHES.replace_all(value, "/")
}

/// Percent-encode a relative path, keeping `/` separators.
///
/// Every byte except ASCII alphanumerics, `-`, `_`, `.`, `~` and the separators is
/// encoded, so `?`, `#`, `+`, `%` and spaces always end up escaped.
#[must_use]
pub fn quote_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_authority_components() {
        let auth = split_authority("//user:pass@Example.com:8080/path").expect("authority");
        assert_eq!(auth.username, Some("user"));
        assert_eq!(auth.password, Some("pass"));
        assert_eq!(auth.hostname, "Example.com");

        let auth = split_authority("//[::1]:80/").expect("authority");
        assert_eq!(auth.hostname, "::1");

        let auth = split_authority("//:pass@/content").expect("authority");
        assert_eq!(auth.username, Some(""));
        assert_eq!(auth.password, Some("pass"));
        assert_eq!(auth.hostname, "");

        assert!(split_authority("/content/index.html").is_none());
    }

    #[test]
    fn test_percent_decode_keeps_invalid_escapes() {
        assert_eq!(percent_decode_lossy("fo%o.html"), "fo%o.html");
        assert_eq!(percent_decode_lossy("fo%C3%A9"), "foé");
        assert_eq!(percent_decode_lossy("a%2Bb"), "a+b");
    }

    #[test]
    fn test_quote_path() {
        assert_eq!(quote_path("fo o/ba?r=1"), "fo%20o/ba%3Fr%3D1");
        assert_eq!(quote_path("../foé.html"), "../fo%C3%A9.html");
        assert_eq!(quote_path("fo~o-_.x"), "fo~o-_.x");
    }

    #[test]
    fn test_collapse_slashes() {
        assert_eq!(collapse_slashes("/a//b///c"), "/a/b/c");
        assert_eq!(collapse_slashes("/a/b"), "/a/b");
    }
}
