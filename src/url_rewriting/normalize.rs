//! URL → archive path canonicalization.
//!
//! Entries are stored under their fully decoded path: `<host><path>[?<query>]` with
//! scheme, credentials, port and fragment dropped. The path must not stay
//! percent-encoded or readers could not look the entry up, so:
//!
//! - punycode host labels are decoded back to Unicode
//! - path and query are percent-decoded (invalid escapes are kept literally)
//! - in the query, `+` means a space; a literal plus only survives as `%2B`
//! - an empty path becomes `/` so `http://a.com` and `http://a.com/` share an entry
//! - an empty query is dropped entirely, not even a trailing `?` is kept
//!
//! The fuzzy rule table is applied last, on the assembled value.

use url::Url;

use super::errors::{UrlError, UrlResult};
use super::fuzzy::FuzzyRules;
use super::http_url::HttpUrl;
use super::zim_path::ZimPath;
use crate::utils::{collapse_slashes, percent_decode_lossy};

/// Normalize `url` into an archive path using the built-in fuzzy rules.
///
/// # Errors
///
/// Returns [`UrlError`] when the URL cannot be parsed or the result is not a valid path.
///
/// # Examples
/// ```
/// # use kodegen_tools_zimrewrite::url_rewriting::{normalize, HttpUrl};
/// let url = HttpUrl::new("https://user:pw@example.com:8080/a%20b?x=1+2#top").unwrap();
/// assert_eq!(normalize(&url).unwrap().value(), "example.com/a b?x=1 2");
/// ```
pub fn normalize(url: &HttpUrl) -> UrlResult<ZimPath> {
    normalize_with(url, FuzzyRules::builtin())
}

/// Normalize `url` into an archive path using a caller-supplied fuzzy rule table.
///
/// # Errors
///
/// Returns [`UrlError`] when the URL cannot be parsed or the result is not a valid path.
pub fn normalize_with(url: &HttpUrl, fuzzy_rules: &FuzzyRules) -> UrlResult<ZimPath> {
    let parsed = url.to_url()?;

    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| UrlError::InvalidUrl(format!("Hostname is missing: {}", url.value())))?;
    let hostname = decode_hostname(host);

    let path = match parsed.path() {
        "" => "/".to_string(),
        raw => percent_decode_lossy(raw),
    };

    let query = match parsed.query() {
        Some(raw) if !raw.is_empty() => format!("?{}", percent_decode_lossy(&raw.replace('+', " "))),
        _ => String::new(),
    };

    let candidate = format!(
        "{hostname}{}{}",
        collapse_slashes(&path),
        collapse_slashes(&query)
    );

    ZimPath::new(fuzzy_rules.apply(&candidate).into_owned())
}

/// Decode punycode labels; the host is returned untouched when decoding fails.
fn decode_hostname(host: &str) -> String {
    if !host.split('.').any(|label| label.starts_with("xn--")) {
        return host.to_string();
    }
    match idna::domain_to_unicode(host) {
        (decoded, Ok(())) => decoded,
        (_, Err(e)) => {
            log::debug!("Keeping undecodable punycode host {host}: {e:?}");
            host.to_string()
        }
    }
}

/// Parse and resolve `reference` against `base`, keeping the failing text in the error.
pub(crate) fn join_url(base: &Url, reference: &str) -> UrlResult<Url> {
    base.join(reference).map_err(|source| UrlError::Resolution {
        url: reference.to_string(),
        source,
    })
}
