//! Validated absolute http(s) URL value

use std::fmt;

use url::Url;

use super::errors::{UrlError, UrlResult};
use crate::utils::{split_authority, split_scheme};

/// An absolute `http`/`https` URL as found in (or resolved from) a document.
///
/// The raw string is kept as given; equality and hashing use it directly. Construction
/// rejects non-http(s) schemes, empty hostnames and hostnames carrying upper-case
/// characters (callers are expected to hand over already lower-cased hosts).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HttpUrl {
    value: String,
}

impl HttpUrl {
    /// Validate `value` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns [`UrlError::InvalidUrl`] when the scheme is missing or not http(s), the
    /// hostname is empty or contains upper-case characters, or the URL cannot be parsed.
    pub fn new(value: impl Into<String>) -> UrlResult<Self> {
        let value = value.into();
        Self::check_validity(&value)?;
        Ok(Self { value })
    }

    fn check_validity(value: &str) -> UrlResult<()> {
        let (scheme, rest) = split_scheme(value).unwrap_or(("", value));
        if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
            return Err(UrlError::InvalidUrl(format!(
                "Incorrect HttpUrl scheme in value: {value} {scheme}"
            )));
        }

        let hostname = split_authority(rest).map_or("", |authority| authority.hostname);
        if hostname.is_empty() {
            return Err(UrlError::InvalidUrl(format!(
                "Unsupported empty hostname in value: {value}"
            )));
        }

        if hostname.chars().any(char::is_uppercase) {
            return Err(UrlError::InvalidUrl(format!(
                "Unsupported upper-case chars in hostname : {value}"
            )));
        }

        Url::parse(value)
            .map(|_| ())
            .map_err(|e| UrlError::InvalidUrl(format!("Unparsable URL in value: {value} ({e})")))
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Parsed form, for resolution of relative references.
    pub(crate) fn to_url(&self) -> UrlResult<Url> {
        Url::parse(&self.value).map_err(|source| UrlError::Resolution {
            url: self.value.clone(),
            source,
        })
    }
}

impl fmt::Display for HttpUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HttpUrl({})", self.value)
    }
}

impl TryFrom<&str> for HttpUrl {
    type Error = UrlError;

    fn try_from(value: &str) -> UrlResult<Self> {
        Self::new(value)
    }
}

impl TryFrom<String> for HttpUrl {
    type Error = UrlError;

    fn try_from(value: String) -> UrlResult<Self> {
        Self::new(value)
    }
}

impl AsRef<str> for HttpUrl {
    fn as_ref(&self) -> &str {
        &self.value
    }
}
