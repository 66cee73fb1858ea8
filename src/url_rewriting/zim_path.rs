//! Archive-internal path value

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{UrlError, UrlResult};
use crate::utils::{split_authority, split_scheme};

/// Path of an entry inside the archive: `<host><path>[?<query>]`, fully decoded.
///
/// Scheme, credentials, port and fragment never appear in a `ZimPath`. Two distinct
/// source URLs may normalize to the same path; they then share one archive entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZimPath {
    value: String,
}

impl ZimPath {
    /// Validate `value` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns [`UrlError::InvalidPath`] when the value carries a scheme, a `//`
    /// authority with a hostname, a username or a password.
    pub fn new(value: impl Into<String>) -> UrlResult<Self> {
        let value = value.into();
        Self::check_validity(&value)?;
        Ok(Self { value })
    }

    /// Wrap a path literal of this crate, such as [`MODULE_DECL_PATH`](crate::utils::MODULE_DECL_PATH).
    pub(crate) fn from_static(value: &'static str) -> Self {
        debug_assert!(Self::check_validity(value).is_ok(), "invalid path literal {value}");
        Self {
            value: value.to_string(),
        }
    }

    fn check_validity(value: &str) -> UrlResult<()> {
        if let Some((scheme, _)) = split_scheme(value) {
            return Err(UrlError::InvalidPath(format!(
                "Unexpected scheme in value: {value} {}",
                scheme.to_ascii_lowercase()
            )));
        }

        let Some(authority) = split_authority(value) else {
            return Ok(());
        };

        if !authority.hostname.is_empty() {
            return Err(UrlError::InvalidPath(format!(
                "Unexpected hostname in value: {value} {}",
                authority.hostname.to_lowercase()
            )));
        }
        if let Some(username) = authority.username.filter(|u| !u.is_empty()) {
            return Err(UrlError::InvalidPath(format!(
                "Unexpected username in value: {value} {username}"
            )));
        }
        if let Some(password) = authority.password.filter(|p| !p.is_empty()) {
            return Err(UrlError::InvalidPath(format!(
                "Unexpected password in value: {value} {password}"
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.value
    }
}

impl fmt::Display for ZimPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZimPath({})", self.value)
    }
}

impl TryFrom<&str> for ZimPath {
    type Error = UrlError;

    fn try_from(value: &str) -> UrlResult<Self> {
        Self::new(value)
    }
}

impl TryFrom<String> for ZimPath {
    type Error = UrlError;

    fn try_from(value: String) -> UrlResult<Self> {
        Self::new(value)
    }
}

impl From<ZimPath> for String {
    fn from(path: ZimPath) -> Self {
        path.value
    }
}

impl AsRef<str> for ZimPath {
    fn as_ref(&self) -> &str {
        &self.value
    }
}
