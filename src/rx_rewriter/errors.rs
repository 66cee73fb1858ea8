//! Error types for the rule engine

use thiserror::Error;

/// Result type alias for rule engine operations
pub type RuleResult<T> = Result<T, RuleError>;

/// Error types for rule table compilation and input decoding
#[derive(Debug, Error)]
pub enum RuleError {
    /// One rule's pattern does not compile
    #[error("Rule #{index} has an invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        index: usize,
        pattern: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },

    /// Every rule compiles alone but not once combined (e.g. duplicate group names)
    #[error("Rules cannot be combined into one pattern: {0}")]
    InvalidCombination(#[source] Box<fancy_regex::Error>),

    /// Byte input is not UTF-8
    #[error("Input is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}
