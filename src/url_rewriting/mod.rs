//! URL and archive path handling.
//!
//! - [`HttpUrl`] / [`ZimPath`]: validated value types
//! - [`normalize`]: URL → archive path canonicalization (with fuzzy rules)
//! - [`ArticleUrlRewriter`]: document-relative rewriting of references

pub mod article;
pub mod catalogue;
pub mod errors;
pub mod fuzzy;
pub mod http_url;
pub mod normalize;
pub mod zim_path;

pub use article::{ArticleUrlRewriter, ArticleUrlRewriterBuilder, RewriteResult};
pub use catalogue::{MissingZimPaths, ZimPathSet};
pub use errors::{UrlError, UrlResult};
pub use fuzzy::{FuzzyRule, FuzzyRuleError, FuzzyRuleResult, FuzzyRuleSpec, FuzzyRuleTest, FuzzyRules};
pub use http_url::HttpUrl;
pub use normalize::{normalize, normalize_with};
pub use zim_path::ZimPath;
