pub mod config;
pub mod css;
pub mod js;
pub mod rx_rewriter;
pub mod url_rewriting;
pub mod utils;

pub use config::RewriteConfig;
pub use css::{CssRewriter, FallbackCssRewriter};
pub use js::{JsRewriteOptions, JsRewriter, ModuleSink};
pub use rx_rewriter::{RuleError, RuleMatch, RuleResult, RxRewriter, TransformationRule};
pub use url_rewriting::{
    ArticleUrlRewriter, FuzzyRules, HttpUrl, MissingZimPaths, RewriteResult, UrlError, UrlResult,
    ZimPath, ZimPathSet, normalize,
};
