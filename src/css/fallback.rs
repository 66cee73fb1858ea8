//! Regex rewriting of `url()` for CSS the parser rejects.
//!
//! Much less thorough than the tree walk, but nothing around the URLs is touched, so
//! a stylesheet the parser merely misunderstood keeps every rule.

use crate::rx_rewriter::{RuleMatch, RuleResult, RxRewriter, TransformationRule};
use crate::url_rewriting::ArticleUrlRewriter;

/// `url(` + optional quote + lazily matched URL + same quote + `)` not preceded by `\`
const URL_FUNCTION_PATTERN: &str = r#"url\((?P<quote>['"]?)(?P<url>.+?)\k<quote>(?<!\\)\)"#;

/// Single-rule [`RxRewriter`] rewriting every `url(...)` it can find.
pub struct FallbackCssRewriter<'a> {
    rx: RxRewriter<'a>,
}

impl<'a> FallbackCssRewriter<'a> {
    #[must_use]
    pub fn new(
        url_rewriter: &'a ArticleUrlRewriter<'a>,
        base_href: Option<&'a str>,
        rewrite_all_url: bool,
    ) -> Self {
        let rewrite_url = move |m: &RuleMatch<'_>, _: &()| {
            let quote = m.name("quote").unwrap_or_default();
            let url = m.name("url").unwrap_or_default();
            let rewritten = url_rewriter
                .rewrite(url, base_href, rewrite_all_url)
                .rewriten_url;
            format!("url({quote}{rewritten}{quote})")
        };
        Self {
            rx: RxRewriter::new(vec![TransformationRule::new(
                URL_FUNCTION_PATTERN,
                rewrite_url,
            )]),
        }
    }

    /// # Errors
    ///
    /// Only fails if the built-in pattern does not compile.
    pub fn rewrite(&self, content: &str) -> RuleResult<String> {
        self.rx.rewrite(content, &())
    }
}
