//! Builder methods available for all states, and the rewriter factories
//!
//! The factories hand the configured settings and fuzzy rule table to each rewriter so
//! callers never have to thread them through by hand.

use super::builder::RewriteConfigBuilder;
use super::types::RewriteConfig;
use crate::css::CssRewriter;
use crate::js::{JsRewriter, ModuleSink};
use crate::url_rewriting::{ArticleUrlRewriter, ArticleUrlRewriterBuilder, HttpUrl};

impl<State> RewriteConfigBuilder<State> {
    /// Make every http(s) reference archive-relative (default), or only the archived ones
    #[must_use]
    pub fn rewrite_all_url(mut self, rewrite_all: bool) -> Self {
        self.rewrite_all_url = rewrite_all;
        self
    }

    #[must_use]
    pub fn remove_css_errors(mut self, remove: bool) -> Self {
        self.remove_css_errors = remove;
        self
    }

    /// Set the archive path of the module declaration script
    ///
    /// Module scripts import the wombat-wrapped globals from this script, which the
    /// archive writer must store at the same path. Validated by `build()`.
    ///
    /// # Example
    /// ```rust
    /// # use kodegen_tools_zimrewrite::config::RewriteConfig;
    /// # fn main() -> anyhow::Result<()> {
    /// let config = RewriteConfig::builder()
    ///     .builtin_fuzzy_rules()
    ///     .module_decl_path("static/module_decl.js")
    ///     .build()?;
    /// assert_eq!(config.module_decl_path().value(), "static/module_decl.js");
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn module_decl_path(mut self, path: impl Into<String>) -> Self {
        self.module_decl_path = path.into();
        self
    }

    #[must_use]
    pub fn notify_dynamic_imports(mut self, notify: bool) -> Self {
        self.notify_dynamic_imports = notify;
        self
    }
}

impl RewriteConfig {
    /// Start an [`ArticleUrlRewriter`] for the document at `article_url`, using this
    /// configuration's fuzzy rules.
    ///
    /// Catalogue and missing-path sink are added on the returned builder.
    pub fn url_rewriter_builder(&self, article_url: HttpUrl) -> ArticleUrlRewriterBuilder<'_> {
        ArticleUrlRewriter::builder(article_url).fuzzy_rules(&self.fuzzy_rules)
    }

    #[must_use]
    pub fn css_rewriter<'a>(
        &self,
        url_rewriter: &'a ArticleUrlRewriter<'a>,
        base_href: Option<&'a str>,
    ) -> CssRewriter<'a> {
        CssRewriter::new(url_rewriter, base_href, self.remove_css_errors)
            .with_rewrite_all_url(self.rewrite_all_url)
    }

    #[must_use]
    pub fn js_rewriter<'a>(
        &self,
        url_rewriter: &'a ArticleUrlRewriter<'a>,
        base_href: Option<&'a str>,
        module_sink: Option<&'a dyn ModuleSink>,
    ) -> JsRewriter<'a> {
        JsRewriter::new(url_rewriter, base_href, module_sink)
            .with_module_decl_path(self.module_decl_path.clone())
            .with_dynamic_import_notification(self.notify_dynamic_imports)
            .with_rewrite_all_url(self.rewrite_all_url)
    }
}
