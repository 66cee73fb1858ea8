//! Script rewriting entry point.

use regex::Captures;

use super::module_sink::ModuleSink;
use super::rules::{
    GLOBAL_OVERRIDES, GLOBALS_RX, IMPORT_EXPORT_HTTP_RX, IMPORT_EXPORT_MATCH_PATTERN,
    WRAP_PREFIX, WRAP_SUFFIX, create_js_rules,
};
use crate::rx_rewriter::{RuleResult, RxRewriter, TransformationRule};
use crate::url_rewriting::{ArticleUrlRewriter, ZimPath};
use crate::utils::{MAX_LOGGED_CONTENT_CHARS, MODULE_DECL_PATH, log_excerpt};

/// How a script is loaded by its document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsRewriteOptions {
    /// `<script type="module">` or a script imported by one
    pub is_module: bool,
    /// Script inlined in an HTML attribute; newlines are folded into spaces
    pub inline: bool,
}

impl JsRewriteOptions {
    pub const CLASSIC: Self = Self {
        is_module: false,
        inline: false,
    };

    pub const MODULE: Self = Self {
        is_module: true,
        inline: false,
    };

    pub const INLINE: Self = Self {
        is_module: false,
        inline: true,
    };
}

/// Rewrites scripts so they run against the wombat runtime instead of the live page.
///
/// Classic scripts using any protected global are wrapped in a block shadowing those
/// globals. Module scripts cannot be wrapped (imports must stay top-level), so they
/// import the shadowed globals from the module declaration script instead, and their
/// static imports are rewritten to archive-relative specifiers.
pub struct JsRewriter<'a> {
    url_rewriter: &'a ArticleUrlRewriter<'a>,
    base_href: Option<&'a str>,
    module_sink: Option<&'a dyn ModuleSink>,
    module_decl_path: ZimPath,
    notify_dynamic_imports: bool,
    rewrite_all_url: bool,
}

impl std::fmt::Debug for JsRewriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsRewriter")
            .field("article_url", self.url_rewriter.article_url())
            .field("base_href", &self.base_href)
            .field("has_module_sink", &self.module_sink.is_some())
            .field("module_decl_path", &self.module_decl_path)
            .field("notify_dynamic_imports", &self.notify_dynamic_imports)
            .field("rewrite_all_url", &self.rewrite_all_url)
            .finish()
    }
}

impl<'a> JsRewriter<'a> {
    /// # Arguments
    /// * `url_rewriter` - Rewriter of the document the script belongs to
    /// * `base_href` - `<base href>` of the enclosing HTML document, if any
    /// * `module_sink` - Receives the archive path of every module the script imports
    #[must_use]
    pub fn new(
        url_rewriter: &'a ArticleUrlRewriter<'a>,
        base_href: Option<&'a str>,
        module_sink: Option<&'a dyn ModuleSink>,
    ) -> Self {
        Self {
            url_rewriter,
            base_href,
            module_sink,
            module_decl_path: ZimPath::from_static(MODULE_DECL_PATH),
            notify_dynamic_imports: true,
            rewrite_all_url: true,
        }
    }

    /// Archive path of the script exporting the shadowed globals to modules
    #[must_use]
    pub fn with_module_decl_path(mut self, path: ZimPath) -> Self {
        self.module_decl_path = path;
        self
    }

    /// Also report modules loaded with `import("<literal>")`
    #[must_use]
    pub fn with_dynamic_import_notification(mut self, enabled: bool) -> Self {
        self.notify_dynamic_imports = enabled;
        self
    }

    /// Only rewrite import specifiers whose target is known to the archive when `false`
    #[must_use]
    pub fn with_rewrite_all_url(mut self, rewrite_all_url: bool) -> Self {
        self.rewrite_all_url = rewrite_all_url;
        self
    }

    /// Rewrite a script.
    ///
    /// Never fails: should the rule table be unusable, the script is returned as-is.
    #[must_use]
    pub fn rewrite(&self, text: &str, opts: JsRewriteOptions) -> String {
        self.try_rewrite(text, opts).unwrap_or_else(|e| {
            log::error!(
                "JS rewriting failed ({e}), script kept as-is. Article URL is {}, content is `{}`",
                self.url_rewriter.article_url().value(),
                log_excerpt(text, MAX_LOGGED_CONTENT_CHARS)
            );
            text.to_string()
        })
    }

    /// Rewrite a UTF-8 encoded script.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidUtf8`](crate::rx_rewriter::RuleError::InvalidUtf8) when
    /// the bytes are not UTF-8.
    pub fn rewrite_bytes(&self, bytes: &[u8], opts: JsRewriteOptions) -> RuleResult<String> {
        Ok(self.rewrite(std::str::from_utf8(bytes)?, opts))
    }

    /// Rewrite a script, surfacing rule table errors.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`](crate::rx_rewriter::RuleError) when a rule does not compile.
    pub fn try_rewrite(&self, text: &str, opts: JsRewriteOptions) -> RuleResult<String> {
        let mut rules = create_js_rules(|specifier| self.notify_dynamic_import(specifier));
        if opts.is_module {
            rules.push(self.esm_import_rule());
        }

        let rewritten = RxRewriter::new(rules).rewrite(text, &opts)?;

        if opts.is_module {
            return Ok(self.module_decl() + &rewritten);
        }

        // Decided on the original text: rewriting adds `self` references
        let mut rewritten = if GLOBALS_RX.is_match(text) {
            format!("{}{rewritten}{WRAP_SUFFIX}", *WRAP_PREFIX)
        } else {
            rewritten
        };

        if opts.inline {
            rewritten = rewritten.replace('\n', " ");
        }
        Ok(rewritten)
    }

    /// `import { <globals> } from "<module decl>";` line opening module scripts
    fn module_decl(&self) -> String {
        format!(
            "import {{ {} }} from \"{}\";\n",
            GLOBAL_OVERRIDES.join(", "),
            self.url_rewriter.get_document_uri(&self.module_decl_path, "")
        )
    }

    /// Static `import`/`export ... from` specifiers of module scripts
    fn esm_import_rule(&self) -> TransformationRule<'_, JsRewriteOptions> {
        TransformationRule::new(IMPORT_EXPORT_MATCH_PATTERN, move |m, _| {
            IMPORT_EXPORT_HTTP_RX
                .replace_all(m.as_str(), |caps: &Captures<'_>| {
                    let specifier = &caps[2];
                    self.notify_module(specifier);
                    format!(
                        "{}{}{}",
                        &caps[1],
                        self.rewrite_import_url(specifier),
                        &caps[3]
                    )
                })
                .into_owned()
        })
    }

    /// Module specifiers must be relative (`./x.js`), a bare `x.js` is a package name.
    fn rewrite_import_url(&self, url: &str) -> String {
        let url = self
            .url_rewriter
            .rewrite(url, self.base_href, self.rewrite_all_url)
            .rewriten_url;
        let kept_absolute = url.starts_with("http://") || url.starts_with("https://");
        if kept_absolute
            || url.starts_with('/')
            || url.starts_with("./")
            || url.starts_with("../")
        {
            url
        } else {
            format!("./{url}")
        }
    }

    fn notify_dynamic_import(&self, specifier: &str) {
        if self.notify_dynamic_imports {
            self.notify_module(specifier);
        }
    }

    fn notify_module(&self, specifier: &str) {
        let Some(sink) = self.module_sink else {
            return;
        };
        match self.url_rewriter.get_item_path(specifier, self.base_href) {
            Ok(path) => sink.notify(path),
            Err(e) => log::debug!(
                "Module {specifier} imported from {} not notified: {e}",
                self.url_rewriter.article_url().value()
            ),
        }
    }
}
