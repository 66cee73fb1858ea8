//! Article-relative URL rewriting.
//!
//! Every reference found in a document (HTML attribute, CSS `url()`, JS import) is
//! resolved against the document URL, normalized into an archive path and, when that
//! path is known to be archived, replaced by a path relative to the document's own
//! archive path. Unknown targets keep pointing at the live web.

use url::Url;

use super::catalogue::{MissingZimPaths, ZimPathSet};
use super::errors::UrlResult;
use super::fuzzy::FuzzyRules;
use super::http_url::HttpUrl;
use super::normalize::{join_url, normalize_with};
use super::zim_path::ZimPath;
use crate::utils::{quote_path, split_scheme};

/// Outcome of rewriting one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteResult {
    /// Reference resolved against the document URL and base href
    pub absolute_url: String,
    /// Value to substitute back into the document
    pub rewriten_url: String,
    /// Archive path of the target; `None` for fragments and non-http(s) schemes
    pub zim_path: Option<ZimPath>,
}

impl RewriteResult {
    fn unchanged(absolute_url: String, item_url: &str) -> Self {
        Self {
            absolute_url,
            rewriten_url: item_url.to_string(),
            zim_path: None,
        }
    }
}

/// Rewrites the references found in one document.
///
/// Cheap to build: it only borrows the catalogue and the fuzzy rules, so one instance
/// per document (or per worker) is the intended usage.
pub struct ArticleUrlRewriter<'a> {
    article_url: HttpUrl,
    article_path: ZimPath,
    existing_zim_paths: Option<&'a dyn ZimPathSet>,
    missing_zim_paths: Option<&'a dyn MissingZimPaths>,
    fuzzy_rules: &'a FuzzyRules,
}

impl std::fmt::Debug for ArticleUrlRewriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArticleUrlRewriter")
            .field("article_url", &self.article_url)
            .field("article_path", &self.article_path)
            .field("has_existing_zim_paths", &self.existing_zim_paths.is_some())
            .field("has_missing_zim_paths", &self.missing_zim_paths.is_some())
            .field("fuzzy_rules", &self.fuzzy_rules.len())
            .finish()
    }
}

/// Builder for [`ArticleUrlRewriter`].
#[must_use]
pub struct ArticleUrlRewriterBuilder<'a> {
    article_url: HttpUrl,
    article_path: Option<ZimPath>,
    existing_zim_paths: Option<&'a dyn ZimPathSet>,
    missing_zim_paths: Option<&'a dyn MissingZimPaths>,
    fuzzy_rules: &'a FuzzyRules,
}

impl<'a> ArticleUrlRewriterBuilder<'a> {
    /// Use this path for the document instead of normalizing its URL
    pub fn article_path(mut self, path: ZimPath) -> Self {
        self.article_path = Some(path);
        self
    }

    /// Paths known to be present in the archive
    pub fn existing_zim_paths(mut self, paths: &'a dyn ZimPathSet) -> Self {
        self.existing_zim_paths = Some(paths);
        self
    }

    /// Sink receiving paths referenced but not present in the archive
    pub fn missing_zim_paths(mut self, sink: &'a dyn MissingZimPaths) -> Self {
        self.missing_zim_paths = Some(sink);
        self
    }

    /// Fuzzy rule table used during normalization (built-in table by default)
    pub fn fuzzy_rules(mut self, rules: &'a FuzzyRules) -> Self {
        self.fuzzy_rules = rules;
        self
    }

    /// Build the rewriter, normalizing the article URL unless a path was supplied.
    ///
    /// # Errors
    ///
    /// Returns [`UrlError`](super::errors::UrlError) when the article URL cannot be normalized.
    pub fn build(self) -> UrlResult<ArticleUrlRewriter<'a>> {
        let article_path = match self.article_path {
            Some(path) => path,
            None => normalize_with(&self.article_url, self.fuzzy_rules)?,
        };
        Ok(ArticleUrlRewriter {
            article_url: self.article_url,
            article_path,
            existing_zim_paths: self.existing_zim_paths,
            missing_zim_paths: self.missing_zim_paths,
            fuzzy_rules: self.fuzzy_rules,
        })
    }
}

impl<'a> ArticleUrlRewriter<'a> {
    /// Start building a rewriter for the document located at `article_url`.
    pub fn builder(article_url: HttpUrl) -> ArticleUrlRewriterBuilder<'a> {
        ArticleUrlRewriterBuilder {
            article_url,
            article_path: None,
            existing_zim_paths: None,
            missing_zim_paths: None,
            fuzzy_rules: FuzzyRules::builtin(),
        }
    }

    /// Rewriter with no catalogue, the built-in fuzzy rules and the normalized article path.
    ///
    /// # Errors
    ///
    /// Returns [`UrlError`](super::errors::UrlError) when the article URL cannot be normalized.
    pub fn new(article_url: HttpUrl) -> UrlResult<Self> {
        Self::builder(article_url).build()
    }

    #[must_use]
    pub fn article_url(&self) -> &HttpUrl {
        &self.article_url
    }

    #[must_use]
    pub fn article_path(&self) -> &ZimPath {
        &self.article_path
    }

    #[must_use]
    pub fn fuzzy_rules(&self) -> &'a FuzzyRules {
        self.fuzzy_rules
    }

    /// Resolve `item_url` against the article URL and `base_href`.
    fn resolve(&self, item_url: &str, base_href: Option<&str>) -> UrlResult<Url> {
        let article = self.article_url.to_url()?;
        let base = match base_href {
            Some(href) => join_url(&article, href)?,
            None => article,
        };
        join_url(&base, item_url)
    }

    /// Archive path `item_url` resolves to, without any rewriting decision.
    ///
    /// # Errors
    ///
    /// Returns [`UrlError`](super::errors::UrlError) when the reference cannot be resolved to an http(s) URL.
    pub fn get_item_path(&self, item_url: &str, base_href: Option<&str>) -> UrlResult<ZimPath> {
        let absolute = self.resolve(item_url, base_href)?;
        normalize_with(&HttpUrl::new(absolute.as_str())?, self.fuzzy_rules)
    }

    /// Rewrite one reference, falling back to the untouched reference on failure.
    ///
    /// This is the entry point used by the document rewriters: a malformed URL in a
    /// document must never abort the rewrite of the whole document.
    pub fn rewrite(
        &self,
        item_url: &str,
        base_href: Option<&str>,
        rewrite_all_url: bool,
    ) -> RewriteResult {
        match self.try_rewrite(item_url, base_href, rewrite_all_url) {
            Ok(result) => result,
            Err(e) => {
                log::debug!(
                    "Invalid URL value found in {}, kept as-is (item_url: {item_url}, base_href: {base_href:?}, rewrite_all_url: {rewrite_all_url}): {e}",
                    self.article_url.value()
                );
                let item_url = item_url.trim();
                RewriteResult::unchanged(item_url.to_string(), item_url)
            }
        }
    }

    /// Rewrite one reference.
    ///
    /// # Arguments
    /// * `item_url` - Reference as found in the document (surrounding whitespace ignored)
    /// * `base_href` - Optional `<base href>` of the document
    /// * `rewrite_all_url` - Make every http(s) target relative, known or not
    ///
    /// # Returns
    /// Fragments and non-http(s) references come back untouched. Known targets (or
    /// all of them in rewrite-all mode) become document-relative; the others keep
    /// their absolute URL and are reported to the missing-paths sink.
    ///
    /// References are resolved with WHATWG URL rules, so a `\` in the path of an
    /// http(s) reference separates segments like `/`. Fragments are kept as written.
    ///
    /// # Errors
    ///
    /// Returns [`UrlError`](super::errors::UrlError) when the reference cannot be resolved to a valid http(s) URL.
    pub fn try_rewrite(
        &self,
        item_url: &str,
        base_href: Option<&str>,
        rewrite_all_url: bool,
    ) -> UrlResult<RewriteResult> {
        let item_url = item_url.trim();

        let absolute = self.resolve(item_url, base_href)?;

        if item_url.starts_with('#') {
            return Ok(RewriteResult::unchanged(absolute.into(), item_url));
        }

        if let Some((scheme, _)) = split_scheme(item_url)
            && !scheme.eq_ignore_ascii_case("http")
            && !scheme.eq_ignore_ascii_case("https")
        {
            return Ok(RewriteResult::unchanged(absolute.into(), item_url));
        }

        // As written in the document, not in the url crate's percent-encoded form
        let fragment = item_url
            .split_once('#')
            .map_or_else(|| absolute.fragment().unwrap_or_default(), |(_, f)| f)
            .to_string();
        let item_path = normalize_with(&HttpUrl::new(absolute.as_str())?, self.fuzzy_rules)?;

        let known = self
            .existing_zim_paths
            .is_some_and(|paths| paths.contains_path(&item_path));

        if rewrite_all_url || known {
            return Ok(RewriteResult {
                absolute_url: absolute.into(),
                rewriten_url: self.get_document_uri(&item_path, &fragment),
                zim_path: Some(item_path),
            });
        }

        if let Some(sink) = self.missing_zim_paths
            && sink.record(item_path.clone())
        {
            log::debug!("{} ({item_url}) not in archive", item_path.value());
        }

        let absolute_url: String = absolute.into();
        Ok(RewriteResult {
            rewriten_url: absolute_url.clone(),
            absolute_url,
            zim_path: Some(item_path),
        })
    }

    /// URI to use inside the current document to address `item_path`.
    ///
    /// The path is made relative to the directory of the article path (the article
    /// path itself when it ends with `/`), climbing with `..` where needed but never
    /// above the archive root. Everything except `/` separators and unreserved
    /// characters is percent-encoded, so a query string becomes part of the path.
    #[must_use]
    pub fn get_document_uri(&self, item_path: &ZimPath, fragment: &str) -> String {
        let article = self.article_path.value();
        let base_dir = if article.ends_with('/') {
            article
        } else {
            article.rsplit_once('/').map_or("", |(parent, _)| parent)
        };

        let base: Vec<&str> = path_segments(base_dir).collect();
        let target: Vec<&str> = path_segments(item_path.value()).collect();

        let common = base
            .iter()
            .zip(&target)
            .take_while(|(a, b)| a == b)
            .count();

        let mut relative: Vec<&str> = std::iter::repeat_n("..", base.len() - common).collect();
        relative.extend_from_slice(&target[common..]);

        let mut relative = if relative.is_empty() {
            ".".to_string()
        } else {
            relative.join("/")
        };
        if item_path.value().ends_with('/') {
            relative.push('/');
        }

        let mut uri = quote_path(&relative);
        if !fragment.is_empty() {
            uri.push('#');
            uri.push_str(fragment);
        }
        uri
    }

    /// Apply the first matching fuzzy rule of this rewriter's table to `value`.
    #[must_use]
    pub fn apply_additional_rules(&self, value: &str) -> String {
        self.fuzzy_rules.apply(value).into_owned()
    }
}

fn path_segments(value: &str) -> impl Iterator<Item = &str> {
    value.split('/').filter(|s| !s.is_empty() && *s != ".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;

    fn rewriter_at(url: &str) -> ArticleUrlRewriter<'static> {
        ArticleUrlRewriter::new(HttpUrl::new(url).expect("valid url")).expect("rewriter")
    }

    #[test]
    fn test_document_uri_same_directory() {
        let rewriter = rewriter_at("https://kiwix.org/a/article/document.html");
        let path = ZimPath::new("kiwix.org/a/article/foo.html").expect("valid path");
        assert_eq!(rewriter.get_document_uri(&path, ""), "foo.html");
        assert_eq!(rewriter.get_document_uri(&path, "top"), "foo.html#top");
    }

    #[test]
    fn test_document_uri_directory_article() {
        let rewriter = rewriter_at("https://kiwix.org/a/article/");
        let path = ZimPath::new("kiwix.org/a/article/").expect("valid path");
        assert_eq!(rewriter.get_document_uri(&path, ""), "./");
    }

    #[test]
    fn test_document_uri_other_host() {
        let rewriter = rewriter_at("https://kiwix.org/a/article/document.html");
        let path = ZimPath::new("exémple.com/a b?x=1").expect("valid path");
        assert_eq!(
            rewriter.get_document_uri(&path, ""),
            "../../../ex%C3%A9mple.com/a%20b%3Fx%3D1"
        );
    }

    #[test]
    fn test_article_path_override() {
        let rewriter = ArticleUrlRewriter::builder(
            HttpUrl::new("https://kiwix.org/a/article/document.html").expect("valid url"),
        )
        .article_path(ZimPath::new("index.html").expect("valid path"))
        .build()
        .expect("rewriter");
        let result = rewriter.rewrite("/foo.html", None, true);
        assert_eq!(result.rewriten_url, "kiwix.org/foo.html");
    }

    #[test]
    fn test_missing_path_recorded_once() {
        let known: HashSet<ZimPath> = HashSet::from([ZimPath::new("kiwix.org/a/article/foo.html")
            .expect("valid path")]);
        let missing: RefCell<HashSet<ZimPath>> = RefCell::new(HashSet::new());
        let rewriter = ArticleUrlRewriter::builder(
            HttpUrl::new("https://kiwix.org/a/article/document.html").expect("valid url"),
        )
        .existing_zim_paths(&known)
        .missing_zim_paths(&missing)
        .build()
        .expect("rewriter");

        rewriter.rewrite("foo.html", None, false);
        assert!(missing.borrow().is_empty());

        let result = rewriter.rewrite("bar.html", None, false);
        rewriter.rewrite("bar.html", None, false);
        assert_eq!(result.rewriten_url, "https://kiwix.org/a/article/bar.html");
        assert_eq!(
            result.zim_path,
            Some(ZimPath::new("kiwix.org/a/article/bar.html").expect("valid path"))
        );
        assert_eq!(missing.borrow().len(), 1);
    }

    #[test]
    fn test_fragment_only() {
        let rewriter = rewriter_at("https://kiwix.org/a/article/document.html");
        let result = rewriter.rewrite("  #anchor1 ", None, false);
        assert_eq!(result.rewriten_url, "#anchor1");
        assert_eq!(result.absolute_url, "https://kiwix.org/a/article/document.html#anchor1");
        assert!(result.zim_path.is_none());
    }

    #[test]
    fn test_unresolvable_reference_kept() {
        let rewriter = rewriter_at("https://kiwix.org/a/article/document.html");
        let result = rewriter.rewrite("http://[::1", None, true);
        assert_eq!(result.rewriten_url, "http://[::1");
        assert!(result.zim_path.is_none());
        assert!(rewriter.try_rewrite("http://[::1", None, true).is_err());

        let result = rewriter.rewrite("  http://[::1 ", None, true);
        assert_eq!(result.rewriten_url, "http://[::1");
        assert_eq!(result.absolute_url, "http://[::1");
    }

    #[test]
    fn test_backslash_separates_segments() {
        let rewriter = rewriter_at("https://kiwix.org/a/article/document.html");
        let result = rewriter.rewrite("/a\\b.html", None, true);
        assert_eq!(result.rewriten_url, "../b.html");
        assert_eq!(
            result.zim_path,
            Some(ZimPath::new("kiwix.org/a/b.html").expect("valid path"))
        );
    }

    #[test]
    fn test_fragment_kept_as_written() {
        let rewriter = rewriter_at("https://kiwix.org/a/article/document.html");
        let result = rewriter.rewrite("foo.html#a b", None, true);
        assert_eq!(result.rewriten_url, "foo.html#a b");

        let result = rewriter.rewrite(
            "https://kiwix.org/a/article/foo.html#caf\u{e9}",
            None,
            true,
        );
        assert_eq!(result.rewriten_url, "foo.html#caf\u{e9}");
    }
}
