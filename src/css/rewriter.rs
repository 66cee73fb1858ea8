//! Tree-walking CSS rewriter.

use super::ast::{ComponentValue, Node, serialize, serialize_string_value, serialize_url};
use super::fallback::FallbackCssRewriter;
use super::parser::{parse_declaration_list, parse_stylesheet};
use crate::url_rewriting::ArticleUrlRewriter;
use crate::utils::{MAX_LOGGED_CONTENT_CHARS, log_excerpt};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Rewrites every URL of a stylesheet or `style` attribute into archive-relative form.
///
/// Each `url()` token, quoted `url("...")` function and `@import "..."` target is
/// passed through the article URL rewriter, in rewrite-all mode unless disabled with
/// [`CssRewriter::with_rewrite_all_url`]. When the CSS does not parse, the whole input
/// goes through [`FallbackCssRewriter`] instead, unless `remove_errors` is set and the
/// errors are top-level items that can be dropped.
pub struct CssRewriter<'a> {
    url_rewriter: &'a ArticleUrlRewriter<'a>,
    base_href: Option<&'a str>,
    remove_errors: bool,
    rewrite_all_url: bool,
    fallback: FallbackCssRewriter<'a>,
}

impl<'a> CssRewriter<'a> {
    /// # Arguments
    /// * `url_rewriter` - Rewriter of the document the CSS belongs to
    /// * `base_href` - `<base href>` of the enclosing HTML document, for inline CSS
    /// * `remove_errors` - Drop unparseable top-level items instead of falling back
    #[must_use]
    pub fn new(
        url_rewriter: &'a ArticleUrlRewriter<'a>,
        base_href: Option<&'a str>,
        remove_errors: bool,
    ) -> Self {
        Self {
            url_rewriter,
            base_href,
            remove_errors,
            rewrite_all_url: true,
            fallback: FallbackCssRewriter::new(url_rewriter, base_href, true),
        }
    }

    /// Only rewrite URLs whose target is known to the archive when `false`
    #[must_use]
    pub fn with_rewrite_all_url(mut self, rewrite_all_url: bool) -> Self {
        self.rewrite_all_url = rewrite_all_url;
        self.fallback =
            FallbackCssRewriter::new(self.url_rewriter, self.base_href, rewrite_all_url);
        self
    }

    /// Rewrite a standalone stylesheet.
    #[must_use]
    pub fn rewrite(&self, content: &str) -> String {
        let mut nodes = parse_stylesheet(content);
        self.process_nodes(&mut nodes);
        self.serialize_or_fallback(&nodes, content)
    }

    /// Rewrite a stylesheet given as bytes; a UTF-8 BOM is skipped.
    #[must_use]
    pub fn rewrite_bytes(&self, content: &[u8]) -> String {
        let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
        self.rewrite(&String::from_utf8_lossy(content))
    }

    /// Rewrite the declarations of a `style` attribute.
    #[must_use]
    pub fn rewrite_inline(&self, content: &str) -> String {
        let mut nodes = parse_declaration_list(content);
        self.process_nodes(&mut nodes);
        self.serialize_or_fallback(&nodes, content)
    }

    fn serialize_or_fallback(&self, nodes: &[Node], content: &str) -> String {
        let serialized = if self.remove_errors {
            let kept: Vec<Node> = nodes.iter().filter(|n| !n.is_error()).cloned().collect();
            serialize(&kept)
        } else {
            serialize(nodes)
        };

        match serialized {
            Ok(css) => css,
            Err(e) => {
                log::warn!(
                    "CSS transformation failed ({e}), falling back to regex rewriter. Article URL is {}, content is `{}`",
                    self.url_rewriter.article_url().value(),
                    log_excerpt(content, MAX_LOGGED_CONTENT_CHARS)
                );
                self.fallback.rewrite(content).unwrap_or_else(|e| {
                    log::error!("CSS fallback rewriter unavailable: {e}");
                    content.to_string()
                })
            }
        }
    }

    fn process_nodes(&self, nodes: &mut [Node]) {
        for node in nodes {
            match node {
                Node::Value(value) => self.process_value(value),
                Node::QualifiedRule { prelude, content } => {
                    self.process_values(prelude);
                    self.process_values(content);
                }
                Node::AtRule {
                    name,
                    prelude,
                    content,
                } => {
                    if name.eq_ignore_ascii_case("import") {
                        self.process_import_target(prelude);
                    }
                    self.process_values(prelude);
                    if let Some(content) = content {
                        self.process_values(content);
                    }
                }
                Node::Declaration { value, .. } => self.process_values(value),
                Node::Error(_) => {}
            }
        }
    }

    fn process_values(&self, values: &mut [ComponentValue]) {
        for value in values {
            self.process_value(value);
        }
    }

    fn process_value(&self, value: &mut ComponentValue) {
        match value {
            ComponentValue::Url { value: url, .. } => {
                let rewritten = self.rewrite_url(url);
                *value = ComponentValue::url(rewritten);
            }
            ComponentValue::Function { name, arguments } if name.eq_ignore_ascii_case("url") => {
                if let Some(ComponentValue::String {
                    value,
                    representation,
                }) = arguments.iter_mut().find(|a| !a.is_whitespace_or_comment())
                {
                    *value = self.rewrite_url(value);
                    *representation = format!("\"{}\"", serialize_url(value));
                }
            }
            ComponentValue::Function { arguments, .. } => self.process_values(arguments),
            ComponentValue::Block { content, .. } => self.process_values(content),
            _ => {}
        }
    }

    /// `@import "target";` names its stylesheet with a bare string
    fn process_import_target(&self, prelude: &mut [ComponentValue]) {
        if let Some(ComponentValue::String {
            value,
            representation,
        }) = prelude.iter_mut().find(|v| !v.is_whitespace_or_comment())
        {
            *value = self.rewrite_url(value);
            *representation = format!("\"{}\"", serialize_string_value(value));
        }
    }

    fn rewrite_url(&self, url: &str) -> String {
        self.url_rewriter
            .rewrite(url, self.base_href, self.rewrite_all_url)
            .rewriten_url
    }
}
