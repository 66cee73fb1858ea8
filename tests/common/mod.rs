//! Test utilities shared by the rewriting test suites

use kodegen_tools_zimrewrite::{ArticleUrlRewriter, HttpUrl, ZimPath};
use std::collections::HashSet;

/// Route library logs to the test output
#[allow(dead_code)]
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[allow(dead_code)]
pub fn http_url(value: &str) -> HttpUrl {
    HttpUrl::new(value).unwrap()
}

#[allow(dead_code)]
pub fn zim_path(value: &str) -> ZimPath {
    ZimPath::new(value).unwrap()
}

#[allow(dead_code)]
pub fn zim_paths(values: &[&str]) -> HashSet<ZimPath> {
    values.iter().map(|v| zim_path(v)).collect()
}

/// Rewriter without catalogue, built-in fuzzy rules
#[allow(dead_code)]
pub fn url_rewriter(article_url: &str) -> ArticleUrlRewriter<'static> {
    ArticleUrlRewriter::new(http_url(article_url)).unwrap()
}
