use kodegen_tools_zimrewrite::{CssRewriter, JsRewriteOptions, JsRewriter, normalize};
use std::time::Instant;

mod common;

/// Test that the rewriting patterns are resistant to `ReDoS` (Regular Expression Denial of Service) attacks
///
/// The JS and CSS fallback rules need lookaround and backreferences, so they run on
/// `fancy-regex`'s backtracking engine. Past its backtrack limit the rule engine
/// falls back to bounded windows instead of hanging; these tests make sure common
/// adversarial shapes still finish quickly.
const MAX_MILLIS: u128 = 2000;

fn time_js(script: &str, opts: JsRewriteOptions) -> String {
    let url_rewriter = common::url_rewriter("https://kiwix.org/a/article");
    let rewriter = JsRewriter::new(&url_rewriter, None, None);
    let start = Instant::now();
    let output = rewriter.rewrite(script, opts);
    let elapsed = start.elapsed();

    println!("JS test ({} bytes): {elapsed:?}", script.len());
    assert!(
        elapsed.as_millis() < MAX_MILLIS,
        "ReDoS vulnerability detected: took {elapsed:?}"
    );
    output
}

fn time_css(content: &str, inline: bool) -> String {
    let url_rewriter = common::url_rewriter("https://kiwix.org/a/article");
    let rewriter = CssRewriter::new(&url_rewriter, None, false);
    let start = Instant::now();
    let output = if inline {
        rewriter.rewrite_inline(content)
    } else {
        rewriter.rewrite(content)
    };
    let elapsed = start.elapsed();

    println!("CSS test ({} bytes): {elapsed:?}", content.len());
    assert!(
        elapsed.as_millis() < MAX_MILLIS,
        "ReDoS vulnerability detected: took {elapsed:?}"
    );
    output
}

#[test]
fn test_redos_resistance_long_identifier() {
    let adversarial = "a".repeat(10000);
    assert_eq!(time_js(&adversarial, JsRewriteOptions::CLASSIC), adversarial);
}

#[test]
fn test_redos_resistance_location_whitespace() {
    let adversarial = "location".to_string() + &" ".repeat(10000) + "x";
    let _ = time_js(&adversarial, JsRewriteOptions::CLASSIC);
}

#[test]
fn test_redos_resistance_repeated_this() {
    let adversarial = "a = this || this && ".repeat(500);
    let _ = time_js(&adversarial, JsRewriteOptions::CLASSIC);
}

#[test]
fn test_redos_resistance_unterminated_import() {
    let adversarial = "import {".to_string() + &"a, ".repeat(3000);
    let output = time_js(&adversarial, JsRewriteOptions::MODULE);
    assert!(output.ends_with(&adversarial));
}

#[test]
fn test_redos_resistance_unterminated_css_string() {
    let adversarial = "p { background: url(\"".to_string() + &"a".repeat(10000);
    let _ = time_css(&adversarial, false);
}

#[test]
fn test_redos_resistance_nested_css_blocks() {
    let adversarial = "p { a: ".to_string() + &"(".repeat(5000) + &")".repeat(5000) + " }";
    assert_eq!(time_css(&adversarial, false), adversarial);
}

#[test]
fn test_redos_resistance_css_fallback() {
    // Broken declaration list: goes through the regex fallback
    let adversarial = "width= ".to_string() + &"url(a) ".repeat(2000);
    let output = time_css(&adversarial, true);
    assert!(output.starts_with("width= url(a)"));
}

#[test]
fn test_redos_resistance_long_url() {
    let url = common::http_url(&format!("https://kiwix.org/{}", "a/".repeat(5000)));
    let start = Instant::now();
    let _ = normalize(&url);
    let elapsed = start.elapsed();

    println!("URL normalization test: {elapsed:?}");
    assert!(
        elapsed.as_millis() < MAX_MILLIS,
        "ReDoS vulnerability detected: took {elapsed:?}"
    );
}
