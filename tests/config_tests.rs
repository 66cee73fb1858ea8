//! Tests for the type-safe configuration builder pattern

use kodegen_tools_zimrewrite::config::RewriteConfig;
use kodegen_tools_zimrewrite::{FuzzyRules, JsRewriteOptions, ModuleSink, ZimPath};
use std::cell::RefCell;
use std::sync::Arc;
use tempfile::TempDir;

mod common;

const STRIP_QUERY_RULES: &str = r#"
fuzzyRules:
  - name: strip_query
    pattern: '(example\.com/a)\?.*'
    replace: '\1'
    tests:
      - raw_url: example.com/a?b=c
        fuzzified_url: example.com/a
"#;

#[test]
fn test_builder_requires_fuzzy_rules() {
    // This should not compile if uncommented - testing compile-time guarantees
    // let config = RewriteConfig::builder().build();

    // This SHOULD compile - rule table chosen
    let config = RewriteConfig::builder().builtin_fuzzy_rules().build().unwrap();
    assert_eq!(config.fuzzy_rules().len(), FuzzyRules::builtin().len());
    assert_eq!(config.fuzzy_rules_file(), None);
}

#[test]
fn test_builder_optional_fields_have_defaults() {
    let config = RewriteConfig::builder().builtin_fuzzy_rules().build().unwrap();

    assert!(config.rewrite_all_url());
    assert!(!config.remove_css_errors());
    assert!(config.notify_dynamic_imports());
    assert_eq!(config.module_decl_path().value(), "_zim_static/__wb_module_decl.js");
}

#[test]
fn test_builder_with_all_optional_fields() {
    let config = RewriteConfig::builder()
        .rewrite_all_url(false)
        .remove_css_errors(true)
        .builtin_fuzzy_rules()
        .module_decl_path("assets/decl.js")
        .notify_dynamic_imports(false)
        .build()
        .unwrap();

    assert!(!config.rewrite_all_url());
    assert!(config.remove_css_errors());
    assert!(!config.notify_dynamic_imports());
    assert_eq!(config.module_decl_path().value(), "assets/decl.js");
}

#[test]
fn test_builder_rejects_module_decl_url() {
    let result = RewriteConfig::builder()
        .builtin_fuzzy_rules()
        .module_decl_path("https://cdn.example.com/decl.js")
        .build();

    let err = result.unwrap_err();
    assert!(err.to_string().contains("module_decl_path"));
}

#[test]
fn test_fuzzy_rules_sources() {
    let from_yaml = RewriteConfig::builder()
        .fuzzy_rules_yaml(STRIP_QUERY_RULES)
        .build()
        .unwrap();
    assert_eq!(from_yaml.fuzzy_rules().len(), 1);
    assert_eq!(from_yaml.fuzzy_rules_file(), None);

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("rules.yaml");
    std::fs::write(&path, STRIP_QUERY_RULES).unwrap();
    let from_file = RewriteConfig::builder()
        .fuzzy_rules_file(&path)
        .build()
        .unwrap();
    assert_eq!(from_file.fuzzy_rules().len(), 1);
    assert_eq!(from_file.fuzzy_rules_file(), Some(path.as_path()));

    let shared = Arc::new(FuzzyRules::empty());
    let from_table = RewriteConfig::builder()
        .fuzzy_rules(Arc::clone(&shared))
        .build()
        .unwrap();
    assert!(from_table.fuzzy_rules().is_empty());
}

#[test]
fn test_fuzzy_rules_loading_errors_carry_context() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.yaml");
    let err = RewriteConfig::builder()
        .fuzzy_rules_file(&missing)
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("missing.yaml"));

    let err = RewriteConfig::builder()
        .fuzzy_rules_yaml("fuzzyRules: not-a-list")
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("Invalid fuzzy rules document"));
}

#[test]
fn test_url_rewriter_uses_configured_rules() {
    let config = RewriteConfig::builder()
        .fuzzy_rules_yaml(STRIP_QUERY_RULES)
        .build()
        .unwrap();
    let rewriter = config
        .url_rewriter_builder(common::http_url("https://example.com/page"))
        .build()
        .unwrap();

    let result = rewriter.rewrite("/a?b=c", None, config.rewrite_all_url());
    assert_eq!(result.zim_path, Some(common::zim_path("example.com/a")));
    assert_eq!(result.rewriten_url, "a");
}

#[test]
fn test_rewriter_factories_apply_settings() {
    let config = RewriteConfig::builder()
        .remove_css_errors(true)
        .builtin_fuzzy_rules()
        .module_decl_path("assets/decl.js")
        .notify_dynamic_imports(false)
        .build()
        .unwrap();
    let url_rewriter = config
        .url_rewriter_builder(common::http_url("https://kiwix.org/a/page.html"))
        .build()
        .unwrap();

    let css = config.css_rewriter(&url_rewriter, None);
    assert_eq!(css.rewrite_inline("color: red; width="), "color: red; ");

    let modules: RefCell<Vec<ZimPath>> = RefCell::new(Vec::new());
    let sink: &dyn ModuleSink = &modules;
    let js = config.js_rewriter(&url_rewriter, None, Some(sink));
    let rewritten = js.rewrite("x = import(\"./lazy.js\");", JsRewriteOptions::MODULE);
    assert!(rewritten.starts_with(
        "import { window, globalThis, self, document, location, top, parent, frames, opener } from \"../../assets/decl.js\";\n"
    ));
    assert!(modules.borrow().is_empty());
}

#[test]
fn test_rewriters_keep_unknown_urls_when_not_rewriting_all() {
    let config = RewriteConfig::builder()
        .rewrite_all_url(false)
        .builtin_fuzzy_rules()
        .build()
        .unwrap();
    let known = common::zim_paths(&["exemple.com/known.png", "exemple.com/known.js"]);
    let url_rewriter = config
        .url_rewriter_builder(common::http_url("http://kiwix.org/article"))
        .existing_zim_paths(&known)
        .build()
        .unwrap();

    let css = config.css_rewriter(&url_rewriter, None);
    assert_eq!(
        css.rewrite("div { background: url('http://exemple.com/img.png') url(http://exemple.com/known.png) }"),
        "div { background: url(\"http://exemple.com/img.png\") url(../exemple.com/known.png) }"
    );
    // Regex fallback
    assert_eq!(
        css.rewrite_inline("width= ; background: url(http://exemple.com/img.png)"),
        "width= ; background: url(http://exemple.com/img.png)"
    );

    let js = config.js_rewriter(&url_rewriter, None, None);
    let rewritten = js.rewrite(
        "import x from \"http://exemple.com/m.js\";\nimport y from \"http://exemple.com/known.js\";",
        JsRewriteOptions::MODULE,
    );
    assert!(rewritten.ends_with(
        "import x from \"http://exemple.com/m.js\";\nimport y from \"../exemple.com/known.js\";"
    ));
}

#[test]
fn test_config_serde_round_trip() {
    let config = RewriteConfig::builder()
        .rewrite_all_url(false)
        .fuzzy_rules_yaml(STRIP_QUERY_RULES)
        .module_decl_path("assets/decl.js")
        .build()
        .unwrap();

    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"module_decl_path\":\"assets/decl.js\""));
    assert!(!json.contains("strip_query"));

    let restored: RewriteConfig = serde_json::from_str(&json).unwrap();
    assert!(!restored.rewrite_all_url());
    assert_eq!(restored.module_decl_path().value(), "assets/decl.js");
    // The table itself is not serialized
    assert_eq!(restored.fuzzy_rules().len(), FuzzyRules::builtin().len());
}

#[test]
fn test_config_deserialization_validates_paths() {
    let json = r#"{
        "rewrite_all_url": true,
        "remove_css_errors": false,
        "module_decl_path": "https://cdn.example.com/decl.js",
        "notify_dynamic_imports": true,
        "fuzzy_rules_file": null
    }"#;
    assert!(serde_json::from_str::<RewriteConfig>(json).is_err());
}
