//! Fuzzy rule tables: YAML loading, validation and use during normalization

mod common;

use std::io::Write;

use common::{http_url, zim_path};
use kodegen_tools_zimrewrite::url_rewriting::{FuzzyRuleError, normalize_with};
use kodegen_tools_zimrewrite::{ArticleUrlRewriter, FuzzyRules, normalize};

const CDN_RULES: &str = r#"
fuzzyRules:
  - name: cdn_versions
    pattern: 'cdn\.example\.org/v\d+/(.*)'
    replace: 'cdn.fuzzy/\1'
    tests:
      - raw_url: cdn.example.org/v12/lib.js
        fuzzified_url: cdn.fuzzy/lib.js
      - raw_url: cdn.example.org/latest/lib.js
        unchanged: true
"#;

#[test]
fn test_builtin_rules_apply_during_normalization() {
    assert_eq!(
        normalize(&http_url(
            "https://i.ytimg.com/vi/-KpLmsAR23I/maxresdefault.jpg?sqp=abc&rs=def"
        ))
        .unwrap(),
        zim_path("i.ytimg.com.fuzzy.replayweb.page/vi/-KpLmsAR23I/thumbnail.jpg")
    );
    assert_eq!(
        normalize(&http_url("https://www.youtube-nocookie.com/embed/bar?key=value")).unwrap(),
        zim_path("youtube.fuzzy.replayweb.page/embed/bar")
    );
}

#[test]
fn test_yaml_rules() {
    let rules = FuzzyRules::from_yaml_str(CDN_RULES).unwrap();
    assert_eq!(rules.len(), 1);
    let rule = rules.iter().next().unwrap();
    assert_eq!(rule.name(), "cdn_versions");
    assert_eq!(rule.replace(), r"cdn.fuzzy/\1");

    assert_eq!(rules.apply("cdn.example.org/v3/app.js"), "cdn.fuzzy/app.js");
    assert_eq!(rules.apply("www.example.org/v3/app.js"), "www.example.org/v3/app.js");
}

#[test]
fn test_custom_table_replaces_builtin() {
    let rules = FuzzyRules::from_yaml_str(CDN_RULES).unwrap();
    assert_eq!(
        normalize_with(&http_url("https://www.youtube.com/embed/foo"), &rules).unwrap(),
        zim_path("www.youtube.com/embed/foo")
    );
    assert_eq!(
        normalize_with(&http_url("https://cdn.example.org/v1/a.css"), &rules).unwrap(),
        zim_path("cdn.fuzzy/a.css")
    );
    assert_eq!(
        normalize_with(&http_url("https://www.youtube.com/embed/foo"), &FuzzyRules::empty())
            .unwrap(),
        zim_path("www.youtube.com/embed/foo")
    );
}

#[test]
fn test_rewriter_uses_its_table() {
    let rules = FuzzyRules::from_yaml_str(CDN_RULES).unwrap();
    let rewriter = ArticleUrlRewriter::builder(http_url("http://kiwix.org/a/page.html"))
        .fuzzy_rules(&rules)
        .build()
        .unwrap();

    let result = rewriter.rewrite("https://cdn.example.org/v3/app.js", None, true);
    assert_eq!(result.zim_path, Some(zim_path("cdn.fuzzy/app.js")));
    assert_eq!(result.rewriten_url, "../../cdn.fuzzy/app.js");
    assert_eq!(rewriter.apply_additional_rules("cdn.example.org/v9/x.js"), "cdn.fuzzy/x.js");
}

#[test]
fn test_yaml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CDN_RULES.as_bytes()).unwrap();
    let rules = FuzzyRules::from_yaml_file(file.path()).unwrap();
    assert_eq!(rules.len(), 1);

    let missing = file.path().with_extension("absent");
    assert!(matches!(
        FuzzyRules::from_yaml_file(&missing),
        Err(FuzzyRuleError::Io(_))
    ));
}

#[test]
fn test_invalid_tables_are_rejected() {
    assert!(matches!(
        FuzzyRules::from_yaml_str("fuzzyRules: [ {"),
        Err(FuzzyRuleError::Yaml(_))
    ));

    let no_tests = "fuzzyRules:\n  - name: a\n    pattern: 'a(.*)'\n    replace: 'b\\1'\n";
    assert!(matches!(
        FuzzyRules::from_yaml_str(no_tests),
        Err(FuzzyRuleError::MissingTests(name)) if name == "a"
    ));

    let no_expectation = "fuzzyRules:\n  - name: a\n    pattern: 'a(.*)'\n    replace: 'b\\1'\n    tests:\n      - raw_url: a1\n";
    assert!(matches!(
        FuzzyRules::from_yaml_str(no_expectation),
        Err(FuzzyRuleError::MissingExpectation { .. })
    ));

    let bad_pattern = "fuzzyRules:\n  - name: a\n    pattern: 'a(.*'\n    replace: 'b'\n    tests:\n      - raw_url: a1\n        unchanged: true\n";
    assert!(matches!(
        FuzzyRules::from_yaml_str(bad_pattern),
        Err(FuzzyRuleError::InvalidPattern { .. })
    ));
}

#[test]
fn test_earlier_rule_shadowing_later_test_is_rejected() {
    let yaml = r#"
fuzzyRules:
  - name: greedy
    pattern: 'example\.org/(.*)'
    replace: 'all/\1'
    tests:
      - raw_url: example.org/x
        fuzzified_url: all/x
  - name: shadowed
    pattern: 'example\.org/static/(.*)'
    replace: 'static/\1'
    tests:
      - raw_url: example.org/static/y
        fuzzified_url: static/y
"#;
    match FuzzyRules::from_yaml_str(yaml) {
        Err(FuzzyRuleError::FailedTest { name, actual, .. }) => {
            assert_eq!(name, "shadowed");
            assert_eq!(actual, "all/static/y");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
