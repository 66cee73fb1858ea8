//! Fuzzy rules: canonicalization of URL variants onto one archive path.
//!
//! A rule table is an ordered list of `(pattern, replace)` pairs. The first rule whose
//! pattern matches at the start of a candidate path wins, and the path becomes the
//! expansion of its replacement template (`\1`, `\g<name>` group references). Every
//! rule carries example test cases which are executed when the table is loaded, so a
//! broken table is rejected up front instead of silently producing wrong paths.
//!
//! The default table is compiled into the crate ([`FuzzyRules::builtin`]); scrapers
//! with their own rule set can load one from YAML:
//!
//! ```yaml
//! fuzzyRules:
//!   - name: googlevideo_com
//!     pattern: .*googlevideo.com/(videoplayback(?=\?)).*[?&](id=[^&]+).*
//!     replace: youtube.fuzzy.replayweb.page/\1?\2
//!     tests:
//!       - raw_url: foobargooglevideo.com/videoplayback?id=1576&key=value
//!         fuzzified_url: youtube.fuzzy.replayweb.page/videoplayback?id=1576
//!       - raw_url: foobargooglevideo.com/videoplayback/?id=1576
//!         unchanged: true
//! ```

mod builtin;

use std::borrow::Cow;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use fancy_regex::{Expander, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for fuzzy rule loading
pub type FuzzyRuleResult<T> = Result<T, FuzzyRuleError>;

/// Error types for fuzzy rule loading and validation
#[derive(Debug, Error)]
pub enum FuzzyRuleError {
    /// Rule at the given position has no name
    #[error("Fuzzy rule #{0} is missing a name")]
    MissingName(usize),

    /// Rule has no test case
    #[error("Fuzzy rule '{0}' is missing test cases")]
    MissingTests(String),

    /// Test case states neither an expected value nor `unchanged`
    #[error("Fuzzy rule '{name}' has a test case without expectation: {raw_url}")]
    MissingExpectation { name: String, raw_url: String },

    /// Pattern does not compile
    #[error("Fuzzy rule '{name}' has an invalid pattern: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },

    /// Replacement template references groups the pattern does not define
    #[error("Fuzzy rule '{name}' has an invalid replacement: {source}")]
    InvalidReplacement {
        name: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },

    /// An embedded test case produced an unexpected result
    #[error(
        "Fuzzy rule '{name}' failed on '{raw_url}': expected '{expected}', got '{actual}'"
    )]
    FailedTest {
        name: String,
        raw_url: String,
        expected: String,
        actual: String,
    },

    /// YAML document is malformed
    #[error("Invalid fuzzy rules document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Rule file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One example attached to a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzyRuleTest {
    pub raw_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuzzified_url: Option<String>,
    #[serde(default)]
    pub unchanged: bool,
}

/// Uncompiled, declarative form of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzyRuleSpec {
    #[serde(default)]
    pub name: Option<String>,
    pub pattern: String,
    pub replace: String,
    #[serde(default)]
    pub tests: Vec<FuzzyRuleTest>,
}

#[derive(Debug, Deserialize)]
struct FuzzyRulesDocument {
    #[serde(rename = "fuzzyRules")]
    fuzzy_rules: Vec<FuzzyRuleSpec>,
}

/// A compiled rule.
#[derive(Debug, Clone)]
pub struct FuzzyRule {
    name: String,
    pattern: String,
    replace: String,
    regex: Arc<Regex>,
}

impl FuzzyRule {
    fn compile(name: String, spec: &FuzzyRuleSpec) -> FuzzyRuleResult<Self> {
        // Rules only ever match at the start of the candidate
        let regex = Regex::new(&format!("^(?:{})", spec.pattern)).map_err(|e| {
            FuzzyRuleError::InvalidPattern {
                name: name.clone(),
                source: Box::new(e),
            }
        })?;

        Expander::python()
            .check(&spec.replace, &regex)
            .map_err(|e| FuzzyRuleError::InvalidReplacement {
                name: name.clone(),
                source: Box::new(e),
            })?;

        Ok(Self {
            name,
            pattern: spec.pattern.clone(),
            replace: spec.replace.clone(),
            regex: Arc::new(regex),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub fn replace(&self) -> &str {
        &self.replace
    }

    /// Expansion of the replacement when the rule matches `value`.
    #[must_use]
    pub fn apply(&self, value: &str) -> Option<String> {
        match self.regex.captures(value) {
            Ok(Some(caps)) => Some(Expander::python().expansion(&self.replace, &caps)),
            Ok(None) => None,
            Err(e) => {
                log::warn!("Fuzzy rule '{}' aborted on '{value}': {e}", self.name);
                None
            }
        }
    }
}

static BUILTIN_FUZZY_RULES: LazyLock<FuzzyRules> = LazyLock::new(|| {
    FuzzyRules::from_specs(builtin::BUILTIN_RULES.iter().map(builtin::BuiltinRule::to_spec))
        .expect("BUILTIN_FUZZY_RULES: hardcoded rules are valid")
});

/// An ordered, validated fuzzy rule table.
#[derive(Debug, Clone, Default)]
pub struct FuzzyRules {
    rules: Vec<FuzzyRule>,
}

impl FuzzyRules {
    /// The table compiled into the crate, shared process-wide.
    #[must_use]
    pub fn builtin() -> &'static FuzzyRules {
        &BUILTIN_FUZZY_RULES
    }

    /// A table without any rule (normalization then never fuzzifies).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile and validate declarative rules.
    ///
    /// Every rule needs a name and at least one test case. Test cases are run
    /// against the complete table, in order, so they also catch an earlier rule
    /// shadowing a later one.
    ///
    /// # Errors
    ///
    /// Returns the first structural, compilation or test failure encountered.
    pub fn from_specs(specs: impl IntoIterator<Item = FuzzyRuleSpec>) -> FuzzyRuleResult<Self> {
        let specs: Vec<FuzzyRuleSpec> = specs.into_iter().collect();
        let mut rules = Vec::with_capacity(specs.len());

        for (index, spec) in specs.iter().enumerate() {
            let name = spec
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .ok_or(FuzzyRuleError::MissingName(index))?;
            if spec.tests.is_empty() {
                return Err(FuzzyRuleError::MissingTests(name));
            }
            rules.push(FuzzyRule::compile(name, spec)?);
        }

        let table = Self { rules };
        table.run_tests(&specs)?;
        Ok(table)
    }

    fn run_tests(&self, specs: &[FuzzyRuleSpec]) -> FuzzyRuleResult<()> {
        for (rule, spec) in self.rules.iter().zip(specs) {
            for test in &spec.tests {
                let expected = match (&test.fuzzified_url, test.unchanged) {
                    (_, true) => test.raw_url.as_str(),
                    (Some(fuzzified), false) => fuzzified.as_str(),
                    (None, false) => {
                        return Err(FuzzyRuleError::MissingExpectation {
                            name: rule.name.clone(),
                            raw_url: test.raw_url.clone(),
                        });
                    }
                };
                let actual = self.apply(&test.raw_url);
                if actual != expected {
                    return Err(FuzzyRuleError::FailedTest {
                        name: rule.name.clone(),
                        raw_url: test.raw_url.clone(),
                        expected: expected.to_string(),
                        actual: actual.into_owned(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Load a `fuzzyRules:` YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`FuzzyRuleError::Yaml`] for malformed documents, otherwise any
    /// validation error of [`FuzzyRules::from_specs`].
    pub fn from_yaml_str(yaml: &str) -> FuzzyRuleResult<Self> {
        let document: FuzzyRulesDocument = serde_yaml::from_str(yaml)?;
        Self::from_specs(document.fuzzy_rules)
    }

    /// Load a `fuzzyRules:` YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`FuzzyRuleError::Io`] when the file cannot be read, otherwise any
    /// error of [`FuzzyRules::from_yaml_str`].
    pub fn from_yaml_file(path: impl AsRef<Path>) -> FuzzyRuleResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Apply the first matching rule; the input is returned as-is when none matches.
    #[must_use]
    pub fn apply<'v>(&self, value: &'v str) -> Cow<'v, str> {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(value))
            .map_or(Cow::Borrowed(value), Cow::Owned)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FuzzyRule> {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_rules_load() {
        let rules = FuzzyRules::builtin();
        assert_eq!(rules.len(), builtin::BUILTIN_RULES.len());
        assert!(rules.iter().any(|r| r.name() == "googlevideo_com"));
    }

    #[test]
    fn test_builtin_googlevideo() {
        assert_eq!(
            FuzzyRules::builtin().apply("foobargooglevideo.com/videoplayback?id=1576&key=value"),
            "youtube.fuzzy.replayweb.page/videoplayback?id=1576"
        );
        assert_eq!(
            FuzzyRules::builtin().apply("kiwix.org/a/article/document.html"),
            "kiwix.org/a/article/document.html"
        );
    }

    #[test]
    fn test_rule_without_name_is_rejected() {
        let spec = FuzzyRuleSpec {
            name: None,
            pattern: "a(.*)".into(),
            replace: r"b\1".into(),
            tests: vec![],
        };
        assert!(matches!(
            FuzzyRules::from_specs([spec]),
            Err(FuzzyRuleError::MissingName(0))
        ));
    }

    #[test]
    fn test_failing_test_case_is_rejected() {
        let spec = FuzzyRuleSpec {
            name: Some("broken".into()),
            pattern: "a(.*)".into(),
            replace: r"b\1".into(),
            tests: vec![FuzzyRuleTest {
                raw_url: "a123".into(),
                fuzzified_url: Some("c123".into()),
                unchanged: false,
            }],
        };
        assert!(matches!(
            FuzzyRules::from_specs([spec]),
            Err(FuzzyRuleError::FailedTest { .. })
        ));
    }
}
