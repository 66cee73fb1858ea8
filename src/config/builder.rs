//! Type-safe builder for `RewriteConfig` using the typestate pattern
//!
//! The fuzzy rule table must be chosen before a `RewriteConfig` can be built; every
//! other setting has a default.

use crate::url_rewriting::{FuzzyRules, ZimPath};
use crate::utils::{DEFAULT_REWRITE_ALL_URL, MODULE_DECL_PATH};
use anyhow::{Context, Result, anyhow};
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

use super::types::RewriteConfig;

// Type states for the builder
pub struct WithFuzzyRules;

/// Where the fuzzy rule table comes from; loaded by `build()`
pub(crate) enum FuzzyRulesSource {
    Builtin,
    File(PathBuf),
    Yaml(String),
    Table(Arc<FuzzyRules>),
}

pub struct RewriteConfigBuilder<State = ()> {
    pub(crate) rewrite_all_url: bool,
    pub(crate) remove_css_errors: bool,
    pub(crate) module_decl_path: String,
    pub(crate) notify_dynamic_imports: bool,
    pub(crate) fuzzy_rules: Option<FuzzyRulesSource>,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for RewriteConfigBuilder<()> {
    fn default() -> Self {
        Self {
            rewrite_all_url: DEFAULT_REWRITE_ALL_URL,
            remove_css_errors: false,
            module_decl_path: MODULE_DECL_PATH.to_string(),
            notify_dynamic_imports: true,
            fuzzy_rules: None,
            _phantom: PhantomData,
        }
    }
}

impl RewriteConfig {
    /// Create a builder for configuring a `RewriteConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> RewriteConfigBuilder<()> {
        RewriteConfigBuilder::default()
    }
}

impl RewriteConfigBuilder<()> {
    fn with_fuzzy_rules(self, source: FuzzyRulesSource) -> RewriteConfigBuilder<WithFuzzyRules> {
        RewriteConfigBuilder {
            rewrite_all_url: self.rewrite_all_url,
            remove_css_errors: self.remove_css_errors,
            module_decl_path: self.module_decl_path,
            notify_dynamic_imports: self.notify_dynamic_imports,
            fuzzy_rules: Some(source),
            _phantom: PhantomData,
        }
    }

    /// Use the fuzzy rule table compiled into the crate
    pub fn builtin_fuzzy_rules(self) -> RewriteConfigBuilder<WithFuzzyRules> {
        self.with_fuzzy_rules(FuzzyRulesSource::Builtin)
    }

    /// Load the fuzzy rule table from a YAML file when building
    ///
    /// # Example
    /// ```rust
    /// # use kodegen_tools_zimrewrite::config::RewriteConfig;
    /// # fn main() -> anyhow::Result<()> {
    /// let rules = tempfile::NamedTempFile::new()?;
    /// std::fs::write(
    ///     rules.path(),
    ///     "fuzzyRules:\n  - name: strip_query\n    pattern: (example\\.com/a)\\?.*\n    replace: \\1\n    tests:\n      - raw_url: example.com/a?b=c\n        fuzzified_url: example.com/a\n",
    /// )?;
    /// let config = RewriteConfig::builder()
    ///     .fuzzy_rules_file(rules.path())
    ///     .build()?;
    /// assert_eq!(config.fuzzy_rules().len(), 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn fuzzy_rules_file(self, path: impl Into<PathBuf>) -> RewriteConfigBuilder<WithFuzzyRules> {
        self.with_fuzzy_rules(FuzzyRulesSource::File(path.into()))
    }

    /// Parse the fuzzy rule table from a YAML document when building
    pub fn fuzzy_rules_yaml(self, yaml: impl Into<String>) -> RewriteConfigBuilder<WithFuzzyRules> {
        self.with_fuzzy_rules(FuzzyRulesSource::Yaml(yaml.into()))
    }

    /// Use an already validated fuzzy rule table
    pub fn fuzzy_rules(self, rules: impl Into<Arc<FuzzyRules>>) -> RewriteConfigBuilder<WithFuzzyRules> {
        self.with_fuzzy_rules(FuzzyRulesSource::Table(rules.into()))
    }
}

// Build method only available once the fuzzy rules are chosen
impl RewriteConfigBuilder<WithFuzzyRules> {
    pub fn build(self) -> Result<RewriteConfig> {
        let (fuzzy_rules, fuzzy_rules_file) = match self
            .fuzzy_rules
            .ok_or_else(|| anyhow!("fuzzy_rules is required"))?
        {
            FuzzyRulesSource::Builtin => (Arc::new(FuzzyRules::builtin().clone()), None),
            FuzzyRulesSource::File(path) => {
                let rules = FuzzyRules::from_yaml_file(&path).with_context(|| {
                    format!("Failed to load fuzzy rules from {}", path.display())
                })?;
                (Arc::new(rules), Some(path))
            }
            FuzzyRulesSource::Yaml(yaml) => (
                Arc::new(FuzzyRules::from_yaml_str(&yaml).context("Invalid fuzzy rules document")?),
                None,
            ),
            FuzzyRulesSource::Table(rules) => (rules, None),
        };

        if fuzzy_rules.is_empty() {
            tracing::warn!(
                "Fuzzy rule table is empty. \
                URL variants of dynamic media sites will be archived as distinct entries."
            );
        }

        let module_decl_path = ZimPath::new(self.module_decl_path)
            .map_err(|e| anyhow!("Invalid module_decl_path: {e}"))?;

        if !module_decl_path.value().ends_with(".js") {
            tracing::warn!(
                "module_decl_path '{}' does not name a .js file; browsers may refuse to load it as a module.",
                module_decl_path.value()
            );
        }

        Ok(RewriteConfig {
            rewrite_all_url: self.rewrite_all_url,
            remove_css_errors: self.remove_css_errors,
            module_decl_path,
            notify_dynamic_imports: self.notify_dynamic_imports,
            fuzzy_rules_file,
            fuzzy_rules,
        })
    }
}
