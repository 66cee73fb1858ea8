//! Getter methods for `RewriteConfig`

use std::path::Path;

use super::types::RewriteConfig;
use crate::url_rewriting::{FuzzyRules, ZimPath};

impl RewriteConfig {
    #[must_use]
    pub fn rewrite_all_url(&self) -> bool {
        self.rewrite_all_url
    }

    #[must_use]
    pub fn remove_css_errors(&self) -> bool {
        self.remove_css_errors
    }

    #[must_use]
    pub fn module_decl_path(&self) -> &ZimPath {
        &self.module_decl_path
    }

    #[must_use]
    pub fn notify_dynamic_imports(&self) -> bool {
        self.notify_dynamic_imports
    }

    /// YAML file the fuzzy rules were loaded from, if any
    #[must_use]
    pub fn fuzzy_rules_file(&self) -> Option<&Path> {
        self.fuzzy_rules_file.as_deref()
    }

    #[must_use]
    pub fn fuzzy_rules(&self) -> &FuzzyRules {
        &self.fuzzy_rules
    }
}
