//! Core configuration types for archive rewriting
//!
//! This module contains the `RewriteConfig` struct shared by every document rewritten
//! during one scrape.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::url_rewriting::{FuzzyRules, ZimPath};

fn builtin_fuzzy_rules() -> Arc<FuzzyRules> {
    Arc::new(FuzzyRules::builtin().clone())
}

/// Settings shared by the URL, CSS and JS rewriters of one scrape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteConfig {
    /// Make every http(s) reference archive-relative, archived or not.
    ///
    /// Applied to the URLs of the CSS and JS rewriters built from this config. When
    /// disabled, only references to paths known to the archive are rewritten and the
    /// others keep their absolute URL and are reported as missing.
    pub(crate) rewrite_all_url: bool,

    /// Drop unparseable top-level CSS items instead of falling back to regex rewriting
    pub(crate) remove_css_errors: bool,

    /// Archive path of the script exporting the wombat-wrapped globals to modules
    pub(crate) module_decl_path: ZimPath,

    /// Report modules loaded through `import("<literal>")` along with static imports
    pub(crate) notify_dynamic_imports: bool,

    /// YAML file the fuzzy rules were loaded from, `None` for built-in or inline rules
    pub(crate) fuzzy_rules_file: Option<PathBuf>,

    /// Loaded fuzzy rule table.
    ///
    /// Not serialized: a deserialized config carries the built-in table.
    #[serde(skip, default = "builtin_fuzzy_rules")]
    pub(crate) fuzzy_rules: Arc<FuzzyRules>,
}
