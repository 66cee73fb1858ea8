//! Shared constants for the rewriters
//!
//! Values that several modules (and the configuration defaults) must agree on.

/// Archive path of the ES module exposing the wombat-wrapped globals.
///
/// The archive writer is expected to store the companion script at this path; module
/// scripts import the protected globals from it instead of being brace-wrapped.
pub const MODULE_DECL_PATH: &str = "_zim_static/__wb_module_decl.js";

/// Maximum number of characters of a document quoted in a log line.
pub const MAX_LOGGED_CONTENT_CHARS: usize = 200;

/// Default for `rewrite_all_url`: every http(s) reference is made archive-relative.
pub const DEFAULT_REWRITE_ALL_URL: bool = true;
