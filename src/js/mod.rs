//! JavaScript rewriting.
//!
//! Replayed scripts run inside the archive viewer next to the wombat runtime, which
//! intercepts network access and navigation. Wombat can only see what goes through
//! the objects it controls, so scripts are rewritten to reach the browser globals,
//! `this`, `eval`, `location` and dynamic imports through wombat hooks. The rewriting
//! is a single pass of the [`RxRewriter`](crate::rx_rewriter::RxRewriter) over a fixed
//! rule table; no JS parsing takes place.

pub mod module_sink;
pub mod rewriter;
pub mod rules;

pub use module_sink::ModuleSink;
pub use rewriter::{JsRewriteOptions, JsRewriter};
pub use rules::{GLOBAL_OVERRIDES, THIS_RW};
