//! CSS rewriting.
//!
//! CSS is tokenized into a tree of component values, which is then grouped into rules
//! (stylesheets) or declarations (`style` attributes). The rewriter walks that tree,
//! replaces every URL with its archive-relative form and serializes the tree back.
//! Serialization keeps the source text wherever nothing was rewritten; strings are
//! normalized to double quotes.
//!
//! Input the parser rejects is rewritten by a regex fallback instead, which only
//! touches the `url(...)` occurrences and leaves the malformed CSS around them as-is.

pub mod ast;
pub mod errors;
pub mod fallback;
pub mod parser;
pub mod rewriter;
pub mod tokenizer;

pub use ast::{BlockKind, ComponentValue, Node, serialize};
pub use errors::{CssErrorKind, CssParseError, CssResult};
pub use fallback::FallbackCssRewriter;
pub use parser::{parse_declaration_list, parse_stylesheet};
pub use rewriter::CssRewriter;
pub use tokenizer::parse_component_values;
