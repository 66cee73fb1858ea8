//! CSS syntax tree and its serialization.
//!
//! The tree keeps enough of the source to be written back faithfully: whitespace,
//! comments, identifiers and numbers keep their raw text. Strings and `url()` tokens
//! carry both their decoded value (what the URL rewriter sees) and the representation
//! written back, so rewriting a URL only means replacing both.

use super::errors::{CssParseError, CssResult};

/// Bracket pair of a simple block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Parenthesis,
    Square,
    Curly,
}

impl BlockKind {
    #[must_use]
    pub fn open(self) -> char {
        match self {
            Self::Parenthesis => '(',
            Self::Square => '[',
            Self::Curly => '{',
        }
    }

    #[must_use]
    pub fn close(self) -> char {
        match self {
            Self::Parenthesis => ')',
            Self::Square => ']',
            Self::Curly => '}',
        }
    }
}

/// One component value: a preserved token, a function or a block.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentValue {
    Whitespace(String),
    /// Comment text between `/*` and `*/`
    Comment(String),
    Ident(String),
    /// At-keyword name, without `@`
    AtKeyword(String),
    /// Hash token, including `#`
    Hash(String),
    /// Number, percentage or dimension as written
    Numeric(String),
    /// Single delimiter, `:`, `;`, `,`, CDO/CDC or an unmatched closing bracket
    Literal(String),
    String {
        value: String,
        representation: String,
    },
    /// Unquoted `url(...)` token
    Url {
        value: String,
        representation: String,
    },
    Function {
        /// Function name as written
        name: String,
        arguments: Vec<ComponentValue>,
    },
    Block {
        kind: BlockKind,
        content: Vec<ComponentValue>,
    },
    Error(CssParseError),
}

impl ComponentValue {
    #[must_use]
    pub fn is_whitespace_or_comment(&self) -> bool {
        matches!(self, Self::Whitespace(_) | Self::Comment(_))
    }

    #[must_use]
    pub fn is_literal(&self, text: &str) -> bool {
        matches!(self, Self::Literal(l) if l == text)
    }

    /// Quoted string token representation of `value`.
    #[must_use]
    pub fn string(value: String) -> Self {
        let representation = format!("\"{}\"", serialize_string_value(&value));
        Self::String {
            value,
            representation,
        }
    }

    /// Unquoted `url()` token representation of `value`.
    #[must_use]
    pub fn url(value: String) -> Self {
        let representation = format!("url({})", serialize_url(&value));
        Self::Url {
            value,
            representation,
        }
    }

    pub(crate) fn serialize_to(&self, out: &mut String) -> CssResult<()> {
        match self {
            Self::Whitespace(raw)
            | Self::Ident(raw)
            | Self::Hash(raw)
            | Self::Numeric(raw)
            | Self::Literal(raw) => out.push_str(raw),
            Self::Comment(text) => {
                out.push_str("/*");
                out.push_str(text);
                out.push_str("*/");
            }
            Self::AtKeyword(name) => {
                out.push('@');
                out.push_str(name);
            }
            Self::String { representation, .. } | Self::Url { representation, .. } => {
                out.push_str(representation);
            }
            Self::Function { name, arguments } => {
                out.push_str(name);
                out.push('(');
                serialize_values(arguments, out)?;
                out.push(')');
            }
            Self::Block { kind, content } => {
                out.push(kind.open());
                serialize_values(content, out)?;
                out.push(kind.close());
            }
            Self::Error(e) => return Err(e.clone()),
        }
        Ok(())
    }
}

/// A top-level item of a stylesheet or declaration list.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Whitespace, comments and CDO/CDC kept verbatim between rules
    Value(ComponentValue),
    QualifiedRule {
        prelude: Vec<ComponentValue>,
        content: Vec<ComponentValue>,
    },
    AtRule {
        name: String,
        prelude: Vec<ComponentValue>,
        /// `None` for statement at-rules ending with `;`
        content: Option<Vec<ComponentValue>>,
    },
    Declaration {
        name: String,
        value: Vec<ComponentValue>,
    },
    Error(CssParseError),
}

impl Node {
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    fn serialize_to(&self, out: &mut String) -> CssResult<()> {
        match self {
            Self::Value(value) => value.serialize_to(out)?,
            Self::QualifiedRule { prelude, content } => {
                serialize_values(prelude, out)?;
                out.push('{');
                serialize_values(content, out)?;
                out.push('}');
            }
            Self::AtRule {
                name,
                prelude,
                content,
            } => {
                out.push('@');
                out.push_str(name);
                serialize_values(prelude, out)?;
                match content {
                    Some(content) => {
                        out.push('{');
                        serialize_values(content, out)?;
                        out.push('}');
                    }
                    None => out.push(';'),
                }
            }
            Self::Declaration { name, value } => {
                out.push_str(name);
                out.push(':');
                serialize_values(value, out)?;
                out.push(';');
            }
            Self::Error(e) => return Err(e.clone()),
        }
        Ok(())
    }
}

pub(crate) fn serialize_values(values: &[ComponentValue], out: &mut String) -> CssResult<()> {
    values.iter().try_for_each(|value| value.serialize_to(out))
}

/// Serialize top-level nodes back to CSS text.
///
/// # Errors
///
/// Returns the first [`CssParseError`] met anywhere in the tree.
pub fn serialize(nodes: &[Node]) -> CssResult<String> {
    let mut out = String::new();
    for node in nodes {
        node.serialize_to(&mut out)?;
    }
    Ok(out)
}

/// Escape a value for use between double quotes.
#[must_use]
pub fn serialize_string_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\A "),
            c => out.push(c),
        }
    }
    out
}

/// Escape a value for use in `url()` (quoted or not).
#[must_use]
pub fn serialize_url(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            ' ' => out.push_str("\\ "),
            '\t' => out.push_str("\\9 "),
            '\n' => out.push_str("\\A "),
            '\x0c' => out.push_str("\\C "),
            '\r' => out.push_str("\\D "),
            '(' => out.push_str("\\28 "),
            ')' => out.push_str("\\29 "),
            c => out.push(c),
        }
    }
    out
}
