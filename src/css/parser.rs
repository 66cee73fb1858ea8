//! Stylesheet and declaration-list parsing on top of component values.

use std::iter::Peekable;
use std::vec::IntoIter;

use super::ast::{BlockKind, ComponentValue, Node};
use super::errors::{CssErrorKind, CssParseError};
use super::tokenizer::parse_component_values;

type Values = Peekable<IntoIter<ComponentValue>>;

/// Parse a standalone stylesheet into rules.
///
/// Rule blocks are kept as raw component values (no declaration parsing), so a
/// malformed declaration inside a rule does not make the stylesheet invalid.
#[must_use]
pub fn parse_stylesheet(source: &str) -> Vec<Node> {
    let mut values = parse_component_values(source).into_iter().peekable();
    let mut nodes = Vec::new();

    while let Some(value) = values.next() {
        let node = match value {
            ComponentValue::Whitespace(_) | ComponentValue::Comment(_) => Node::Value(value),
            v if v.is_literal("<!--") || v.is_literal("-->") => Node::Value(v),
            ComponentValue::AtKeyword(name) => consume_at_rule(name, &mut values),
            first => consume_qualified_rule(first, &mut values, source),
        };
        nodes.push(node);
    }
    nodes
}

/// Parse the content of a `style` attribute (a list of declarations).
#[must_use]
pub fn parse_declaration_list(source: &str) -> Vec<Node> {
    let mut values = parse_component_values(source).into_iter().peekable();
    let mut nodes = Vec::new();

    while let Some(value) = values.next() {
        let node = match value {
            ComponentValue::Whitespace(_) | ComponentValue::Comment(_) => Node::Value(value),
            ComponentValue::AtKeyword(name) => consume_at_rule(name, &mut values),
            v if v.is_literal(";") => continue,
            first => consume_declaration(first, &mut values, source),
        };
        nodes.push(node);
    }
    nodes
}

fn consume_at_rule(name: String, values: &mut Values) -> Node {
    let mut prelude = Vec::new();
    let mut content = None;
    for value in values.by_ref() {
        match value {
            v if v.is_literal(";") => break,
            ComponentValue::Block {
                kind: BlockKind::Curly,
                content: block,
            } => {
                content = Some(block);
                break;
            }
            v => prelude.push(v),
        }
    }
    Node::AtRule {
        name,
        prelude,
        content,
    }
}

fn consume_qualified_rule(first: ComponentValue, values: &mut Values, source: &str) -> Node {
    if let ComponentValue::Block {
        kind: BlockKind::Curly,
        content,
    } = first
    {
        return Node::QualifiedRule {
            prelude: Vec::new(),
            content,
        };
    }

    let mut prelude = vec![first];
    for value in values.by_ref() {
        match value {
            ComponentValue::Block {
                kind: BlockKind::Curly,
                content,
            } => return Node::QualifiedRule { prelude, content },
            v => prelude.push(v),
        }
    }
    Node::Error(CssParseError::at(CssErrorKind::UnexpectedEof, source, source.len()))
}

fn consume_declaration(first: ComponentValue, values: &mut Values, source: &str) -> Node {
    let mut tokens = vec![first];
    while let Some(value) = values.next_if(|v| !v.is_literal(";")) {
        tokens.push(value);
    }
    values.next_if(|v| v.is_literal(";"));

    let mut tokens = tokens.into_iter();
    let Some(ComponentValue::Ident(name)) = tokens.next() else {
        return invalid_declaration(source);
    };

    let mut tokens = tokens.skip_while(ComponentValue::is_whitespace_or_comment);
    match tokens.next() {
        Some(v) if v.is_literal(":") => Node::Declaration {
            name,
            value: tokens.collect(),
        },
        _ => invalid_declaration(source),
    }
}

fn invalid_declaration(source: &str) -> Node {
    // Component values do not keep offsets; report at end of input
    Node::Error(CssParseError::at(
        CssErrorKind::InvalidDeclaration,
        source,
        source.len(),
    ))
}
