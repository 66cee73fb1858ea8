//! CSS tokenizer producing nested component values.
//!
//! Follows the CSS Syntax Level 3 tokenization rules closely enough to locate every
//! `url()` reliably, while keeping the raw text of tokens the rewriter never touches.
//! Brackets are matched on the fly: `(`, `[` and `{` open blocks (or functions) that
//! always get closed on serialization, unmatched closers stay literal tokens.

use super::ast::{BlockKind, ComponentValue, serialize_string_value, serialize_url};
use super::errors::{CssErrorKind, CssParseError};

/// Nesting deeper than this is kept as flat literal tokens
const MAX_NESTING: usize = 128;

/// Tokenize `source` into a tree of component values.
#[must_use]
pub fn parse_component_values(source: &str) -> Vec<ComponentValue> {
    let mut tokenizer = Tokenizer {
        source,
        pos: 0,
        depth: 0,
    };
    tokenizer.consume_list(None)
}

struct Tokenizer<'s> {
    source: &'s str,
    pos: usize,
    depth: usize,
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0c')
}

fn is_newline(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\x0c')
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-'
}

fn is_non_printable(c: char) -> bool {
    matches!(c, '\x00'..='\x08' | '\x0b' | '\x0e'..='\x1f' | '\x7f')
}

fn is_valid_escape(first: Option<char>, second: Option<char>) -> bool {
    first == Some('\\') && second.is_some_and(|c| !is_newline(c))
}

impl Tokenizer<'_> {
    fn peek(&self, offset: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(offset)
    }

    fn rest(&self) -> &str {
        &self.source[self.pos..]
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek(0)?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, kind: CssErrorKind, at: usize) -> ComponentValue {
        ComponentValue::Error(CssParseError::at(kind, self.source, at))
    }

    fn consume_list(&mut self, end: Option<char>) -> Vec<ComponentValue> {
        let mut values = Vec::new();
        while let Some(c) = self.peek(0) {
            if Some(c) == end {
                self.bump();
                return values;
            }
            values.push(self.consume_value(c));
        }
        values
    }

    fn consume_value(&mut self, c: char) -> ComponentValue {
        let start = self.pos;
        match c {
            c if is_whitespace(c) => {
                while self.peek(0).is_some_and(is_whitespace) {
                    self.bump();
                }
                ComponentValue::Whitespace(self.source[start..self.pos].to_string())
            }
            '/' if self.peek(1) == Some('*') => self.consume_comment(),
            '"' | '\'' => self.consume_string(c),
            '#' if self.peek(1).is_some_and(is_name_char)
                || is_valid_escape(self.peek(1), self.peek(2)) =>
            {
                self.bump();
                self.consume_name();
                ComponentValue::Hash(self.source[start..self.pos].to_string())
            }
            '(' | '[' | '{' if self.depth < MAX_NESTING => {
                let kind = match c {
                    '(' => BlockKind::Parenthesis,
                    '[' => BlockKind::Square,
                    _ => BlockKind::Curly,
                };
                self.bump();
                self.depth += 1;
                let content = self.consume_list(Some(kind.close()));
                self.depth -= 1;
                ComponentValue::Block { kind, content }
            }
            _ if self.starts_number() => self.consume_numeric(),
            '-' if self.rest().starts_with("-->") => self.literal(3),
            '<' if self.rest().starts_with("<!--") => self.literal(4),
            '@' if self.starts_ident(1) => {
                self.bump();
                let name_start = self.pos;
                self.consume_name();
                ComponentValue::AtKeyword(self.source[name_start..self.pos].to_string())
            }
            _ if self.starts_ident(0) => self.consume_ident_like(),
            _ => self.literal(1),
        }
    }

    fn literal(&mut self, chars: usize) -> ComponentValue {
        let start = self.pos;
        for _ in 0..chars {
            self.bump();
        }
        ComponentValue::Literal(self.source[start..self.pos].to_string())
    }

    fn consume_comment(&mut self) -> ComponentValue {
        let body_start = self.pos + 2;
        match self.source[body_start..].find("*/") {
            Some(len) => {
                self.pos = body_start + len + 2;
                ComponentValue::Comment(self.source[body_start..body_start + len].to_string())
            }
            None => {
                self.pos = self.source.len();
                ComponentValue::Comment(self.source[body_start..].to_string())
            }
        }
    }

    fn starts_ident(&self, offset: usize) -> bool {
        match self.peek(offset) {
            Some('-') => {
                let next = self.peek(offset + 1);
                next.is_some_and(|c| is_name_start(c) || c == '-')
                    || is_valid_escape(next, self.peek(offset + 2))
            }
            Some('\\') => is_valid_escape(Some('\\'), self.peek(offset + 1)),
            Some(c) => is_name_start(c),
            None => false,
        }
    }

    fn starts_number(&self) -> bool {
        let digit = |c: Option<char>| c.is_some_and(|c| c.is_ascii_digit());
        match self.peek(0) {
            Some('+' | '-') => {
                digit(self.peek(1)) || (self.peek(1) == Some('.') && digit(self.peek(2)))
            }
            Some('.') => digit(self.peek(1)),
            c => digit(c),
        }
    }

    fn consume_digits(&mut self) {
        while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
    }

    fn consume_numeric(&mut self) -> ComponentValue {
        let start = self.pos;
        if matches!(self.peek(0), Some('+' | '-')) {
            self.bump();
        }
        self.consume_digits();
        if self.peek(0) == Some('.') && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            self.consume_digits();
        }
        if matches!(self.peek(0), Some('e' | 'E')) {
            let exponent = match self.peek(1) {
                Some('+' | '-') => self.peek(2).is_some_and(|c| c.is_ascii_digit()),
                c => c.is_some_and(|c| c.is_ascii_digit()),
            };
            if exponent {
                self.bump();
                if matches!(self.peek(0), Some('+' | '-')) {
                    self.bump();
                }
                self.consume_digits();
            }
        }
        if self.starts_ident(0) {
            self.consume_name();
        } else if self.peek(0) == Some('%') {
            self.bump();
        }
        ComponentValue::Numeric(self.source[start..self.pos].to_string())
    }

    /// Consume a name, returning its unescaped value
    fn consume_name(&mut self) -> String {
        let mut value = String::new();
        loop {
            match self.peek(0) {
                Some(c) if is_name_char(c) => {
                    value.push(c);
                    self.bump();
                }
                first @ Some('\\') if is_valid_escape(first, self.peek(1)) => {
                    value.push(self.consume_escape());
                }
                _ => return value,
            }
        }
    }

    /// Consume `\` and the escaped code point
    fn consume_escape(&mut self) -> char {
        self.bump();
        match self.peek(0) {
            Some(c) if c.is_ascii_hexdigit() => {
                let start = self.pos;
                while self.pos - start < 6 && self.peek(0).is_some_and(|c| c.is_ascii_hexdigit()) {
                    self.bump();
                }
                let code = u32::from_str_radix(&self.source[start..self.pos], 16).unwrap_or(0);
                if self.rest().starts_with("\r\n") {
                    self.pos += 2;
                } else if self.peek(0).is_some_and(is_whitespace) {
                    self.bump();
                }
                match code {
                    0 => char::REPLACEMENT_CHARACTER,
                    code => char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER),
                }
            }
            Some(_) => self.bump().unwrap_or(char::REPLACEMENT_CHARACTER),
            None => char::REPLACEMENT_CHARACTER,
        }
    }

    fn consume_ident_like(&mut self) -> ComponentValue {
        let start = self.pos;
        let name = self.consume_name();
        let raw = self.source[start..self.pos].to_string();

        if self.peek(0) != Some('(') || self.depth >= MAX_NESTING {
            return ComponentValue::Ident(raw);
        }

        if name.eq_ignore_ascii_case("url") {
            let after_paren = self.rest()[1..].trim_start_matches(is_whitespace);
            if !after_paren.starts_with(['"', '\'']) {
                self.bump();
                return self.consume_url(start);
            }
        }

        self.bump();
        self.depth += 1;
        let arguments = self.consume_list(Some(')'));
        self.depth -= 1;
        ComponentValue::Function {
            name: raw,
            arguments,
        }
    }

    /// Consume an unquoted url token, right after `url(`
    fn consume_url(&mut self, start: usize) -> ComponentValue {
        while self.peek(0).is_some_and(is_whitespace) {
            self.bump();
        }
        let mut value = String::new();
        loop {
            match self.peek(0) {
                None => {
                    // Unterminated at EOF: written back without closing parenthesis
                    let representation = format!("url({}", serialize_url(&value));
                    return ComponentValue::Url {
                        value,
                        representation,
                    };
                }
                Some(')') => {
                    self.bump();
                    return ComponentValue::url(value);
                }
                Some(c) if is_whitespace(c) => {
                    while self.peek(0).is_some_and(is_whitespace) {
                        self.bump();
                    }
                    match self.peek(0) {
                        Some(')') => {
                            self.bump();
                            return ComponentValue::url(value);
                        }
                        None => {}
                        Some(_) => return self.consume_bad_url(start),
                    }
                }
                Some('"' | '\'' | '(') => return self.consume_bad_url(start),
                Some(c) if is_non_printable(c) => return self.consume_bad_url(start),
                first @ Some('\\') => {
                    if is_valid_escape(first, self.peek(1)) {
                        value.push(self.consume_escape());
                    } else {
                        return self.consume_bad_url(start);
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.bump();
                }
            }
        }
    }

    fn consume_bad_url(&mut self, start: usize) -> ComponentValue {
        loop {
            match self.peek(0) {
                None => break,
                Some(')') => {
                    self.bump();
                    break;
                }
                first @ Some('\\') if is_valid_escape(first, self.peek(1)) => {
                    self.consume_escape();
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
        self.error(CssErrorKind::BadUrl, start)
    }

    fn consume_string(&mut self, quote: char) -> ComponentValue {
        let start = self.pos;
        self.bump();
        let mut value = String::new();
        loop {
            match self.peek(0) {
                None => {
                    // Unterminated at EOF: written back without closing quote
                    let representation = format!("\"{}", serialize_string_value(&value));
                    return ComponentValue::String {
                        value,
                        representation,
                    };
                }
                Some(c) if c == quote => {
                    self.bump();
                    return ComponentValue::string(value);
                }
                Some(c) if is_newline(c) => return self.error(CssErrorKind::BadString, start),
                Some('\\') => match self.peek(1) {
                    None => {
                        self.bump();
                    }
                    Some(c) if is_newline(c) => {
                        self.bump();
                        if self.rest().starts_with("\r\n") {
                            self.pos += 2;
                        } else {
                            self.bump();
                        }
                    }
                    Some(_) => value.push(self.consume_escape()),
                },
                Some(c) => {
                    value.push(c);
                    self.bump();
                }
            }
        }
    }
}
