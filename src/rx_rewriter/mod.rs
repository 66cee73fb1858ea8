//! Ordered regex rule engine.
//!
//! An [`RxRewriter`] combines an ordered list of [`TransformationRule`]s into one
//! alternation regex and rewrites a text in a single left-to-right pass: every
//! non-overlapping leftmost match is handed to the action of the rule that produced
//! it, unmatched text is copied verbatim. Because all rules live in one pattern, a
//! span claimed by rule *i* is never reconsidered by a later rule; when several rules
//! could match at the same position the earliest one wins.
//!
//! Each rule is wrapped in a named group `rxrule<i>` to find out which one matched,
//! so rules must not use numbered backreferences and named groups must be unique
//! across the table. The combined pattern is compiled in multi-line mode (`^` and `$`
//! also match at line boundaries).
//!
//! Compilation is deferred to the first rewrite and compiled patterns are shared
//! process-wide, keyed by pattern text: rule tables built per document (with actions
//! capturing per-document state) only pay the closure allocation.
//!
//! Rules using lookaround run on `fancy-regex`'s backtracking VM, whose step budget
//! covers a whole search, including the scan over text no rule matches. Once a
//! search runs out of budget, the rest of the text is searched in bounded windows
//! cut at line ends, so a large script is still rewritten up to its last byte.

pub mod actions;
pub mod errors;

use std::cell::OnceCell;
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use fancy_regex::{Captures, Regex, RegexBuilder};

pub use actions::{add_prefix, add_suffix, m2str, replace, replace_all, replace_prefix_from};
pub use errors::{RuleError, RuleResult};

/// Default backtracking budget of one search
pub const DEFAULT_BACKTRACK_LIMIT: usize = 10_000_000;

/// Bytes at the end of a search window whose matches are left to the next window
const WINDOW_OVERLAP: usize = 1024;

/// Compiled combined patterns, keyed by backtrack limit and source text
static COMPILED_RULES: LazyLock<DashMap<(usize, String), Arc<Regex>>> =
    LazyLock::new(DashMap::new);

/// Rule action: computes the replacement of one match given the rewrite options.
pub type TransformationAction<'a, O> = Box<dyn Fn(&RuleMatch<'_>, &O) -> String + 'a>;

/// A pattern and the action applied to its matches.
pub struct TransformationRule<'a, O> {
    pattern: String,
    action: TransformationAction<'a, O>,
}

impl<'a, O> TransformationRule<'a, O> {
    pub fn new(
        pattern: impl Into<String>,
        action: impl Fn(&RuleMatch<'_>, &O) -> String + 'a,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            action: Box::new(action),
        }
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl<O> std::fmt::Debug for TransformationRule<'_, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformationRule")
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// One match of a rule, as seen by its action.
pub struct RuleMatch<'t> {
    captures: Captures<'t>,
    haystack: &'t str,
    group: usize,
    rule_index: usize,
}

impl<'t> RuleMatch<'t> {
    /// Text matched by the rule
    #[must_use]
    pub fn as_str(&self) -> &'t str {
        self.captures.get(self.group).map_or("", |m| m.as_str())
    }

    /// Byte offset of the match in the rewritten text
    #[must_use]
    pub fn start(&self) -> usize {
        self.captures.get(self.group).map_or(0, |m| m.start())
    }

    /// Byte offset just past the match
    #[must_use]
    pub fn end(&self) -> usize {
        self.captures.get(self.group).map_or(0, |m| m.end())
    }

    /// Text of a named group declared by the rule's pattern
    #[must_use]
    pub fn name(&self, name: &str) -> Option<&'t str> {
        self.captures.name(name).map(|m| m.as_str())
    }

    /// Character right before the match, if any
    #[must_use]
    pub fn preceding_char(&self) -> Option<char> {
        self.haystack[..self.start()].chars().next_back()
    }

    /// Text following the match
    #[must_use]
    pub fn following(&self) -> &'t str {
        &self.haystack[self.end()..]
    }

    /// Position of the matching rule in the table
    #[must_use]
    pub fn rule_index(&self) -> usize {
        self.rule_index
    }
}

struct CompiledRules {
    regex: Arc<Regex>,
    /// Capture group index of each rule's `rxrule<i>` wrapper
    groups: Vec<usize>,
}

/// Applies an ordered rule table to texts in one pass.
///
/// `O` is the options type handed to every action along with the match (use `()` when
/// actions need none).
pub struct RxRewriter<'a, O = ()> {
    rules: Vec<TransformationRule<'a, O>>,
    backtrack_limit: usize,
    compiled: OnceCell<CompiledRules>,
}

/// Outcome of looking for the next match
enum Search<'t> {
    Found(Captures<'t>),
    /// No match starts before this offset
    Skip(usize),
    Exhausted,
}

impl<'a, O> RxRewriter<'a, O> {
    #[must_use]
    pub fn new(rules: Vec<TransformationRule<'a, O>>) -> Self {
        Self {
            rules,
            backtrack_limit: DEFAULT_BACKTRACK_LIMIT,
            compiled: OnceCell::new(),
        }
    }

    /// Backtracking steps one search may take before falling back to windowed search.
    #[must_use]
    pub fn with_backtrack_limit(mut self, limit: usize) -> Self {
        self.backtrack_limit = limit.max(1);
        self.compiled = OnceCell::new();
        self
    }

    #[must_use]
    pub fn rules(&self) -> &[TransformationRule<'a, O>] {
        &self.rules
    }

    /// Compile the rule table now instead of on first use.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidPattern`] naming the first rule that does not compile.
    pub fn compile(&self) -> RuleResult<()> {
        self.compiled_rules().map(|_| ())
    }

    fn compiled_rules(&self) -> RuleResult<&CompiledRules> {
        if let Some(compiled) = self.compiled.get() {
            return Ok(compiled);
        }

        let pattern = format!(
            "(?m){}",
            self.rules
                .iter()
                .enumerate()
                .map(|(i, rule)| format!("(?P<rxrule{i}>{})", rule.pattern))
                .collect::<Vec<_>>()
                .join("|")
        );

        let key = (self.backtrack_limit, pattern);
        let cached = COMPILED_RULES
            .get(&key)
            .map(|entry| Arc::clone(entry.value()));
        let regex = match cached {
            Some(regex) => regex,
            None => {
                let regex = Arc::new(self.build_regex(&key.1)?);
                COMPILED_RULES.insert(key, Arc::clone(&regex));
                regex
            }
        };

        let mut groups = vec![0; self.rules.len()];
        for (index, name) in regex.capture_names().enumerate() {
            if let Some(rule) = name
                .and_then(|n| n.strip_prefix("rxrule"))
                .and_then(|n| n.parse::<usize>().ok())
                && let Some(slot) = groups.get_mut(rule)
            {
                *slot = index;
            }
        }

        Ok(self.compiled.get_or_init(|| CompiledRules { regex, groups }))
    }

    fn build_regex(&self, pattern: &str) -> RuleResult<Regex> {
        RegexBuilder::new(pattern)
            .backtrack_limit(self.backtrack_limit)
            .build()
            .map_err(|combined| {
                // Point at the culprit when a single rule is broken
                self.rules
                    .iter()
                    .enumerate()
                    .find_map(|(index, rule)| {
                        Regex::new(&rule.pattern)
                            .err()
                            .map(|source| RuleError::InvalidPattern {
                                index,
                                pattern: rule.pattern.clone(),
                                source: Box::new(source),
                            })
                    })
                    .unwrap_or_else(|| RuleError::InvalidCombination(Box::new(combined)))
            })
    }

    /// Rewrite `text`, handing `opts` to every action.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] when the rule table does not compile.
    pub fn rewrite(&self, text: &str, opts: &O) -> RuleResult<String> {
        if self.rules.is_empty() {
            return Ok(text.to_string());
        }

        let compiled = self.compiled_rules()?;
        let mut output = String::with_capacity(text.len());
        let mut last = 0;
        let mut pos = 0;
        let mut windowed = false;

        while pos <= text.len() {
            let search = if windowed {
                self.search_window(&compiled.regex, text, pos)
            } else {
                match compiled.regex.captures_from_pos(text, pos) {
                    Ok(Some(captures)) => Search::Found(captures),
                    Ok(None) => Search::Exhausted,
                    Err(e) => {
                        log::debug!(
                            "Rule engine search from byte {pos} gave up ({e}), searching by windows"
                        );
                        windowed = true;
                        continue;
                    }
                }
            };

            let captures = match search {
                Search::Found(captures) => captures,
                Search::Skip(next) => {
                    pos = next;
                    continue;
                }
                Search::Exhausted => break,
            };

            let Some((rule_index, group)) = compiled
                .groups
                .iter()
                .enumerate()
                .find(|(_, group)| captures.get(**group).is_some())
                .map(|(i, group)| (i, *group))
            else {
                break;
            };

            let rule_match = RuleMatch {
                captures,
                haystack: text,
                group,
                rule_index,
            };
            let (start, end) = (rule_match.start(), rule_match.end());
            output.push_str(&text[last..start]);
            output.push_str(&(self.rules[rule_index].action)(&rule_match, opts));
            last = end;
            pos = if end > start {
                end
            } else {
                next_char_boundary(text, end)
            };
        }

        output.push_str(&text[last..]);
        Ok(output)
    }

    /// Search from `pos` within a window sized after the backtrack budget.
    ///
    /// Matches starting in the last [`WINDOW_OVERLAP`] bytes of the window are left
    /// to the next window, which sees the text following them.
    fn search_window<'t>(&self, regex: &Regex, text: &'t str, pos: usize) -> Search<'t> {
        let window = (self.backtrack_limit / 16).max(4 * WINDOW_OVERLAP);
        let end = window_end(text, pos, window);
        let safe = if end == text.len() {
            end + 1
        } else {
            prev_char_boundary(text, end - WINDOW_OVERLAP).max(next_char_boundary(text, pos))
        };

        match regex.captures_from_pos(&text[..end], pos) {
            Ok(Some(captures)) if captures.get(0).is_some_and(|m| m.start() < safe) => {
                Search::Found(captures)
            }
            Ok(_) if end == text.len() => Search::Exhausted,
            Ok(_) => Search::Skip(safe),
            Err(e) => {
                log::warn!("Rule engine gave up on bytes {pos}..{end}, copied verbatim: {e}");
                if end == text.len() {
                    Search::Exhausted
                } else {
                    Search::Skip(safe)
                }
            }
        }
    }

    /// Rewrite UTF-8 encoded bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidUtf8`] when the input is not UTF-8, or any error of
    /// [`RxRewriter::rewrite`].
    pub fn rewrite_bytes(&self, bytes: &[u8], opts: &O) -> RuleResult<String> {
        self.rewrite(std::str::from_utf8(bytes)?, opts)
    }
}

/// End of the search window starting at `pos`: the last line end within `window`
/// bytes, or a plain character boundary for text without one
fn window_end(text: &str, pos: usize, window: usize) -> usize {
    let limit = pos.saturating_add(window);
    if limit >= text.len() {
        return text.len();
    }
    let limit = prev_char_boundary(text, limit);
    let min = prev_char_boundary(text, pos + window / 2);
    text[min..limit]
        .rfind('\n')
        .map_or(limit, |newline| min + newline + 1)
}

fn prev_char_boundary(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn next_char_boundary(text: &str, index: usize) -> usize {
    let mut next = index + 1;
    while next < text.len() && !text.is_char_boundary(next) {
        next += 1;
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewriter() -> RxRewriter<'static> {
        RxRewriter::new(vec![
            TransformationRule::new("foo", replace("oo", "456")),
            TransformationRule::new("bar", replace("oo", "456")),
            TransformationRule::new("<replaced>", replace("pla", "123")),
        ])
    }

    #[test]
    fn test_rx_rewriter() {
        let rewriter = rewriter();
        assert_eq!(rewriter.rewrite("pre<replaced>post", &()).expect("compiles"), "pre<re123ced>post");
        assert_eq!(rewriter.rewrite("foo", &()).expect("compiles"), "f456");
        assert_eq!(rewriter.rewrite("bar", &()).expect("compiles"), "bar");
        assert_eq!(rewriter.rewrite("blu", &()).expect("compiles"), "blu");
    }

    #[test]
    fn test_rx_rewriter_bytes() {
        assert_eq!(
            rewriter().rewrite_bytes(b"pre<replaced>post", &()).expect("compiles"),
            "pre<re123ced>post"
        );
        assert!(matches!(
            rewriter().rewrite_bytes(&[0xff, 0xfe], &()),
            Err(RuleError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn test_rx_rewriter_no_rules() {
        let rewriter: RxRewriter<'_> = RxRewriter::new(Vec::new());
        assert_eq!(rewriter.rewrite("pre<replaced>post", &()).expect("identity"), "pre<replaced>post");
    }

    fn lookbehind_rewriter(limit: usize) -> RxRewriter<'static> {
        RxRewriter::new(vec![TransformationRule::new(r"(?<!x)foo", replace_all("bar"))])
            .with_backtrack_limit(limit)
    }

    #[test]
    fn test_budget_overflow_keeps_rewriting_tail() {
        let body = "var a = b + c;\n".repeat(50_000);
        let text = format!("foo\n{body}xfoo foo\n");
        let output = lookbehind_rewriter(100_000).rewrite(&text, &()).expect("compiles");
        assert_eq!(output, format!("bar\n{body}xfoo bar\n"));
    }

    #[test]
    fn test_budget_overflow_without_line_ends() {
        let text = format!("{}foo", "\u{e9}a".repeat(200_000));
        let output = lookbehind_rewriter(100_000).rewrite(&text, &()).expect("compiles");
        assert!(output.ends_with("\u{e9}abar"));
        assert_eq!(output.len(), text.len());
    }

    #[test]
    fn test_windowed_search_finds_every_match() {
        let text: String = (0..60_000)
            .map(|i| {
                if i % 15_000 == 0 || i % 15_000 == 14_999 {
                    format!("{i} foo xfoo\n")
                } else {
                    format!("{i} a\n")
                }
            })
            .collect();
        let exact = lookbehind_rewriter(DEFAULT_BACKTRACK_LIMIT)
            .rewrite(&text, &())
            .expect("compiles");
        let windowed = lookbehind_rewriter(32_000).rewrite(&text, &()).expect("compiles");
        assert_eq!(windowed, exact);
        assert_eq!(exact.matches(" bar xfoo").count(), text.matches(" foo xfoo").count());
    }

    #[test]
    fn test_first_rule_wins() {
        let rewriter: RxRewriter<'_> = RxRewriter::new(vec![
            TransformationRule::new("ab", replace_all("1")),
            TransformationRule::new("abc", replace_all("2")),
        ]);
        assert_eq!(rewriter.rewrite("abc", &()).expect("compiles"), "1c");
    }

    #[test]
    fn test_invalid_pattern_names_rule() {
        let rewriter: RxRewriter<'_> = RxRewriter::new(vec![
            TransformationRule::new("ok", replace_all("1")),
            TransformationRule::new("(unclosed", replace_all("2")),
        ]);
        match rewriter.rewrite("ok", &()) {
            Err(RuleError::InvalidPattern { index, .. }) => assert_eq!(index, 1),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_options_reach_actions() {
        let rewriter: RxRewriter<'_, bool> = RxRewriter::new(vec![TransformationRule::new(
            "x",
            |m: &RuleMatch<'_>, upper: &bool| {
                if *upper { m.as_str().to_uppercase() } else { m.as_str().to_string() }
            },
        )]);
        assert_eq!(rewriter.rewrite("axa", &true).expect("compiles"), "aXa");
        assert_eq!(rewriter.rewrite("axa", &false).expect("compiles"), "axa");
    }
}
