//! Reusable rule actions.
//!
//! Each helper returns a closure usable as the action of a
//! [`TransformationRule`](super::TransformationRule); the options argument is ignored.

use super::RuleMatch;

/// Insert `prefix` before the matched text.
pub fn add_prefix<O>(prefix: impl Into<String>) -> impl Fn(&RuleMatch<'_>, &O) -> String {
    let prefix = prefix.into();
    move |m, _| format!("{prefix}{}", m.as_str())
}

/// Append `suffix` after the matched text.
pub fn add_suffix<O>(suffix: impl Into<String>) -> impl Fn(&RuleMatch<'_>, &O) -> String {
    let suffix = suffix.into();
    move |m, _| format!("{}{suffix}", m.as_str())
}

/// Replace the whole match by `value`.
pub fn replace_all<O>(value: impl Into<String>) -> impl Fn(&RuleMatch<'_>, &O) -> String {
    let value = value.into();
    move |_, _| value.clone()
}

/// Replace every occurrence of `src` inside the match by `target`.
pub fn replace<O>(
    src: impl Into<String>,
    target: impl Into<String>,
) -> impl Fn(&RuleMatch<'_>, &O) -> String {
    let src = src.into();
    let target = target.into();
    move |m, _| m.as_str().replace(&src, &target)
}

/// Keep the match up to the first occurrence of `from`, then append `prefix`.
///
/// Everything from `from` onwards is dropped; a match not containing `from` is kept.
pub fn replace_prefix_from<O>(
    prefix: impl Into<String>,
    from: impl Into<String>,
) -> impl Fn(&RuleMatch<'_>, &O) -> String {
    let prefix = prefix.into();
    let from = from.into();
    move |m, _| {
        let text = m.as_str();
        match text.find(&from) {
            Some(idx) => format!("{}{prefix}", &text[..idx]),
            None => text.to_string(),
        }
    }
}

/// Lift a plain text transformation into an action.
pub fn m2str<O>(f: impl Fn(&str) -> String) -> impl Fn(&RuleMatch<'_>, &O) -> String {
    move |m, _| f(m.as_str())
}

#[cfg(test)]
mod tests {
    use super::super::{RxRewriter, TransformationRule};
    use super::*;

    fn apply<F>(action: F) -> String
    where
        F: Fn(&RuleMatch<'_>, &()) -> String + 'static,
    {
        RxRewriter::new(vec![TransformationRule::new("<replaced>", action)])
            .rewrite("pre<replaced>post", &())
            .expect("rules compile")
    }

    #[test]
    fn test_single_operand_actions() {
        assert_eq!(apply(add_suffix("456")), "pre<replaced>456post");
        assert_eq!(apply(add_prefix("456")), "pre456<replaced>post");
        assert_eq!(apply(replace_all("456")), "pre456post");
    }

    #[test]
    fn test_two_operand_actions() {
        assert_eq!(apply(replace_prefix_from("456", "pl")), "pre<re456post");
        assert_eq!(apply(replace_prefix_from("456", "<repl")), "pre456post");
        assert_eq!(apply(replace("epla", "456")), "pre<r456ced>post");
    }

    #[test]
    fn test_m2str() {
        assert_eq!(apply(m2str(|s: &str| s.to_uppercase())), "pre<REPLACED>post");
    }
}
