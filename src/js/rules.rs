//! Fixed JS rule table.
//!
//! The rules intercept what replayed scripts use to reach outside the archive: `eval`,
//! assignments to `location`, `this` when it may be the global object, `postMessage`
//! and dynamic `import()`. Rule order matters: an earlier rule claiming a span hides it
//! from the later ones (`async import(` must be claimed before the generic `import(`).

use std::sync::LazyLock;

use regex::Regex;

use super::rewriter::JsRewriteOptions;
use crate::rx_rewriter::{
    RuleMatch, TransformationRule, add_prefix, m2str, replace, replace_prefix_from,
};

/// Globals shadowed by the wombat runtime
pub const GLOBAL_OVERRIDES: [&str; 9] = [
    "window",
    "globalThis",
    "self",
    "document",
    "location",
    "top",
    "parent",
    "frames",
    "opener",
];

/// Replacement for a `this` that may be the global object
pub const THIS_RW: &str = "_____WB$wombat$check$this$function_____(this)";

const ASSIGN_FUNC: &str = "_____WB$wombat$assign$function_____";

/// Turns `location = x` into an assignment of the checked location's `href`
const CHECK_LOC: &str =
    "((self.__WB_check_loc && self.__WB_check_loc(location, arguments)) || {}).href = ";

/// Replaces `eval(` invocations
const EVAL_STR: &str = "WB_wombat_runEval2((_______eval_arg, isGlobal) => { var ge = eval; return isGlobal ? ge(_______eval_arg) : eval(_______eval_arg); }).eval(this, (function() { return arguments })(),";

const IMPORT_RW: &str = "____wb_rewrite_import__";

/// Whole `import`/`export` statement prelude of a module, up to its first quote or space
pub(super) const IMPORT_EXPORT_MATCH_PATTERN: &str = r#"(^|;)\s*?(?:im|ex)port(?:['"\s]*(?:[\w*$\{\}\s,]+from\s*)?['"\s]?['"\s])(?:.*?)['"\s]"#;

/// http(s), relative or absolute target inside an `import`/`export` prelude
pub(super) static IMPORT_EXPORT_HTTP_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"((?:im|ex)port(?:['"\s]*(?:[\w*$\{\}\s,]+from\s*)?['"\s]?['"\s]))((?:https?|[./]).*?)(['"\s])"#,
    )
    .expect("IMPORT_EXPORT_HTTP_RX: hardcoded regex is valid")
});

/// Any standalone use of a protected global
pub(super) static GLOBALS_RX: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives: Vec<String> = GLOBAL_OVERRIDES
        .iter()
        .map(|name| format!(r"(?:^|[^$.])\b{name}\b(?:$|[^$])"))
        .collect();
    Regex::new(&alternatives.join("|")).expect("GLOBALS_RX: hardcoded regex is valid")
});

/// String literal opening the arguments of a dynamic `import(`
static IMPORT_LITERAL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(?:"(?P<dq>[^"\n]*)"|'(?P<sq>[^'\n]*)'|`(?P<bq>[^`$]*)`)"#)
        .expect("IMPORT_LITERAL_RX: hardcoded regex is valid")
});

/// Local declarations prepended to scripts using protected globals.
///
/// Closed by [`WRAP_SUFFIX`].
pub(super) static WRAP_PREFIX: LazyLock<String> = LazyLock::new(|| {
    let mut buffer = format!(
        "var {ASSIGN_FUNC} = function(name) {{return (self._wb_wombat && self._wb_wombat.local_init && self._wb_wombat.local_init(name)) || self[name]; }};\n\
         if (!self.__WB_pmw) {{ self.__WB_pmw = function(obj) {{ this.__WB_source = obj; return this; }} }}\n{{\n"
    );
    for name in GLOBAL_OVERRIDES {
        buffer.push_str(&format!("let {name} = {ASSIGN_FUNC}(\"{name}\");\n"));
    }
    buffer.push_str("let arguments;\n\n");
    buffer
});

pub(super) const WRAP_SUFFIX: &str = "\n}";

/// Append `suffix` unless the match is a property access (preceded by `.` or `$`).
fn add_suffix_non_prop(
    suffix: &'static str,
) -> impl Fn(&RuleMatch<'_>, &JsRewriteOptions) -> String {
    move |m, _| match m.preceding_char() {
        Some('.' | '$') => m.as_str().to_string(),
        _ => format!("{}{suffix}", m.as_str()),
    }
}

fn replace_this() -> impl Fn(&RuleMatch<'_>, &JsRewriteOptions) -> String {
    replace::<JsRewriteOptions>("this", THIS_RW)
}

/// Replace `this` unless it is a property of some object.
fn replace_this_non_prop() -> impl Fn(&RuleMatch<'_>, &JsRewriteOptions) -> String {
    |m, _| match m.preceding_char() {
        // Start of line: a `;` keeps the previous statement from swallowing the call
        Some('\n') => m.as_str().replace("this", &format!(";{THIS_RW}")),
        Some('.' | '$') => m.as_str().to_string(),
        _ => m.as_str().replace("this", THIS_RW),
    }
}

/// Route a dynamic `import(` through the wombat import hook.
///
/// `on_import` receives the literal specifier when the call starts with one.
fn replace_import<'a>(
    on_import: impl Fn(&str) + 'a,
) -> impl Fn(&RuleMatch<'_>, &JsRewriteOptions) -> String + 'a {
    move |m, opts| {
        if let Some(specifier) = import_literal(m.following()) {
            on_import(specifier);
        }
        let base_url = if opts.is_module {
            "import.meta.url, "
        } else {
            "\"\", "
        };
        format!("{}{base_url}", m.as_str().replace("import", IMPORT_RW))
    }
}

/// Literal specifier at the start of `args`, when it addresses a fetchable script
fn import_literal(args: &str) -> Option<&str> {
    let captures = IMPORT_LITERAL_RX.captures(args)?;
    let specifier = captures
        .name("dq")
        .or_else(|| captures.name("sq"))
        .or_else(|| captures.name("bq"))?
        .as_str();
    let fetchable = specifier.starts_with("http://")
        || specifier.starts_with("https://")
        || specifier.starts_with('.')
        || specifier.starts_with('/');
    fetchable.then_some(specifier)
}

/// The fixed rule table, in priority order.
///
/// `on_import` is told about the literal specifiers of dynamic imports.
pub(super) fn create_js_rules<'a>(
    on_import: impl Fn(&str) + 'a,
) -> Vec<TransformationRule<'a, JsRewriteOptions>> {
    vec![
        // `eval(...)` invocation
        TransformationRule::new(
            r"(?<!static)(?<!function)(?<!\})(?:^|\s)\beval\s*\(",
            replace_prefix_from::<JsRewriteOptions>(EVAL_STR, "eval"),
        ),
        TransformationRule::new(
            r"\([\w]+,\s*eval\)\(",
            m2str::<JsRewriteOptions>(|_| format!(" {EVAL_STR}")),
        ),
        // `x = eval`, no invocation
        TransformationRule::new(
            r"[=]\s*\beval\b(?![(:.$])",
            replace::<JsRewriteOptions>("eval", "self.eval"),
        ),
        TransformationRule::new(r"var\s+self", replace::<JsRewriteOptions>("var", "let")),
        TransformationRule::new(
            r"\.postMessage\b\(",
            add_prefix::<JsRewriteOptions>(".__WB_pmw(self)"),
        ),
        TransformationRule::new(
            r"(?:^|[^$.+*/%^-])\s?\blocation\b\s*[=]\s*(?![\s\d=>])",
            add_suffix_non_prop(CHECK_LOC),
        ),
        TransformationRule::new(r"\breturn\s+this\b\s*(?![\s\w.$])", replace_this()),
        // `this.<global>`
        TransformationRule::new(
            format!(
                r"[^$.]\s?\bthis\b(?=(?:\.(?:{})\b))",
                GLOBAL_OVERRIDES.join("|")
            ),
            replace_this_non_prop(),
        ),
        // `= this`, `, this`
        TransformationRule::new(r"[=,]\s*\bthis\b\s*(?![\s\w:.$])", replace_this()),
        // `})(this)`
        TransformationRule::new(r"\}(?:\s*\))?\s*\(this\)", replace_this()),
        // `this` in `&&` / `||` expressions
        TransformationRule::new(
            r"[^|&][|&]{2}\s*this\b\s*(?![|\s&.$](?:[^|&]|$))",
            replace_this(),
        ),
        // Methods named `import`, claimed here so the next rule does not see them
        TransformationRule::new(
            r"async\s+import\s*\(",
            m2str::<JsRewriteOptions>(str::to_string),
        ),
        TransformationRule::new(
            r"[^$.]\bimport\s*\([^)]*\)\s*\{",
            m2str::<JsRewriteOptions>(str::to_string),
        ),
        TransformationRule::new(r"[^$.]\bimport\s*\(", replace_import(on_import)),
    ]
}
