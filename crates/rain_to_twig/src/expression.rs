//! Expression-level rewriting shared by the tag passes.
//!
//! RainTPL expressions are PHP-flavored: `$`-sigiled variables, `->` member
//! access, `.` string concatenation, `!`/`&&`/`||` logic. Twig wants bare
//! identifiers, `.` member access, `~` concatenation and word operators.
//! [`ExpressionTranslator`] performs that token-level rewrite; it never
//! validates the expression, it only rewrites the tokens it recognizes.

use regex::Regex;

use crate::errors::{compile, TranslateError};

#[cfg(test)]
#[path = "expression_tests.rs"]
mod tests;

/// RainTPL filter name -> Twig filter name.
///
/// Names missing from this table pass through unchanged, so templates using
/// custom Twig filters directly keep working.
const FILTER_MAP: &[(&str, &str)] = &[
    ("count", "length"),
    ("sizeof", "length"),
    ("upper", "upper"),
    ("lower", "lower"),
    ("capitalize", "capitalize"),
    ("ucfirst", "capitalize"),
    ("strtoupper", "upper"),
    ("strtolower", "lower"),
    ("nl2br", "nl2br"),
    ("escape", "escape"),
    ("e", "escape"),
    ("trim", "trim"),
    ("strip_tags", "striptags"),
    ("json_encode", "json_encode"),
    ("json", "json_encode"),
    ("reverse", "reverse"),
    ("sort", "sort"),
    ("keys", "keys"),
    ("values", "values"),
    ("first", "first"),
    ("last", "last"),
    ("join", "join"),
    ("split", "split"),
    ("default", "default"),
    ("date", "date"),
    ("abs", "abs"),
    ("round", "round"),
    ("floor", "floor"),
    ("ceil", "ceil"),
    ("number_format", "number_format"),
];

/// PHP functions that Twig exposes as filters rather than callables.
///
/// The value is the complete filter chain to append after the translated
/// argument expression.
const FUNCTION_FILTERS: &[(&str, &str)] = &[
    ("addslashes", "escape('js')"),
    ("htmlspecialchars", "escape"),
    ("strip_tags", "striptags"),
    ("nl2br", "nl2br"),
    ("json_encode", "json_encode|raw"),
    ("urlencode", "url_encode"),
];

/// Returns the Twig filter chain replacing a well-known PHP function call,
/// or `None` if the function should be emitted as a direct call.
pub(crate) fn function_filter(name: &str) -> Option<&'static str> {
    FUNCTION_FILTERS
        .iter()
        .find(|(func, _)| *func == name)
        .map(|(_, filter)| *filter)
}

/// Token-level RainTPL-to-Twig expression rewriter.
pub(crate) struct ExpressionTranslator {
    sigil: Regex,
    concat_after_literal: Regex,
    concat_before_literal: Regex,
    filter_segment: Regex,
}

impl ExpressionTranslator {
    pub(crate) fn new() -> Result<Self, TranslateError> {
        Ok(Self {
            sigil: compile(r"\$([a-zA-Z_][a-zA-Z0-9_]*)")?,
            // 'text'.$var and $var.'text' style concatenation without spaces,
            // including constants: FS_MYDOCS.'images/logo.png'
            concat_after_literal: compile(r#"(['"])\.([A-Za-z_])"#)?,
            concat_before_literal: compile(r#"([A-Za-z0-9_)])\.(['"])"#)?,
            filter_segment: compile(r"\|(\w+)")?,
        })
    }

    /// Rewrites a RainTPL expression to its Twig spelling.
    pub(crate) fn translate(&self, expr: &str) -> String {
        let expr = self.sigil.replace_all(expr, "$1");
        let expr = expr.replace("->", ".");
        let expr = expr.replace(" . ", " ~ ");
        let expr = self.concat_after_literal.replace_all(&expr, "$1 ~ $2");
        let expr = self.concat_before_literal.replace_all(&expr, "$1 ~ $2");
        let expr = rewrite_negation(&expr);
        let expr = expr.replace("&&", "and").replace("||", "or");
        let expr = expr.replace(" AND ", " and ").replace(" OR ", " or ");
        expr.trim().to_string()
    }

    /// Remaps the `|filter` segments of an expression through [`FILTER_MAP`].
    ///
    /// A name is only remapped when it is a whole filter segment, i.e. it
    /// runs to the end of the expression or up to the next `|`. A name
    /// followed by anything else (an argument list, an operand) is left
    /// alone.
    pub(crate) fn remap_filters(&self, expr: &str) -> String {
        let mut out = String::with_capacity(expr.len());
        let mut last = 0;
        for caps in self.filter_segment.captures_iter(expr) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&expr[last..whole.start()]);
            last = whole.end();

            let name = &caps[1];
            let at_boundary = matches!(expr[whole.end()..].chars().next(), None | Some('|'));
            match FILTER_MAP.iter().find(|(rain, _)| *rain == name) {
                Some((_, twig)) if at_boundary => {
                    out.push('|');
                    out.push_str(twig);
                }
                _ => out.push_str(whole.as_str()),
            }
        }
        out.push_str(&expr[last..]);
        out
    }
}

/// Replaces logical negation `!` with Twig's `not `, leaving `!=` and `!==`
/// comparisons alone.
fn rewrite_negation(expr: &str) -> String {
    let mut out = String::with_capacity(expr.len());
    let mut chars = expr.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '!' && chars.peek() != Some(&'=') {
            out.push_str("not ");
        } else {
            out.push(ch);
        }
    }
    out
}
