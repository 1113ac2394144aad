//! Loop-marker rewriting.
//!
//! RainTPL loops come in three spellings: a C-style counting loop
//! (`{loop="$i=1;$i<=$n;$i++"}`), an explicit-variable loop
//! (`{loop="$list" as $key => $value}`), and an implicit loop
//! (`{loop="$list"}`) whose iteration variables are numbered by nesting
//! depth (`key1`/`value1`, `key2`/`value2`, ...). All three, plus the
//! `{/loop}` close marker, are handled in one stateful scan so the depth
//! counter stays consistent across the whole template.

use regex::Regex;

use crate::errors::{compile, TranslateError};
use crate::expression::ExpressionTranslator;

#[cfg(test)]
#[path = "loops_tests.rs"]
mod tests;

pub(crate) struct LoopRewriter {
    marker: Regex,
    c_style: Regex,
}

impl LoopRewriter {
    pub(crate) fn new() -> Result<Self, TranslateError> {
        Ok(Self {
            marker: compile(
                r#"\{loop="(?P<variable>\$?[^"]*)"(?: as (?P<key>\$.*?)(?: => (?P<value>\$.*?))?)?\}|(?P<close>\{/loop\})"#,
            )?,
            // $i=1;$i<=$n;$i++ with the same identifier in all three clauses;
            // identifier equality is checked in code, the pattern only
            // captures the three occurrences.
            c_style: compile(r"^\$(\w+)\s*=\s*(\d+)\s*;\s*\$(\w+)\s*(<=?)\s*([^;]+)\s*;\s*\$(\w+)\+\+$")?,
        })
    }

    /// Rewrites every loop marker in `input`, threading the nesting depth
    /// through a single left-to-right scan.
    ///
    /// Returns [`TranslateError::UnbalancedLoops`] when a `{/loop}` has no
    /// matching open or opens remain unclosed at the end of the input.
    pub(crate) fn rewrite(
        &self,
        input: &str,
        expr: &ExpressionTranslator,
    ) -> Result<String, TranslateError> {
        let mut depth: i32 = 0;
        let mut opens = 0usize;
        let mut closes = 0usize;
        let mut underflow = false;

        let out = self.marker.replace_all(input, |caps: &regex::Captures| {
            if caps.name("close").is_some() {
                closes += 1;
                depth -= 1;
                if depth < 0 {
                    underflow = true;
                }
                return "{% endfor %}".to_string();
            }

            opens += 1;
            depth += 1;
            let raw = caps.name("variable").map(|m| m.as_str()).unwrap_or("");

            if let Some(c) = self.c_style.captures(raw) {
                if c[1] == c[3] && c[1] == c[6] {
                    let var = &c[1];
                    let start = &c[2];
                    let end = expr.translate(c[5].trim());
                    // <= iterates to the bound itself, < stops one short.
                    return if &c[4] == "<=" {
                        format!("{{% for {var} in range({start}, {end}) %}}")
                    } else {
                        format!("{{% for {var} in range({start}, {end} - 1) %}}")
                    };
                }
            }

            let collection = expr.translate(raw);
            match (caps.name("key"), caps.name("value")) {
                (Some(key), Some(value)) => {
                    let key = key.as_str().replace('$', "");
                    let value = value.as_str().replace('$', "");
                    format!("{{% for {key}, {value} in {collection} %}}")
                }
                (Some(value), None) => {
                    // Single `as $x` binds the value, not the key.
                    let value = value.as_str().replace('$', "");
                    format!("{{% for {value} in {collection} %}}")
                }
                _ => {
                    // Implicit loop: numbered variables per depth, plus the
                    // unnumbered aliases legacy templates expect for the
                    // innermost loop. Last write wins on the aliases.
                    let value = format!("value{depth}");
                    let key = format!("key{depth}");
                    format!(
                        "{{% for {key}, {value} in {collection} %}}{{% set value = {value} %}}{{% set key = {key} %}}"
                    )
                }
            }
        });

        if underflow || depth != 0 {
            return Err(TranslateError::UnbalancedLoops { opens, closes });
        }
        Ok(out.into_owned())
    }
}
