//! RainTPL to Twig translator for FSFramework legacy templates.
//!
//! Legacy view files are written in RainTPL's `{...}` tag syntax. This crate
//! rewrites that syntax into Twig at load time so old templates keep working
//! on the Twig rendering stack without being rewritten by hand.
//!
//! Translation is a pure string-to-string transformation organized as an
//! ordered pipeline of rewrite passes. Text that does not match a known
//! construct passes through byte-for-byte, so templates embedding `{...}`
//! for non-template purposes (inline CSS, JavaScript object literals) are
//! not broken.
//!
//! # Examples
//!
//! ```rust
//! # fn main() -> Result<(), rain_to_twig::TranslateError> {
//! use rain_to_twig::RainToTwig;
//!
//! let translator = RainToTwig::new()?;
//!
//! let twig = translator.translate(r#"{if="$a == 1"}{$a}{else}{$b}{/if}"#)?;
//! assert_eq!(twig, "{% if a == 1 %}{{ a|raw }}{% else %}{{ b|raw }}{% endif %}");
//!
//! let twig = translator.translate("{$total+=$tax}")?;
//! assert_eq!(twig, "{% set total = total + tax %}");
//! # Ok(())
//! # }
//! ```

use regex::Regex;

mod errors;
mod expression;
mod loops;

pub use errors::TranslateError;

use errors::compile;
use expression::ExpressionTranslator;
use loops::LoopRewriter;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Extension appended to extensionless `{include="..."}` targets.
const DEFAULT_EXTENSION: &str = ".html";

/// RainTPL-to-Twig template translator.
///
/// All rewrite patterns are compiled once at construction; a single instance
/// is immutable afterwards and safe to share across threads. Each
/// [`translate`](RainToTwig::translate) call owns its working state, so
/// concurrent calls need no synchronization.
pub struct RainToTwig {
    entity_tag: Regex,
    comment: Regex,
    ignore_block: Regex,
    noparse_block: Regex,
    include_tag: Regex,
    if_tag: Regex,
    elseif_tag: Regex,
    variable_tag: Regex,
    compound_assign: Regex,
    simple_assign: Regex,
    function_tag: Regex,
    method_call: Regex,
    function_call: Regex,
    constant_tag: Regex,
    loops: LoopRewriter,
    expr: ExpressionTranslator,
}

impl RainToTwig {
    pub fn new() -> Result<Self, TranslateError> {
        Ok(Self {
            entity_tag: compile(r"\{([a-z]+)=&quot;(.+?)&quot;\}")?,
            comment: compile(r"(?s)\{\*(.*?)\*\}")?,
            ignore_block: compile(r"(?s)\{ignore\}(.*?)\{/ignore\}")?,
            noparse_block: compile(r"(?s)\{noparse\}(.*?)\{/noparse\}")?,
            include_tag: compile(r#"\{include="([^"]+)"\}"#)?,
            if_tag: compile(r#"\{if(?: condition)?="([^"]*)"\}"#)?,
            elseif_tag: compile(r#"\{elseif="([^"]*)"\}"#)?,
            variable_tag: compile(r"\{\$([a-zA-Z_][^{}]*)\}")?,
            compound_assign: compile(r"^([a-zA-Z0-9_.]+)\s*([-+*/.])=\s*(.*)$")?,
            // The value must not start with '=' so comparisons like a == 1
            // are not mistaken for assignments.
            simple_assign: compile(r"^([a-zA-Z0-9_.]+)\s*=\s*([^=].*)$")?,
            function_tag: compile(r#"\{function="([^"]+)"\}"#)?,
            method_call: compile(
                r"^\$([a-zA-Z_][a-zA-Z_0-9]*)((?:->[a-zA-Z_][a-zA-Z_0-9]*)+)\s*\(([^)]*)\)$",
            )?,
            function_call: compile(r"^([a-zA-Z_][a-zA-Z_0-9]*)\s*\(([^)]*)\)$")?,
            constant_tag: compile(r"\{#([a-zA-Z_][a-zA-Z0-9_]*)#?\}")?,
            loops: LoopRewriter::new()?,
            expr: ExpressionTranslator::new()?,
        })
    }

    /// Translates a RainTPL template to Twig.
    ///
    /// Comment and `{noparse}` block contents are opaque: they are carved
    /// out before any other pass runs and restored verbatim at the end, so
    /// template syntax inside them is never rewritten.
    pub fn translate(&self, source: &str) -> Result<String, TranslateError> {
        let text = self.normalize_entities(source);

        // Opaque blocks first, so a comment containing {$...} survives the
        // later passes untouched.
        let mut blocks: Vec<String> = Vec::new();
        let text = self.extract(&self.comment, &text, &mut blocks, comment_block);
        let text = self.extract(&self.ignore_block, &text, &mut blocks, comment_block);
        let text = self.extract(&self.noparse_block, &text, &mut blocks, verbatim_block);

        let text = self.rewrite_includes(&text);
        let text = self.loops.rewrite(&text, &self.expr)?;
        let text = text
            .replace("{break}", "{% break %}")
            .replace("{continue}", "{% continue %}");
        let text = self.rewrite_conditionals(&text);
        let text = self.rewrite_variables(&text);
        let text = self.rewrite_functions(&text);
        let text = self
            .constant_tag
            .replace_all(&text, "{{ constant('$1') }}")
            .into_owned();

        Ok(restore_blocks(text, &blocks))
    }

    /// Restores literal quotes inside tag attributes that were stored
    /// HTML-entity-escaped, e.g. `{include=&quot;header&quot;}`. Entities
    /// outside the tag-attribute shape are left alone.
    fn normalize_entities(&self, text: &str) -> String {
        self.entity_tag
            .replace_all(text, |caps: &regex::Captures| {
                format!("{{{}=\"{}\"}}", &caps[1], decode_entities(&caps[2]))
            })
            .into_owned()
    }

    /// Replaces every match of `re` with a placeholder token and stashes the
    /// rendered replacement for [`restore_blocks`].
    fn extract(
        &self,
        re: &Regex,
        text: &str,
        blocks: &mut Vec<String>,
        render: fn(&str) -> String,
    ) -> String {
        re.replace_all(text, |caps: &regex::Captures| {
            let token = block_token(blocks.len());
            blocks.push(render(&caps[1]));
            token
        })
        .into_owned()
    }

    fn rewrite_includes(&self, text: &str) -> String {
        self.include_tag
            .replace_all(text, |caps: &regex::Captures| {
                let target = &caps[1];
                if target.starts_with('$') {
                    // Dynamic include: the engine resolves the extension at
                    // render time.
                    let expr = self.expr.translate(target);
                    return format!("{{{{ include(auto_ext({expr})) }}}}");
                }
                let mut file = target.to_string();
                if !file.contains('.') {
                    file.push_str(DEFAULT_EXTENSION);
                }
                format!("{{{{ include('{file}') }}}}")
            })
            .into_owned()
    }

    fn rewrite_conditionals(&self, text: &str) -> String {
        let text = self.if_tag.replace_all(text, |caps: &regex::Captures| {
            format!("{{% if {} %}}", self.expr.translate(&caps[1]))
        });
        let text = self.elseif_tag.replace_all(&text, |caps: &regex::Captures| {
            format!("{{% elseif {} %}}", self.expr.translate(&caps[1]))
        });
        text.replace("{else}", "{% else %}")
            .replace("{/if}", "{% endif %}")
    }

    fn rewrite_variables(&self, text: &str) -> String {
        self.variable_tag
            .replace_all(text, |caps: &regex::Captures| {
                let expr = self.expr.translate(&format!("${}", &caps[1]));

                if let Some(c) = self.compound_assign.captures(&expr) {
                    let var = &c[1];
                    let val = &c[3];
                    // PHP .= is string concatenation, Twig spells it ~.
                    let op = if &c[2] == "." { "~" } else { &c[2] };
                    return format!("{{% set {var} = {var} {op} {val} %}}");
                }

                if let Some(c) = self.simple_assign.captures(&expr) {
                    return format!("{{% set {} = {} %}}", &c[1], &c[2]);
                }

                // Output expression: legacy templates assume raw output.
                format!("{{{{ {}|raw }}}}", self.expr.remap_filters(&expr))
            })
            .into_owned()
    }

    fn rewrite_functions(&self, text: &str) -> String {
        self.function_tag
            .replace_all(text, |caps: &regex::Captures| {
                let raw = &caps[1];

                if let Some(m) = self.method_call.captures(raw) {
                    let receiver = &m[1];
                    let chain = m[2].replace("->", ".");
                    let args = self.expr.translate(&m[3]);
                    return format!("{{{{ {receiver}{chain}({args})|raw }}}}");
                }

                if let Some(f) = self.function_call.captures(raw) {
                    let func = &f[1];
                    let args = self.expr.translate(&f[2]);
                    // Well-known PHP functions exist in Twig as filters, not
                    // callables.
                    if let Some(filter) = expression::function_filter(func) {
                        return format!("{{{{ {args}|{filter} }}}}");
                    }
                    return format!("{{{{ {func}({args})|raw }}}}");
                }

                format!("{{{{ ({})|raw }}}}", self.expr.translate(raw))
            })
            .into_owned()
    }
}

fn comment_block(content: &str) -> String {
    format!("{{# {content} #}}")
}

fn verbatim_block(content: &str) -> String {
    format!("{{% verbatim %}}{content}{{% endverbatim %}}")
}

fn block_token(index: usize) -> String {
    format!("__RAINTPL_BLOCK_{index}__")
}

fn restore_blocks(mut text: String, blocks: &[String]) -> String {
    // A later-extracted block can embed the token of an earlier one (a
    // comment inside a noparse block), so restore newest first.
    for (index, block) in blocks.iter().enumerate().rev() {
        text = text.replacen(&block_token(index), block, 1);
    }
    text
}

/// Decodes the HTML entities RainTPL templates are known to carry inside
/// entity-escaped tag attributes. `&amp;` is decoded last so it cannot
/// produce new entities.
fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
