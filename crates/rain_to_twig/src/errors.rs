use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Error types that can occur while translating RainTPL templates.
///
/// Translation itself is deliberately permissive: unrecognized `{...}`
/// constructs pass through untouched and malformed expressions are rewritten
/// best-effort. The only hard failures are construction-time pattern errors
/// and structurally unbalanced loop markers.
#[derive(Error, Debug)]
pub enum TranslateError {
    /// A hard-coded rewrite pattern failed to compile.
    ///
    /// This can only happen if a pattern shipped with the translator is
    /// invalid, so seeing it means a defect in the translator itself rather
    /// than in the template being translated.
    #[error("invalid rewrite pattern '{pattern}': {source}")]
    Pattern {
        /// The pattern that failed to compile
        pattern: String,
        /// The underlying regex compilation error
        #[source]
        source: regex::Error,
    },

    /// The template's `{loop}` / `{/loop}` markers do not balance.
    ///
    /// A `{/loop}` with no matching open, or opens left unclosed at the end
    /// of the template, would produce inconsistent implicit loop-variable
    /// numbering, so translation refuses the input instead.
    #[error("unbalanced loop markers: {opens} {{loop}} opens, {closes} {{/loop}} closes")]
    UnbalancedLoops {
        /// Number of `{loop="..."}` markers seen
        opens: usize,
        /// Number of `{/loop}` markers seen
        closes: usize,
    },
}

/// Compiles one of the translator's hard-coded patterns.
pub(crate) fn compile(pattern: &str) -> Result<regex::Regex, TranslateError> {
    regex::Regex::new(pattern).map_err(|source| TranslateError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}
