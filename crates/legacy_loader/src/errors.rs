use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Error types that can occur while resolving and loading templates.
#[derive(Error, Debug)]
pub enum Error {
    /// No source provider could supply the named template, after all
    /// fallback attempts.
    #[error("template not found: {0}")]
    NotFound(String),

    /// The template name is rejected before any lookup, e.g. because it
    /// contains a `..` path segment.
    #[error("invalid template name: {0}")]
    InvalidName(String),

    /// I/O operation failed while reading template files or metadata.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Template content contains invalid UTF-8 sequences.
    #[error("Invalid UTF-8 content in template: {0}")]
    InvalidUtf8(String),

    /// Legacy syntax translation failed.
    ///
    /// Raised both when the translator cannot be constructed and when a
    /// legacy template is structurally malformed (unbalanced loop markers).
    #[error("template translation failed: {0}")]
    Translation(#[from] rain_to_twig::TranslateError),
}
