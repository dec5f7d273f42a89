use thiserror::Error;

/// Errors that can occur when compiling a search pattern.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The pattern's regular expression failed to compile.
    #[error("invalid regex in pattern '{pattern}': {source}")]
    InvalidRegex {
        /// The pattern text that failed (e.g. `"pass(word?"`).
        pattern: String,
        /// The underlying regex compilation error.
        #[source]
        source: regex::Error,
    },
}

/// Top-level error type for the delve search pipeline.
///
/// Unifies errors from pattern compilation, configuration loading, log
/// parsing, and history queries into a single type for callers that
/// orchestrate the full workflow.
#[derive(Debug, Error)]
pub enum DelveError {
    /// A pattern failed to compile.
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// Configuration could not be read or parsed.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// A log record did not have the expected labelled layout.
    #[error(transparent)]
    Log(#[from] crate::log::LogParseError),

    /// The history source could not answer a query.
    #[error(transparent)]
    Source(#[from] crate::search::SourceError),
}
