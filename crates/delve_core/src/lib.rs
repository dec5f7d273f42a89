//! History search engine for delve.
//!
//! This crate turns git's textual log and diff output into structured
//! findings: which commits, files, and added lines match a set of regular
//! expressions. It never touches a repository itself; callers supply a
//! [`HistorySource`] that runs the queries.
//!
//! # Main Types
//!
//! - [`Investigator`] - Runs message, diff, and staged searches per pattern
//! - [`PatternSet`] - Ordered, de-duplicated collection of labelled patterns
//! - [`FindingTree`] - Pattern to commit to file to line matches
//! - [`Config`] - User configuration loaded from `.delve.toml`
//!
//! # Error Handling
//!
//! This crate uses [`thiserror`] for structured, typed errors that library
//! consumers can match on:
//!
//! - [`PatternError`] - Pattern compilation failures
//! - [`ConfigError`] - Configuration loading/parsing failures
//! - [`SourceError`] - A history query could not be answered
//! - [`DelveError`] - Top-level error enum combining the above
//!
//! Failures confined to one revision range are collected as
//! [`SearchWarning`]s instead of aborting the run. The CLI crate
//! (`delve_cli`) uses `anyhow` for error propagation.

/// User configuration loaded from `.delve.toml`.
pub mod config;
/// Unified diff splitting and added-line matching.
pub mod diff;
/// Error types for pattern compilation and the combined crate error.
pub mod error;
/// The nested finding tree and its merge rules.
pub mod finding;
/// Parsing of labelled `git log` records.
pub mod log;
/// Pattern definitions, pattern files, and the built-in set.
pub mod pattern;
/// Common re-exports for internal use.
pub mod prelude;
/// Construction of git argument lists.
pub mod query;
/// Search orchestration over a history source.
pub mod search;
/// Line-oriented helpers shared by the diff and log parsers.
pub mod text;
#[cfg(test)]
pub(crate) mod test_utils;

pub use config::{Config, ConfigError};
pub use diff::{FileDiff, Fragment, HunkMatches, find_file_matches};
pub use error::{DelveError, PatternError};
pub use finding::{CommitMatch, FileMatch, FindingTree, LineMatch, PatternBucket, STAGED_KEY};
pub use log::{LogParseError, LogRecord, parse_log};
pub use pattern::{Pattern, PatternSet, parse_pattern_file};
pub use query::{Filters, LogQuery, RepoPaths, RevisionRange, SearchTarget};
pub use search::{
    DiffMetadataPolicy, HistorySource, Investigation, Investigator, PatternOutcome, SearchOptions, SearchWarning,
    SourceError,
};

/// Default filename for delve configuration.
pub const CONFIG_FILENAME: &str = ".delve.toml";
