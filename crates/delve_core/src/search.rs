//! Search orchestration over a [`HistorySource`].
//!
//! For every pattern and revision range the [`Investigator`] runs a message
//! search and a diff search and merges both into one [`PatternBucket`].
//! Staged mode skips revision enumeration and parses the index diff once.

use std::time::Duration;

use regex::Regex;
use thiserror::Error;
#[cfg(feature = "tracing")]
use tracing::{debug, warn};

use crate::diff::find_file_matches;
use crate::error::PatternError;
use crate::finding::{CommitMatch, FindingTree, PatternBucket, STAGED_KEY, merge_into};
use crate::log::{LogRecord, parse_log};
use crate::pattern::{Pattern, PatternSet};
use crate::query::{Filters, LogQuery, RevisionRange, SearchTarget};

/// Errors reported by a [`HistorySource`].
#[derive(Debug, Error)]
pub enum SourceError {
    /// The query process could not be started.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        /// The command line that was attempted.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The query process exited unsuccessfully.
    #[error("`{command}` exited with status {status}: {stderr}")]
    Failed {
        /// The command line that failed.
        command: String,
        /// Exit status description.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// The query did not finish within its time limit.
    #[error("`{command}` timed out after {}s", timeout.as_secs())]
    Timeout {
        /// The command line that was abandoned.
        command: String,
        /// The limit that was exceeded.
        timeout: Duration,
    },
}

/// Answers history queries with raw git text output.
///
/// Implementations must be shareable across worker threads; each call is an
/// independent, read-only query.
pub trait HistorySource: Send + Sync {
    /// Runs a log query and returns its labelled records.
    fn log(&self, query: &LogQuery<'_>) -> Result<String, SourceError>;

    /// Returns the unified diff introduced by one revision.
    fn show(&self, sha: &str) -> Result<String, SourceError>;

    /// Returns the unified diff of the index against `HEAD`.
    fn staged_diff(&self) -> Result<String, SourceError>;
}

impl<S: HistorySource + ?Sized> HistorySource for &S {
    fn log(&self, query: &LogQuery<'_>) -> Result<String, SourceError> {
        (**self).log(query)
    }

    fn show(&self, sha: &str) -> Result<String, SourceError> {
        (**self).show(sha)
    }

    fn staged_diff(&self) -> Result<String, SourceError> {
        (**self).staged_diff()
    }
}

/// What to do with a diff-search revision whose diff produced no matching
/// added lines (for example when the pattern only appeared in removed lines).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiffMetadataPolicy {
    /// Drop the revision entirely.
    #[default]
    RequireMatches,
    /// Record the revision's author metadata without files.
    KeepMetadata,
}

/// Run-wide search settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Revision ranges searched independently, in order.
    pub ranges: Vec<RevisionRange>,
    /// Author and date filters.
    pub filters: Filters,
    /// Handling of diff-search revisions without line matches.
    pub diff_metadata: DiffMetadataPolicy,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            ranges: vec![RevisionRange::parse(crate::query::DEFAULT_REVLIST)],
            filters: Filters::default(),
            diff_metadata: DiffMetadataPolicy::default(),
        }
    }
}

/// A recoverable problem encountered while searching one pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchWarning {
    /// A query for one range and target failed; other passes continued.
    QueryFailed {
        /// The range being searched.
        range: String,
        /// Which search failed.
        target: SearchTarget,
        /// Error description.
        message: String,
    },
    /// A revision's diff could not be retrieved.
    ShowFailed {
        /// The revision.
        sha: String,
        /// Error description.
        message: String,
    },
    /// A log record could not be parsed and was skipped.
    MalformedRecord {
        /// Error description.
        message: String,
    },
}

/// The bucket for one pattern plus any recoverable problems.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternOutcome {
    /// Merged matches keyed by commit.
    pub bucket: PatternBucket,
    /// Problems that did not stop the search.
    pub warnings: Vec<SearchWarning>,
}

/// Drives message, diff, and staged searches against a history source.
#[derive(Debug)]
pub struct Investigator<'o, S> {
    source: S,
    options: &'o SearchOptions,
}

impl<'o, S: HistorySource> Investigator<'o, S> {
    /// Creates an investigator over `source`.
    #[must_use]
    pub const fn new(source: S, options: &'o SearchOptions) -> Self {
        Self { source, options }
    }

    /// Searches every range for `pattern` with both strategies.
    pub fn search_pattern(&self, pattern: &Pattern) -> Result<PatternOutcome, PatternError> {
        let regex = pattern.compile()?;
        let mut outcome = PatternOutcome::default();

        for range in &self.options.ranges {
            for target in [SearchTarget::Message, SearchTarget::Diff] {
                match self.search_committed(target, &pattern.text, &regex, range, &mut outcome.warnings) {
                    Ok(records) => {
                        for (sha, record) in records {
                            merge_into(&mut outcome.bucket, sha, record);
                        }
                    }
                    Err(err) => {
                        #[cfg(feature = "tracing")]
                        warn!(pattern = %pattern.text, %range, %target, error = %err, "query failed");
                        outcome.warnings.push(SearchWarning::QueryFailed {
                            range: range.to_string(),
                            target,
                            message: err.to_string(),
                        });
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Runs one search strategy over one range, returning per-commit partial
    /// records in log order.
    pub fn search_committed(
        &self,
        target: SearchTarget,
        pattern: &str,
        regex: &Regex,
        range: &RevisionRange,
        warnings: &mut Vec<SearchWarning>,
    ) -> Result<Vec<(String, CommitMatch)>, SourceError> {
        let query = LogQuery {
            target,
            pattern,
            range,
            filters: &self.options.filters,
        };
        let raw = self.source.log(&query)?;

        let mut results = Vec::new();

        for parsed in parse_log(&raw) {
            let LogRecord { sha, mut metadata } = match parsed {
                Ok(record) => record,
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    warn!(error = %err, "skipping malformed log record");
                    warnings.push(SearchWarning::MalformedRecord {
                        message: err.to_string(),
                    });
                    continue;
                }
            };

            if target == SearchTarget::Diff {
                let diff = match self.source.show(&sha) {
                    Ok(diff) => diff,
                    Err(err) => {
                        #[cfg(feature = "tracing")]
                        warn!(%sha, error = %err, "failed to read revision diff");
                        warnings.push(SearchWarning::ShowFailed {
                            sha,
                            message: err.to_string(),
                        });
                        continue;
                    }
                };

                let files = find_file_matches(&diff, regex);

                if files.is_empty() {
                    #[cfg(feature = "tracing")]
                    debug!(%sha, "no added lines matched");
                    if self.options.diff_metadata == DiffMetadataPolicy::RequireMatches {
                        continue;
                    }
                } else {
                    metadata.files = Some(files);
                }
            }

            results.push((sha, metadata));
        }

        Ok(results)
    }

    /// Searches the staged diff for `pattern`.
    ///
    /// The bucket holds a single [`STAGED_KEY`] entry when any staged line
    /// matched, and is empty otherwise.
    pub fn search_staged(&self, pattern: &Pattern) -> Result<PatternOutcome, PatternError> {
        let regex = pattern.compile()?;
        let mut outcome = PatternOutcome::default();

        match self.source.staged_diff() {
            Ok(diff) => {
                let files = find_file_matches(&diff, &regex);
                if !files.is_empty() {
                    outcome
                        .bucket
                        .insert(STAGED_KEY.to_string(), CommitMatch::with_files(files));
                }
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                warn!(pattern = %pattern.text, error = %err, "staged diff failed");
                outcome.warnings.push(SearchWarning::QueryFailed {
                    range: STAGED_KEY.to_string(),
                    target: SearchTarget::Diff,
                    message: err.to_string(),
                });
            }
        }

        Ok(outcome)
    }

    /// Searches every pattern sequentially and assembles the finding tree.
    ///
    /// Every pattern gets a bucket, even when it matched nothing.
    pub fn investigate(&self, patterns: &PatternSet, staged: bool) -> Result<Investigation, PatternError> {
        let mut investigation = Investigation::new(patterns);

        for pattern in patterns {
            let outcome = if staged {
                self.search_staged(pattern)?
            } else {
                self.search_pattern(pattern)?
            };
            investigation.record(pattern, outcome);
        }

        Ok(investigation)
    }
}

/// A finished (or in-progress) run: the finding tree and collected warnings.
#[derive(Debug, Clone, Default)]
pub struct Investigation {
    /// Findings for every submitted pattern.
    pub tree: FindingTree,
    /// Recoverable problems, tagged with their pattern text.
    pub warnings: Vec<(String, SearchWarning)>,
}

impl Investigation {
    /// Starts a run with an empty bucket for every pattern.
    #[must_use]
    pub fn new(patterns: &PatternSet) -> Self {
        Self {
            tree: FindingTree::with_patterns(patterns.iter().map(|p| p.text.as_str())),
            warnings: Vec::new(),
        }
    }

    /// Stores the outcome for one pattern.
    pub fn record(&mut self, pattern: &Pattern, outcome: PatternOutcome) {
        self.tree.insert_bucket(pattern.text.clone(), outcome.bucket);
        self.warnings
            .extend(outcome.warnings.into_iter().map(|w| (pattern.text.clone(), w)));
    }
}
