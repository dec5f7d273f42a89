//! Convenience re-exports of the most commonly used types.

pub use crate::config::{Config, ConfigError};
pub use crate::error::{DelveError, PatternError};
pub use crate::finding::{CommitMatch, FileMatch, FindingTree, LineMatch, PatternBucket};
pub use crate::pattern::{Pattern, PatternSet};
pub use crate::query::{Filters, RevisionRange};
pub use crate::search::{HistorySource, Investigator, SearchOptions, SourceError};
