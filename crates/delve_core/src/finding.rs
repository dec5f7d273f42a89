//! The finding tree: pattern → revision → match record.
//!
//! [`FindingTree`] is the artifact handed to renderers and serializers. Its
//! JSON form is exactly its in-memory shape, with absent optional fields
//! omitted.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::{Deserialize, Serialize};

/// Key of the pseudo-commit holding staged-change matches.
pub const STAGED_KEY: &str = "staged";

/// An added line that matched a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineMatch {
    /// One-based line number in the new version of the file.
    pub line: u32,
    /// The added line without its `+` sigil, trimmed.
    pub text: String,
}

impl LineMatch {
    /// Creates a line match.
    #[must_use]
    pub fn new(line: u32, text: impl Into<String>) -> Self {
        Self {
            line,
            text: text.into(),
        }
    }
}

/// The matching lines of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMatch {
    /// Path with the `b/` diff prefix removed.
    pub file: String,
    /// Matches in diff order.
    pub matches: Vec<LineMatch>,
}

impl FileMatch {
    /// Creates a file match.
    #[must_use]
    pub fn new(file: impl Into<String>, matches: Vec<LineMatch>) -> Self {
        Self {
            file: file.into(),
            matches,
        }
    }
}

/// Everything known about one commit's match under one pattern.
///
/// Built up by merging partial records from the message and diff searches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMatch {
    /// Author date as printed by git (RFC 2822).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_date: Option<String>,
    /// Author name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    /// Author email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    /// Commit message (subject and body).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    /// Files whose added lines matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileMatch>>,
}

impl CommitMatch {
    /// Creates a record holding only file matches.
    #[must_use]
    pub fn with_files(files: Vec<FileMatch>) -> Self {
        Self {
            files: Some(files),
            ..Self::default()
        }
    }

    /// Left-biased merge: fields already present are kept, absent fields are
    /// taken from `other`.
    pub fn merge(&mut self, other: Self) {
        fill(&mut self.author_date, other.author_date);
        fill(&mut self.author_name, other.author_name);
        fill(&mut self.author_email, other.author_email);
        fill(&mut self.log, other.log);
        fill(&mut self.files, other.files);
    }

    /// Returns the file matches, or an empty slice for message-only matches.
    #[must_use]
    pub fn files(&self) -> &[FileMatch] {
        self.files.as_deref().unwrap_or_default()
    }

    /// Total matched lines across all files.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.files().iter().map(|f| f.matches.len()).sum()
    }
}

fn fill<T>(slot: &mut Option<T>, incoming: Option<T>) {
    if slot.is_none() {
        *slot = incoming;
    }
}

/// All matches for one pattern, keyed by abbreviated commit SHA.
pub type PatternBucket = BTreeMap<String, CommitMatch>;

/// Merges a partial commit record into a bucket, creating the entry if
/// needed.
pub fn merge_into(bucket: &mut PatternBucket, sha: String, record: CommitMatch) {
    match bucket.entry(sha) {
        Entry::Occupied(mut entry) => entry.get_mut().merge(record),
        Entry::Vacant(entry) => {
            entry.insert(record);
        }
    }
}

/// The complete result of a run: pattern text → bucket.
///
/// A pattern mapped to an empty bucket was searched and found nothing; a
/// pattern absent from the tree was never searched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FindingTree {
    patterns: BTreeMap<String, PatternBucket>,
}

impl FindingTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tree with an empty bucket for every pattern text.
    #[must_use]
    pub fn with_patterns<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| (p.to_string(), PatternBucket::new()))
                .collect(),
        }
    }

    /// Replaces the bucket for `pattern`.
    pub fn insert_bucket(&mut self, pattern: impl Into<String>, bucket: PatternBucket) {
        self.patterns.insert(pattern.into(), bucket);
    }

    /// Merges one commit record into the bucket for `pattern`.
    pub fn merge_commit(&mut self, pattern: &str, sha: impl Into<String>, record: CommitMatch) {
        let bucket = self.patterns.entry(pattern.to_string()).or_default();
        merge_into(bucket, sha.into(), record);
    }

    /// Returns the bucket for `pattern`, if the pattern was searched.
    #[must_use]
    pub fn get(&self, pattern: &str) -> Option<&PatternBucket> {
        self.patterns.get(pattern)
    }

    /// Iterates over `(pattern, bucket)` pairs in pattern order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PatternBucket)> {
        self.patterns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over the patterns that produced at least one match.
    pub fn matched(&self) -> impl Iterator<Item = (&str, &PatternBucket)> {
        self.iter().filter(|(_, bucket)| !bucket.is_empty())
    }

    /// Returns `true` if any pattern produced any finding.
    #[must_use]
    pub fn has_findings(&self) -> bool {
        self.patterns.values().any(|bucket| !bucket.is_empty())
    }

    /// Number of patterns in the tree, matched or not.
    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Number of commit entries across all patterns.
    #[must_use]
    pub fn total_commits(&self) -> usize {
        self.patterns.values().map(BTreeMap::len).sum()
    }
}
