//! Construction of the `git` argument lists used by the search.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Revision token meaning "the entire history".
pub const ALL_HISTORY: &str = "all";
/// Default revision range: the most recent commit only.
pub const DEFAULT_REVLIST: &str = "HEAD^!";

const MESSAGE_FORMAT: &str = "--format=COMMIT: %h AUTHORDATE: %aD AUTHORNAME: %an AUTHOREMAIL: %ae LOG: %s %b";
const DIFF_FORMAT: &str = "--format=COMMIT: %h AUTHORDATE: %aD AUTHORNAME: %an AUTHOREMAIL: %ae";

/// Which part of each revision a log query searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchTarget {
    /// The commit message (`--grep`).
    Message,
    /// Lines added or removed by the commit (`-G`).
    Diff,
}

impl fmt::Display for SearchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message => f.write_str("message"),
            Self::Diff => f.write_str("diff"),
        }
    }
}

/// One entry of the user's revision list: a SHA, a range expression, or the
/// whole history.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RevisionRange {
    /// Every ref (`--all`).
    All,
    /// An opaque revision expression passed through to git.
    Expr(String),
}

impl RevisionRange {
    /// Parses a single token, recognising the `all` sentinel.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        if token == ALL_HISTORY || token == "--all" {
            Self::All
        } else {
            Self::Expr(token.to_string())
        }
    }

    /// Parses a comma-delimited revision list, dropping empty entries.
    #[must_use]
    pub fn parse_list(list: &str) -> Vec<Self> {
        list.split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(Self::parse)
            .collect()
    }

    /// The argument git expects for this range.
    #[must_use]
    pub fn as_arg(&self) -> &str {
        match self {
            Self::All => "--all",
            Self::Expr(expr) => expr,
        }
    }
}

impl fmt::Display for RevisionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL_HISTORY),
            Self::Expr(expr) => f.write_str(expr),
        }
    }
}

/// Optional author and date restrictions applied to every log query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    /// Restrict to commits by this author (name or email).
    #[serde(default)]
    pub author: Option<String>,
    /// Only commits before this date.
    #[serde(default)]
    pub before: Option<String>,
    /// Only commits after this date.
    #[serde(default)]
    pub after: Option<String>,
}

impl Filters {
    fn push_args(&self, args: &mut Vec<String>) {
        for (flag, value) in [
            ("--author", &self.author),
            ("--before", &self.before),
            ("--after", &self.after),
        ] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                args.push(flag.to_string());
                args.push(value.to_string());
            }
        }
    }
}

/// A history query for one pattern over one revision range.
#[derive(Debug, Clone, Copy)]
pub struct LogQuery<'a> {
    /// What to search.
    pub target: SearchTarget,
    /// The pattern text.
    pub pattern: &'a str,
    /// The revision range.
    pub range: &'a RevisionRange,
    /// Author and date filters.
    pub filters: &'a Filters,
}

impl LogQuery<'_> {
    /// Builds the `git log` arguments (without the leading `--git-dir`).
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "log".to_string(),
            self.range.as_arg().to_string(),
            "-i".to_string(),
            "-E".to_string(),
            "--oneline".to_string(),
        ];

        match self.target {
            SearchTarget::Message => {
                args.push(MESSAGE_FORMAT.to_string());
                args.push("--grep".to_string());
                args.push(self.pattern.to_string());
            }
            SearchTarget::Diff => {
                args.push(DIFF_FORMAT.to_string());
                args.push(format!("-G{}", self.pattern));
            }
        }

        self.filters.push_args(&mut args);
        args
    }
}

/// Prefixes `args` with `--git-dir <git_dir>`.
#[must_use]
pub fn with_git_dir(git_dir: &Path, args: Vec<String>) -> Vec<String> {
    let mut full = Vec::with_capacity(args.len() + 2);
    full.push("--git-dir".to_string());
    full.push(git_dir.display().to_string());
    full.extend(args);
    full
}

/// Arguments that print one revision's full diff with no context lines.
#[must_use]
pub fn show_args(sha: &str) -> Vec<String> {
    ["show", sha, "--no-color", "--unified=0"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Arguments that print the index's staged diff, limited to `repo_dir`.
#[must_use]
pub fn staged_args(repo_dir: &Path) -> Vec<String> {
    let mut args: Vec<String> = ["diff", "--staged", "--no-color", "--unified=0", "--"]
        .into_iter()
        .map(String::from)
        .collect();
    args.push(repo_dir.display().to_string());
    args
}

/// Locations of a repository on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPaths {
    /// The work tree root.
    pub work_dir: PathBuf,
    /// The `.git` directory.
    pub git_dir: PathBuf,
}

impl RepoPaths {
    /// Paths for a conventional, non-bare checkout at `work_dir`.
    #[must_use]
    pub fn for_work_dir(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        let git_dir = work_dir.join(".git");
        Self { work_dir, git_dir }
    }
}
