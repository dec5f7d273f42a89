//! Search patterns, pattern files, and the built-in default set.

use std::collections::HashSet;
use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::PatternError;

const DEFAULT_PATTERNS: &str = include_str!("../patterns/default.txt");

const LABEL_PREFIX: char = '#';

/// A text pattern to search history for, with an optional category label.
///
/// Identity is the literal pattern text; the label is display metadata only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    /// The literal text or regular expression.
    pub text: String,
    /// Human-readable category, e.g. `"Usernames and Passwords"`.
    #[serde(default)]
    pub label: Option<String>,
}

impl Pattern {
    /// Creates an unlabelled pattern.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: None,
        }
    }

    /// Creates a pattern carrying a category label.
    #[must_use]
    pub fn labelled(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: Some(label.into()),
        }
    }

    /// Compiles the pattern as a case-insensitive regular expression.
    pub fn compile(&self) -> Result<Regex, PatternError> {
        compile_case_insensitive(&self.text)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Compiles `text` as a case-insensitive regular expression.
pub fn compile_case_insensitive(text: &str) -> Result<Regex, PatternError> {
    RegexBuilder::new(text)
        .case_insensitive(true)
        .build()
        .map_err(|source| PatternError::InvalidRegex {
            pattern: text.to_string(),
            source,
        })
}

/// Ordered collection of patterns, deduplicated by text.
///
/// The first occurrence of a pattern text wins, including its label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
    seen: HashSet<String>,
}

impl PatternSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the built-in default patterns.
    #[must_use]
    pub fn builtin() -> Self {
        let mut set = Self::new();
        set.extend(parse_pattern_file(DEFAULT_PATTERNS));
        set
    }

    /// Adds a pattern unless one with the same text is already present.
    ///
    /// Returns `true` if the pattern was added.
    pub fn insert(&mut self, pattern: Pattern) -> bool {
        if pattern.text.is_empty() || !self.seen.insert(pattern.text.clone()) {
            return false;
        }
        self.patterns.push(pattern);
        true
    }

    /// Returns the patterns in insertion order.
    #[must_use]
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Looks up a pattern by its text.
    #[must_use]
    pub fn get(&self, text: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.text == text)
    }

    /// Returns an iterator over the patterns.
    pub fn iter(&self) -> std::slice::Iter<'_, Pattern> {
        self.patterns.iter()
    }

    /// Returns the number of distinct patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns `true` if no patterns were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Compiles every pattern, failing on the first invalid regex.
    pub fn validate(&self) -> Result<(), PatternError> {
        self.patterns.iter().try_for_each(|p| p.compile().map(drop))
    }
}

impl Extend<Pattern> for PatternSet {
    fn extend<I: IntoIterator<Item = Pattern>>(&mut self, iter: I) {
        for pattern in iter {
            self.insert(pattern);
        }
    }
}

impl FromIterator<Pattern> for PatternSet {
    fn from_iter<I: IntoIterator<Item = Pattern>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<'a> IntoIterator for &'a PatternSet {
    type Item = &'a Pattern;
    type IntoIter = std::slice::Iter<'a, Pattern>;

    fn into_iter(self) -> Self::IntoIter {
        self.patterns.iter()
    }
}

/// Parses a pattern file: one pattern per line.
///
/// A line starting with `#` sets the label for the patterns that follow; a
/// blank line clears it.
#[must_use]
pub fn parse_pattern_file(content: &str) -> Vec<Pattern> {
    let mut label: Option<String> = None;
    let mut patterns = Vec::new();

    for line in content.lines() {
        let line = line.trim();

        if line.starts_with(LABEL_PREFIX) {
            let text = line.trim_start_matches(|c| c == LABEL_PREFIX || c == ' ');
            label = (!text.is_empty()).then(|| text.to_string());
        } else if line.is_empty() {
            label = None;
        } else {
            patterns.push(Pattern {
                text: line.to_string(),
                label: label.clone(),
            });
        }
    }

    patterns
}
