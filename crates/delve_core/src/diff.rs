//! Unified diff splitting and added-line matching.
//!
//! Diffs are treated as opaque lines. [`split_fragments`] cuts a multi-file
//! diff into per-file [`Fragment`]s and [`HunkMatches`] walks one fragment's
//! hunks, yielding the added lines that match a pattern together with their
//! line number in the new version of the file.

use regex::Regex;
#[cfg(feature = "tracing")]
use tracing::trace;

use crate::finding::{FileMatch, LineMatch};
use crate::text::split_at_line_markers;

const FILE_MARKER: &str = "diff --git ";
const NEW_PATH_MARKER: &str = " b/";
const HUNK_MARKER: &str = "@@";
const DELETED_PREFIX: &str = "deleted file";

const HUNK_SIGIL: char = '@';
const ADDED_SIGIL: char = '+';

/// One file's section of a unified diff, classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'a> {
    /// A file with at least one hunk to search.
    File(FileDiff<'a>),
    /// The file was deleted; nothing was added so nothing is searched.
    Deleted,
    /// No hunk to parse: mode change, pure rename, binary file, or a
    /// truncated fragment.
    Skipped,
}

/// The searchable part of one file's diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDiff<'a> {
    /// Path after the `b/` prefix.
    pub filename: &'a str,
    /// Hunk text, starting at the first `@@` header.
    pub body: &'a str,
}

impl<'a> FileDiff<'a> {
    /// Lazily yields the added lines in this file that match `regex`.
    #[must_use]
    pub fn matches<'r>(&self, regex: &'r Regex) -> HunkMatches<'a, 'r> {
        HunkMatches::new(self.body, regex)
    }
}

/// Splits raw diff output into per-file fragments.
///
/// A fragment starts at each line beginning with `diff --git `; the marker
/// inside an added or removed line does not start a new file. Text before
/// the first marker (such as the commit header printed by `git show`) is
/// discarded.
pub fn split_fragments(raw: &str) -> impl Iterator<Item = Fragment<'_>> {
    split_at_line_markers(raw, FILE_MARKER).into_iter().map(classify_fragment)
}

/// Classifies a single fragment (the text following a `diff --git ` marker).
#[must_use]
pub fn classify_fragment(fragment: &str) -> Fragment<'_> {
    let mut parts = fragment.splitn(3, '\n');
    let (Some(header), Some(second), Some(rest)) = (parts.next(), parts.next(), parts.next()) else {
        return Fragment::Skipped;
    };

    if second.starts_with(DELETED_PREFIX) {
        return Fragment::Deleted;
    }

    let Some((_, filename)) = header.split_once(NEW_PATH_MARKER) else {
        return Fragment::Skipped;
    };

    let Some(start) = find_first_hunk(rest) else {
        return Fragment::Skipped;
    };

    Fragment::File(FileDiff {
        filename: filename.trim_end_matches('\r'),
        body: &rest[start..],
    })
}

fn find_first_hunk(text: &str) -> Option<usize> {
    if text.starts_with(HUNK_MARKER) {
        return Some(0);
    }
    text.find("\n@@").map(|idx| idx + 1)
}

/// Collects the files in `raw` that have at least one added line matching
/// `regex`, in diff order.
#[must_use]
pub fn find_file_matches(raw: &str, regex: &Regex) -> Vec<FileMatch> {
    split_fragments(raw)
        .filter_map(|fragment| match fragment {
            Fragment::File(file) => {
                let matches: Vec<LineMatch> = file.matches(regex).collect();
                (!matches.is_empty()).then(|| FileMatch::new(file.filename, matches))
            }
            Fragment::Deleted | Fragment::Skipped => {
                #[cfg(feature = "tracing")]
                trace!(?fragment, "fragment not searched");
                None
            }
        })
        .collect()
}

/// Iterator over the matching added lines of one file's hunks.
///
/// The line counter is set by every hunk header to the header's new-file
/// start and advances only on added lines; context and removal lines leave
/// it untouched. Re-invoking [`FileDiff::matches`] restarts the walk.
#[derive(Debug, Clone)]
pub struct HunkMatches<'a, 'r> {
    lines: std::str::Lines<'a>,
    regex: &'r Regex,
    line_number: u32,
}

impl<'a, 'r> HunkMatches<'a, 'r> {
    /// Creates a matcher over raw hunk text.
    #[must_use]
    pub fn new(body: &'a str, regex: &'r Regex) -> Self {
        Self {
            lines: body.lines(),
            regex,
            line_number: 0,
        }
    }
}

impl Iterator for HunkMatches<'_, '_> {
    type Item = LineMatch;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            let line = line.strip_suffix('\r').unwrap_or(line);

            if line.starts_with(HUNK_SIGIL) {
                self.line_number = parse_hunk_start(line).unwrap_or(0);
            } else if let Some(added) = line.strip_prefix(ADDED_SIGIL) {
                let current = self.line_number;
                self.line_number = self.line_number.saturating_add(1);

                if self.regex.is_match(added) {
                    return Some(LineMatch::new(current, added.trim()));
                }
            }
        }

        None
    }
}

/// Extracts the new-file start line from `@@ -<old> +<start>[,<count>] @@`.
#[must_use]
pub fn parse_hunk_start(header: &str) -> Option<u32> {
    let rest = header.strip_prefix("@@ -")?;
    let (_, new_range) = rest.split_once(" +")?;
    let end = new_range
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(new_range.len());
    new_range[..end].parse().ok()
}
