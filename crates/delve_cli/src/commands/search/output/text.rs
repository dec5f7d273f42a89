//! Text output formatting for search results.

use std::io::Write;

use chrono::DateTime;
use console::style;
use delve_core::prelude::*;
use regex::Regex;

use super::OutputContext;
use crate::ui::{
    self, LINE_NUMBER_WIDTH, colors, format_duration, highlight, indicators, truncate_with_ellipsis, wrap,
};

const MATCH_TRUNCATE_WIDTH: usize = 80;
const MESSAGE_TRUNCATE_WIDTH: usize = 60;
const MESSAGE_WRAP_WIDTH: usize = 72;

/// Renders the finding tree as styled, human-readable text.
///
/// Thin mode lists one line per matched line or message; verbose mode adds
/// authorship, dates, full messages, highlighted matches, and the patterns
/// that matched nothing.
pub fn write(ctx: &OutputContext, writer: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(writer)?;

    for pattern in ctx.patterns {
        let Some(bucket) = ctx.tree.get(&pattern.text) else {
            continue;
        };

        if bucket.is_empty() {
            if ctx.verbose {
                write_clean_pattern(pattern, writer)?;
            }
            continue;
        }

        write_pattern_header(pattern, bucket, writer)?;
        if ctx.verbose {
            write_bucket_verbose(pattern, bucket, writer)?;
        } else {
            write_bucket_thin(bucket, writer)?;
        }
        writeln!(writer)?;
    }

    if ctx.verbose && !ctx.tree.has_findings() {
        writeln!(writer)?;
    }

    write_summary(ctx, writer)?;
    writeln!(writer)?;
    Ok(())
}

fn write_pattern_header(pattern: &Pattern, bucket: &PatternBucket, writer: &mut dyn Write) -> anyhow::Result<()> {
    let count = bucket.len();
    let commits = format!("{count} {}", ui::pluralise_word(count, "commit", "commits"));

    match &pattern.label {
        Some(label) => writeln!(
            writer,
            "{} {} {} {} {} {}",
            colors::error().apply_to(indicators::ERROR),
            style(&pattern.text).bold(),
            colors::muted().apply_to("·"),
            colors::accent().apply_to(label),
            colors::muted().apply_to("·"),
            colors::muted().apply_to(&commits),
        )?,
        None => writeln!(
            writer,
            "{} {} {} {}",
            colors::error().apply_to(indicators::ERROR),
            style(&pattern.text).bold(),
            colors::muted().apply_to("·"),
            colors::muted().apply_to(&commits),
        )?,
    }

    Ok(())
}

fn write_clean_pattern(pattern: &Pattern, writer: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(
        writer,
        "{} {} {} {}",
        colors::success().apply_to(indicators::SUCCESS),
        colors::secondary().apply_to(&pattern.text),
        colors::muted().apply_to("·"),
        colors::muted().apply_to("no matches"),
    )?;
    Ok(())
}

fn write_bucket_thin(bucket: &PatternBucket, writer: &mut dyn Write) -> anyhow::Result<()> {
    for (sha, commit) in bucket {
        if let Some(log) = &commit.log {
            let subject = log.lines().next().unwrap_or_default();
            writeln!(
                writer,
                "  {} {}  {}",
                colors::emphasis().apply_to(sha),
                colors::muted().apply_to("message"),
                colors::secondary().apply_to(truncate_with_ellipsis(subject, MESSAGE_TRUNCATE_WIDTH)),
            )?;
        }

        for file in commit.files() {
            for line in &file.matches {
                writeln!(
                    writer,
                    "  {} {}:{}  {}",
                    colors::emphasis().apply_to(sha),
                    colors::secondary().apply_to(&file.file),
                    line.line,
                    colors::code().apply_to(truncate_with_ellipsis(&line.text, MATCH_TRUNCATE_WIDTH)),
                )?;
            }
        }
    }
    Ok(())
}

fn write_bucket_verbose(pattern: &Pattern, bucket: &PatternBucket, writer: &mut dyn Write) -> anyhow::Result<()> {
    let regex = pattern.compile().ok();
    let count = bucket.len();

    for (i, (sha, commit)) in bucket.iter().enumerate() {
        let is_last = i + 1 == count;
        let (branch, rail) = if is_last { ("└─", "   ") } else { ("├─", "│  ") };
        let rail = colors::muted().apply_to(rail);

        writeln!(
            writer,
            "  {} {}{}",
            colors::muted().apply_to(branch),
            colors::emphasis().apply_to(sha),
            describe_author(commit),
        )?;

        if let Some(log) = &commit.log {
            for line in wrap(log, MESSAGE_WRAP_WIDTH) {
                writeln!(writer, "  {rail}{}", colors::secondary().apply_to(emphasise(&line, regex.as_ref())))?;
            }
        }

        for file in commit.files() {
            writeln!(writer, "  {rail}{}", colors::primary().apply_to(&file.file))?;
            for line in &file.matches {
                writeln!(
                    writer,
                    "  {rail}{} {} {}",
                    colors::line_number().apply_to(format!("{:>LINE_NUMBER_WIDTH$}", line.line)),
                    colors::muted().apply_to("│"),
                    colors::code().apply_to(emphasise(&line.text, regex.as_ref())),
                )?;
            }
        }
    }
    Ok(())
}

fn describe_author(commit: &CommitMatch) -> String {
    let mut parts = Vec::new();

    match (&commit.author_name, &commit.author_email) {
        (Some(name), Some(email)) => parts.push(format!("{name} <{email}>")),
        (Some(who), None) | (None, Some(who)) => parts.push(who.clone()),
        (None, None) => {}
    }

    if let Some(date) = &commit.author_date {
        parts.push(format_date(date));
    }

    parts
        .iter()
        .map(|part| format!(" {} {}", colors::muted().apply_to("·"), colors::muted().apply_to(part)))
        .collect()
}

/// Formats an RFC 2822 author date as `YYYY-MM-DD HH:MM` in the author's
/// own offset, passing anything unparseable through.
fn format_date(raw: &str) -> String {
    DateTime::parse_from_rfc2822(raw).map_or_else(|_| raw.to_string(), |date| date.format("%Y-%m-%d %H:%M").to_string())
}

fn emphasise(text: &str, regex: Option<&Regex>) -> String {
    regex.map_or_else(|| text.to_string(), |regex| highlight(text, regex))
}

fn write_summary(ctx: &OutputContext, writer: &mut dyn Write) -> anyhow::Result<()> {
    let scope = if ctx.staged {
        "staged changes".to_string()
    } else {
        ctx.options
            .ranges
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    let searched = ctx.stats.patterns_searched;
    let patterns = format!("{searched} {}", ui::pluralise_word(searched, "pattern", "patterns"));
    let timing = format!("({})", format_duration(ctx.stats.elapsed));

    if ctx.stats.patterns_matched == 0 {
        writeln!(
            writer,
            "{} {} {} {} {} {} {}",
            colors::success().apply_to(indicators::SUCCESS),
            colors::primary().apply_to("Nothing found"),
            colors::muted().apply_to("·"),
            colors::muted().apply_to(&patterns),
            colors::muted().apply_to("·"),
            colors::muted().apply_to(&scope),
            colors::muted().apply_to(&timing),
        )?;
        return Ok(());
    }

    let commits = ctx.stats.commits_matched;
    let commit_word = if ctx.staged {
        "staged"
    } else {
        ui::pluralise_word(commits, "commit", "commits")
    };

    writeln!(
        writer,
        "{} {} {} {} {} {} {}",
        colors::error().apply_to(indicators::ERROR),
        colors::primary().apply_to(format!("{} of {patterns} matched", ctx.stats.patterns_matched)),
        colors::muted().apply_to("·"),
        colors::muted().apply_to(format!("{commits} {commit_word}")),
        colors::muted().apply_to("·"),
        colors::muted().apply_to(&scope),
        colors::muted().apply_to(&timing),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use delve_core::{FileMatch, LineMatch, STAGED_KEY};

    use super::super::SearchStats;
    use super::*;

    fn render(tree: &FindingTree, patterns: &PatternSet, staged: bool, verbose: bool) -> String {
        let options = SearchOptions {
            ranges: vec![RevisionRange::All],
            ..SearchOptions::default()
        };
        let ctx = OutputContext {
            tree,
            patterns,
            options: &options,
            staged,
            verbose,
            stats: SearchStats {
                patterns_searched: tree.pattern_count(),
                patterns_matched: tree.matched().count(),
                commits_matched: tree.total_commits(),
                elapsed: Duration::from_millis(5),
            },
        };
        let mut out = Vec::new();
        write(&ctx, &mut out).unwrap();
        console::strip_ansi_codes(&String::from_utf8(out).unwrap()).into_owned()
    }

    fn sample() -> (FindingTree, PatternSet) {
        let patterns: PatternSet = [
            Pattern::labelled("frabjous", "Poetry"),
            Pattern::new("token"),
        ]
        .into_iter()
        .collect();

        let mut tree = FindingTree::with_patterns(patterns.iter().map(|p| p.text.as_str()));
        tree.merge_commit(
            "frabjous",
            "f0a6ebc",
            CommitMatch {
                author_date: Some("Mon, 2 Nov 2015 14:07:33 -0500".into()),
                author_name: Some("Jabber Wock".into()),
                author_email: Some("jabber@wock.org".into()),
                log: Some("Callooh! frabjous day".into()),
                files: Some(vec![FileMatch::new(
                    "poem.txt",
                    vec![LineMatch::new(12, "O frabjous day!")],
                )]),
            },
        );
        (tree, patterns)
    }

    #[test]
    fn thin_lists_message_and_file_lines() {
        let (tree, patterns) = sample();
        let out = render(&tree, &patterns, false, false);

        assert!(out.contains("✖ frabjous · Poetry · 1 commit"));
        assert!(out.contains("f0a6ebc message  Callooh! frabjous day"));
        assert!(out.contains("f0a6ebc poem.txt:12  O frabjous day!"));
        assert!(!out.contains("token"));
        assert!(out.contains("1 of 2 patterns matched · 1 commit · all"));
    }

    #[test]
    fn verbose_adds_author_date_and_clean_patterns() {
        let (tree, patterns) = sample();
        let out = render(&tree, &patterns, false, true);

        assert!(out.contains("└─ f0a6ebc · Jabber Wock <jabber@wock.org> · 2015-11-02 14:07"));
        assert!(out.contains("   12 │ O frabjous day!"));
        assert!(out.contains("✓ token · no matches"));
    }

    #[test]
    fn empty_tree_reports_nothing_found() {
        let patterns: PatternSet = [Pattern::new("token")].into_iter().collect();
        let tree = FindingTree::with_patterns(["token"]);
        let out = render(&tree, &patterns, false, false);
        assert!(out.contains("✓ Nothing found · 1 pattern · all"));
    }

    #[test]
    fn staged_entries_are_labelled_staged() {
        let patterns: PatternSet = [Pattern::new("token")].into_iter().collect();
        let mut tree = FindingTree::with_patterns(["token"]);
        tree.merge_commit(
            "token",
            STAGED_KEY,
            CommitMatch::with_files(vec![FileMatch::new(".env", vec![LineMatch::new(3, "TOKEN=abc")])]),
        );

        let out = render(&tree, &patterns, true, false);
        assert!(out.contains("staged .env:3  TOKEN=abc"));
        assert!(out.contains("· staged changes"));
    }

    #[test]
    fn unparseable_dates_pass_through() {
        assert_eq!(format_date("yesterday"), "yesterday");
        assert_eq!(format_date("Tue, 1 Dec 2015 09:12:00 -0500"), "2015-12-01 09:12");
    }
}
