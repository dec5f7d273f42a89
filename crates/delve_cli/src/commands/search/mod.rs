//! Search command - looks for patterns in commit messages, committed diffs,
//! or staged changes.

mod context;
mod output;
mod runner;

use std::time::Instant;

use delve_core::SearchWarning;

use self::context::SearchContext;
use self::output::{OutputContext, SearchStats};
use self::runner::{configure_thread_pool, run_search};
use crate::git::{GitCli, Repo, clone_or_pull};
use crate::ui::{exit, print_command_header, print_warning};
use crate::{OutputFormat, SearchArgs};

/// Executes the `delve search` command.
pub fn run(args: &SearchArgs) -> super::Result {
    let show_progress = should_show_progress(args);
    let start = Instant::now();

    if show_progress {
        print_command_header(if args.staged { "search --staged" } else { "search" });
    }

    if let Some(url) = &args.url {
        clone_or_pull(url, &args.dir, args.yes)?;
    }

    let repo = Repo::discover(&args.dir)?;
    let context = SearchContext::load(args)?;
    configure_thread_pool(context.concurrency(args.concurrency))?;

    if !args.staged && repo.is_shallow() {
        print_warning(
            "shallow clone detected, search limited to available commits\nrun `git fetch --unshallow` for full history",
        );
    }

    let source = GitCli::new(repo.paths(), context.timeout)?;
    let investigation = run_search(
        &source,
        &context.patterns,
        &context.options,
        args.staged,
        show_progress,
    )?;

    for (pattern, warning) in &investigation.warnings {
        print_warning(&describe_warning(pattern, warning));
    }

    let stats = SearchStats {
        patterns_searched: investigation.tree.pattern_count(),
        patterns_matched: investigation.tree.matched().count(),
        commits_matched: investigation.tree.total_commits(),
        elapsed: start.elapsed(),
    };

    let ctx = OutputContext {
        tree: &investigation.tree,
        patterns: &context.patterns,
        options: &context.options,
        staged: args.staged,
        verbose: args.verbose,
        stats,
    };

    output::write_output(args, &ctx)?;

    if !args.exit_zero && investigation.tree.has_findings() {
        std::process::exit(exit::FINDINGS);
    }

    Ok(())
}

fn should_show_progress(args: &SearchArgs) -> bool {
    matches!(args.format, OutputFormat::Text)
}

fn describe_warning(pattern: &str, warning: &SearchWarning) -> String {
    match warning {
        SearchWarning::QueryFailed { range, target, message } => {
            format!("{target} search for '{pattern}' in {range} failed: {message}")
        }
        SearchWarning::ShowFailed { sha, message } => {
            format!("could not read diff of {sha} for '{pattern}': {message}")
        }
        SearchWarning::MalformedRecord { message } => {
            format!("skipped a log record for '{pattern}': {message}")
        }
    }
}
