//! Output formatting for search results.

mod json;
mod text;

use std::fs::File;
use std::io::{BufWriter, IsTerminal as _, Write as _};
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::Context as _;
use delve_core::prelude::*;
#[cfg(feature = "tracing")]
use tracing::debug;

use crate::{OutputFormat, SearchArgs};

const PAGER: &str = "less";
const PAGER_ARGS: [&str; 5] = ["-F", "-R", "-S", "-X", "-K"];

/// Aggregate statistics for a completed search.
#[derive(Debug)]
pub struct SearchStats {
    /// Number of patterns searched.
    pub patterns_searched: usize,
    /// Number of patterns with at least one match.
    pub patterns_matched: usize,
    /// Matched commits summed over all patterns.
    pub commits_matched: usize,
    /// Wall-clock time for the search.
    pub elapsed: Duration,
}

/// Everything needed to render search output in any format.
#[derive(Debug)]
pub struct OutputContext<'a> {
    /// The finding tree.
    pub tree: &'a FindingTree,
    /// The searched patterns (for labels and highlighting).
    pub patterns: &'a PatternSet,
    /// Ranges and filters the search used.
    pub options: &'a SearchOptions,
    /// Whether the staged changes were searched.
    pub staged: bool,
    /// Whether to render the verbose report.
    pub verbose: bool,
    /// Search statistics for the summary.
    pub stats: SearchStats,
}

/// Writes the JSON document to `--output` if given, then renders to stdout
/// in the requested format.
pub fn write_output(args: &SearchArgs, ctx: &OutputContext) -> anyhow::Result<()> {
    if let Some(path) = &args.output {
        let file = File::create(path).with_context(|| format!("failed to create output file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        json::write(ctx, &mut writer)?;
        writer.flush()?;
    }

    match args.format {
        OutputFormat::Json => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            json::write(ctx, &mut writer)
        }
        OutputFormat::Text if ctx.verbose && std::io::stdout().is_terminal() => {
            let mut rendered = Vec::new();
            text::write(ctx, &mut rendered)?;
            page(&rendered)
        }
        OutputFormat::Text => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            text::write(ctx, &mut writer)
        }
    }
}

/// Sends `rendered` through `less`, printing directly when it cannot start.
fn page(rendered: &[u8]) -> anyhow::Result<()> {
    let Ok(mut child) = Command::new(PAGER).args(PAGER_ARGS).stdin(Stdio::piped()).spawn() else {
        #[cfg(feature = "tracing")]
        debug!(pager = PAGER, "pager unavailable, printing directly");
        let stdout = std::io::stdout();
        let mut writer = stdout.lock();
        writer.write_all(rendered)?;
        return Ok(());
    };

    if let Some(mut stdin) = child.stdin.take() {
        match stdin.write_all(rendered) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
            Err(e) => return Err(e).context("failed to write to pager"),
        }
    }

    child.wait().context("pager failed")?;
    Ok(())
}
