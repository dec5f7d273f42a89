//! # Commands
//!
//! - `delve search` - Search commit messages, diffs, or staged changes for patterns
//! - `delve patterns` - List the patterns a search would use

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod commands;
mod git;
mod sources;
mod ui;

use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use console::style;
pub use delve_core::CONFIG_FILENAME;

use crate::ui::colors;

const REPO_URL: &str = "https://github.com/delve-scan/delve";

#[derive(Debug, Parser)]
#[command(
    name = "delve",
    version,
    styles = ui::clap_styles(),
    arg_required_else_help = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search revision history or staged changes for patterns.
    #[command(visible_alias = "s")]
    Search(SearchArgs),

    /// List the patterns a search would use.
    #[command(visible_alias = "p")]
    Patterns(PatternsArgs),
}

/// Output format for search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable terminal output.
    #[default]
    Text,
    /// The finding tree as JSON.
    Json,
}

/// Arguments for the `delve search` command.
#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// Local directory of the repository (clone target with `--url`).
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Clone the repository from this URL into `--dir` before searching.
    #[arg(short, long)]
    pub url: Option<String>,

    /// Answer yes to prompts (pull an existing clone).
    #[arg(short, long)]
    pub yes: bool,

    /// A single pattern to search for.
    #[arg(short, long)]
    pub term: Option<String>,

    /// Pattern files or http(s) URLs, comma-separated.
    #[arg(short, long, value_name = "SOURCES", value_delimiter = ',')]
    pub patterns: Vec<String>,

    /// Comma-separated revision ranges to search; `all` for the full history.
    #[arg(short, long, value_name = "LIST")]
    pub revlist: Option<String>,

    /// Restrict to commits by this author (name or email).
    #[arg(long)]
    pub author: Option<String>,

    /// Only search commits before this date.
    #[arg(short, long, value_name = "DATE")]
    pub before: Option<String>,

    /// Only search commits after this date.
    #[arg(short, long, value_name = "DATE")]
    pub after: Option<String>,

    /// Search the staged changes instead of committed history.
    #[arg(long)]
    pub staged: bool,

    /// Show authors, dates, full messages, and highlighted matches.
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Write the finding tree as JSON to a file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to `.delve.toml` configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Time limit for each git query, in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Number of patterns searched in parallel.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Always exit with code 0, even when matches are found.
    #[arg(long)]
    pub exit_zero: bool,
}

/// Arguments for the `delve patterns` command.
#[derive(Debug, Parser)]
pub struct PatternsArgs {
    /// A single extra pattern.
    #[arg(short, long)]
    pub term: Option<String>,

    /// Pattern files or http(s) URLs, comma-separated.
    #[arg(short, long, value_name = "SOURCES", value_delimiter = ',')]
    pub patterns: Vec<String>,

    /// Path to `.delve.toml` configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

fn main() {
    #[cfg(feature = "tracing")]
    {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
            .with(EnvFilter::from_default_env())
            .init();
    }

    let cli = parse_cli();

    if let Err(e) = run(cli.command) {
        ui::print_error(&format!("{e:#}"));
        std::process::exit(ui::exit::ERROR);
    }
}

fn parse_cli() -> Cli {
    let cmd = Cli::command().about(build_about()).after_help(build_after_help());

    let matches = cmd.get_matches();

    #[expect(clippy::expect_used, reason = "clap already validated args; this cannot fail")]
    Cli::from_arg_matches(&matches).expect("failed to parse arguments")
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Search(args) => commands::search::run(&args),
        Command::Patterns(args) => commands::patterns::run(&args),
    }
}

fn build_about() -> String {
    format!(
        r"
  {} searches a git repository's history for secrets and sensitive text.

  Commit messages, the lines each commit added, and staged changes
  are matched against case-insensitive regular expressions.",
        colors::accent().apply_to("delve").bold()
    )
}

fn build_after_help() -> String {
    format!(
        r"
  {}
    delve search                          Search the latest commit with built-in patterns
    delve search -r all -t 'api[_-]?key'  Search the whole history for one pattern
    delve search -p team.txt -r all       Use patterns from a file
    delve search --staged                 Check staged changes before committing
    delve search -r all -o findings.json  Write the finding tree as JSON
    delve patterns                        List the patterns a search would use

  Learn more: {}",
        style("Examples:").bold(),
        colors::accent().apply_to(REPO_URL).underlined()
    )
}
