//! Search context - configuration, pattern loading, and run settings.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use delve_core::prelude::*;
use delve_core::query::DEFAULT_REVLIST;
use delve_core::DiffMetadataPolicy;

use crate::sources::load_patterns;
use crate::{CONFIG_FILENAME, SearchArgs};

/// Query time limit used when neither the flag nor the config sets one.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 120;

/// Everything a search needs, resolved once from flags and `.delve.toml`.
#[derive(Debug)]
pub struct SearchContext {
    /// Parsed configuration.
    pub config: Config,
    /// The patterns to search for.
    pub patterns: PatternSet,
    /// Ranges, filters, and the diff-metadata policy.
    pub options: SearchOptions,
    /// Per-query time limit.
    pub timeout: Duration,
}

impl SearchContext {
    /// Loads configuration and patterns and resolves flag overrides.
    pub fn load(args: &SearchArgs) -> anyhow::Result<Self> {
        let config_path = config_path(args);
        let config = Config::load(&config_path).context("loading config")?;
        let patterns = load_patterns(args.term.as_deref(), &config, &args.patterns)?;
        let options = build_options(args, &config);
        let timeout = Duration::from_secs(
            args.timeout
                .or(config.query_timeout_secs)
                .unwrap_or(DEFAULT_QUERY_TIMEOUT_SECS),
        );

        Ok(Self {
            config,
            patterns,
            options,
            timeout,
        })
    }

    /// Returns the effective worker count, preferring the CLI argument.
    pub fn concurrency(&self, arg: Option<usize>) -> Option<usize> {
        arg.or(self.config.concurrency)
    }
}

fn config_path(args: &SearchArgs) -> PathBuf {
    args.config.clone().unwrap_or_else(|| args.dir.join(CONFIG_FILENAME))
}

fn build_options(args: &SearchArgs, config: &Config) -> SearchOptions {
    let revlist = args
        .revlist
        .as_deref()
        .or(config.revlist.as_deref())
        .unwrap_or(DEFAULT_REVLIST);

    let mut ranges = RevisionRange::parse_list(revlist);
    if ranges.is_empty() {
        ranges.push(RevisionRange::parse(DEFAULT_REVLIST));
    }

    let filters = Filters {
        author: args.author.clone().or_else(|| config.filters.author.clone()),
        before: args.before.clone().or_else(|| config.filters.before.clone()),
        after: args.after.clone().or_else(|| config.filters.after.clone()),
    };

    SearchOptions {
        ranges,
        filters,
        diff_metadata: DiffMetadataPolicy::RequireMatches,
    }
}
