//! Parallel pattern search.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Context as _;
use delve_core::prelude::*;
use delve_core::{Investigation, PatternOutcome};
use rayon::prelude::*;

use crate::ui::create_pattern_progress;

/// Configures the global rayon thread pool with the requested number of
/// threads, if specified.
pub fn configure_thread_pool(concurrency: Option<usize>) -> anyhow::Result<()> {
    if let Some(n) = concurrency {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("failed to configure thread pool")?;
    }
    Ok(())
}

/// Searches every pattern on the rayon pool and assembles the finding tree.
///
/// Each worker owns one pattern's bucket; buckets are inserted into the tree
/// on the calling thread in pattern order.
pub fn run_search<S: HistorySource>(
    source: &S,
    patterns: &PatternSet,
    options: &SearchOptions,
    staged: bool,
    show_progress: bool,
) -> anyhow::Result<Investigation> {
    let investigator = Investigator::new(source, options);
    let pb = show_progress.then(|| create_pattern_progress(patterns.len()));
    let progress = AtomicUsize::new(0);

    let outcomes: Vec<Result<PatternOutcome, PatternError>> = patterns
        .patterns()
        .par_iter()
        .map(|pattern| {
            let outcome = if staged {
                investigator.search_staged(pattern)
            } else {
                investigator.search_pattern(pattern)
            };

            let completed = progress.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref pb) = pb {
                pb.set_position(completed as u64);
            }

            outcome
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let mut investigation = Investigation::new(patterns);
    for (pattern, outcome) in patterns.iter().zip(outcomes) {
        investigation.record(pattern, outcome?);
    }

    Ok(investigation)
}
