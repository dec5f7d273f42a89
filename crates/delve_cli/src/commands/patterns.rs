//! Patterns command - lists the patterns a search would use.

use std::path::Path;

use anyhow::Context as _;
use console::style;
use delve_core::prelude::*;

use crate::sources::load_patterns;
use crate::ui::{colors, pluralise_word, print_command_header};
use crate::{CONFIG_FILENAME, PatternsArgs};

const UNLABELLED: &str = "Unlabelled";

/// Lists the effective pattern set grouped by label, in first-seen order.
pub fn run(args: &PatternsArgs) -> super::Result {
    print_command_header("patterns");

    let config_path = args.config.as_deref().unwrap_or(Path::new(CONFIG_FILENAME));
    let config = Config::load(config_path).context("loading config")?;
    let patterns = load_patterns(args.term.as_deref(), &config, &args.patterns)?;

    println!(
        "{}",
        colors::muted().apply_to(format!(
            "{} {}",
            patterns.len(),
            pluralise_word(patterns.len(), "pattern", "patterns")
        ))
    );

    for (label, members) in group_by_label(&patterns) {
        print_group(label, &members);
    }

    println!();
    Ok(())
}

fn group_by_label(patterns: &PatternSet) -> Vec<(&str, Vec<&Pattern>)> {
    let mut groups: Vec<(&str, Vec<&Pattern>)> = Vec::new();

    for pattern in patterns {
        let label = pattern.label.as_deref().unwrap_or(UNLABELLED);
        match groups.iter_mut().find(|(name, _)| *name == label) {
            Some((_, members)) => members.push(pattern),
            None => groups.push((label, vec![pattern])),
        }
    }

    groups
}

fn print_group(label: &str, patterns: &[&Pattern]) {
    println!();
    println!(
        "{} {}",
        style(label).bold(),
        colors::muted().apply_to(format!("({})", patterns.len()))
    );

    for pattern in patterns {
        println!("  {}", colors::accent().apply_to(&pattern.text));
    }
}
