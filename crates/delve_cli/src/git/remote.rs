//! Cloning or refreshing the repository named by `--url`.

use std::path::Path;
use std::process::Command;

use anyhow::Context as _;
use dialoguer::Confirm;
use dialoguer::theme::ColorfulTheme;
#[cfg(feature = "tracing")]
use tracing::info;

use crate::ui::{print_info, print_warning};

/// Clones `url` into `dir`.
///
/// When the clone fails (typically because `dir` already holds a checkout)
/// the user is asked whether to `git pull` instead; `assume_yes` answers for
/// them. Declining leaves the existing checkout untouched.
pub fn clone_or_pull(url: &str, dir: &Path, assume_yes: bool) -> anyhow::Result<()> {
    let url = url.trim_end_matches('/');
    #[cfg(feature = "tracing")]
    info!(url, dir = %dir.display(), "cloning repository");

    let clone = Command::new("git")
        .arg("clone")
        .arg(url)
        .arg(dir)
        .output()
        .context("failed to run git clone")?;

    if clone.status.success() {
        print_info(&format!("cloned {url} into {}", dir.display()));
        return Ok(());
    }

    print_warning(String::from_utf8_lossy(&clone.stderr).trim());

    if !(assume_yes || confirm_pull()) {
        return Ok(());
    }

    let pull = Command::new("git")
        .arg("-C")
        .arg(dir)
        .arg("pull")
        .output()
        .context("failed to run git pull")?;

    if !pull.status.success() {
        anyhow::bail!(
            "git pull in {} failed: {}",
            dir.display(),
            String::from_utf8_lossy(&pull.stderr).trim()
        );
    }

    print_info(&format!("git says: {}", String::from_utf8_lossy(&pull.stdout).trim()));
    Ok(())
}

fn confirm_pull() -> bool {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Do you want to git pull?")
        .default(false)
        .interact()
        .unwrap_or(false)
}
