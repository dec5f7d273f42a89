//! `git` subprocess runner implementing [`HistorySource`].

use std::process::Stdio;
use std::time::Duration;

use anyhow::Context as _;
use delve_core::query::{self, LogQuery};
use delve_core::{HistorySource, RepoPaths, SourceError};
use tokio::process::Command;
use tokio::runtime::Runtime;
#[cfg(feature = "tracing")]
use tracing::debug;

const RUNTIME_WORKERS: usize = 2;

/// Runs history queries through the `git` executable.
///
/// Each query is a separate child process with its own time limit; a child
/// that overruns is killed and reported as [`SourceError::Timeout`].
#[derive(Debug)]
pub struct GitCli {
    paths: RepoPaths,
    timeout: Duration,
    runtime: Runtime,
}

impl GitCli {
    /// Creates a runner for the repository at `paths`.
    pub fn new(paths: RepoPaths, timeout: Duration) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(RUNTIME_WORKERS)
            .enable_all()
            .build()
            .context("failed to start process runtime")?;

        Ok(Self {
            paths,
            timeout,
            runtime,
        })
    }

    fn run(&self, args: Vec<String>) -> Result<String, SourceError> {
        let command = format!("git {}", args.join(" "));
        #[cfg(feature = "tracing")]
        debug!(%command, "running git");

        self.runtime.block_on(async {
            let child = Command::new("git")
                .args(&args)
                .current_dir(&self.paths.work_dir)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|source| SourceError::Spawn {
                    command: command.clone(),
                    source,
                })?;

            let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
                Ok(Ok(output)) => output,
                Ok(Err(source)) => return Err(SourceError::Spawn { command, source }),
                Err(_elapsed) => {
                    return Err(SourceError::Timeout {
                        command,
                        timeout: self.timeout,
                    });
                }
            };

            if !output.status.success() {
                return Err(SourceError::Failed {
                    command,
                    status: output.status.to_string(),
                    stderr: decode(&output.stderr).trim().to_string(),
                });
            }

            Ok(decode(&output.stdout))
        })
    }
}

impl HistorySource for GitCli {
    fn log(&self, query: &LogQuery<'_>) -> Result<String, SourceError> {
        self.run(query::with_git_dir(&self.paths.git_dir, query.args()))
    }

    fn show(&self, sha: &str) -> Result<String, SourceError> {
        self.run(query::with_git_dir(&self.paths.git_dir, query::show_args(sha)))
    }

    fn staged_diff(&self) -> Result<String, SourceError> {
        self.run(query::staged_args(&self.paths.work_dir))
    }
}

/// Decodes git output line by line: UTF-8 where a line is valid, Latin-1
/// for lines that are not.
fn decode(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for line in bytes.split_inclusive(|&b| b == b'\n') {
        match std::str::from_utf8(line) {
            Ok(valid) => text.push_str(valid),
            Err(_) => text.extend(line.iter().copied().map(char::from)),
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use delve_core::{Filters, RevisionRange, SearchTarget};
    use tempfile::TempDir;

    use super::*;

    fn git(dir: &Path, args: &[&str]) {
        std::process::Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
    }

    fn repo_with_commit() -> (TempDir, GitCli) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        git(root, &["init"]);
        git(root, &["config", "user.email", "test@test.com"]);
        git(root, &["config", "user.name", "Test User"]);
        fs::write(root.join("notes.txt"), "frabjous day\n").unwrap();
        git(root, &["add", "notes.txt"]);
        git(root, &["commit", "-m", "callooh callay"]);

        let cli = GitCli::new(RepoPaths::for_work_dir(root), Duration::from_secs(30)).unwrap();
        (dir, cli)
    }

    #[test]
    fn decode_passes_utf8_through() {
        assert_eq!(decode("héllo".as_bytes()), "héllo");
    }

    #[test]
    fn decode_falls_back_to_latin1() {
        assert_eq!(decode(&[b'c', 0xE9, b'!']), "cé!");
    }

    #[test]
    fn log_returns_labelled_records() {
        let (_dir, cli) = repo_with_commit();
        let range = RevisionRange::All;
        let filters = Filters::default();
        let query = LogQuery {
            target: SearchTarget::Message,
            pattern: "callooh",
            range: &range,
            filters: &filters,
        };

        let out = cli.log(&query).unwrap();
        assert!(out.starts_with("COMMIT: "));
        assert!(out.contains("AUTHOREMAIL: test@test.com LOG: callooh callay"));
    }

    #[test]
    fn show_returns_zero_context_diff() {
        let (_dir, cli) = repo_with_commit();
        let out = cli.show("HEAD").unwrap();
        assert!(out.contains("diff --git a/notes.txt b/notes.txt"));
        assert!(out.contains("+frabjous day"));
    }

    #[test]
    fn unknown_revision_is_a_failure_with_stderr() {
        let (_dir, cli) = repo_with_commit();
        let err = cli.show("no-such-revision").unwrap_err();
        assert!(matches!(err, SourceError::Failed { ref stderr, .. } if !stderr.is_empty()));
    }

    #[test]
    fn staged_diff_is_empty_without_changes() {
        let (_dir, cli) = repo_with_commit();
        assert_eq!(cli.staged_diff().unwrap(), "");
    }

    #[test]
    fn decode_falls_back_to_latin1_only_for_invalid_lines() {
        let mut bytes = "+café = ok\n".as_bytes().to_vec();
        bytes.extend_from_slice(b"+caf\xe9 = latin1\n");
        bytes.extend_from_slice("+naïve\n".as_bytes());

        assert_eq!(decode(&bytes), "+café = ok\n+café = latin1\n+naïve\n");
    }
}
