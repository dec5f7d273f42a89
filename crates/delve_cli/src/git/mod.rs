//! Git repository access for history searches.

mod process;
mod remote;

use std::path::Path;

use anyhow::Context as _;
use delve_core::RepoPaths;

pub use self::process::GitCli;
pub use self::remote::clone_or_pull;

/// A discovered git repository.
#[derive(Debug)]
pub struct Repo {
    inner: gix::Repository,
}

impl Repo {
    /// Discovers the repository at or above `path`.
    pub fn discover(path: &Path) -> anyhow::Result<Self> {
        let path = path
            .canonicalize()
            .with_context(|| format!("invalid repository directory: {}", path.display()))?;
        let inner = gix::discover(&path).with_context(|| format!("not a git repository: {}", path.display()))?;
        Ok(Self { inner })
    }

    /// Returns the work tree and `.git` directory.
    ///
    /// Bare repositories use the git directory for both.
    #[must_use]
    pub fn paths(&self) -> RepoPaths {
        let git_dir = self.inner.git_dir().to_path_buf();
        let work_dir = self.inner.workdir().map_or_else(|| git_dir.clone(), Path::to_path_buf);
        RepoPaths { work_dir, git_dir }
    }

    /// Returns `true` if this is a shallow clone with truncated history.
    #[must_use]
    pub fn is_shallow(&self) -> bool {
        self.inner.is_shallow()
    }
}

#[cfg(test)]
mod tests {
    use std::process::Command;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn discover_rejects_plain_directory() {
        let dir = TempDir::new().unwrap();
        let err = Repo::discover(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("not a git repository"));
    }

    #[test]
    fn discover_rejects_missing_directory() {
        let err = Repo::discover(Path::new("/nonexistent/delve/repo")).unwrap_err();
        assert!(err.to_string().contains("invalid repository directory"));
    }

    #[test]
    fn paths_point_at_work_tree_and_git_dir() {
        let dir = TempDir::new().unwrap();
        Command::new("git").arg("init").current_dir(dir.path()).output().unwrap();

        let repo = Repo::discover(dir.path()).unwrap();
        let paths = repo.paths();
        let root = dir.path().canonicalize().unwrap();

        assert_eq!(paths.work_dir, root);
        assert_eq!(paths.git_dir, root.join(".git"));
        assert!(!repo.is_shallow());
    }
}
