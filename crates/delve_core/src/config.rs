use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::pattern::Pattern;
use crate::query::Filters;

/// Project-level configuration loaded from `.delve.toml`.
///
/// Every field is optional; command-line flags take precedence over the
/// values here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Pattern files or `http(s)` URLs to load patterns from.
    #[serde(default)]
    pub pattern_sources: Vec<String>,

    /// Patterns declared inline.
    #[serde(default)]
    pub patterns: Vec<Pattern>,

    /// Comma-delimited revision list to search.
    #[serde(default)]
    pub revlist: Option<String>,

    /// Author and date restrictions.
    #[serde(default, flatten)]
    pub filters: Filters,

    /// Per-query time limit in seconds.
    #[serde(default)]
    pub query_timeout_secs: Option<u64>,

    /// Number of patterns searched in parallel.
    #[serde(default)]
    pub concurrency: Option<usize>,
}

impl Config {
    /// Creates a default configuration with no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a `.delve.toml` file.
    ///
    /// Returns the default configuration if the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })
    }
}

/// Errors that can occur when reading or parsing a `.delve.toml` file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read from disk.
    #[error("failed to read config '{path}': {source}")]
    Read {
        /// Path to the config file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file contained invalid TOML or unexpected values.
    #[error("failed to parse config '{path}': {source}")]
    Parse {
        /// Path to the config file that could not be parsed.
        path: PathBuf,
        /// The underlying TOML deserialization error.
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    /// Returns the file path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } => path,
        }
    }
}
