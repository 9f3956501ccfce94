//! Error taxonomy.
//!
//! `QueryError`, `InvalidDate` and `ConfigError` are fatal and abort a run
//! before anything is removed. `RemovalError` is per package: the executor
//! records it in the report and moves on.

use std::path::PathBuf;
use thiserror::Error;

/// Failure running an external command.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The process could not be started.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        /// Rendered command line.
        command: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The process exited unsuccessfully.
    #[error("`{command}` failed ({status}): {stderr}")]
    Failed {
        /// Rendered command line.
        command: String,
        /// Exit status as reported by the OS.
        status: String,
        /// Trimmed stderr output.
        stderr: String,
    },

    /// The process did not finish within the configured timeout and was killed.
    #[error("`{command}` timed out after {secs}s")]
    Timeout {
        /// Rendered command line.
        command: String,
        /// Timeout that elapsed.
        secs: u64,
    },
}

/// The package manager could not be queried.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The package manager executable could not be located.
    #[error("package manager `{program}` not found")]
    Unavailable {
        /// Program name or configured path.
        program: String,
    },

    /// A query command failed.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The package manager answered with output we could not interpret.
    #[error("malformed package manager output: {0}")]
    Malformed(String),
}

/// A single package could not be uninstalled.
#[derive(Error, Debug)]
pub enum RemovalError {
    /// The uninstall command failed.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The package manager refused because other installed packages depend on it.
    #[error("required by other installed packages: {detail}")]
    HasDependents {
        /// Message from the package manager.
        detail: String,
    },

    /// Backend-specific failure.
    #[error("{0}")]
    Other(String),
}

impl RemovalError {
    /// Whether another attempt could succeed. A refusal over dependents is
    /// deterministic and is not retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::HasDependents { .. })
    }
}

/// A cutoff date that could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid date `{input}`: expected YYYY-MM-DD or an RFC 3339 timestamp")]
pub struct InvalidDate {
    /// The rejected input.
    pub input: String,
}

/// Configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`crate::PruneConfig`].
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// A value is out of range.
    #[error("invalid config value: {0}")]
    Invalid(String),
}
