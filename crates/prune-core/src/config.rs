//! User configuration.
//!
//! Resolution order: explicit path, `$PRUNE_CONFIG`, then
//! `<config_dir>/prune/config.toml`. Only the last one may be missing.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::executor::PrunePolicy;
use crate::types::PackageName;

/// Default cutoff horizon in days.
pub const DEFAULT_HORIZON_DAYS: u32 = 90;

/// Largest accepted `horizon_days` (roughly a century).
pub const MAX_HORIZON_DAYS: u32 = 36_500;

/// Default per-command timeout in seconds.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 300;

/// Settings read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PruneConfig {
    /// Days before now used as the cutoff when `--before` is omitted.
    pub horizon_days: u32,
    /// Whether packages with no recorded use are pruned.
    pub include_never_used: bool,
    /// Packages that are never removed.
    pub keep: BTreeSet<PackageName>,
    /// Explicit path to the `brew` executable.
    pub brew_path: Option<PathBuf>,
    /// Per package-manager invocation timeout.
    pub command_timeout_secs: u64,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
            include_never_used: true,
            keep: BTreeSet::new(),
            brew_path: None,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
        }
    }
}

impl PruneConfig {
    /// Load configuration, applying environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicitly requested file is missing,
    /// any file fails to parse, or a value is out of range.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("PRUNE_CONFIG").map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        if let Some(brew) = std::env::var_os("PRUNE_BREW") {
            config.brew_path = Some(PathBuf::from(brew));
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero timeout or a horizon
    /// beyond [`MAX_HORIZON_DAYS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon_days > MAX_HORIZON_DAYS {
            return Err(ConfigError::Invalid(format!(
                "horizon_days must be at most {MAX_HORIZON_DAYS}, got {}",
                self.horizon_days
            )));
        }
        if self.command_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "command_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Timeout applied to each package-manager command.
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Removal policy derived from this configuration.
    pub fn policy(&self) -> PrunePolicy {
        PrunePolicy {
            include_never_used: self.include_never_used,
            keep: self.keep.clone(),
        }
    }
}

/// Default config location: `<config_dir>/prune/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("prune").join("config.toml"))
}
