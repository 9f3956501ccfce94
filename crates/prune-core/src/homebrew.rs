//! Homebrew backend.
//!
//! Installed formulae come from `brew info --json=v2 --installed`. Homebrew
//! records no usage data itself, so "last used" is derived from file access
//! times inside each keg: executables under `bin/` and `sbin/` first, any
//! file in the keg otherwise.
//!
//! Access times depend on the volume's atime policy. APFS updates them lazily
//! (at most once per day past the modification time), which is precise
//! enough for day-granularity cutoffs.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::config::PruneConfig;
use crate::error::{CommandError, QueryError, RemovalError};
use crate::manager::PackageManager;
use crate::process;
use crate::types::{PackageName, PackageRecord};

#[derive(Debug, Deserialize)]
struct BrewInfo {
    #[serde(default)]
    formulae: Vec<BrewFormula>,
}

#[derive(Debug, Deserialize)]
struct BrewFormula {
    name: String,
    #[serde(default)]
    installed: Vec<BrewInstalled>,
    #[serde(default)]
    linked_keg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BrewInstalled {
    version: String,
}

/// Usage data gathered from a keg directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KegUsage {
    /// Latest access time, `None` if nothing could be read.
    pub last_access: Option<DateTime<Utc>>,
    /// Total size of regular files, `None` if the keg is missing.
    pub size_bytes: Option<u64>,
}

/// [`PackageManager`] backed by the `brew` executable.
#[derive(Debug, Clone)]
pub struct Homebrew {
    brew: PathBuf,
    timeout: Duration,
}

impl Homebrew {
    /// Use a specific `brew` executable.
    pub fn new(brew: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            brew: brew.into(),
            timeout,
        }
    }

    /// Find `brew` from the configured path or `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Unavailable`] if no executable is found.
    pub fn locate(config: &PruneConfig) -> Result<Self, QueryError> {
        let brew = match &config.brew_path {
            Some(path) if path.is_file() => path.clone(),
            Some(path) => {
                return Err(QueryError::Unavailable {
                    program: path.display().to_string(),
                });
            }
            None => which::which("brew").map_err(|_| QueryError::Unavailable {
                program: "brew".to_string(),
            })?,
        };
        tracing::debug!(brew = %brew.display(), "using homebrew");
        Ok(Self::new(brew, config.command_timeout()))
    }

    fn cellar(&self) -> Result<PathBuf, QueryError> {
        let out = process::run(&self.brew, &["--cellar"], self.timeout)?;
        let cellar = out.stdout.trim();
        if cellar.is_empty() {
            let msg = "`brew --cellar` printed nothing".to_string();
            return Err(QueryError::Malformed(msg));
        }
        Ok(PathBuf::from(cellar))
    }
}

impl PackageManager for Homebrew {
    fn name(&self) -> &str {
        "brew"
    }

    fn list(&self) -> Result<Vec<PackageRecord>, QueryError> {
        let cellar = self.cellar()?;
        let args = ["info", "--json=v2", "--installed"];
        let out = process::run(&self.brew, &args, self.timeout)?;
        records_from_info(&out.stdout, &cellar)
    }

    fn uninstall(&self, name: &PackageName) -> Result<(), RemovalError> {
        let args = ["uninstall", "--formula", name.as_str()];
        match process::run(&self.brew, &args, self.timeout) {
            Ok(_) => Ok(()),
            Err(CommandError::Failed { stderr, .. }) if stderr.contains("required by") => {
                Err(RemovalError::HasDependents { detail: stderr })
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Build records from `brew info --json=v2` output and the cellar on disk.
///
/// # Errors
///
/// Returns [`QueryError::Malformed`] if the JSON cannot be parsed.
pub fn records_from_info(json: &str, cellar: &Path) -> Result<Vec<PackageRecord>, QueryError> {
    let info: BrewInfo =
        serde_json::from_str(json).map_err(|e| QueryError::Malformed(e.to_string()))?;

    let records = info
        .formulae
        .into_iter()
        .map(|formula| {
            let version = formula
                .linked_keg
                .or_else(|| formula.installed.last().map(|i| i.version.clone()));

            let mut record = PackageRecord::new(formula.name.as_str());
            if let Some(version) = version {
                let usage = inspect_keg(&cellar.join(&formula.name).join(&version));
                record.last_used_at = usage.last_access;
                record.installed_size_bytes = usage.size_bytes;
                record.version = Some(version);
            }
            record
        })
        .collect();

    Ok(records)
}

/// Measure a keg: latest access time and total size.
pub fn inspect_keg(keg: &Path) -> KegUsage {
    if !keg.is_dir() {
        return KegUsage::default();
    }

    let mut size: u64 = 0;
    let mut latest_exec: Option<SystemTime> = None;
    let mut latest_any: Option<SystemTime> = None;

    for entry in walkdir::WalkDir::new(keg)
        .follow_links(false)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
    {
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        size += meta.len();

        let Ok(accessed) = meta.accessed() else {
            continue;
        };
        latest_any = latest_any.max(Some(accessed));

        let is_exec = entry
            .path()
            .strip_prefix(keg)
            .ok()
            .and_then(|rel| rel.components().next())
            .is_some_and(|c| c.as_os_str() == "bin" || c.as_os_str() == "sbin");
        if is_exec {
            latest_exec = latest_exec.max(Some(accessed));
        }
    }

    KegUsage {
        last_access: latest_exec.or(latest_any).map(DateTime::<Utc>::from),
        size_bytes: Some(size),
    }
}
