//! Data model for a single prune run.
//!
//! Nothing here is persisted: records are rebuilt from the package manager on
//! every invocation and the report is discarded once printed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A package name, normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PackageName(String);

impl PackageName {
    /// Create a new package name, normalizing the input to lowercase.
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    /// Return the normalized name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for PackageName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::ffi::OsStr> for PackageName {
    fn as_ref(&self) -> &std::ffi::OsStr {
        self.0.as_ref()
    }
}

impl PartialEq<str> for PackageName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.to_lowercase()
    }
}

impl PartialEq<&str> for PackageName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.to_lowercase()
    }
}

impl From<String> for PackageName {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<PackageName> for String {
    fn from(name: PackageName) -> Self {
        name.0
    }
}

/// One installed package as reported by the package manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRecord {
    /// Package name.
    pub name: PackageName,
    /// Installed version, when the manager reports one.
    pub version: Option<String>,
    /// Most recent recorded use. `None` means no use was ever recorded.
    pub last_used_at: Option<DateTime<Utc>>,
    /// Size of the installed files, when known.
    pub installed_size_bytes: Option<u64>,
}

impl PackageRecord {
    /// Create a record with no usage, version or size information.
    pub fn new(name: impl Into<PackageName>) -> Self {
        Self {
            name: name.into(),
            version: None,
            last_used_at: None,
            installed_size_bytes: None,
        }
    }

    /// Set the last-used timestamp.
    pub fn with_last_used(mut self, at: DateTime<Utc>) -> Self {
        self.last_used_at = Some(at);
        self
    }

    /// Set the installed size in bytes.
    pub fn with_size(mut self, bytes: u64) -> Self {
        self.installed_size_bytes = Some(bytes);
        self
    }

    /// Set the installed version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Returns `true` if the package has no recorded use at all.
    pub fn is_never_used(&self) -> bool {
        self.last_used_at.is_none()
    }
}

/// Why a package was selected for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateReason {
    /// Last use is older than the cutoff.
    StaleUsage,
    /// No use was ever recorded.
    NeverUsed,
}

/// A package eligible for removal in the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneCandidate {
    /// The underlying record.
    pub record: PackageRecord,
    /// Why it was selected.
    pub reason: CandidateReason,
}

/// Why a package was left installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Used on or after the cutoff.
    RecentlyUsed,
    /// Never used, but never-used pruning is disabled.
    NeverUsedExcluded,
    /// Protected by the keep list.
    Kept,
    /// The uninstall call failed, including its retry.
    RemovalFailed,
}

impl SkipReason {
    /// Short human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::RecentlyUsed => "recently used",
            Self::NeverUsedExcluded => "never used (excluded)",
            Self::Kept => "kept",
            Self::RemovalFailed => "removal failed",
        }
    }
}

/// A package that was not removed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPackage {
    /// The underlying record.
    pub record: PackageRecord,
    /// Why it was skipped.
    pub reason: SkipReason,
    /// Error message for [`SkipReason::RemovalFailed`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SkippedPackage {
    /// Skip a package for a non-error reason.
    pub fn new(record: PackageRecord, reason: SkipReason) -> Self {
        Self {
            record,
            reason,
            detail: None,
        }
    }

    /// Record a failed removal.
    pub fn failed(record: PackageRecord, error: impl Into<String>) -> Self {
        Self {
            record,
            reason: SkipReason::RemovalFailed,
            detail: Some(error.into()),
        }
    }
}

/// Whether removal is simulated or performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PruneMode {
    /// Classify and report, never uninstall.
    DryRun,
    /// Uninstall every candidate.
    Apply,
}

/// Outcome of a prune run.
///
/// In [`PruneMode::DryRun`] `removed` lists what *would* be removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    /// Mode the run executed in.
    pub mode: PruneMode,
    /// Cutoff the records were compared against.
    pub cutoff: DateTime<Utc>,
    /// Removed (or would-be-removed) packages, in name order.
    pub removed: Vec<PackageRecord>,
    /// Packages left installed, in name order.
    pub skipped: Vec<SkippedPackage>,
    /// Set when the run stopped early on an interrupt.
    pub interrupted: bool,
}

impl PruneReport {
    /// Returns `true` if at least one removal failed.
    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Iterate over failed removals.
    pub fn failures(&self) -> impl Iterator<Item = &SkippedPackage> {
        self.skipped
            .iter()
            .filter(|s| s.reason == SkipReason::RemovalFailed)
    }

    /// Total known size of removed packages.
    pub fn reclaimed_bytes(&self) -> u64 {
        self.removed
            .iter()
            .filter_map(|r| r.installed_size_bytes)
            .sum()
    }
}
