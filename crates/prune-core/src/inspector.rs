//! Usage Inspector: installed packages and when they were last used.

use std::collections::BTreeMap;

use crate::error::QueryError;
use crate::manager::PackageManager;
use crate::types::{PackageName, PackageRecord};

/// Queries a [`PackageManager`] and validates what it returns.
pub struct UsageInspector<'a> {
    manager: &'a dyn PackageManager,
}

impl std::fmt::Debug for UsageInspector<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageInspector")
            .field("manager", &self.manager.name())
            .finish()
    }
}

impl<'a> UsageInspector<'a> {
    /// Wrap a package manager.
    pub fn new(manager: &'a dyn PackageManager) -> Self {
        Self { manager }
    }

    /// List installed packages, sorted by name.
    ///
    /// Records without usage data are kept. Duplicate names collapse to the
    /// last occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] if the manager fails or reports a package with
    /// an empty name.
    pub fn list_installed_packages(&self) -> Result<Vec<PackageRecord>, QueryError> {
        let raw = self.manager.list()?;

        let mut by_name: BTreeMap<PackageName, PackageRecord> = BTreeMap::new();
        for record in raw {
            if record.name.is_empty() {
                return Err(QueryError::Malformed(format!(
                    "{} reported a package with an empty name",
                    self.manager.name()
                )));
            }
            if let Some(previous) = by_name.insert(record.name.clone(), record) {
                tracing::warn!(package = %previous.name, "duplicate package in listing");
            }
        }

        let records: Vec<PackageRecord> = by_name.into_values().collect();
        let never_used = records.iter().filter(|r| r.is_never_used()).count();
        tracing::debug!(
            manager = self.manager.name(),
            total = records.len(),
            never_used,
            "listed installed packages"
        );

        Ok(records)
    }
}
