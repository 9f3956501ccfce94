//! Package manager capability.

use crate::error::{QueryError, RemovalError};
use crate::types::{PackageName, PackageRecord};

/// The two operations prune needs from a package manager.
///
/// Both components receive this as an injected capability, never as global
/// state, so tests can run against an in-memory fake.
pub trait PackageManager: Send + Sync {
    /// Display name of the backend (e.g. `brew`).
    fn name(&self) -> &str;

    /// List installed packages with whatever usage data is available.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] if the manager is unavailable or its output
    /// cannot be interpreted.
    fn list(&self) -> Result<Vec<PackageRecord>, QueryError>;

    /// Uninstall a single package.
    ///
    /// # Errors
    ///
    /// Returns [`RemovalError`] if the package could not be removed.
    fn uninstall(&self, name: &PackageName) -> Result<(), RemovalError>;
}
