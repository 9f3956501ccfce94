//! Reporter trait for dependency injection
//!
//! This trait allows the executor to report progress and status without
//! being coupled to a specific terminal implementation.

use crate::types::PackageName;

/// Sink for executor progress events.
pub trait Reporter: Send + Sync {
    /// Indicates a new phase has started (e.g. "Listing", "Removing").
    fn section(&self, title: &str);

    /// Updates the state of a package to 'removing'.
    fn removing(&self, name: &PackageName);

    /// Marks a package operation as successfully completed.
    fn done(&self, name: &PackageName, detail: &str, size: Option<u64>);

    /// Marks a package operation as failed with a specific reason.
    fn failed(&self, name: &PackageName, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);
}

/// A no-op reporter for silent operations (e.g., JSON output, testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn removing(&self, _: &PackageName) {}
    fn done(&self, _: &PackageName, _: &str, _: Option<u64>) {}
    fn failed(&self, _: &PackageName, _: &str) {}
    fn info(&self, _: &str) {}
    fn warning(&self, _: &str) {}
}
