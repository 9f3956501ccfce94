//! prune - remove Homebrew packages nobody has used in a while
//!
//! # Architecture
//!
//! - **Capability injection**: all package-manager access goes through the
//!   [`PackageManager`] trait (`list` + `uninstall`). [`Homebrew`] is the real
//!   backend; tests substitute a fake.
//! - **Usage Inspector**: [`UsageInspector`] turns the manager's listing into
//!   validated [`PackageRecord`]s.
//! - **Prune Executor**: [`PruneExecutor`] classifies records against a cutoff,
//!   then simulates or performs removal strictly in name order and collects a
//!   [`PruneReport`].
//! - **Reporter**: progress is pushed through the [`Reporter`] trait so the
//!   core stays decoupled from the terminal.
//!
//! ```text
//! Idle -> Listing -> Classifying -> (Simulating | Removing) -> Reported
//! ```

pub mod config;
pub mod cutoff;
pub mod error;
pub mod executor;
pub mod homebrew;
pub mod inspector;
pub mod manager;
pub mod process;
pub mod reporter;
pub mod types;

pub use config::PruneConfig;
pub use cutoff::{default_cutoff, parse_cutoff};
pub use error::{CommandError, ConfigError, InvalidDate, QueryError, RemovalError};
pub use executor::{Classification, PruneExecutor, PrunePhase, PrunePolicy, classify};
pub use homebrew::Homebrew;
pub use inspector::UsageInspector;
pub use manager::PackageManager;
pub use reporter::{NullReporter, Reporter};
pub use types::{
    CandidateReason, PackageName, PackageRecord, PruneCandidate, PruneMode, PruneReport,
    SkipReason, SkippedPackage,
};
