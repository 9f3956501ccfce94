//! Prune Executor
//!
//! Classifies records against a cutoff and then either simulates or performs
//! removal:
//!
//! ```text
//! Idle --> Listing --> Classifying --+--> Simulating --+--> Reported
//!                                    +--> Removing ----+
//! ```
//!
//! Removals run one at a time in name order. A failed uninstall is retried
//! once (unless the package manager refused because of dependents), then
//! recorded as [`SkipReason::RemovalFailed`]; it never stops the remaining
//! candidates. An interrupt stops before the next removal and the
//! report covers only what was processed. Nothing is rolled back.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{self, AtomicBool};

use crate::error::{QueryError, RemovalError};
use crate::inspector::UsageInspector;
use crate::manager::PackageManager;
use crate::reporter::Reporter;
use crate::types::{
    CandidateReason, PackageName, PackageRecord, PruneCandidate, PruneMode, PruneReport,
    SkipReason, SkippedPackage,
};

/// Uninstall attempts per candidate: the first call plus one retry.
pub const MAX_REMOVAL_ATTEMPTS: u32 = 2;

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrunePhase {
    /// Nothing has happened yet.
    Idle,
    /// Querying the package manager.
    Listing,
    /// Comparing records with the cutoff.
    Classifying,
    /// Dry run: reporting candidates without uninstalling.
    Simulating,
    /// Uninstalling candidates.
    Removing,
    /// Report built. Terminal.
    Reported,
}

impl PrunePhase {
    fn title(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Listing => "Listing installed packages",
            Self::Classifying => "Classifying",
            Self::Simulating => "Would remove",
            Self::Removing => "Removing",
            Self::Reported => "Done",
        }
    }
}

/// Which packages are eligible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrunePolicy {
    /// Treat packages with no recorded use as candidates.
    pub include_never_used: bool,
    /// Packages that are never candidates.
    pub keep: BTreeSet<PackageName>,
}

impl Default for PrunePolicy {
    fn default() -> Self {
        Self {
            include_never_used: true,
            keep: BTreeSet::new(),
        }
    }
}

/// Result of the classification step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    /// Packages to remove, sorted by name.
    pub candidates: Vec<PruneCandidate>,
    /// Packages to leave installed, sorted by name.
    pub retained: Vec<SkippedPackage>,
}

/// Split records into candidates and retained packages.
///
/// A record is a candidate if it was last used strictly before `cutoff`, or
/// if it was never used and the policy includes never-used packages. The keep
/// list wins over both.
pub fn classify(
    mut records: Vec<PackageRecord>,
    cutoff: DateTime<Utc>,
    policy: &PrunePolicy,
) -> Classification {
    let mut out = Classification::default();
    records.sort_by(|a, b| a.name.cmp(&b.name));

    for record in records {
        let verdict = if policy.keep.contains(&record.name) {
            Err(SkipReason::Kept)
        } else {
            match record.last_used_at {
                Some(at) if at < cutoff => Ok(CandidateReason::StaleUsage),
                Some(_) => Err(SkipReason::RecentlyUsed),
                None if policy.include_never_used => Ok(CandidateReason::NeverUsed),
                None => Err(SkipReason::NeverUsedExcluded),
            }
        };

        match verdict {
            Ok(reason) => out.candidates.push(PruneCandidate { record, reason }),
            Err(reason) => out.retained.push(SkippedPackage::new(record, reason)),
        }
    }

    out
}

fn by_name(a: &SkippedPackage, b: &SkippedPackage) -> Ordering {
    a.record.name.cmp(&b.record.name)
}

/// Drives a prune run against an injected package manager.
pub struct PruneExecutor<'a> {
    manager: &'a dyn PackageManager,
    reporter: &'a dyn Reporter,
    policy: PrunePolicy,
    cancel: Option<Arc<AtomicBool>>,
    phase: PrunePhase,
}

impl std::fmt::Debug for PruneExecutor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PruneExecutor")
            .field("manager", &self.manager.name())
            .field("policy", &self.policy)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl<'a> PruneExecutor<'a> {
    /// Create an executor with the default policy.
    pub fn new(manager: &'a dyn PackageManager, reporter: &'a dyn Reporter) -> Self {
        Self {
            manager,
            reporter,
            policy: PrunePolicy::default(),
            cancel: None,
            phase: PrunePhase::Idle,
        }
    }

    /// Replace the removal policy.
    pub fn with_policy(mut self, policy: PrunePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Stop before the next removal once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Current phase.
    pub fn phase(&self) -> PrunePhase {
        self.phase
    }

    /// List installed packages, then [`prune`](Self::prune) them.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] if listing fails; nothing is removed in that case.
    pub fn run(
        &mut self,
        cutoff: DateTime<Utc>,
        mode: PruneMode,
    ) -> Result<PruneReport, QueryError> {
        self.enter(PrunePhase::Listing);
        let records = UsageInspector::new(self.manager).list_installed_packages()?;
        Ok(self.prune(records, cutoff, mode))
    }

    /// Classify `records` and simulate or perform removal.
    pub fn prune(
        &mut self,
        records: Vec<PackageRecord>,
        cutoff: DateTime<Utc>,
        mode: PruneMode,
    ) -> PruneReport {
        self.enter(PrunePhase::Classifying);
        let Classification {
            candidates,
            retained,
        } = classify(records, cutoff, &self.policy);
        tracing::debug!(
            candidates = candidates.len(),
            retained = retained.len(),
            %cutoff,
            "classified"
        );

        let mut report = PruneReport {
            mode,
            cutoff,
            removed: Vec::with_capacity(candidates.len()),
            skipped: retained,
            interrupted: false,
        };

        match mode {
            PruneMode::DryRun => {
                self.enter(PrunePhase::Simulating);
                for candidate in candidates {
                    self.reporter.done(
                        &candidate.record.name,
                        candidate_detail(candidate.reason),
                        candidate.record.installed_size_bytes,
                    );
                    report.removed.push(candidate.record);
                }
            }
            PruneMode::Apply => {
                self.enter(PrunePhase::Removing);
                let total = candidates.len();
                for (idx, candidate) in candidates.into_iter().enumerate() {
                    if self.is_cancelled() {
                        let remaining = total - idx;
                        tracing::warn!(remaining, "interrupted, stopping removals");
                        let msg = format!("Interrupted: {remaining} package(s) not processed");
                        self.reporter.warning(&msg);
                        report.interrupted = true;
                        break;
                    }

                    let record = candidate.record;
                    self.reporter.removing(&record.name);
                    match self.remove_with_retry(&record.name) {
                        Ok(()) => {
                            tracing::info!(package = %record.name, "removed");
                            let size = record.installed_size_bytes;
                            self.reporter.done(&record.name, "removed", size);
                            report.removed.push(record);
                        }
                        Err(e) => {
                            let message = e.to_string();
                            self.reporter.failed(&record.name, &message);
                            report.skipped.push(SkippedPackage::failed(record, message));
                        }
                    }
                }
            }
        }

        report.skipped.sort_by(by_name);
        self.enter(PrunePhase::Reported);
        report
    }

    fn remove_with_retry(&self, name: &PackageName) -> Result<(), RemovalError> {
        let mut attempt = 1;
        loop {
            let Err(e) = self.manager.uninstall(name) else {
                return Ok(());
            };
            if !e.is_retryable() || attempt >= MAX_REMOVAL_ATTEMPTS || self.is_cancelled() {
                tracing::warn!(package = %name, attempt, error = %e, "uninstall failed");
                return Err(e);
            }
            tracing::warn!(package = %name, attempt, error = %e, "uninstall failed, retrying");
            attempt += 1;
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(atomic::Ordering::SeqCst))
    }

    fn enter(&mut self, next: PrunePhase) {
        tracing::debug!(from = ?self.phase, to = ?next, "phase");
        self.phase = next;
        if !matches!(next, PrunePhase::Idle | PrunePhase::Reported) {
            self.reporter.section(next.title());
        }
    }
}

fn candidate_detail(reason: CandidateReason) -> &'static str {
    match reason {
        CandidateReason::StaleUsage => "would remove (stale)",
        CandidateReason::NeverUsed => "would remove (never used)",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::NullReporter;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;

    /// In-memory manager that records uninstall calls.
    #[derive(Default)]
    struct FakeManager {
        records: Vec<PackageRecord>,
        /// Remaining failures per package; `u32::MAX` fails forever.
        failures: Mutex<HashMap<String, u32>>,
        calls: Mutex<Vec<String>>,
        list_fails: bool,
        cancel_after_first: Option<Arc<AtomicBool>>,
        /// Packages refused because something depends on them.
        required: Vec<String>,
    }

    impl FakeManager {
        fn with_records(records: Vec<PackageRecord>) -> Self {
            Self {
                records,
                ..Self::default()
            }
        }

        fn failing(self, name: &str, times: u32) -> Self {
            self.fail(name, times);
            self
        }

        fn fail(&self, name: &str, times: u32) {
            let mut failures = self.failures.lock().unwrap();
            failures.insert(name.to_string(), times);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PackageManager for FakeManager {
        fn name(&self) -> &str {
            "fake"
        }

        fn list(&self) -> Result<Vec<PackageRecord>, QueryError> {
            if self.list_fails {
                return Err(QueryError::Malformed("garbage".to_string()));
            }
            Ok(self.records.clone())
        }

        fn uninstall(&self, name: &PackageName) -> Result<(), RemovalError> {
            self.calls.lock().unwrap().push(name.to_string());
            if let Some(flag) = &self.cancel_after_first {
                flag.store(true, atomic::Ordering::SeqCst);
            }
            if self.required.iter().any(|r| r == name.as_str()) {
                return Err(RemovalError::HasDependents {
                    detail: format!("{name} is required by x"),
                });
            }
            let mut failures = self.failures.lock().unwrap();
            match failures.get_mut(name.as_str()) {
                Some(n) if *n > 0 => {
                    *n = n.saturating_sub(1);
                    Err(RemovalError::Other(format!("cannot remove {name}")))
                }
                _ => Ok(()),
            }
        }
    }

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn scenario_records() -> Vec<PackageRecord> {
        vec![
            PackageRecord::new("c").with_last_used(date(2024, 6, 1)),
            PackageRecord::new("a").with_last_used(date(2020, 1, 1)),
            PackageRecord::new("b"),
        ]
    }

    fn names(records: &[PackageRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    fn skipped(report: &PruneReport) -> Vec<(&str, SkipReason)> {
        report
            .skipped
            .iter()
            .map(|s| (s.record.name.as_str(), s.reason))
            .collect()
    }

    #[test]
    fn test_apply_scenario() {
        let manager = FakeManager::with_records(scenario_records());
        let mut exec = PruneExecutor::new(&manager, &NullReporter);

        let report = exec.prune(scenario_records(), date(2023, 1, 1), PruneMode::Apply);

        assert_eq!(names(&report.removed), vec!["a", "b"]);
        assert_eq!(skipped(&report), vec![("c", SkipReason::RecentlyUsed)]);
        assert_eq!(manager.calls(), vec!["a", "b"]);
        assert!(!report.has_failures());
        assert_eq!(exec.phase(), PrunePhase::Reported);
    }

    #[test]
    fn test_apply_scenario_with_failure() {
        let manager = FakeManager::with_records(scenario_records()).failing("b", u32::MAX);
        let mut exec = PruneExecutor::new(&manager, &NullReporter);

        let report = exec.prune(scenario_records(), date(2023, 1, 1), PruneMode::Apply);

        assert_eq!(names(&report.removed), vec!["a"]);
        assert_eq!(
            skipped(&report),
            vec![
                ("b", SkipReason::RemovalFailed),
                ("c", SkipReason::RecentlyUsed),
            ]
        );
        assert!(report.has_failures());
        assert_eq!(report.skipped[0].detail.as_deref(), Some("cannot remove b"));
        // One attempt plus exactly one retry.
        assert_eq!(manager.calls(), vec!["a", "b", "b"]);
    }

    #[test]
    fn test_retry_recovers_transient_failure() {
        let manager = FakeManager::with_records(scenario_records()).failing("a", 1);
        let mut exec = PruneExecutor::new(&manager, &NullReporter);

        let report = exec.prune(scenario_records(), date(2023, 1, 1), PruneMode::Apply);

        assert_eq!(names(&report.removed), vec!["a", "b"]);
        assert_eq!(manager.calls(), vec!["a", "a", "b"]);
    }

    #[test]
    fn test_dependents_refusal_is_not_retried() {
        let manager = FakeManager {
            records: scenario_records(),
            required: vec!["a".to_string()],
            ..FakeManager::default()
        };
        let mut exec = PruneExecutor::new(&manager, &NullReporter);

        let report = exec.prune(scenario_records(), date(2023, 1, 1), PruneMode::Apply);

        assert_eq!(names(&report.removed), vec!["b"]);
        assert_eq!(report.skipped[0].reason, SkipReason::RemovalFailed);
        assert!(
            report.skipped[0]
                .detail
                .as_deref()
                .unwrap()
                .contains("required by")
        );
        assert_eq!(manager.calls(), vec!["a", "b"]);
    }

    #[test]
    fn test_dry_run_never_uninstalls() {
        let manager = FakeManager::with_records(scenario_records());
        let mut exec = PruneExecutor::new(&manager, &NullReporter);

        let report = exec.prune(scenario_records(), date(2023, 1, 1), PruneMode::DryRun);

        assert_eq!(names(&report.removed), vec!["a", "b"]);
        assert_eq!(report.mode, PruneMode::DryRun);
        assert!(manager.calls().is_empty());
    }

    #[test]
    fn test_cutoff_boundary_is_exclusive() {
        let cutoff = date(2023, 1, 1);
        let records = vec![PackageRecord::new("edge").with_last_used(cutoff)];
        let classification = classify(records, cutoff, &PrunePolicy::default());
        assert!(classification.candidates.is_empty());
        assert_eq!(classification.retained[0].reason, SkipReason::RecentlyUsed);
    }

    #[test]
    fn test_never_used_excluded_by_policy() {
        let policy = PrunePolicy {
            include_never_used: false,
            ..PrunePolicy::default()
        };
        let manager = FakeManager::with_records(scenario_records());
        let mut exec = PruneExecutor::new(&manager, &NullReporter).with_policy(policy);

        let report = exec.prune(scenario_records(), date(2023, 1, 1), PruneMode::Apply);

        assert_eq!(names(&report.removed), vec!["a"]);
        assert_eq!(
            skipped(&report),
            vec![
                ("b", SkipReason::NeverUsedExcluded),
                ("c", SkipReason::RecentlyUsed),
            ]
        );
    }

    #[test]
    fn test_keep_list_protects_package() {
        let policy = PrunePolicy {
            keep: [PackageName::new("A")].into_iter().collect(),
            ..PrunePolicy::default()
        };
        let manager = FakeManager::with_records(scenario_records());
        let mut exec = PruneExecutor::new(&manager, &NullReporter).with_policy(policy);

        let report = exec.prune(scenario_records(), date(2023, 1, 1), PruneMode::Apply);

        assert_eq!(names(&report.removed), vec!["b"]);
        assert_eq!(
            skipped(&report),
            vec![("a", SkipReason::Kept), ("c", SkipReason::RecentlyUsed)]
        );
        assert_eq!(manager.calls(), vec!["b"]);
    }

    #[test]
    fn test_interrupt_reports_prefix_only() {
        let flag = Arc::new(AtomicBool::new(false));
        let records = vec![
            PackageRecord::new("one"),
            PackageRecord::new("two"),
            PackageRecord::new("three"),
        ];
        let manager = FakeManager {
            records: records.clone(),
            cancel_after_first: Some(Arc::clone(&flag)),
            ..FakeManager::default()
        };
        let mut exec = PruneExecutor::new(&manager, &NullReporter).with_cancel_flag(flag);

        let report = exec.prune(records, date(2023, 1, 1), PruneMode::Apply);

        assert!(report.interrupted);
        assert_eq!(names(&report.removed), vec!["one"]);
        assert!(report.skipped.is_empty());
        assert_eq!(manager.calls(), vec!["one"]);
        assert_eq!(exec.phase(), PrunePhase::Reported);
    }

    #[test]
    fn test_run_lists_then_prunes() {
        let manager = FakeManager::with_records(scenario_records());
        let mut exec = PruneExecutor::new(&manager, &NullReporter);

        let report = exec.run(date(2023, 1, 1), PruneMode::DryRun).unwrap();
        assert_eq!(names(&report.removed), vec!["a", "b"]);
    }

    #[test]
    fn test_run_query_error_removes_nothing() {
        let manager = FakeManager {
            list_fails: true,
            ..FakeManager::default()
        };
        let mut exec = PruneExecutor::new(&manager, &NullReporter);

        assert!(exec.run(date(2023, 1, 1), PruneMode::Apply).is_err());
        assert!(manager.calls().is_empty());
        assert_eq!(exec.phase(), PrunePhase::Listing);
    }

    fn arb_records() -> impl Strategy<Value = Vec<PackageRecord>> {
        prop::collection::btree_map(
            "[a-z][a-z0-9-]{0,8}",
            prop::option::of(0i64..2_000_000_000),
            0..24,
        )
        .prop_map(|m: BTreeMap<String, Option<i64>>| {
            m.into_iter()
                .map(|(name, ts)| {
                    let mut r = PackageRecord::new(name.as_str());
                    r.last_used_at = ts.and_then(|s| DateTime::from_timestamp(s, 0));
                    r
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_report_partitions_input(
            mut records in arb_records(),
            cutoff_secs in 0i64..2_000_000_000,
            fail_mask in prop::collection::vec(any::<bool>(), 24),
            shuffle_seed in any::<u64>(),
        ) {
            let cutoff = DateTime::from_timestamp(cutoff_secs, 0).unwrap();
            let manager = FakeManager::with_records(records.clone());
            for (record, fail) in records.iter().zip(&fail_mask) {
                if *fail {
                    manager.fail(&record.name, u32::MAX);
                }
            }
            // Input order must not matter.
            if !records.is_empty() {
                let k = (shuffle_seed % records.len() as u64) as usize;
                records.rotate_left(k);
            }
            let input: BTreeSet<String> = records.iter().map(|r| r.name.to_string()).collect();
            let never_used: BTreeSet<String> = records
                .iter()
                .filter(|r| r.is_never_used())
                .map(|r| r.name.to_string())
                .collect();
            let recent: BTreeSet<String> = records
                .iter()
                .filter(|r| r.last_used_at.is_some_and(|t| t >= cutoff))
                .map(|r| r.name.to_string())
                .collect();

            let mut exec = PruneExecutor::new(&manager, &NullReporter);
            let report = exec.prune(records, cutoff, PruneMode::Apply);

            let removed: Vec<String> =
                report.removed.iter().map(|r| r.name.to_string()).collect();
            let skipped: Vec<String> =
                report.skipped.iter().map(|s| s.record.name.to_string()).collect();

            // Exactly-once partition of the input.
            let mut all: Vec<String> = removed.iter().chain(&skipped).cloned().collect();
            all.sort();
            let total = all.len();
            all.dedup();
            prop_assert_eq!(all.len(), total);
            prop_assert_eq!(all.into_iter().collect::<BTreeSet<_>>(), input);

            // Deterministic name order.
            let mut sorted = removed.clone();
            sorted.sort();
            prop_assert_eq!(&removed, &sorted);
            let mut sorted = skipped.clone();
            sorted.sort();
            prop_assert_eq!(&skipped, &sorted);

            // Recently used packages are never removed.
            for name in &removed {
                prop_assert!(!recent.contains(name));
            }

            // Never-used packages were all attempted.
            let calls: BTreeSet<String> = manager.calls().into_iter().collect();
            for name in &never_used {
                prop_assert!(calls.contains(name));
            }

            // At most one retry per candidate.
            let mut counts: HashMap<String, usize> = HashMap::new();
            for call in manager.calls() {
                *counts.entry(call).or_default() += 1;
            }
            for count in counts.values() {
                prop_assert!(*count <= MAX_REMOVAL_ATTEMPTS as usize);
            }
        }

        #[test]
        fn prop_dry_run_is_side_effect_free(
            records in arb_records(),
            cutoff_secs in 0i64..2_000_000_000,
        ) {
            let cutoff = DateTime::from_timestamp(cutoff_secs, 0).unwrap();
            let manager = FakeManager::with_records(records.clone());
            let expected = classify(records.clone(), cutoff, &PrunePolicy::default());

            let mut exec = PruneExecutor::new(&manager, &NullReporter);
            let report = exec.prune(records, cutoff, PruneMode::DryRun);

            prop_assert!(manager.calls().is_empty());
            let candidates: Vec<PackageRecord> =
                expected.candidates.into_iter().map(|c| c.record).collect();
            prop_assert_eq!(report.removed, candidates);
        }
    }
}
