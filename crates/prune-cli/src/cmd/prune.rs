//! Prune command
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use crossterm::style::Stylize;
use std::io::{IsTerminal, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::ui::{Output, report};
use crate::{Cli, Exit};
use prune_core::{
    Homebrew, PackageName, PackageRecord, PruneConfig, PruneExecutor, PruneMode, PrunePolicy,
    PruneReport, Reporter, UsageInspector, classify, default_cutoff, parse_cutoff,
};

/// Run one prune pass and map its outcome to an exit status.
///
/// Fatal errors (bad date, bad config, package manager unavailable) are
/// returned as `Err` before anything is removed.
pub async fn prune(cli: &Cli) -> Result<Exit> {
    let config = PruneConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let cutoff = match cli.before.as_deref() {
        Some(raw) => parse_cutoff(raw)?,
        None => default_cutoff(Utc::now(), config.horizon_days),
    };
    let mode = if cli.dry_run {
        PruneMode::DryRun
    } else {
        PruneMode::Apply
    };
    let policy = build_policy(&config, cli);
    tracing::debug!(%cutoff, ?mode, ?policy, "starting");

    let output = Output::new(cli.quiet || cli.json);
    let manager = Arc::new(Homebrew::locate(&config)?);

    output.section("Listing installed packages");
    let records = {
        let manager = Arc::clone(&manager);
        tokio::task::spawn_blocking(move || {
            UsageInspector::new(manager.as_ref()).list_installed_packages()
        })
        .await
        .context("Listing worker panicked")??
    };
    output.info(&format!(
        "{} packages installed, cutoff {}",
        records.len(),
        cutoff.format("%Y-%m-%d")
    ));

    if mode == PruneMode::Apply && !cli.yes && !confirm(&output, &records, cutoff, &policy)? {
        return Ok(Exit::Success);
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let watcher = {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.store(true, Ordering::SeqCst);
            }
        })
    };

    let prune_report = {
        let manager = Arc::clone(&manager);
        let output = output.clone();
        tokio::task::spawn_blocking(move || {
            PruneExecutor::new(manager.as_ref(), &output)
                .with_policy(policy)
                .with_cancel_flag(cancel)
                .prune(records, cutoff, mode)
        })
        .await
        .context("Prune worker panicked")?
    };
    watcher.abort();

    render(cli, &output, &prune_report)?;

    Ok(if prune_report.has_failures() {
        Exit::PartialFailure
    } else {
        Exit::Success
    })
}

fn build_policy(config: &PruneConfig, cli: &Cli) -> PrunePolicy {
    let mut policy = config.policy();
    if cli.keep_never_used {
        policy.include_never_used = false;
    }
    policy
        .keep
        .extend(cli.keep.iter().map(|name| PackageName::new(name)));
    policy
}

/// Show the candidates and ask before removing anything.
///
/// Returns `true` without prompting when there is nothing to remove, and
/// `false` when the user declines or stdin is not a terminal.
fn confirm(
    output: &Output,
    records: &[PackageRecord],
    cutoff: DateTime<Utc>,
    policy: &PrunePolicy,
) -> Result<bool> {
    let preview = classify(records.to_vec(), cutoff, policy);
    if preview.candidates.is_empty() {
        // Nothing to ask; let the executor produce the (empty) report.
        return Ok(true);
    }

    // Keep stdout clean for --json; the prompt then goes to stderr.
    let mut out: Box<dyn Write> = if output.is_quiet() {
        Box::new(std::io::stderr())
    } else {
        Box::new(std::io::stdout())
    };
    report::print_candidates(&mut out, output.theme(), &preview.candidates)?;

    if !std::io::stdin().is_terminal() {
        output.warning("stdin is not a terminal; re-run with --yes to remove these packages");
        return Ok(false);
    }

    let count = preview.candidates.len();
    let plural = if count == 1 { "" } else { "s" };
    let warning = "WARNING:".bold().red();
    writeln!(out)?;
    write!(out, "  {warning} Remove {count} package{plural}? (y/N) ")?;
    out.flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    if input.trim().eq_ignore_ascii_case("y") {
        Ok(true)
    } else {
        output.error("Operation cancelled");
        Ok(false)
    }
}

fn render(cli: &Cli, output: &Output, prune_report: &PruneReport) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    if cli.json {
        let json = serde_json::to_string_pretty(prune_report).context("Failed to encode report")?;
        writeln!(stdout, "{json}")?;
    } else if !output.is_quiet() || prune_report.has_failures() {
        report::print_report(&mut stdout, output.theme(), prune_report)?;
    }
    stdout.flush()?;
    Ok(())
}
