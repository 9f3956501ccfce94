//! Report and candidate list formatting
//!
//! Column-aligned rendering for the confirmation prompt and the final
//! summary printed after a run.

use crossterm::style::{Color, Stylize};
use std::io::{self, Write};

use super::theme::{Theme, format_last_used, format_size};
use prune_core::{
    CandidateReason, PackageRecord, PruneCandidate, PruneMode, PruneReport, SkipReason,
};

fn header(out: &mut impl Write, theme: &Theme) -> io::Result<()> {
    let header = format!(
        "  {:<nw$} {:<vw$} {:>sw$}  {:<dw$}  {}",
        "name",
        "version",
        "size",
        "last used",
        "status",
        nw = theme.layout.name_width,
        vw = theme.layout.version_width,
        sw = theme.layout.size_width,
        dw = theme.layout.date_width
    );
    writeln!(out)?;
    writeln!(out, "{}", header.with(theme.colors.header))
}

fn row(
    out: &mut impl Write,
    theme: &Theme,
    record: &PackageRecord,
    status: &str,
    status_color: Color,
) -> io::Result<()> {
    let layout = &theme.layout;
    let name = record.name.as_str();
    let version = record.version.as_deref().unwrap_or("-");
    let size = record.installed_size_bytes;
    let size = size.map(format_size).unwrap_or_default();
    let date = format_last_used(record.last_used_at);

    let name_part = format!("{name:<w$}", w = layout.name_width);
    let version_part = format!("{version:<w$}", w = layout.version_width);
    let size_part = format!("{size:>w$}", w = layout.size_width);
    let date_part = format!("{date:<w$}", w = layout.date_width);

    writeln!(
        out,
        "  {} {} {}  {}  {}",
        name_part.with(theme.colors.package_name),
        version_part.with(theme.colors.version),
        size_part.with(theme.colors.secondary),
        date_part.with(theme.colors.secondary),
        status.with(status_color)
    )
}

/// Print the packages about to be removed, for the confirmation prompt.
pub fn print_candidates(
    out: &mut impl Write,
    theme: &Theme,
    candidates: &[PruneCandidate],
) -> io::Result<()> {
    header(out, theme)?;
    for candidate in candidates {
        let status = match candidate.reason {
            CandidateReason::StaleUsage => format!("{} stale", theme.icons.pending),
            CandidateReason::NeverUsed => format!("{} never used", theme.icons.pending),
        };
        row(out, theme, &candidate.record, &status, theme.colors.warning)?;
    }

    let total: u64 = candidates
        .iter()
        .filter_map(|c| c.record.installed_size_bytes)
        .sum();
    writeln!(out)?;
    let msg = format!("  {} candidates, {}", candidates.len(), format_size(total));
    writeln!(out, "{}", msg.with(theme.colors.secondary))
}

/// Print the final report table and summary line.
pub fn print_report(out: &mut impl Write, theme: &Theme, report: &PruneReport) -> io::Result<()> {
    let (removed_label, removed_verb) = match report.mode {
        PruneMode::DryRun => ("would remove", "would be removed"),
        PruneMode::Apply => ("removed", "removed"),
    };

    if report.removed.is_empty() && report.skipped.is_empty() {
        writeln!(out)?;
        writeln!(out, "  No packages installed.")?;
        return Ok(());
    }

    header(out, theme)?;
    for record in &report.removed {
        let status = format!("{} {removed_label}", theme.icons.success);
        row(out, theme, record, &status, theme.colors.success)?;
    }
    for skipped in &report.skipped {
        let (icon, color) = match skipped.reason {
            SkipReason::RemovalFailed => (theme.icons.error, theme.colors.error),
            _ => (theme.icons.pending, theme.colors.secondary),
        };
        let status = match &skipped.detail {
            Some(detail) => format!("{icon} {}: {detail}", skipped.reason.label()),
            None => format!("{icon} {}", skipped.reason.label()),
        };
        row(out, theme, &skipped.record, &status, color)?;
    }

    writeln!(out)?;
    let failed = report.failures().count();
    let msg = format!(
        "  {} {removed_verb} ({}), {} kept, {} failed  [cutoff {}]",
        report.removed.len(),
        format_size(report.reclaimed_bytes()),
        report.skipped.len() - failed,
        failed,
        report.cutoff.format("%Y-%m-%d")
    );
    let color = if failed > 0 {
        theme.colors.error
    } else {
        theme.colors.secondary
    };
    writeln!(out, "{}", msg.with(color))?;

    if report.interrupted {
        writeln!(
            out,
            "  {} {}",
            theme.icons.warning.with(theme.colors.warning),
            "Interrupted: remaining candidates were not processed".with(theme.colors.warning)
        )?;
    }

    Ok(())
}
