//! Terminal reporter.
//!
//! `Output` implements the core [`Reporter`] so the executor can stream
//! per-package progress. Progress goes to stdout and is silenced by
//! `--quiet`/`--json`; warnings and errors always go to stderr.

use crossterm::{
    QueueableCommand,
    cursor::MoveToColumn,
    style::Stylize,
    terminal::{Clear, ClearType},
};
use std::io::{IsTerminal, Write, stdout};

use super::theme::{Theme, format_size};
use prune_core::{PackageName, Reporter};

/// A cloneable handle for printing prune progress.
#[derive(Debug, Clone)]
pub struct Output {
    theme: Theme,
    quiet: bool,
    live: bool,
}

impl Output {
    /// Create a new output handle. `quiet` hides progress lines.
    pub fn new(quiet: bool) -> Self {
        Self {
            theme: Theme::default(),
            quiet,
            live: !quiet && stdout().is_terminal(),
        }
    }

    /// Theme in use.
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Whether progress lines are suppressed.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Prints an error message to stderr.
    pub fn error(&self, msg: &str) {
        eprintln!(
            "  {} {}",
            self.theme.icons.error.with(self.theme.colors.error),
            msg.with(self.theme.colors.error)
        );
    }

    /// Replace the in-place "removing" line, if one is showing.
    fn finish_live_line(&self) {
        if self.live {
            let mut out = stdout();
            let _ = out.queue(MoveToColumn(0));
            let _ = out.queue(Clear(ClearType::CurrentLine));
            let _ = out.flush();
        }
    }

    fn name_cell(&self, name: &PackageName) -> String {
        format!("{:<width$}", name.as_str(), width = self.theme.layout.name_width)
    }
}

impl Reporter for Output {
    fn section(&self, title: &str) {
        if self.quiet {
            return;
        }
        println!();
        println!("{}", title.bold());
    }

    fn removing(&self, name: &PackageName) {
        tracing::debug!(package = %name, "removing");
        if !self.live {
            return;
        }
        let mut out = stdout();
        let _ = write!(
            out,
            "  {} {} {}",
            self.theme.icons.active.with(self.theme.colors.warning),
            self.name_cell(name).with(self.theme.colors.package_name),
            "removing...".with(self.theme.colors.secondary)
        );
        let _ = out.flush();
    }

    fn done(&self, name: &PackageName, detail: &str, size: Option<u64>) {
        if self.quiet {
            return;
        }
        self.finish_live_line();
        let size = size.map(format_size).unwrap_or_default();
        println!(
            "  {} {} {:<18} {}",
            self.theme.icons.success.with(self.theme.colors.success),
            self.name_cell(name).with(self.theme.colors.package_name),
            detail,
            size.with(self.theme.colors.secondary)
        );
    }

    fn failed(&self, name: &PackageName, reason: &str) {
        self.finish_live_line();
        eprintln!(
            "  {} {} {}",
            self.theme.icons.error.with(self.theme.colors.error),
            self.name_cell(name).with(self.theme.colors.package_name),
            reason.with(self.theme.colors.error)
        );
    }

    fn info(&self, msg: &str) {
        if self.quiet {
            return;
        }
        println!(
            "  {} {}",
            self.theme.icons.info.with(self.theme.colors.secondary),
            msg
        );
    }

    fn warning(&self, msg: &str) {
        self.finish_live_line();
        eprintln!(
            "  {} {}",
            self.theme.icons.warning.with(self.theme.colors.warning),
            msg.with(self.theme.colors.warning)
        );
    }
}
