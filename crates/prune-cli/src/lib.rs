//! prune - uninstall Homebrew packages not used since a given date
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Command-line front end for [`prune_core`]: flag parsing, confirmation,
//! terminal output and exit codes.
//!
//! # Exit codes
//!
//! | code | meaning |
//! |------|---------|
//! | 0 | success, including "nothing to remove" and a declined prompt |
//! | 1 | fatal: unknown or malformed flags, bad `--before`, bad config, package manager unavailable or unparseable |
//! | 2 | at least one removal failed |

pub mod cmd;
pub mod ui;

use clap::Parser;
use std::path::PathBuf;

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Success = 0,
    Fatal = 1,
    PartialFailure = 2,
}

impl From<Exit> for std::process::ExitCode {
    fn from(exit: Exit) -> Self {
        Self::from(exit as u8)
    }
}

#[derive(Debug, Parser)]
#[command(name = "prune")]
#[command(author, version = env!("PRUNE_VERSION"))]
#[command(about = "Uninstall Homebrew packages not used since a given date")]
pub struct Cli {
    /// Cutoff date (YYYY-MM-DD or RFC 3339). Defaults to `horizon_days` ago
    #[arg(long, value_name = "DATE")]
    pub before: Option<String>,

    /// Show what would be removed without uninstalling anything
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Leave packages with no recorded use installed
    #[arg(long)]
    pub keep_never_used: bool,

    /// Never remove this package (repeatable)
    #[arg(long, value_name = "NAME")]
    pub keep: Vec<String>,

    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,

    /// Configuration file (default: <config dir>/prune/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
