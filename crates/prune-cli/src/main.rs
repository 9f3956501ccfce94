//! prune - Homebrew package pruner CLI

use clap::Parser;
use clap::error::ErrorKind;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use prune_cli::ui::Output;
use prune_cli::{Cli, Exit, cmd};

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so `--json` output on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Usage errors are fatal (1); clap's own status 2 means partial failure here.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                let _ = e.print();
                return Exit::Fatal.into();
            }
        },
    };

    match cmd::prune::prune(&cli).await {
        Ok(exit) => exit.into(),
        Err(e) => {
            Output::new(false).error(&format!("{e:#}"));
            Exit::Fatal.into()
        }
    }
}
