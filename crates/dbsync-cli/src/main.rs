//! dbsync CLI
//!
//! Copies Access databases from a network share into a local directory and
//! points their linked tables at the local copies.

mod cli;
mod commands;
mod error;
mod logging;

use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, DEFAULT_LOG_FILE};
use error::{EXIT_FAILURE, Result};

fn main() {
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(true) => 0,
        Ok(false) => EXIT_FAILURE,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}: {}", "error".red().bold(), e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

/// Returns whether every database succeeded.
fn run(cli: Cli) -> Result<bool> {
    let cwd = std::env::current_dir()?;
    let overrides = commands::load_overrides(cli.settings.as_deref())?;

    let log_file = cli
        .log_file
        .clone()
        .or_else(|| overrides.log_file.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
    logging::init(cli.verbose, &log_file)?;
    tracing::debug!(mode = %cli.mode(), "Verbose mode enabled");

    let settings = commands::load_settings(&cwd, cli.env_file.as_deref(), &overrides)?;
    let report = commands::run_sync(settings, cli.mode())?;
    Ok(report.is_success())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;

    #[test]
    fn missing_settings_file_is_a_settings_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let cli = Cli::try_parse_from([
            "dbsync",
            "--settings",
            temp.path().join("absent.toml").to_str().unwrap(),
        ])
        .unwrap();

        let err = run(cli).unwrap_err();
        assert!(matches!(err, CliError::Settings { .. }));
        assert_eq!(err.exit_code(), error::EXIT_CONFIG);
    }
}
