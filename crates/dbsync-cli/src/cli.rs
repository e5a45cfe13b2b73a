//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::Parser;
use dbsync_core::RunMode;

/// Log file used when neither the command line nor the settings file names one
pub const DEFAULT_LOG_FILE: &str = "db_local_importer.log";

/// dbsync - copy Access databases from the network and relink them locally
///
/// Without flags, every configured database is copied (or, for mail-like
/// databases, rebuilt from its most recent records) into the local
/// directory, then linked tables are pointed at the local copies.
#[derive(Parser, Debug)]
#[command(name = "dbsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Only relink tables in existing local copies; copy nothing
    #[arg(long, conflicts_with = "check_network")]
    pub links_only: bool,

    /// Show configuration and check that remote databases are reachable
    #[arg(long)]
    pub check_network: bool,

    /// Key/value configuration file [default: .env in the working directory]
    #[arg(long, env = "DBSYNC_ENV_FILE")]
    pub env_file: Option<PathBuf>,

    /// TOML or JSON file overriding mail_pattern, tail_size, host_shell, log_file
    #[arg(long, env = "DBSYNC_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Log file, appended to on every run [default: db_local_importer.log]
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn mode(&self) -> RunMode {
        if self.check_network {
            RunMode::CheckNetwork
        } else if self.links_only {
            RunMode::LinksOnly
        } else {
            RunMode::Full
        }
    }
}
