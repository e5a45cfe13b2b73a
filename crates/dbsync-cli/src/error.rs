//! Error types for dbsync-cli

use std::path::PathBuf;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Exit code for a run in which a database failed, or any other runtime error
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for configuration errors
pub const EXIT_CONFIG: i32 = 2;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from dbsync-core
    #[error(transparent)]
    Core(#[from] dbsync_core::Error),

    /// Error from dbsync-fs
    #[error(transparent)]
    Fs(#[from] dbsync_fs::Error),

    /// Settings file named on the command line could not be loaded
    #[error("Cannot load settings file {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: dbsync_fs::Error,
    },

    /// Log file could not be opened for appending
    #[error("Cannot open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Core(e) if e.is_config() => EXIT_CONFIG,
            Self::Settings { .. } | Self::LogFile { .. } => EXIT_CONFIG,
            _ => EXIT_FAILURE,
        }
    }
}
