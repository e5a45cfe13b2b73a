//! Error types for dbsync-core

use std::path::PathBuf;

/// Result type for dbsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in dbsync-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No `DB_*` entries, or another key the run cannot start without
    #[error("Missing configuration: {key}")]
    ConfigMissing { key: String },

    /// A configuration value that cannot be used
    #[error("Invalid configuration for {key}: {message}")]
    ConfigInvalid { key: String, message: String },

    /// Configuration file named explicitly but unreadable
    #[error("Cannot read configuration file {path}: {source}")]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two databases would be copied onto the same local file
    #[error("Databases {first} and {second} both map to local file {path}")]
    DuplicateLocalTarget {
        path: String,
        first: String,
        second: String,
    },

    /// One remote root mapped to two different local roots
    #[error("Remote root {remote_root} maps to both {first} and {second}")]
    ConflictingRule {
        remote_root: String,
        first: String,
        second: String,
    },

    /// Host automation engine (PowerShell or DAO) not installed or not startable
    #[error("Host automation unavailable: {message}")]
    HostUnavailable { message: String },

    /// The host engine raised while performing an operation
    #[error("Host operation '{op}' failed: {message}")]
    HostFailed { op: String, message: String },

    /// The host answered with something that is not a valid reply
    #[error("Host protocol error: {message}")]
    HostProtocol { message: String },

    /// Filesystem error from dbsync-fs
    #[error(transparent)]
    Fs(#[from] dbsync_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Configuration errors abort the run before any database is touched.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::ConfigMissing { .. }
                | Self::ConfigInvalid { .. }
                | Self::ConfigUnreadable { .. }
                | Self::DuplicateLocalTarget { .. }
                | Self::ConflictingRule { .. }
        )
    }

    pub(crate) fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            key: key.into(),
            message: message.into(),
        }
    }

    pub(crate) fn host_failed(op: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HostFailed {
            op: op.into(),
            message: message.into(),
        }
    }
}
