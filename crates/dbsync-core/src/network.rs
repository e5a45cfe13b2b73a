//! Remote location reachability

use dbsync_fs::NormalizedPath;
use serde::Serialize;

/// Result of probing one remote database path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Reachability {
    /// The file is there
    Reachable,
    /// The share or directory holding the file cannot be reached
    Unreachable { location: String },
    /// The location is reachable but the file is not in it
    Missing,
}

impl Reachability {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Self::Reachable)
    }
}

impl std::fmt::Display for Reachability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reachable => write!(f, "reachable"),
            Self::Unreachable { location } => write!(f, "unreachable ({})", location),
            Self::Missing => write!(f, "file missing"),
        }
    }
}

/// Answers whether a remote database can be read right now.
pub trait ReachabilityProbe {
    fn probe(&self, remote: &NormalizedPath) -> Reachability;
}

/// Probe through the filesystem.
///
/// For a UNC path the `\\server\share` root is checked first; otherwise the
/// file's parent directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl ReachabilityProbe for FsProbe {
    fn probe(&self, remote: &NormalizedPath) -> Reachability {
        let location = remote.share_root().or_else(|| remote.parent());
        if let Some(location) = location.filter(|l| !l.is_dir()) {
            tracing::debug!(%location, "Remote location not reachable");
            return Reachability::Unreachable {
                location: location.to_windows_string(),
            };
        }
        if remote.is_file() {
            Reachability::Reachable
        } else {
            Reachability::Missing
        }
    }
}
