//! Report types for sync runs

use serde::Serialize;

use crate::extract::ExtractReport;
use crate::link::LinkReport;
use crate::network::Reachability;

/// What a run does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Copy or extract every database, then relink
    #[default]
    Full,
    /// Relink existing local copies only
    LinksOnly,
    /// Show configuration and probe remotes; change nothing
    CheckNetwork,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::LinksOnly => write!(f, "links-only"),
            Self::CheckNetwork => write!(f, "check-network"),
        }
    }
}

/// How the local copy of a database was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransferOutcome {
    /// Whole file copied
    Copied { bytes: u64, checksum: String },
    /// Fresh database built from the primary table's tail
    Extracted(ExtractReport),
    /// Nothing transferred
    Skipped { reason: String },
    Failed { message: String },
}

/// Everything that happened to one database during a run.
#[derive(Debug, Clone, Serialize)]
pub struct DescriptorOutcome {
    pub name: String,
    pub local_path: String,
    /// Set in modes that probe the remote
    pub reachability: Option<Reachability>,
    pub transfer: Option<TransferOutcome>,
    /// Set when the local copy was opened for relinking
    pub links: Option<LinkReport>,
    /// Reasons this database counts as failed
    pub failures: Vec<String>,
}

impl DescriptorOutcome {
    pub(crate) fn new(name: &str, local_path: String) -> Self {
        Self {
            name: name.to_string(),
            local_path,
            reachability: None,
            transfer: None,
            links: None,
            failures: Vec::new(),
        }
    }

    pub(crate) fn fail(&mut self, reason: impl Into<String>) {
        self.failures.push(reason.into());
    }

    pub fn is_failed(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Summary of a whole run, in descriptor order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: RunMode,
    pub outcomes: Vec<DescriptorOutcome>,
}

impl RunReport {
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.len() - self.failed_count()
    }

    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    pub fn outcome(&self, name: &str) -> Option<&DescriptorOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    /// Total tables relinked across all databases.
    pub fn relinked_tables(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.links.as_ref())
            .map(LinkReport::relinked)
            .sum()
    }
}
