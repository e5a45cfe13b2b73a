//! SyncEngine implementation
//!
//! The SyncEngine walks the configured databases one at a time. A failure on
//! one database is recorded in its outcome and the run moves on.

use crate::Result;
use crate::config::{DatabaseDescriptor, Settings};
use crate::extract::RecordExtractor;
use crate::host::HostEngine;
use crate::link::LinkUpdater;
use crate::mapping::PathMapper;
use crate::network::{FsProbe, ReachabilityProbe};

use super::report::{DescriptorOutcome, RunMode, RunReport, TransferOutcome};

/// Engine for copying databases locally and relinking them
///
/// The SyncEngine provides three run modes:
/// - **full**: copy (or extract) every reachable database, then relink
/// - **links-only**: relink the local copies that already exist
/// - **check-network**: report configuration and reachability only
pub struct SyncEngine {
    settings: Settings,
    mapper: PathMapper,
    host: Box<dyn HostEngine>,
    probe: Box<dyn ReachabilityProbe>,
}

impl SyncEngine {
    /// Create a new SyncEngine probing remotes through the filesystem.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the settings yield conflicting
    /// mapping rules.
    pub fn new(settings: Settings, host: Box<dyn HostEngine>) -> Result<Self> {
        let mapper = PathMapper::new(settings.mapping_rules())?;
        tracing::debug!(rules = mapper.rules().len(), host = host.name(), "Created sync engine");
        Ok(Self {
            settings,
            mapper,
            host,
            probe: Box::new(FsProbe),
        })
    }

    /// Replace the reachability probe.
    pub fn with_probe(mut self, probe: Box<dyn ReachabilityProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn mapper(&self) -> &PathMapper {
        &self.mapper
    }

    /// Log the effective configuration and the state of every database.
    pub fn show_configuration(&self) {
        tracing::info!("Local directory: {}", self.settings.local_dir());
        tracing::info!(
            "Password: {}",
            if self.settings.password().is_some() {
                "set"
            } else {
                "not set"
            }
        );
        tracing::info!("Host engine: {}", self.host.name());
        for descriptor in self.settings.descriptors() {
            tracing::info!(
                "{} [{}]{}",
                descriptor.name(),
                descriptor.file_name(),
                if descriptor.is_mail_like() {
                    format!(" (last {} records)", self.settings.tail_size())
                } else {
                    String::new()
                }
            );
            tracing::info!(
                "  remote: {} ({})",
                descriptor.remote_path().to_windows_string(),
                exists_label(descriptor.remote_path().is_file())
            );
            tracing::info!(
                "  local:  {} ({})",
                descriptor.local_path().to_windows_string(),
                exists_label(descriptor.local_path().is_file())
            );
        }
    }

    /// Run every configured database through `mode`.
    ///
    /// # Errors
    ///
    /// Only errors that stop the whole run are returned, such as failing to
    /// create the local directory. Per-database failures are in the report.
    pub fn run(&self, mode: RunMode) -> Result<RunReport> {
        tracing::info!("Starting {} run", mode);
        self.show_configuration();

        if mode == RunMode::Full {
            dbsync_fs::io::ensure_dir(self.settings.local_dir())?;
        }

        let mut outcomes = Vec::with_capacity(self.settings.descriptors().len());
        for descriptor in self.settings.descriptors() {
            let outcome = match mode {
                RunMode::Full => self.run_full(descriptor),
                RunMode::LinksOnly => self.run_links_only(descriptor),
                RunMode::CheckNetwork => self.run_check(descriptor),
            };
            for reason in &outcome.failures {
                tracing::error!("{}: {}", descriptor.name(), reason);
            }
            outcomes.push(outcome);
        }

        let report = RunReport { mode, outcomes };
        tracing::info!(
            "Finished {} run: {} succeeded, {} failed",
            mode,
            report.succeeded_count(),
            report.failed_count()
        );
        Ok(report)
    }

    fn run_full(&self, descriptor: &DatabaseDescriptor) -> DescriptorOutcome {
        tracing::info!("Processing {}", descriptor.name());
        let mut outcome = new_outcome(descriptor);

        let reachability = self.probe.probe(descriptor.remote_path());
        tracing::info!("{}: remote {}", descriptor.name(), reachability);

        let transfer = if reachability.is_reachable() {
            self.transfer(descriptor)
        } else {
            tracing::warn!(
                "{}: skipping copy, remote {}",
                descriptor.name(),
                reachability
            );
            TransferOutcome::Skipped {
                reason: format!("remote {}", reachability),
            }
        };
        match &transfer {
            TransferOutcome::Failed { message } => outcome.fail(message.clone()),
            TransferOutcome::Skipped { reason } => outcome.fail(reason.clone()),
            TransferOutcome::Copied { .. } | TransferOutcome::Extracted(_) => {}
        }
        outcome.reachability = Some(reachability);
        outcome.transfer = Some(transfer);

        self.relink_into(descriptor, &mut outcome);
        outcome
    }

    fn run_links_only(&self, descriptor: &DatabaseDescriptor) -> DescriptorOutcome {
        let mut outcome = new_outcome(descriptor);
        self.relink_into(descriptor, &mut outcome);
        outcome
    }

    fn run_check(&self, descriptor: &DatabaseDescriptor) -> DescriptorOutcome {
        let mut outcome = new_outcome(descriptor);
        let reachability = self.probe.probe(descriptor.remote_path());
        if reachability.is_reachable() {
            tracing::info!("{}: remote {}", descriptor.name(), reachability);
        } else {
            tracing::warn!("{}: remote {}", descriptor.name(), reachability);
            outcome.fail(format!("remote {}", reachability));
        }
        outcome.reachability = Some(reachability);
        outcome
    }

    fn transfer(&self, descriptor: &DatabaseDescriptor) -> TransferOutcome {
        if descriptor.is_mail_like() {
            let extractor = RecordExtractor::new(
                self.host.as_ref(),
                self.settings.password(),
                self.settings.tail_size(),
            );
            return match extractor.extract(descriptor.remote_path(), descriptor.local_path()) {
                Ok(report) => TransferOutcome::Extracted(report),
                Err(e) => TransferOutcome::Failed {
                    message: format!("extraction failed: {}", e),
                },
            };
        }

        match dbsync_fs::io::copy_atomic(descriptor.remote_path(), descriptor.local_path()) {
            Ok(copied) => {
                tracing::info!(
                    "{}: copied {} bytes to {}",
                    descriptor.name(),
                    copied.bytes,
                    descriptor.local_path()
                );
                tracing::debug!(checksum = %copied.checksum, "Copy checksum");
                TransferOutcome::Copied {
                    bytes: copied.bytes,
                    checksum: copied.checksum,
                }
            }
            Err(e) => TransferOutcome::Failed {
                message: format!("copy failed: {}", e),
            },
        }
    }

    fn relink_into(&self, descriptor: &DatabaseDescriptor, outcome: &mut DescriptorOutcome) {
        if !descriptor.local_path().is_file() {
            tracing::warn!(
                "{}: no local copy at {}, skipping links",
                descriptor.name(),
                descriptor.local_path()
            );
            return;
        }

        let updater = LinkUpdater::new(self.host.as_ref(), &self.mapper, self.settings.password());
        match updater.update(descriptor.local_path()) {
            Ok(report) => {
                if !report.is_success() {
                    outcome.fail(format!("{} linked tables failed to relink", report.failed()));
                }
                outcome.links = Some(report);
            }
            Err(e) => outcome.fail(format!("link update failed: {}", e)),
        }
    }
}

fn new_outcome(descriptor: &DatabaseDescriptor) -> DescriptorOutcome {
    DescriptorOutcome::new(descriptor.name(), descriptor.local_path().to_string())
}

fn exists_label(exists: bool) -> &'static str {
    if exists { "exists" } else { "missing" }
}
