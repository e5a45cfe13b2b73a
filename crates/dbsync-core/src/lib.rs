//! Core orchestration layer for dbsync
//!
//! This crate implements everything between configuration and the database
//! engine:
//!
//! - **Configuration**: `.env`-style key/value pairs resolved into immutable [`Settings`]
//! - **Path mapping**: remote-root to local-root rewriting with longest-prefix matching
//! - **Host automation**: the [`HostEngine`] / [`HostSession`] seam and the PowerShell/DAO host
//! - **Link updating**: relinking linked tables inside local databases
//! - **Record extraction**: rebuilding mail-like databases from their most recent rows
//! - **SyncEngine**: reachability, copy or extraction, and relinking per database
//!
//! # Architecture
//!
//! ```text
//!                 dbsync-cli
//!                     |
//!                dbsync-core
//!        +--------+---+----+---------+
//!        |        |        |         |
//!     config   mapping   host      sync
//!                  \       |      /   |
//!                   +---- link ---+  extract
//!                     |
//!                 dbsync-fs
//! ```
//!
//! # Example
//!
//! ```ignore
//! use dbsync_core::{PowerShellHost, RunMode, Settings, SettingsOverrides, SyncEngine};
//! use dbsync_core::config::read_env_file;
//! use dbsync_fs::NormalizedPath;
//!
//! let pairs = read_env_file(&NormalizedPath::new(".env"))?;
//! let settings = Settings::from_pairs(&pairs, &NormalizedPath::new("."), &SettingsOverrides::default())?;
//! let host = PowerShellHost::new(settings.host_shell());
//! let engine = SyncEngine::new(settings, Box::new(host))?;
//! let report = engine.run(RunMode::Full)?;
//! assert!(report.is_success());
//! ```

pub mod config;
pub mod connect;
pub mod error;
pub mod extract;
pub mod host;
pub mod link;
pub mod mapping;
pub mod network;
pub mod sync;

pub use config::{DatabaseDescriptor, Settings, SettingsOverrides};
pub use connect::ConnectString;
pub use error::{Error, Result};
pub use extract::{ExtractReport, RecordExtractor};
pub use host::{
    Column, ColumnType, HostEngine, HostSession, LinkedTableDef, PowerShellHost, Row, TableSchema,
};
pub use link::{LinkReport, LinkStatus, LinkUpdater, TableOutcome};
pub use mapping::{MappingRule, PathMapper, Resolution};
pub use network::{FsProbe, Reachability, ReachabilityProbe};
pub use sync::{DescriptorOutcome, RunMode, RunReport, SyncEngine, TransferOutcome};
