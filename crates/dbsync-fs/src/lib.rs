//! Filesystem layer for dbsync
//!
//! Provides Windows/UNC aware path handling, atomic file copies and
//! configuration file loading.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use io::CopyOutcome;
pub use path::NormalizedPath;
