//! Command implementations for the dbsync CLI

pub mod config;
pub mod sync;

pub use config::{load_overrides, load_settings};
pub use sync::run_sync;
