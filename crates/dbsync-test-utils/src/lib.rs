//! Shared test utilities for the dbsync workspace.
//!
//! This crate provides test fixtures shared by the crate test suites and the
//! workspace scenarios. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`fake_host`] - [`FakeEngine`], a host engine storing databases as JSON files
//! - [`workspace`] - [`TestWorkspace`] builder with remote and local directories

pub mod fake_host;
pub mod workspace;

pub use fake_host::{FakeDatabase, FakeEngine, FakeTable};
pub use workspace::TestWorkspace;
