//! Run orchestration
//!
//! This module provides:
//! - **engine**: the `SyncEngine` driving reachability, copy or extraction,
//!   and relinking for every configured database
//! - **report**: per-database outcomes and the run summary

mod engine;
mod report;

pub use engine::SyncEngine;
pub use report::{DescriptorOutcome, RunMode, RunReport, TransferOutcome};
