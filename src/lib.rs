//! funk-deploy - deploy plans and resilient cluster commands
//!
//! This library interprets SDK deploy plans (ordered mkdir / exec /
//! templated-file steps) and drives cluster client binaries with
//! bounded retry and eventual-consistency polling.

pub mod cli;
pub mod cluster;
pub mod commands;
pub mod common;
pub mod manifest;
pub mod plan;
pub mod process;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use plan::{Context, Plan, Step};
pub use process::RunOptions;
