//! Common utilities shared by the plan interpreter and cluster commands

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};

/// Human-readable description of a command invocation
pub fn describe(cli: &str, args: &[String]) -> String {
    format!("{} {}", cli, args.join(" "))
}
