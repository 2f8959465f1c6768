//! Error types for funk-deploy
//!
//! Messages name the step, command or file involved so a failed deploy
//! can be diagnosed from a single line of output.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for plan execution and cluster commands
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("invalid config step '{name}' - {reason}")]
    InvalidStep { name: String, reason: String },

    // === Template Errors ===
    #[error("Template error: {0}")]
    Template(String),

    // === Process Errors ===
    #[error("Executable '{0}' not found on PATH")]
    ExecutableNotFound(String),

    #[error("Execution error: command '{command}' stderr: '{stderr}' error: '{detail}'")]
    CommandFailed {
        command: String,
        stderr: String,
        detail: String,
        /// Set unless the caller opted in to tolerating the failure
        fatal: bool,
    },

    // === Cluster Errors ===
    #[error("Timed out waiting for {resource} to become {state} after {attempts} attempts")]
    PollTimeout {
        resource: String,
        state: String,
        attempts: u32,
    },

    #[error("Unexpected output from '{command}': expected to match '{pattern}', got '{output}'")]
    UnexpectedOutput {
        command: String,
        pattern: String,
        output: String,
    },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid step error
    pub fn invalid_step(name: &str, reason: &str) -> Self {
        Self::InvalidStep {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a file read error from the path and underlying io error
    pub fn file_read(path: &std::path::Path, error: &io::Error) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Create a poll timeout error
    pub fn poll_timeout(resource: &str, state: &str, attempts: u32) -> Self {
        Self::PollTimeout {
            resource: resource.to_string(),
            state: state.to_string(),
            attempts,
        }
    }

    /// Whether this error should end the overall run.
    ///
    /// Only command failures carry a fatality flag; every other error is
    /// returned to the caller for it to decide.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::CommandFailed { fatal: true, .. })
    }

    /// Captured standard error of a failed command, if any
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Error::CommandFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}
