//! External process execution
//!
//! One child process per call, with capture or pass-through of the
//! standard streams and best-effort interruption on cancellation.

mod options;
mod runner;

pub use options::{Input, RunOptions, Sink};
pub use runner::{execute, run, run_inherited, CommandRunner, Output, ProcessRunner};
