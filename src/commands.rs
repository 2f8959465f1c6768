//! CLI command definitions
//!
//! Defines the clap commands for the funk CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run an SDK's deploy plan
    Deploy {
        /// SDK directory containing deploy.yaml
        #[arg(long)]
        sdk_dir: PathBuf,

        /// SDK name shown in the banner (default: directory name)
        #[arg(long)]
        sdk_name: Option<String>,
    },

    /// Namespace lifecycle against the cluster
    #[command(subcommand)]
    Namespace(NamespaceCommands),

    /// List the functions declared in a manifest
    Manifest {
        /// Path to the JSON manifest
        path: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum NamespaceCommands {
    /// Create a namespace, retrying until the control plane accepts it
    Create { name: String },

    /// Delete a namespace
    Delete { name: String },

    /// Wait until a namespace is listed
    WaitCreated { name: String },

    /// Wait until a namespace is no longer listed
    WaitDeleted { name: String },
}
