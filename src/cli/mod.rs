//! CLI command handling
//!
//! Dispatches CLI commands to the plan interpreter and cluster helpers
//! and formats output.

use std::sync::Arc;

use colored::Colorize;

use crate::cluster::{Counters, E2eTest};
use crate::commands::{Commands, NamespaceCommands};
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::manifest::FunkConfig;
use crate::plan::{run_deploy, Sdk};
use crate::process::ProcessRunner;

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Deploy { sdk_dir, sdk_name } => {
            let name = match sdk_name {
                Some(name) => name,
                None => sdk_dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| {
                        Error::Config(format!(
                            "Cannot infer SDK name from '{}', pass --sdk-name",
                            sdk_dir.display()
                        ))
                    })?,
            };

            let sdk = Sdk::new(name, sdk_dir);
            let mut stdout = std::io::stdout();
            run_deploy(&mut stdout, &sdk).await?;

            println!("{} {}", "✓".green(), "Deploy plan complete".green());
            Ok(())
        }

        Commands::Namespace(command) => {
            let config = Config::load()?;
            let mut e2e =
                E2eTest::from_config(&config, Arc::new(ProcessRunner), Counters::global());

            match command {
                NamespaceCommands::Create { name } => {
                    let out = e2e.create_namespace(&name).await?;
                    print!("{}", out);
                }
                NamespaceCommands::Delete { name } => {
                    let out = e2e.delete_namespace(&name).await?;
                    print!("{}", out);
                }
                NamespaceCommands::WaitCreated { name } => {
                    let attempts = e2e.wait_for_namespace_created(&name).await?;
                    println!("Namespace {} created ({} checks)", name, attempts);
                }
                NamespaceCommands::WaitDeleted { name } => {
                    let attempts = e2e.wait_for_namespace_deleted(&name).await?;
                    println!("Namespace {} deleted ({} checks)", name, attempts);
                }
            }
            Ok(())
        }

        Commands::Manifest { path } => {
            let manifest = FunkConfig::load(&path)?;

            if manifest.functions.is_empty() {
                println!("No functions declared in {}", path.display());
                return Ok(());
            }

            for function in &manifest.functions {
                println!(
                    "{} ({}) {} -> {}",
                    function.name.bold(),
                    function.kind,
                    function.source.dimmed(),
                    function.returns
                );
            }
            Ok(())
        }
    }
}
