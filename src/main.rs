//! funk - run function SDK deploy plans and manage test namespaces
//!
//! Deploy plans are ordered steps (mkdir, exec, templated file) read
//! from an SDK's `deploy.yaml`.

use clap::Parser;
use funk_deploy::{cli, commands::Commands, common::logging};

#[derive(Parser)]
#[command(name = "funk", about = "Function SDK deploy plans and cluster helpers")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    logging::init_cli();

    let cli = Cli::parse();

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
