//! Wildthread CLI - Catalog seeding and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Seed the catalog from the embedded demo set
//! wt-cli seed
//!
//! # Seed the catalog from a YAML file
//! wt-cli seed --file catalog.yaml
//! ```
//!
//! # Commands
//!
//! - `seed` - Write product documents to the configured backend

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "wt-cli")]
#[command(author, version, about = "Wildthread CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the product catalog
    Seed {
        /// YAML file with the products to write; embedded demo set if absent
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Seed { file } => commands::seed::run(file.as_deref()).await?,
    }

    Ok(())
}
