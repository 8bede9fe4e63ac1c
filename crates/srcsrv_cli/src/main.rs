//! SRCSRV CLI - source indexing for native symbol databases.
//!
//! The same binary serves both phases: `index` runs at build time, and the
//! SRCSRVCMD it embeds into each .PDB re-invokes `fetch` from inside the
//! debugger years later.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::fetch::FetchArgs;
use commands::index::IndexArgs;

#[derive(Parser)]
#[command(name = "srcsrv")]
#[command(about = "Source indexing for .PDB symbol databases", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed source index streams into .PDB files
    Index(IndexArgs),
    /// Retrieve one indexed source file into the cache (debugger entry point)
    Fetch(FetchArgs),
}

fn main() -> Result<()> {
    // Respects RUST_LOG environment variable (e.g., RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Index(args) => commands::index::run(args),
        Commands::Fetch(args) => commands::fetch::run(args),
    }
}
