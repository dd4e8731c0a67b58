//! ## lookout-cli
//! **Operational entrypoint**
//!
//! `lookout serve` runs the HTTP control surface (and optionally starts the
//! live loop straight away); `lookout analyze <file>` runs one-shot detection
//! from the command line.

use clap::Parser;

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => commands::serve(args).await,
        Commands::Analyze(args) => commands::analyze(args).await,
    }
}
