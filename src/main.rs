//! Overload CLI - Stress-Coupled Soundscape Renderer
//!
//! Command-line host for the audio layer and visual stimulus engines.

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;

use overload::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Overload Engine v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Overload Engine v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Presets { kind } => overload::cli::commands::list_presets(kind),
        Commands::Render(args) => overload::cli::commands::render(&args),
    }
}
