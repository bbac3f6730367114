//! Stitch CLI - Static site composition engine.
//!
//! Provides commands for:
//! - `build`: Compose all manifest pages into the build directory
//! - `check`: Validate the site manifest
//! - `clean`: Empty the build directory

mod commands;
mod config;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, CheckArgs, CleanArgs};
use output::Output;

/// Stitch - Static site composition engine.
#[derive(Parser)]
#[command(name = "stitch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose all manifest pages into the build directory.
    Build(BuildArgs),
    /// Validate the site manifest.
    Check(CheckArgs),
    /// Empty the build directory.
    Clean(CleanArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // Check if verbose flag is set for build command
    let verbose = matches!(&cli.command, Commands::Build(args) if args.verbose);

    // Initialize tracing with appropriate log level
    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Build(args) => args.execute(),
        Commands::Check(args) => args.execute(),
        Commands::Clean(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
