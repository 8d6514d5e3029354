//! StoryAtlas CLI - play, demonstrate, and inspect story-map documents.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use storyatlas::config::{ConfigFile, EngineConfig};

use error::CliError;

#[derive(Debug, Parser)]
#[command(
    name = "storyatlas",
    version,
    about = "Guided map tours from authored story-map documents"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Write logs to a daily-rolling file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Engine config INI (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Play a story-map document headlessly
    Play(commands::play::PlayArgs),
    /// Demonstrate a segment's route animations alone
    Routes(commands::routes::RoutesArgs),
    /// Validate and summarize a document
    Inspect(commands::inspect::InspectArgs),
}

fn engine_config(cli: &Cli) -> EngineConfig {
    match &cli.config {
        Some(path) => ConfigFile::load(path),
        None => ConfigFile::load_default(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // The guard must outlive every command so buffered file logs flush.
    let _log_guard = match &cli.log_dir {
        Some(dir) => match storyatlas::log::init_with_file(cli.verbose, dir) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("Error: {}", CliError::Logging(e));
                std::process::exit(1);
            }
        },
        None => {
            if let Err(e) = storyatlas::log::init_console(cli.verbose) {
                eprintln!("Error: {}", CliError::Logging(e));
                std::process::exit(1);
            }
            None
        }
    };

    let config = engine_config(&cli);
    let result = match cli.command {
        Commands::Play(args) => commands::play::run(args, config).await,
        Commands::Routes(args) => commands::routes::run(args, config).await,
        Commands::Inspect(args) => commands::inspect::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
