mod api;
mod commands;
mod config;
mod error;
mod model;
mod prompt;
mod select;
mod state;
#[cfg(test)]
mod testing;

pub use error::Result;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Keeps Minecraft mods, datapacks, resource packs and shaders in sync with Modrinth
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Path to the config file
    #[arg(short, long, global = true, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Looks for new versions, asks which to install, then installs them
    Update {
        /// Show changelogs of versions newer than the installed one
        #[arg(short = 'c', long)]
        changelog: bool,

        /// Log debug output
        #[arg(short, long)]
        verbose: bool,
    },
    /// Checks which configured projects have builds for the given game versions
    Report {
        /// Game versions to check, in preference order
        #[arg(required = true)]
        game_versions: Vec<String>,
    },
    /// Makes the install directories match the lock file
    Install {
        /// Log debug output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(args: Args) -> Result<()> {
    let config = config::Config::load(&args.config)?;
    match args.command {
        Command::Update { changelog, .. } => commands::update(&config, changelog).await,
        Command::Report { game_versions } => commands::report(&config, game_versions).await,
        Command::Install { .. } => commands::install(&config).await,
    }
}

fn failure_message(error: &error::Error) -> String {
    format!("{} {}", "error:".red().bold(), error)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(matches!(
        args.command,
        Command::Update { verbose: true, .. } | Command::Install { verbose: true }
    ));
    info!("Starting modsync version {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(args).await {
        eprintln!("{}", failure_message(&e));
        std::process::exit(1);
    }
}
