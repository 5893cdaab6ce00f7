use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod terminal;

use config::ConfigLoader;

#[derive(Parser)]
#[command(name = "posture", about = "Device security posture checks")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file layered over the user and project configs
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the engine once and report its posture
    Check(commands::check::CheckArgs),
    /// Initialize, then recheck periodically while streaming events
    Watch(commands::watch::WatchArgs),
    /// Initialize and dump the security audit trail
    Events(commands::events::EventsArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = ConfigLoader::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Check(args) => commands::check::run(args, &config).await,
        Commands::Watch(args) => commands::watch::run(args, &config).await,
        Commands::Events(args) => commands::events::run(args, &config).await,
        Commands::Config(args) => {
            commands::config::run(args, &config, cli.config.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
