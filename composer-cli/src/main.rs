use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "composer", about = "Compose grounded answers from retrieved sources")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file layered over the user and project config
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose an answer from an extractive answer and source chunks
    Compose(commands::compose::ComposeArgs),
    /// Rate a composed answer
    Feedback(commands::feedback::FeedbackArgs),
    /// Show performance, policy and feedback statistics
    Stats(commands::stats::StatsArgs),
    /// Check how well a text is grounded in source chunks
    Verify(commands::verify::VerifyArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config::ConfigLoader::load(cli.config.as_deref())?;
    tracing::debug!(data_dir = %config.storage.data_dir().display(), "Configuration loaded");

    match cli.command {
        Commands::Compose(args) => commands::compose::run(args, &config).await,
        Commands::Feedback(args) => commands::feedback::run(args, &config).await,
        Commands::Stats(args) => commands::stats::run(args, &config).await,
        Commands::Verify(args) => commands::verify::run(args, &config),
        Commands::Config(args) => commands::config::run(args, &config),
    }
}
