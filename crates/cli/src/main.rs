use clap::{Parser, Subcommand};
use std::path::PathBuf;
use surebet_core::config_loader::DEFAULT_CONFIG_PATH;
use surebet_core::ConfigLoader;

mod commands;
mod snapshot;

use commands::{CorrelateArgs, DemoArgs, SimilarityArgs};

#[derive(Parser)]
#[command(name = "surebet", version)]
#[command(about = "Cross-bookmaker odds correlation and arbitrage detection", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Config profile overlay (e.g. "strict" loads Surebet.strict.toml)
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Correlate a JSON snapshot of bookmaker batches
    Correlate(CorrelateArgs),
    /// Run the engine over a built-in sample
    Demo(DemoArgs),
    /// Show how similar two team names are under each metric
    Similarity(SimilarityArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so --json output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ConfigLoader::load_from(&cli.config, cli.profile.as_deref())?;

    match cli.command {
        Commands::Correlate(args) => {
            commands::run_correlate(args, config).await?;
        }
        Commands::Demo(args) => {
            commands::run_demo(args, config).await?;
        }
        Commands::Similarity(args) => {
            commands::run_similarity(&args, &config)?;
        }
    }

    Ok(())
}
