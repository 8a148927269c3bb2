//! Runs the engine over a JSON snapshot file.
//!
//! ```bash
//! surebet correlate --snapshot demos/snapshot.json
//! surebet --profile strict correlate --snapshot demos/snapshot.json --target 2000 --json
//! ```

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use surebet_core::AppConfig;

use super::{print_report, run_engine, EngineArgs};
use crate::snapshot::Snapshot;

/// Arguments for the correlate command.
#[derive(Args, Debug, Clone)]
pub struct CorrelateArgs {
    /// Snapshot JSON file with the newest batch per bookmaker
    #[arg(short, long)]
    pub snapshot: PathBuf,

    #[command(flatten)]
    pub engine: EngineArgs,
}

pub async fn run_correlate(args: CorrelateArgs, config: AppConfig) -> Result<()> {
    let config = args.engine.apply(config)?;
    tracing::info!(snapshot = %args.snapshot.display(), "Correlating snapshot");

    let batches = Snapshot::from_path(&args.snapshot)?.into_batches();
    let report = run_engine(&config, batches).await?;

    print_report(&report, args.engine.json)
}
