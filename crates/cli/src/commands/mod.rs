//! CLI commands for the surebet engine.

pub mod correlate;
pub mod demo;
pub mod similarity;

pub use correlate::{run_correlate, CorrelateArgs};
pub use demo::{run_demo, DemoArgs};
pub use similarity::{run_similarity, SimilarityArgs};

use anyhow::{anyhow, Context, Result};
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use std::time::Duration;
use surebet_core::{AppConfig, Batches, MatcherStrategy};
use surebet_correlation::{ClusterState, CorrelationReport, CorrelationService, TracingSink};
use tracing::info;

/// Matching strategy selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Same kick-off and equal standardized names
    Exact,
    /// Similar standardized names, kick-off ignored
    Fuzzy,
}

impl From<StrategyArg> for MatcherStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Exact => MatcherStrategy::Exact,
            StrategyArg::Fuzzy => MatcherStrategy::Fuzzy,
        }
    }
}

/// Engine settings that override the loaded configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct EngineArgs {
    /// Payout each leg should return (overrides engine.target_payout)
    #[arg(long)]
    pub target: Option<Decimal>,

    /// Mask stakes to multiples of this amount
    #[arg(long)]
    pub multiple: Option<u32>,

    /// Matching strategy (overrides matcher.strategy)
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Evaluate clusters in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Print the full report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl EngineArgs {
    /// Applies the overrides and re-validates.
    ///
    /// # Errors
    ///
    /// Returns an error if an override puts a setting out of range.
    pub fn apply(&self, mut config: AppConfig) -> Result<AppConfig> {
        if let Some(target) = self.target {
            config.engine.target_payout = target;
        }
        if let Some(multiple) = self.multiple {
            config.engine.rounding_multiple = multiple;
        }
        if let Some(strategy) = self.strategy {
            config.matcher.strategy = strategy.into();
        }
        if self.parallel {
            config.engine.parallel_evaluation = true;
        }
        config.validate().context("invalid command-line override")?;
        Ok(config)
    }
}

/// Runs the engine on a blocking thread, bounded by `engine.run_timeout_secs`.
///
/// Accepted plans are logged through [`TracingSink`].
///
/// # Errors
///
/// Returns an error on timeout, on an engine error, or if the task panicked.
pub async fn run_engine(config: &AppConfig, batches: Batches) -> Result<CorrelationReport> {
    let service = CorrelationService::from_config(config)?;
    let limit = Duration::from_secs(config.engine.run_timeout_secs);
    info!(
        matcher = service.matcher().name(),
        target = %service.target_payout(),
        timeout_secs = limit.as_secs(),
        "Running correlation"
    );

    let task = tokio::task::spawn_blocking(move || service.run_and_emit(&batches, &TracingSink));
    let report = tokio::time::timeout(limit, task)
        .await
        .map_err(|_| anyhow!("correlation run exceeded {}s", limit.as_secs()))?
        .context("correlation task failed")??;

    Ok(report)
}

/// Prints a report as JSON or as a human-readable summary.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print_report(report: &CorrelationReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let stats = &report.stats;
    println!(
        "Matched {} of {} candidate records ({:.2}%) across {} batches",
        stats.clustering.matched_records,
        stats.clustering.candidate_records,
        stats.clustering.match_rate_pct(),
        stats.batches
    );
    if let Some(skew) = &stats.batch_skew {
        let flag = if stats.skew_exceeded { " (exceeds tolerance)" } else { "" };
        println!(
            "Largest scrape gap: {:.3}s between {} and {}{flag}",
            skew.gap_ms as f64 / 1000.0,
            skew.earlier,
            skew.later
        );
    }
    let states = report.cluster_states();
    let accepted = states
        .iter()
        .filter(|(_, state)| *state == ClusterState::Accepted)
        .count();
    println!("{accepted} accepted, {} discarded", states.len() - accepted);

    for accepted in &report.accepted {
        let plan = &accepted.plan;
        println!();
        println!(
            "ACCEPTED {}  edge {}%  stake {}  profit {}",
            accepted.cluster.fixture(),
            accepted.opportunity.edge_pct().round_dp(2),
            plan.total_stake(),
            accepted.profit()
        );
        for leg in plan.legs() {
            println!(
                "  {:<12} {:<10} @ {:>6}  stake {:>8}  pays {}",
                leg.outcome.as_str(),
                leg.source.as_str(),
                leg.quote_value,
                leg.stake,
                leg.payout().round_dp(2)
            );
        }
    }

    if !report.discarded.is_empty() {
        println!();
        for discarded in &report.discarded {
            println!("DISCARDED {}: {}", discarded.cluster.fixture(), discarded.reason);
        }
    }

    Ok(())
}
