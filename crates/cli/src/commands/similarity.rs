//! Prints how similar two team names are under every metric.

use anyhow::Result;
use clap::Args;
use surebet_core::{AppConfig, SimilarityMetric};
use surebet_correlation::{similarity, FallbackStandardizer, NameStandardizer};

/// Arguments for the similarity command.
#[derive(Args, Debug, Clone)]
pub struct SimilarityArgs {
    /// First team name
    pub left: String,

    /// Second team name
    pub right: String,

    /// Compare raw names instead of standardizing them first
    #[arg(long)]
    pub raw: bool,
}

pub fn run_similarity(args: &SimilarityArgs, config: &AppConfig) -> Result<()> {
    let (left, right) = if args.raw {
        (args.left.clone(), args.right.clone())
    } else {
        (
            FallbackStandardizer.standardize(&args.left),
            FallbackStandardizer.standardize(&args.right),
        )
    };
    let threshold = config.matcher.threshold;

    println!("{left:?} vs {right:?} (threshold {threshold})");
    for metric in SimilarityMetric::ALL {
        let score = similarity(metric, &left, &right);
        let verdict = if score >= threshold { "match" } else { "no match" };
        let marker = if metric == config.matcher.metric { "*" } else { " " };
        println!("{marker} {:<14} {score:.4}  {verdict}", metric.as_str());
    }

    Ok(())
}
