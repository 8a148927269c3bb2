//! Runs the engine over a built-in three-bookmaker sample.
//!
//! Real vs City has an arbitrage that masking to 50 wipes out. The Barcelona
//! match is spelled differently by each bookmaker and stays profitable after
//! masking.

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use surebet_core::{batches_from, AppConfig, Batch, BatchWindow, Batches, Outcome, Quote, SourceRecord};
use surebet_correlation::{FallbackStandardizer, NameStandardizer};
use uuid::Uuid;

use super::{print_report, run_engine, EngineArgs};

/// Arguments for the demo command.
#[derive(Args, Debug, Clone)]
pub struct DemoArgs {
    #[command(flatten)]
    pub engine: EngineArgs,
}

pub async fn run_demo(args: DemoArgs, config: AppConfig) -> Result<()> {
    let config = args.engine.apply(config)?;
    let report = run_engine(&config, sample_batches()).await?;
    print_report(&report, args.engine.json)
}

/// Sample odds as (source, scrape offset in seconds, fixtures).
type SampleBook = (&'static str, i64, [(&'static str, &'static str, [Decimal; 3]); 2]);

fn sample_books() -> [SampleBook; 3] {
    [
        (
            "BETCLIC",
            0,
            [
                ("Real", "City", [dec!(1.60), dec!(3.0), dec!(8.0)]),
                ("FC Barcelona", "Sevilla", [dec!(2.9), dec!(3.3), dec!(3.5)]),
            ],
        ),
        (
            "LVBET",
            12,
            [
                ("real", "city", [dec!(1.80), dec!(3.2), dec!(5.0)]),
                ("Barcelona", "Sevilla FC", [dec!(2.7), dec!(3.6), dec!(3.6)]),
            ],
        ),
        (
            "STS",
            25,
            [
                ("Real ", "City", [dec!(1.90), dec!(3.1), dec!(4.0)]),
                ("barcelona", "sevilla", [dec!(2.8), dec!(3.4), dec!(3.9)]),
            ],
        ),
    ]
}

/// # Panics
///
/// Never in practice: the sample kick-off is a fixed, unambiguous UTC time.
fn kickoff() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 19, 0, 0)
        .single()
        .expect("sample kick-off is a valid UTC time")
}

/// The sample as engine batches, names passed through the fallback standardizer.
#[must_use]
pub fn sample_batches() -> Batches {
    let scrape_base = kickoff() - Duration::hours(6);

    batches_from(sample_books().into_iter().map(|(source, offset, fixtures)| {
        let end = scrape_base + Duration::seconds(offset);
        let window = BatchWindow::new(end - Duration::seconds(10), end);
        let batch_id = Uuid::new_v4();

        let records = fixtures
            .into_iter()
            .enumerate()
            .map(|(i, (team_a, team_b, odds))| {
                let record = SourceRecord::new(source, kickoff() + Duration::hours(i as i64 * 2), team_a, team_b)
                    .with_batch(batch_id, window);
                let record = Outcome::ALL
                    .into_iter()
                    .zip(odds)
                    .fold(record, |r, (outcome, value)| r.with_quote(outcome, Quote::new(value, end)));
                FallbackStandardizer.apply(record)
            })
            .collect();

        Batch::new(source, records)
    }))
}
