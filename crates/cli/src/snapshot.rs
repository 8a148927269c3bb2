//! JSON snapshot adapter.
//!
//! A snapshot holds the newest scrape batch per bookmaker plus an optional
//! club-name synonym table:
//!
//! ```json
//! {
//!   "synonyms": { "Barcelona": ["FC Barcelona", "Barca"] },
//!   "batches": [
//!     {
//!       "source": "BETCLIC",
//!       "scrape_start": "2024-05-01T12:00:00Z",
//!       "scrape_end": "2024-05-01T12:00:20Z",
//!       "records": [
//!         {
//!           "event_time": "2024-05-01T19:00:00Z",
//!           "team_a": "Real",
//!           "team_b": "City",
//!           "odds": { "TEAM_A_WINS": 1.60, "DRAW": 3.0, "TEAM_B_WINS": 8.0 }
//!         }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Records with a non-positive price are dropped here with a warning; they
//! never reach the engine. So is a whole batch whose scrape ends before it
//! starts.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use surebet_core::{Batch, BatchWindow, Batches, Outcome, Quote, SourceId, SourceRecord};
use surebet_correlation::{NameStandardizer, SynonymStandardizer};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Canonical club name to known spellings.
    #[serde(default)]
    pub synonyms: IndexMap<String, Vec<String>>,
    pub batches: Vec<RawBatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBatch {
    pub source: SourceId,
    #[serde(default)]
    pub batch_id: Option<Uuid>,
    pub scrape_start: DateTime<Utc>,
    pub scrape_end: DateTime<Utc>,
    pub records: Vec<RawRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub event_time: DateTime<Utc>,
    pub team_a: String,
    pub team_b: String,
    #[serde(default)]
    pub odds: BTreeMap<Outcome, Decimal>,
}

impl Snapshot {
    /// Reads a snapshot from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid snapshot.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse snapshot {}", path.display()))
    }

    /// Validates and standardizes every record into engine batches.
    ///
    /// Batch order is kept. A repeated source replaces the earlier batch.
    #[must_use]
    pub fn into_batches(self) -> Batches {
        let standardizer = SynonymStandardizer::new(&self.synonyms);
        let mut batches = Batches::new();
        let mut dropped = 0usize;

        for raw in self.batches {
            let batch_id = raw.batch_id.unwrap_or_else(Uuid::new_v4);
            let window = BatchWindow::new(raw.scrape_start, raw.scrape_end);
            if window.duration() < Duration::zero() {
                warn!(
                    source = %raw.source,
                    start = %window.start,
                    end = %window.end,
                    "Dropping batch whose scrape ends before it starts"
                );
                dropped += raw.records.len();
                continue;
            }

            let records: Vec<SourceRecord> = raw
                .records
                .into_iter()
                .filter_map(|record| {
                    let converted = to_record(&raw.source, record, batch_id, window);
                    if converted.is_none() {
                        dropped += 1;
                    }
                    converted
                })
                .map(|record| standardizer.apply(record))
                .collect();

            if batches.contains_key(&raw.source) {
                warn!(source = %raw.source, "Duplicate batch for source, keeping the later one");
            }
            batches.insert(raw.source.clone(), Batch::new(raw.source, records));
        }

        info!(
            batches = batches.len(),
            records = batches.values().map(Batch::count).sum::<usize>(),
            dropped,
            "Snapshot loaded"
        );
        batches
    }
}

fn to_record(
    source: &SourceId,
    raw: RawRecord,
    batch_id: Uuid,
    window: BatchWindow,
) -> Option<SourceRecord> {
    let mut record = SourceRecord::new(source.clone(), raw.event_time, raw.team_a, raw.team_b)
        .with_batch(batch_id, window);

    for (outcome, value) in raw.odds {
        match Quote::try_new(value, window.end) {
            Ok(quote) => record = record.with_quote(outcome, quote),
            Err(e) => {
                warn!(
                    source = %source,
                    fixture = %record.fixture(),
                    %outcome,
                    error = %e,
                    "Dropping record with malformed odds"
                );
                return None;
            }
        }
    }
    Some(record)
}
