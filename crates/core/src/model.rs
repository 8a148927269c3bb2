//! Odds and record model shared by the correlation engine and its adapters.
//!
//! Every type here describes one source's view of one sporting event. Records
//! are produced by ingestion once per scrape batch and are read-only to the
//! engine.

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Newest batch per source, in insertion order.
///
/// Insertion order is significant: it breaks ties when picking the anchor
/// source and fixes the order in which the remaining sources are scanned.
pub type Batches = IndexMap<SourceId, Batch>;

/// Errors raised while building model values from untrusted input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Odds must be strictly positive.
    #[error("quote value must be positive, got {0}")]
    NonPositiveQuote(Decimal),
}

// =============================================================================
// Source Identifier
// =============================================================================

/// Identifies an independent odds provider (a bookmaker).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// Mutually exclusive results of a football match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// Home side (team A) wins.
    TeamAWins,
    /// Match ends level.
    Draw,
    /// Away side (team B) wins.
    TeamBWins,
}

impl Outcome {
    /// The closed outcome set, in the order used for aggregation and staking.
    pub const ALL: [Outcome; 3] = [Outcome::TeamAWins, Outcome::Draw, Outcome::TeamBWins];

    /// Returns the display string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TeamAWins => "TEAM_A_WINS",
            Self::Draw => "DRAW",
            Self::TeamBWins => "TEAM_B_WINS",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Quote
// =============================================================================

/// Decimal odds offered by one source for one outcome.
///
/// The value is the payout per unit staked and is always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQuote")]
pub struct Quote {
    /// Decimal odds (e.g. 1.90).
    pub value: Decimal,
    /// When the source published this price.
    pub observed_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawQuote {
    value: Decimal,
    observed_at: DateTime<Utc>,
}

impl TryFrom<RawQuote> for Quote {
    type Error = ModelError;

    fn try_from(raw: RawQuote) -> Result<Self, Self::Error> {
        Self::try_new(raw.value, raw.observed_at)
    }
}

impl Quote {
    /// Creates a quote.
    ///
    /// # Panics
    ///
    /// Panics if `value` is not strictly positive. A non-positive quote inside
    /// the engine means ingestion let malformed data through.
    #[must_use]
    pub fn new(value: Decimal, observed_at: DateTime<Utc>) -> Self {
        assert!(
            value > Decimal::ZERO,
            "quote value must be positive, got {value}"
        );
        Self { value, observed_at }
    }

    /// Creates a quote, rejecting non-positive values.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NonPositiveQuote`] if `value <= 0`.
    pub fn try_new(value: Decimal, observed_at: DateTime<Utc>) -> Result<Self, ModelError> {
        if value <= Decimal::ZERO {
            return Err(ModelError::NonPositiveQuote(value));
        }
        Ok(Self { value, observed_at })
    }

    /// Implied probability of this single price (`1 / value`).
    #[must_use]
    pub fn implied_probability(&self) -> Decimal {
        Decimal::ONE / self.value
    }
}

// =============================================================================
// Source Record
// =============================================================================

/// Start and end of the scrape that produced a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BatchWindow {
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// A zero-length window at `at`.
    #[must_use]
    pub fn instant(at: DateTime<Utc>) -> Self {
        Self { start: at, end: at }
    }

    /// How long the scrape took.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// One source's view of one event, captured in one scrape batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Source that published the odds.
    pub source: SourceId,
    /// Kick-off time as reported by the source.
    pub event_time: DateTime<Utc>,
    /// Home side name as scraped.
    pub team_a: String,
    /// Away side name as scraped.
    pub team_b: String,
    /// Home side name after synonym lookup / normalization.
    pub team_a_standardized: String,
    /// Away side name after synonym lookup / normalization.
    pub team_b_standardized: String,
    /// Quote per outcome; an outcome may be absent.
    pub quotes: BTreeMap<Outcome, Quote>,
    /// Scrape batch this record belongs to.
    pub batch_id: Uuid,
    /// Window of the scrape batch.
    pub batch_window: BatchWindow,
}

impl SourceRecord {
    /// Creates a record whose standardized names equal the raw names.
    ///
    /// Use [`SourceRecord::with_standardized_names`] once the names have been
    /// passed through a standardizer.
    #[must_use]
    pub fn new(
        source: impl Into<SourceId>,
        event_time: DateTime<Utc>,
        team_a: impl Into<String>,
        team_b: impl Into<String>,
    ) -> Self {
        let team_a = team_a.into();
        let team_b = team_b.into();
        Self {
            source: source.into(),
            event_time,
            team_a_standardized: team_a.clone(),
            team_b_standardized: team_b.clone(),
            team_a,
            team_b,
            quotes: BTreeMap::new(),
            batch_id: Uuid::nil(),
            batch_window: BatchWindow::instant(event_time),
        }
    }

    #[must_use]
    pub fn with_standardized_names(
        mut self,
        team_a: impl Into<String>,
        team_b: impl Into<String>,
    ) -> Self {
        self.team_a_standardized = team_a.into();
        self.team_b_standardized = team_b.into();
        self
    }

    #[must_use]
    pub fn with_quote(mut self, outcome: Outcome, quote: Quote) -> Self {
        self.quotes.insert(outcome, quote);
        self
    }

    #[must_use]
    pub fn with_batch(mut self, batch_id: Uuid, window: BatchWindow) -> Self {
        self.batch_id = batch_id;
        self.batch_window = window;
        self
    }

    /// Returns the quote for `outcome`, if the source offers one.
    #[must_use]
    pub fn quote(&self, outcome: Outcome) -> Option<&Quote> {
        self.quotes.get(&outcome)
    }

    /// Short human-readable label, e.g. `Real vs City`.
    #[must_use]
    pub fn fixture(&self) -> String {
        format!("{} vs {}", self.team_a_standardized, self.team_b_standardized)
    }
}

// =============================================================================
// Batch
// =============================================================================

/// The newest snapshot of records from one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub source: SourceId,
    pub records: Vec<SourceRecord>,
}

impl Batch {
    #[must_use]
    pub fn new(source: impl Into<SourceId>, records: Vec<SourceRecord>) -> Self {
        Self {
            source: source.into(),
            records,
        }
    }

    /// Number of records in the batch.
    #[must_use]
    pub fn count(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Latest scrape end across the batch's records.
    #[must_use]
    pub fn scrape_end(&self) -> Option<DateTime<Utc>> {
        self.records.iter().map(|r| r.batch_window.end).max()
    }
}

/// Builds an ordered batch map from batches, keeping their order.
///
/// A later batch for an already present source replaces the earlier one but
/// keeps the earlier position.
#[must_use]
pub fn batches_from(batches: impl IntoIterator<Item = Batch>) -> Batches {
    let mut map = Batches::new();
    for batch in batches {
        map.insert(batch.source.clone(), batch);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn kickoff() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 19, 0, 0).unwrap()
    }

    #[test]
    fn test_quote_implied_probability() {
        let quote = Quote::new(dec!(4.0), kickoff());
        assert_eq!(quote.implied_probability(), dec!(0.25));
    }

    #[test]
    #[should_panic(expected = "quote value must be positive")]
    fn test_quote_rejects_zero() {
        let _ = Quote::new(Decimal::ZERO, kickoff());
    }

    #[test]
    fn test_quote_try_new_negative() {
        let err = Quote::try_new(dec!(-1.5), kickoff()).unwrap_err();
        assert_eq!(err, ModelError::NonPositiveQuote(dec!(-1.5)));
    }

    #[test]
    fn test_quote_deserialize_rejects_non_positive() {
        let json = r#"{"value": 0, "observed_at": "2024-05-01T19:00:00Z"}"#;
        assert!(serde_json::from_str::<Quote>(json).is_err());

        let json = r#"{"value": 1.85, "observed_at": "2024-05-01T19:00:00Z"}"#;
        let quote: Quote = serde_json::from_str(json).unwrap();
        assert_eq!(quote.value, dec!(1.85));
    }

    #[test]
    fn test_outcome_order_and_names() {
        assert_eq!(
            Outcome::ALL,
            [Outcome::TeamAWins, Outcome::Draw, Outcome::TeamBWins]
        );
        assert_eq!(Outcome::Draw.to_string(), "DRAW");
        assert_eq!(
            serde_json::to_string(&Outcome::TeamBWins).unwrap(),
            "\"TEAM_B_WINS\""
        );
    }

    #[test]
    fn test_record_builder() {
        let record = SourceRecord::new("BETCLIC", kickoff(), "real ", "city")
            .with_standardized_names("Real", "City")
            .with_quote(Outcome::Draw, Quote::new(dec!(3.2), kickoff()));

        assert_eq!(record.source.as_str(), "BETCLIC");
        assert_eq!(record.team_a, "real ");
        assert_eq!(record.fixture(), "Real vs City");
        assert_eq!(record.quote(Outcome::Draw).unwrap().value, dec!(3.2));
        assert!(record.quote(Outcome::TeamAWins).is_none());
    }

    #[test]
    fn test_batches_from_keeps_insertion_order() {
        let batches = batches_from(vec![
            Batch::new("LVBET", vec![]),
            Batch::new("BETCLIC", vec![]),
            Batch::new("STS", vec![]),
        ]);

        let order: Vec<&str> = batches.keys().map(SourceId::as_str).collect();
        assert_eq!(order, vec!["LVBET", "BETCLIC", "STS"]);
    }

    #[test]
    fn test_batch_scrape_end() {
        let start = kickoff();
        let end = start + Duration::seconds(45);
        let record = SourceRecord::new("STS", kickoff(), "A", "B")
            .with_batch(Uuid::new_v4(), BatchWindow::new(start, end));
        let batch = Batch::new("STS", vec![record]);

        assert_eq!(batch.count(), 1);
        assert_eq!(batch.scrape_end(), Some(end));
        assert_eq!(batch.records[0].batch_window.duration(), Duration::seconds(45));
        assert_eq!(BatchWindow::instant(end).duration(), Duration::zero());
        assert_eq!(Batch::new("STS", vec![]).scrape_end(), None);
    }
}
