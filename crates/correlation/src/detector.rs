//! Arbitrage detection over best available odds.
//!
//! An arbitrage exists when every outcome is priced and the implied
//! probabilities of the best quotes sum to strictly less than one: staking
//! `target / odds` on each outcome then costs less than the payout any single
//! outcome returns.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::aggregator::BestOddsMap;

// =============================================================================
// Opportunity
// =============================================================================

/// Result of evaluating one cluster's best odds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    /// True iff the odds map is complete and the implied probability is
    /// strictly below one.
    pub exists: bool,
    /// Best quote per outcome the decision was made on.
    pub best_odds: BestOddsMap,
    /// Sum of `1 / odds` over the covered outcomes.
    pub implied_probability: Decimal,
    /// Profit after masking, filled in once a plan has been validated.
    pub profit: Option<Decimal>,
}

impl Opportunity {
    /// Theoretical edge before masking, as a percentage (`(1 - p) * 100`).
    ///
    /// Negative when the book is over-round. Only meaningful for complete maps.
    #[must_use]
    pub fn edge_pct(&self) -> Decimal {
        (Decimal::ONE - self.implied_probability) * dec!(100)
    }

    /// Returns a copy with the validated profit attached.
    #[must_use]
    pub fn with_profit(mut self, profit: Decimal) -> Self {
        self.profit = Some(profit);
        self
    }
}

// =============================================================================
// Detector
// =============================================================================

/// Decides whether best odds form an arbitrage.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArbitrageDetector;

impl ArbitrageDetector {
    /// Evaluates `best`. Pure; the returned opportunity carries no profit.
    #[must_use]
    pub fn detect(&self, best: &BestOddsMap) -> Opportunity {
        let implied_probability = implied_probability(best);
        let exists = best.is_complete() && implied_probability < Decimal::ONE;

        trace!(
            implied_probability = %implied_probability,
            complete = best.is_complete(),
            exists,
            "Arbitrage check"
        );

        Opportunity {
            exists,
            best_odds: best.clone(),
            implied_probability,
            profit: None,
        }
    }
}

/// Sum of `1 / value` over the outcomes present in `best`.
#[must_use]
pub fn implied_probability(best: &BestOddsMap) -> Decimal {
    best.covered()
        .map(|(_, b)| b.quote.implied_probability())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::BestQuote;
    use chrono::{TimeZone, Utc};
    use surebet_core::{Outcome, Quote};

    fn best_of(odds: &[(Outcome, Decimal)]) -> BestOddsMap {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 19, 0, 0).unwrap();
        odds.iter().fold(BestOddsMap::empty(), |map, (outcome, value)| {
            map.with(
                *outcome,
                BestQuote {
                    source: "S".into(),
                    quote: Quote::new(*value, at),
                },
            )
        })
    }

    #[test]
    fn test_detects_arbitrage_below_one() {
        let best = best_of(&[
            (Outcome::TeamAWins, dec!(1.90)),
            (Outcome::Draw, dec!(3.2)),
            (Outcome::TeamBWins, dec!(8.0)),
        ]);

        let opportunity = ArbitrageDetector.detect(&best);

        assert!(opportunity.exists);
        assert!(opportunity.implied_probability > dec!(0.963));
        assert!(opportunity.implied_probability < dec!(0.964));
        assert!(opportunity.edge_pct() > dec!(3.6));
        assert!(opportunity.profit.is_none());
    }

    #[test]
    fn test_probability_of_exactly_one_is_not_arbitrage() {
        let best = best_of(&[
            (Outcome::TeamAWins, dec!(2)),
            (Outcome::Draw, dec!(4)),
            (Outcome::TeamBWins, dec!(4)),
        ]);

        let opportunity = ArbitrageDetector.detect(&best);

        assert_eq!(opportunity.implied_probability, Decimal::ONE);
        assert!(!opportunity.exists);
        assert_eq!(opportunity.edge_pct(), Decimal::ZERO);
    }

    #[test]
    fn test_over_round_book() {
        let best = best_of(&[
            (Outcome::TeamAWins, dec!(1.60)),
            (Outcome::Draw, dec!(3.0)),
            (Outcome::TeamBWins, dec!(4.0)),
        ]);

        let opportunity = ArbitrageDetector.detect(&best);

        assert!(!opportunity.exists);
        assert!(opportunity.edge_pct() < Decimal::ZERO);
    }

    #[test]
    fn test_incomplete_map_never_exists() {
        // Two long prices sum well below one but the draw is uncovered.
        let best = best_of(&[(Outcome::TeamAWins, dec!(10)), (Outcome::TeamBWins, dec!(10))]);

        let opportunity = ArbitrageDetector.detect(&best);

        assert_eq!(opportunity.implied_probability, dec!(0.2));
        assert!(!opportunity.exists);
    }
}
