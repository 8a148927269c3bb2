//! Stake allocation for a detected arbitrage.
//!
//! Given a target payout `T`, staking `T / odds` on every outcome makes each
//! winning leg return `T`. Stakes are rounded to cents, so each leg returns
//! `T` within half a cent times its odds.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surebet_core::{Outcome, SourceId};

use crate::aggregator::BestOddsMap;
use crate::error::{CorrelationError, Result};

// =============================================================================
// Bet Plan
// =============================================================================

/// One stake on one outcome at one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetLeg {
    pub outcome: Outcome,
    pub source: SourceId,
    /// Odds the stake is placed at.
    pub quote_value: Decimal,
    pub stake: Decimal,
}

impl BetLeg {
    /// What this leg returns if its outcome wins.
    #[must_use]
    pub fn payout(&self) -> Decimal {
        self.stake * self.quote_value
    }
}

/// Whether plan stakes are exact or have been masked to round amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanState {
    Raw,
    Masked,
}

/// Stakes covering every outcome of one event.
///
/// Plans start [`PlanState::Raw`] and are moved to [`PlanState::Masked`]
/// exactly once by [`crate::StakeMasker`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetPlan {
    legs: Vec<BetLeg>,
    target_payout: Decimal,
    state: PlanState,
}

impl BetPlan {
    pub(crate) fn masked(self, legs: Vec<BetLeg>) -> Self {
        Self {
            legs,
            target_payout: self.target_payout,
            state: PlanState::Masked,
        }
    }

    /// Legs in [`Outcome::ALL`] order.
    #[must_use]
    pub fn legs(&self) -> &[BetLeg] {
        &self.legs
    }

    #[must_use]
    pub fn leg(&self, outcome: Outcome) -> Option<&BetLeg> {
        self.legs.iter().find(|leg| leg.outcome == outcome)
    }

    #[must_use]
    pub fn target_payout(&self) -> Decimal {
        self.target_payout
    }

    #[must_use]
    pub fn state(&self) -> PlanState {
        self.state
    }

    #[must_use]
    pub fn is_masked(&self) -> bool {
        self.state == PlanState::Masked
    }

    /// Sum of all stakes.
    #[must_use]
    pub fn total_stake(&self) -> Decimal {
        self.legs.iter().map(|leg| leg.stake).sum()
    }

    /// Payout per outcome if that outcome wins.
    #[must_use]
    pub fn payouts(&self) -> Vec<(Outcome, Decimal)> {
        self.legs
            .iter()
            .map(|leg| (leg.outcome, leg.payout()))
            .collect()
    }

    /// Smallest payout over all outcomes.
    #[must_use]
    pub fn worst_case_payout(&self) -> Decimal {
        self.legs
            .iter()
            .map(BetLeg::payout)
            .min()
            .unwrap_or(Decimal::ZERO)
    }

    /// Payout the plan can be counted on for: the target, capped by the
    /// worst leg.
    #[must_use]
    pub fn guaranteed_payout(&self) -> Decimal {
        self.target_payout.min(self.worst_case_payout())
    }

    /// Guaranteed payout minus total stake.
    #[must_use]
    pub fn profit(&self) -> Decimal {
        self.guaranteed_payout() - self.total_stake()
    }

    /// Sum of `1 / odds` over the legs.
    #[must_use]
    pub fn implied_probability(&self) -> Decimal {
        self.legs
            .iter()
            .map(|leg| Decimal::ONE / leg.quote_value)
            .sum()
    }
}

// =============================================================================
// Stake Calculator
// =============================================================================

/// Computes the raw stakes that pay out a target on any outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct StakeCalculator;

impl StakeCalculator {
    /// Stakes `round(target / odds, 2)` on every outcome of `best`.
    ///
    /// Rounding is half-to-even.
    ///
    /// # Errors
    ///
    /// Returns [`CorrelationError::NonPositiveTarget`] if `target <= 0`, and
    /// [`CorrelationError::IncompleteOdds`] if any outcome lacks a quote.
    pub fn perfect_stake(&self, best: &BestOddsMap, target: Decimal) -> Result<BetPlan> {
        if target <= Decimal::ZERO {
            return Err(CorrelationError::NonPositiveTarget(target));
        }

        let missing = best.missing_outcomes();
        if !missing.is_empty() {
            return Err(CorrelationError::IncompleteOdds(missing));
        }

        let legs = best
            .covered()
            .map(|(outcome, best)| BetLeg {
                outcome,
                source: best.source.clone(),
                quote_value: best.quote.value,
                stake: (target / best.quote.value).round_dp(2),
            })
            .collect();

        Ok(BetPlan {
            legs,
            target_payout: target,
            state: PlanState::Raw,
        })
    }
}
