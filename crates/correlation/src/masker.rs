//! Rounds raw stakes to amounts that do not stand out at the bookmaker.

use rust_decimal::Decimal;
use tracing::debug;

use crate::stake::{BetLeg, BetPlan};

/// Masks plan stakes to multiples of a rounding amount.
///
/// Each stake becomes `ceil(stake / m) * m`. With `round_up` disabled the
/// result is one multiple lower, so a stake that is already an exact
/// multiple also drops by `m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeMasker {
    rounding_multiple: Decimal,
    round_up: bool,
}

impl StakeMasker {
    pub const DEFAULT_MULTIPLE: u32 = 50;

    /// Creates a masker.
    ///
    /// # Panics
    ///
    /// Panics if `rounding_multiple` is zero.
    #[must_use]
    pub fn new(rounding_multiple: u32, round_up: bool) -> Self {
        assert!(rounding_multiple > 0, "rounding multiple must be positive");
        Self {
            rounding_multiple: Decimal::from(rounding_multiple),
            round_up,
        }
    }

    #[must_use]
    pub fn rounding_multiple(&self) -> Decimal {
        self.rounding_multiple
    }

    #[must_use]
    pub fn round_up(&self) -> bool {
        self.round_up
    }

    /// Masks a single amount.
    #[must_use]
    pub fn mask_amount(&self, amount: Decimal) -> Decimal {
        let m = self.rounding_multiple;
        let ceiled = (amount / m).ceil() * m;
        if self.round_up {
            ceiled
        } else {
            ceiled - m
        }
    }

    /// Masks every leg of a raw plan.
    ///
    /// # Panics
    ///
    /// Panics if `plan` is already masked.
    #[must_use]
    pub fn mask(&self, plan: BetPlan) -> BetPlan {
        assert!(!plan.is_masked(), "bet plan is already masked");

        let legs = plan
            .legs()
            .iter()
            .map(|leg| BetLeg {
                stake: self.mask_amount(leg.stake),
                ..leg.clone()
            })
            .collect();
        let masked = plan.masked(legs);

        debug!(
            multiple = %self.rounding_multiple,
            round_up = self.round_up,
            total = %masked.total_stake(),
            "Stakes masked"
        );
        masked
    }
}

impl Default for StakeMasker {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MULTIPLE, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{BestOddsMap, BestQuote};
    use crate::stake::{PlanState, StakeCalculator};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use surebet_core::{Outcome, Quote};

    fn plan_for(odds: [Decimal; 3], target: Decimal) -> BetPlan {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 19, 0, 0).unwrap();
        let best = Outcome::ALL
            .into_iter()
            .zip(odds)
            .fold(BestOddsMap::empty(), |map, (outcome, value)| {
                map.with(
                    outcome,
                    BestQuote {
                        source: outcome.as_str().into(),
                        quote: Quote::new(value, at),
                    },
                )
            });
        StakeCalculator.perfect_stake(&best, target).unwrap()
    }

    fn stakes(plan: &BetPlan) -> Vec<Decimal> {
        plan.legs().iter().map(|l| l.stake).collect()
    }

    // ==================== Amount Tests ====================

    #[test]
    fn test_mask_amount_round_up() {
        let masker = StakeMasker::default();

        assert_eq!(masker.mask_amount(dec!(526.32)), dec!(550));
        assert_eq!(masker.mask_amount(dec!(312.50)), dec!(350));
        assert_eq!(masker.mask_amount(dec!(125.00)), dec!(150));
        assert_eq!(masker.mask_amount(dec!(250.00)), dec!(250));
    }

    #[test]
    fn test_mask_amount_round_down_drops_one_multiple() {
        let masker = StakeMasker::new(50, false);

        assert_eq!(masker.mask_amount(dec!(526.32)), dec!(500));
        assert_eq!(masker.mask_amount(dec!(250.00)), dec!(200));
    }

    // ==================== Plan Tests ====================

    #[test]
    fn test_mask_plan_1000() {
        let masked = StakeMasker::default().mask(plan_for([dec!(1.90), dec!(3.2), dec!(8.0)], dec!(1000)));

        assert_eq!(masked.state(), PlanState::Masked);
        assert_eq!(stakes(&masked), vec![dec!(550), dec!(350), dec!(150)]);
        assert_eq!(masked.total_stake(), dec!(1050));
        assert!(masked.profit() < Decimal::ZERO);
    }

    #[test]
    fn test_mask_plan_2000() {
        let masked = StakeMasker::default().mask(plan_for([dec!(1.90), dec!(3.2), dec!(8.0)], dec!(2000)));

        assert_eq!(stakes(&masked), vec![dec!(1100), dec!(650), dec!(250)]);
        assert_eq!(masked.total_stake(), dec!(2000));
        assert_eq!(masked.profit(), Decimal::ZERO);
    }

    #[test]
    fn test_masked_stakes_are_multiples_and_not_smaller() {
        let odds = [dec!(1.15), dec!(2.4), dec!(3.75), dec!(9.5)];
        for multiple in [1u32, 5, 10, 50, 100] {
            let masker = StakeMasker::new(multiple, true);
            for a in odds {
                for b in odds {
                    for c in odds {
                        let raw = plan_for([a, b, c], dec!(1234.56));
                        let masked = masker.mask(raw.clone());

                        for leg in masked.legs() {
                            assert_eq!(leg.stake % Decimal::from(multiple), Decimal::ZERO);
                        }
                        assert!(masked.total_stake() >= raw.total_stake());
                    }
                }
            }
        }
    }

    #[test]
    #[should_panic(expected = "already masked")]
    fn test_masking_twice_panics() {
        let masker = StakeMasker::default();
        let masked = masker.mask(plan_for([dec!(2), dec!(4), dec!(4)], dec!(100)));
        let _ = masker.mask(masked);
    }
}
