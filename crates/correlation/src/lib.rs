//! Cross-bookmaker event correlation and arbitrage stake planning.
//!
//! Bookmakers publish odds for the same football match under slightly
//! different names and timestamps. This crate groups their records into
//! clusters describing one event, picks the best price per outcome, and
//! checks whether backing every outcome at those prices returns more than it
//! costs:
//!
//! ```text
//! Real vs City        1       X       2
//! BETCLIC           1.60    3.00    8.00
//! LVBET             1.80    3.20    5.00
//! STS               1.90    3.10    4.00
//!
//! Best:             1.90    3.20    8.00   (STS / LVBET / BETCLIC)
//! Implied:  1/1.90 + 1/3.20 + 1/8.00 = 0.9638 < 1  -> arbitrage
//! Stakes for 1000:  526.32  312.50  125.00  (total 963.82)
//! ```
//!
//! # Modules
//!
//! - [`similarity`] and [`matcher`]: pairwise record matching
//! - [`cluster`]: greedy anchor-based clustering of per-source batches
//! - [`aggregator`] and [`detector`]: best odds and arbitrage check
//! - [`stake`] and [`masker`]: stake allocation and rounding
//! - [`service`]: the end-to-end run
//! - [`standardize`] and [`sink`]: collaborators on either side of a run
//!
//! # Example
//!
//! ```ignore
//! use surebet_correlation::{CollectingSink, CorrelationService};
//!
//! let service = CorrelationService::from_config(&config)?;
//! let sink = CollectingSink::new();
//! let report = service.run_and_emit(&batches, &sink)?;
//!
//! for discarded in &report.discarded {
//!     println!("{}: {}", discarded.cluster.fixture(), discarded.reason);
//! }
//! ```
//!
//! Masking rounds stakes up to bookmaker-friendly amounts, which often eats
//! the whole edge. A plan is only accepted when its masked stakes still
//! guarantee a strictly positive profit.

pub mod aggregator;
pub mod cluster;
pub mod detector;
pub mod error;
pub mod masker;
pub mod matcher;
pub mod service;
pub mod similarity;
pub mod sink;
pub mod stake;
pub mod standardize;

pub use aggregator::{BestOddsMap, BestQuote, OddsAggregator};
pub use cluster::{Cluster, ClusterBuild, ClusterBuilder, ClusterStats, DEFAULT_MIN_CLUSTER_SIZE};
pub use detector::{implied_probability, ArbitrageDetector, Opportunity};
pub use error::CorrelationError;
pub use masker::StakeMasker;
pub use matcher::{matcher_from_config, EntityMatcher, ExactMatcher, FuzzyMatcher};
pub use service::{
    batch_skew, AcceptedPlan, BatchSkew, ClusterState, CorrelationReport, CorrelationService,
    DiscardReason, DiscardedCluster, RunStats,
};
pub use similarity::{indel_ratio, similarity};
pub use sink::{CollectingSink, PlanSink, TracingSink};
pub use stake::{BetLeg, BetPlan, PlanState, StakeCalculator};
pub use standardize::{FallbackStandardizer, NameStandardizer, SynonymStandardizer};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_exports() {
        assert_eq!(ClusterBuilder::default().min_size(), DEFAULT_MIN_CLUSTER_SIZE);

        let fuzzy = FuzzyMatcher::default();
        assert_eq!(fuzzy.name(), "fuzzy");
        assert!((fuzzy.threshold() - FuzzyMatcher::DEFAULT_THRESHOLD).abs() < f64::EPSILON);
        assert_eq!(fuzzy.metric(), surebet_core::SimilarityMetric::Indel);

        let masker = StakeMasker::default();
        assert_eq!(masker.rounding_multiple(), rust_decimal::Decimal::from(StakeMasker::DEFAULT_MULTIPLE));
        assert!(masker.round_up());

        assert!(!BestOddsMap::default().is_complete());
        assert_eq!(BestOddsMap::default().missing_outcomes().len(), 3);
        assert!(CollectingSink::new().is_empty());

        let service = CorrelationService::new(Box::new(ExactMatcher));
        assert_eq!(service.matcher().name(), "exact");
        assert_eq!(service.target_payout(), CorrelationService::DEFAULT_TARGET_PAYOUT);
    }
}
