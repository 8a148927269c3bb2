//! End-to-end correlation run over one snapshot of per-source batches.
//!
//! Each anchor record moves through
//! `Unmatched -> Clustered -> OpportunityEvaluated -> Accepted | Discarded`.
//! A run is a single pass: nothing is retried and no state survives it.

use chrono::Duration;
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surebet_core::{AppConfig, Batches, Outcome, SourceId};
use tracing::{debug, info, warn};

use crate::aggregator::OddsAggregator;
use crate::cluster::{Cluster, ClusterBuilder, ClusterStats};
use crate::detector::{ArbitrageDetector, Opportunity};
use crate::error::{CorrelationError, Result};
use crate::masker::StakeMasker;
use crate::matcher::{matcher_from_config, EntityMatcher};
use crate::sink::PlanSink;
use crate::stake::{BetPlan, StakeCalculator};

// =============================================================================
// Run Results
// =============================================================================

/// Lifecycle of one anchor record within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterState {
    Unmatched,
    Clustered,
    OpportunityEvaluated,
    Accepted,
    Discarded,
}

/// Why a cluster produced no plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DiscardReason {
    /// Fewer matched sources than the minimum cluster size.
    Undersized { size: usize, min_size: usize },
    /// Some outcome is priced by no source in the cluster.
    IncompleteOdds { missing: Vec<Outcome> },
    /// Best odds imply a probability of one or more.
    NoArbitrage { implied_probability: Decimal },
    /// Masked stakes leave no positive profit.
    Unprofitable { profit: Decimal, total_stake: Decimal },
}

impl DiscardReason {
    /// Last state the cluster reached before being discarded.
    #[must_use]
    pub fn reached(&self) -> ClusterState {
        match self {
            Self::Undersized { .. } => ClusterState::Unmatched,
            Self::IncompleteOdds { .. } => ClusterState::Clustered,
            Self::NoArbitrage { .. } | Self::Unprofitable { .. } => {
                ClusterState::OpportunityEvaluated
            }
        }
    }
}

impl std::fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Undersized { size, min_size } => {
                write!(f, "undersized cluster ({size} < {min_size})")
            }
            Self::IncompleteOdds { missing } => write!(f, "incomplete odds, missing {missing:?}"),
            Self::NoArbitrage {
                implied_probability,
            } => write!(f, "no arbitrage (implied probability {implied_probability:.4})"),
            Self::Unprofitable {
                profit,
                total_stake,
            } => write!(f, "unprofitable after masking (profit {profit}, stake {total_stake})"),
        }
    }
}

/// A cluster whose masked plan returns a positive profit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedPlan {
    pub cluster: Cluster,
    /// Opportunity with its validated profit set.
    pub opportunity: Opportunity,
    /// Masked plan.
    pub plan: BetPlan,
}

impl AcceptedPlan {
    #[must_use]
    pub fn profit(&self) -> Decimal {
        self.opportunity.profit.unwrap_or_else(|| self.plan.profit())
    }

    #[must_use]
    pub fn state(&self) -> ClusterState {
        ClusterState::Accepted
    }
}

/// A cluster that produced no plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscardedCluster {
    pub cluster: Cluster,
    pub reason: DiscardReason,
}

impl DiscardedCluster {
    #[must_use]
    pub fn state(&self) -> ClusterState {
        ClusterState::Discarded
    }
}

/// Largest gap between consecutive batch scrape ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSkew {
    /// Gap in milliseconds, truncated; the tolerance check uses the exact gap.
    pub gap_ms: i64,
    pub earlier: SourceId,
    pub later: SourceId,
}

impl BatchSkew {
    #[must_use]
    pub fn gap(&self) -> Duration {
        Duration::milliseconds(self.gap_ms)
    }
}

/// Exact gap between two consecutive scrape ends.
struct ScrapeGap<'a> {
    gap: Duration,
    earlier: &'a SourceId,
    later: &'a SourceId,
}

impl ScrapeGap<'_> {
    fn to_skew(&self) -> BatchSkew {
        BatchSkew {
            gap_ms: self.gap.num_milliseconds(),
            earlier: self.earlier.clone(),
            later: self.later.clone(),
        }
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub batches: usize,
    pub records: usize,
    pub clustering: ClusterStats,
    pub batch_skew: Option<BatchSkew>,
    /// True when the skew exceeded the configured tolerance.
    pub skew_exceeded: bool,
    pub accepted: usize,
    pub discarded: usize,
}

/// Everything one run produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    /// Accepted plans in cluster order.
    pub accepted: Vec<AcceptedPlan>,
    /// Evaluated clusters that were discarded, in cluster order, followed by
    /// the undersized candidates.
    pub discarded: Vec<DiscardedCluster>,
    pub stats: RunStats,
}

impl CorrelationReport {
    /// Final state of every cluster in the report, accepted plans first.
    #[must_use]
    pub fn cluster_states(&self) -> Vec<(&Cluster, ClusterState)> {
        self.accepted
            .iter()
            .map(|a| (&a.cluster, a.state()))
            .chain(self.discarded.iter().map(|d| (&d.cluster, d.state())))
            .collect()
    }
}

enum Evaluation {
    Accepted(AcceptedPlan),
    Discarded(DiscardedCluster),
}

// =============================================================================
// Correlation Service
// =============================================================================

/// Runs clustering, detection, staking and masking over a snapshot.
#[derive(Debug)]
pub struct CorrelationService {
    matcher: Box<dyn EntityMatcher>,
    builder: ClusterBuilder,
    aggregator: OddsAggregator,
    detector: ArbitrageDetector,
    calculator: StakeCalculator,
    masker: StakeMasker,
    target_payout: Decimal,
    parallel: bool,
    max_batch_skew: Duration,
}

impl CorrelationService {
    pub const DEFAULT_TARGET_PAYOUT: Decimal = Decimal::ONE_THOUSAND;

    /// Creates a service with default engine settings around `matcher`.
    #[must_use]
    pub fn new(matcher: Box<dyn EntityMatcher>) -> Self {
        Self {
            matcher,
            builder: ClusterBuilder::default(),
            aggregator: OddsAggregator,
            detector: ArbitrageDetector,
            calculator: StakeCalculator,
            masker: StakeMasker::default(),
            target_payout: Self::DEFAULT_TARGET_PAYOUT,
            parallel: false,
            max_batch_skew: Duration::seconds(60),
        }
    }

    /// Builds a service from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CorrelationError::InvalidConfig`] if a setting is out of range.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| CorrelationError::InvalidConfig(e.to_string()))?;

        let engine = &config.engine;
        let max_batch_skew = Duration::try_seconds(engine.max_batch_skew_secs).ok_or_else(|| {
            CorrelationError::InvalidConfig(format!(
                "engine.max_batch_skew_secs out of range: {}",
                engine.max_batch_skew_secs
            ))
        })?;

        Ok(Self::new(matcher_from_config(&config.matcher))
            .with_min_cluster_size(engine.min_cluster_size)
            .with_target_payout(engine.target_payout)
            .with_masker(StakeMasker::new(engine.rounding_multiple, engine.round_up))
            .with_parallel_evaluation(engine.parallel_evaluation)
            .with_max_batch_skew(max_batch_skew))
    }

    /// Sets the minimum cluster size.
    ///
    /// # Panics
    ///
    /// Panics if `min_size` is zero.
    #[must_use]
    pub fn with_min_cluster_size(mut self, min_size: usize) -> Self {
        self.builder = ClusterBuilder::new(min_size);
        self
    }

    /// Sets the payout every leg should cover.
    #[must_use]
    pub fn with_target_payout(mut self, target: Decimal) -> Self {
        self.target_payout = target;
        self
    }

    #[must_use]
    pub fn with_masker(mut self, masker: StakeMasker) -> Self {
        self.masker = masker;
        self
    }

    /// Evaluates clusters on the rayon pool.
    #[must_use]
    pub fn with_parallel_evaluation(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    #[must_use]
    pub fn with_max_batch_skew(mut self, skew: Duration) -> Self {
        self.max_batch_skew = skew;
        self
    }

    #[must_use]
    pub fn matcher(&self) -> &dyn EntityMatcher {
        self.matcher.as_ref()
    }

    #[must_use]
    pub fn target_payout(&self) -> Decimal {
        self.target_payout
    }

    /// Runs one correlation pass over `batches`.
    ///
    /// Discarded clusters are a normal result, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CorrelationError::NonPositiveTarget`] if the configured
    /// target payout is not positive.
    pub fn run(&self, batches: &Batches) -> Result<CorrelationReport> {
        if self.target_payout <= Decimal::ZERO {
            return Err(CorrelationError::NonPositiveTarget(self.target_payout));
        }
        debug!(
            matcher = self.matcher.name(),
            target = %self.target_payout,
            multiple = %self.masker.rounding_multiple(),
            round_up = self.masker.round_up(),
            "Starting correlation run"
        );

        let mut stats = RunStats {
            batches: batches.len(),
            records: batches.values().map(|b| b.count()).sum(),
            ..RunStats::default()
        };
        if let Some(widest) = widest_scrape_gap(batches) {
            let skew = widest.to_skew();
            debug!(gap_ms = skew.gap_ms, earlier = %skew.earlier, later = %skew.later, "Batch skew");
            if widest.gap > self.max_batch_skew {
                stats.skew_exceeded = true;
                warn!(
                    gap_ms = skew.gap_ms,
                    max_ms = self.max_batch_skew.num_milliseconds(),
                    earlier = %skew.earlier,
                    later = %skew.later,
                    "Scrape batches are further apart than tolerated"
                );
            }
            stats.batch_skew = Some(skew);
        }

        let build = self.builder.build(batches, self.matcher.as_ref());
        stats.clustering = build.stats;

        let evaluations: Vec<Evaluation> = if self.parallel {
            build
                .clusters
                .into_par_iter()
                .map(|cluster| self.evaluate(cluster))
                .collect::<Result<_>>()?
        } else {
            build
                .clusters
                .into_iter()
                .map(|cluster| self.evaluate(cluster))
                .collect::<Result<_>>()?
        };

        let mut report = CorrelationReport::default();
        for evaluation in evaluations {
            match evaluation {
                Evaluation::Accepted(plan) => report.accepted.push(plan),
                Evaluation::Discarded(discarded) => report.discarded.push(discarded),
            }
        }

        let min_size = self.builder.min_size();
        report
            .discarded
            .extend(build.undersized.into_iter().map(|cluster| DiscardedCluster {
                reason: DiscardReason::Undersized {
                    size: cluster.len(),
                    min_size,
                },
                cluster,
            }));

        stats.accepted = report.accepted.len();
        stats.discarded = report.discarded.len();
        info!(
            batches = stats.batches,
            records = stats.records,
            clusters = stats.clustering.clusters,
            accepted = stats.accepted,
            discarded = stats.discarded,
            "Correlation run complete"
        );

        report.stats = stats;
        Ok(report)
    }

    /// Runs one pass and hands every accepted plan to `sink`, in order.
    ///
    /// # Errors
    ///
    /// Returns the first run or sink error. Plans already emitted stay emitted.
    pub fn run_and_emit(&self, batches: &Batches, sink: &dyn PlanSink) -> Result<CorrelationReport> {
        let report = self.run(batches)?;
        for accepted in &report.accepted {
            sink.accept(accepted)?;
        }
        Ok(report)
    }

    fn evaluate(&self, cluster: Cluster) -> Result<Evaluation> {
        let best = self.aggregator.best_odds(&cluster);
        if !best.is_complete() {
            return Ok(discard(
                cluster,
                DiscardReason::IncompleteOdds {
                    missing: best.missing_outcomes(),
                },
            ));
        }

        let opportunity = self.detector.detect(&best);
        if !opportunity.exists {
            return Ok(discard(
                cluster,
                DiscardReason::NoArbitrage {
                    implied_probability: opportunity.implied_probability,
                },
            ));
        }

        let raw = self.calculator.perfect_stake(&best, self.target_payout)?;
        let plan = self.masker.mask(raw);
        let profit = plan.profit();
        if profit <= Decimal::ZERO {
            return Ok(discard(
                cluster,
                DiscardReason::Unprofitable {
                    profit,
                    total_stake: plan.total_stake(),
                },
            ));
        }

        info!(
            fixture = %cluster.fixture(),
            sources = cluster.len(),
            edge_pct = %opportunity.edge_pct().round_dp(2),
            total_stake = %plan.total_stake(),
            profit = %profit,
            "Arbitrage accepted"
        );

        Ok(Evaluation::Accepted(AcceptedPlan {
            cluster,
            opportunity: opportunity.with_profit(profit),
            plan,
        }))
    }
}

fn discard(cluster: Cluster, reason: DiscardReason) -> Evaluation {
    debug!(fixture = %cluster.fixture(), %reason, "Cluster discarded");
    Evaluation::Discarded(DiscardedCluster { cluster, reason })
}

/// Largest gap between consecutive scrape ends, over non-empty batches.
///
/// `None` when fewer than two batches carry records.
#[must_use]
pub fn batch_skew(batches: &Batches) -> Option<BatchSkew> {
    widest_scrape_gap(batches).map(|widest| widest.to_skew())
}

fn widest_scrape_gap(batches: &Batches) -> Option<ScrapeGap<'_>> {
    let mut ends: Vec<_> = batches
        .values()
        .filter_map(|batch| batch.scrape_end().map(|end| (end, &batch.source)))
        .collect();
    ends.sort_by_key(|(end, _)| *end);

    ends.windows(2)
        .map(|pair| ScrapeGap {
            gap: pair[1].0 - pair[0].0,
            earlier: pair[0].1,
            later: pair[1].1,
        })
        .fold(None, |widest: Option<ScrapeGap<'_>>, gap| match widest {
            Some(current) if current.gap >= gap.gap => Some(current),
            _ => Some(gap),
        })
}
