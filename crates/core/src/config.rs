use anyhow::{ensure, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub matcher: MatcherConfig,
}

/// Correlation and staking parameters for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum number of sources in a cluster before it is evaluated.
    pub min_cluster_size: usize,
    /// Payout every leg should return if its outcome wins.
    pub target_payout: Decimal,
    /// Stakes are masked to multiples of this amount.
    pub rounding_multiple: u32,
    /// Mask stakes upwards (otherwise one multiple below the ceiling).
    pub round_up: bool,
    /// Evaluate clusters on the rayon thread pool.
    pub parallel_evaluation: bool,
    /// Largest tolerated gap between batch scrape ends before warning.
    pub max_batch_skew_secs: i64,
    /// Upper bound on a whole run, enforced by the caller.
    pub run_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: 3,
            target_payout: Decimal::from(1000),
            rounding_multiple: 50,
            round_up: true,
            parallel_evaluation: false,
            max_batch_skew_secs: 60,
            run_timeout_secs: 30,
        }
    }
}

/// Which pairwise matching strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherStrategy {
    /// Same kick-off time and case-insensitively equal team names.
    Exact,
    /// Team-name similarity at or above a threshold; kick-off ignored.
    #[default]
    Fuzzy,
}

/// String similarity used by the fuzzy strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// `2 * LCS / (len_a + len_b)`, insert/delete edit distance.
    #[default]
    Indel,
    /// Normalized Levenshtein distance.
    Levenshtein,
    /// Jaro-Winkler similarity.
    JaroWinkler,
    /// Sorensen-Dice coefficient over character bigrams.
    SorensenDice,
}

impl SimilarityMetric {
    pub const ALL: [SimilarityMetric; 4] = [
        SimilarityMetric::Indel,
        SimilarityMetric::Levenshtein,
        SimilarityMetric::JaroWinkler,
        SimilarityMetric::SorensenDice,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Indel => "indel",
            Self::Levenshtein => "levenshtein",
            Self::JaroWinkler => "jaro_winkler",
            Self::SorensenDice => "sorensen_dice",
        }
    }
}

impl std::fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    pub strategy: MatcherStrategy,
    /// Minimum similarity per team name for the fuzzy strategy.
    pub threshold: f64,
    pub metric: SimilarityMetric,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            strategy: MatcherStrategy::Fuzzy,
            threshold: 0.8,
            metric: SimilarityMetric::Indel,
        }
    }
}

impl AppConfig {
    /// Checks value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending setting.
    pub fn validate(&self) -> Result<()> {
        let engine = &self.engine;
        ensure!(
            engine.min_cluster_size >= 2,
            "engine.min_cluster_size must be at least 2, got {}",
            engine.min_cluster_size
        );
        ensure!(
            engine.target_payout > Decimal::ZERO,
            "engine.target_payout must be positive, got {}",
            engine.target_payout
        );
        ensure!(
            engine.rounding_multiple > 0,
            "engine.rounding_multiple must be positive"
        );
        ensure!(
            engine.max_batch_skew_secs >= 0,
            "engine.max_batch_skew_secs must not be negative, got {}",
            engine.max_batch_skew_secs
        );
        ensure!(
            engine.run_timeout_secs > 0,
            "engine.run_timeout_secs must be positive"
        );
        ensure!(
            (0.0..=1.0).contains(&self.matcher.threshold),
            "matcher.threshold must be within [0, 1], got {}",
            self.matcher.threshold
        );
        Ok(())
    }
}
