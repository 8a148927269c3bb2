//! Pairwise entity matching across sources.
//!
//! A matcher decides whether two single-source records describe the same
//! real-world match. Matchers only see already-standardized team names;
//! standardization happens before records reach the engine.

use surebet_core::{MatcherConfig, MatcherStrategy, SimilarityMetric, SourceRecord};
use tracing::trace;

use crate::similarity::similarity;

// =============================================================================
// Matcher Trait
// =============================================================================

/// Decides whether two records refer to the same event.
///
/// Implementations must be pure and symmetric:
/// `matches(a, b) == matches(b, a)` for every pair of records.
pub trait EntityMatcher: Send + Sync + std::fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns true if `a` and `b` describe the same event.
    fn matches(&self, a: &SourceRecord, b: &SourceRecord) -> bool;
}

/// Builds the matcher selected by configuration.
#[must_use]
pub fn matcher_from_config(config: &MatcherConfig) -> Box<dyn EntityMatcher> {
    match config.strategy {
        MatcherStrategy::Exact => Box::new(ExactMatcher),
        MatcherStrategy::Fuzzy => Box::new(FuzzyMatcher::new(config.threshold, config.metric)),
    }
}

// =============================================================================
// Exact Strategy
// =============================================================================

/// Matches on identical kick-off time and case-insensitively equal names.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatcher;

impl EntityMatcher for ExactMatcher {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn matches(&self, a: &SourceRecord, b: &SourceRecord) -> bool {
        a.event_time == b.event_time
            && eq_ignore_case(&a.team_a_standardized, &b.team_a_standardized)
            && eq_ignore_case(&a.team_b_standardized, &b.team_b_standardized)
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

// =============================================================================
// Fuzzy Strategy
// =============================================================================

/// Matches when both team names are similar enough.
///
/// Kick-off time is ignored: sources report it with different precision.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatcher {
    threshold: f64,
    metric: SimilarityMetric,
}

impl FuzzyMatcher {
    pub const DEFAULT_THRESHOLD: f64 = 0.8;

    /// Creates a fuzzy matcher.
    ///
    /// # Panics
    ///
    /// Panics if `threshold` is outside `[0, 1]`.
    #[must_use]
    pub fn new(threshold: f64, metric: SimilarityMetric) -> Self {
        assert!(
            (0.0..=1.0).contains(&threshold),
            "similarity threshold must be within [0, 1], got {threshold}"
        );
        Self { threshold, metric }
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[must_use]
    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD, SimilarityMetric::default())
    }
}

impl EntityMatcher for FuzzyMatcher {
    fn name(&self) -> &'static str {
        "fuzzy"
    }

    fn matches(&self, a: &SourceRecord, b: &SourceRecord) -> bool {
        let team_a = similarity(self.metric, &a.team_a_standardized, &b.team_a_standardized);
        if team_a < self.threshold {
            return false;
        }

        let team_b = similarity(self.metric, &a.team_b_standardized, &b.team_b_standardized);
        trace!(
            left = %a.fixture(),
            right = %b.fixture(),
            team_a,
            team_b,
            threshold = self.threshold,
            "Fuzzy comparison"
        );
        team_b >= self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn kickoff() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 19, 0, 0).unwrap()
    }

    fn record(source: &str, team_a: &str, team_b: &str, at: DateTime<Utc>) -> SourceRecord {
        SourceRecord::new(source, at, team_a, team_b)
    }

    // ==================== Exact Strategy Tests ====================

    #[test]
    fn test_exact_matches_case_insensitively() {
        let a = record("BETCLIC", "Real", "City", kickoff());
        let b = record("LVBET", "REAL", "city", kickoff());

        assert!(ExactMatcher.matches(&a, &b));
    }

    #[test]
    fn test_exact_requires_same_kickoff() {
        let a = record("BETCLIC", "Real", "City", kickoff());
        let b = record("LVBET", "Real", "City", kickoff() + Duration::minutes(1));

        assert!(!ExactMatcher.matches(&a, &b));
    }

    #[test]
    fn test_exact_compares_standardized_names() {
        let a = record("BETCLIC", "FC Barcelona", "Sevilla", kickoff())
            .with_standardized_names("Barcelona", "Sevilla");
        let b = record("LVBET", "Barcelona", "Sevilla", kickoff());

        assert!(ExactMatcher.matches(&a, &b));
    }

    // ==================== Fuzzy Strategy Tests ====================

    #[test]
    fn test_fuzzy_ignores_kickoff() {
        let a = record("BETCLIC", "Real", "City", kickoff());
        let b = record("LVBET", "Real", "City", kickoff() + Duration::hours(2));

        assert!(FuzzyMatcher::default().matches(&a, &b));
    }

    #[test]
    fn test_fuzzy_rejects_when_either_side_differs() {
        let a = record("BETCLIC", "Arsenal", "Chelsea", kickoff());
        let b = record("LVBET", "Arsenal", "Everton", kickoff());

        assert!(!FuzzyMatcher::default().matches(&a, &b));
    }

    #[test]
    fn test_fuzzy_threshold_boundary() {
        let a = record("BETCLIC", "FC Barcelona", "Sevilla", kickoff());
        let b = record("LVBET", "Barcelona", "Sevilla", kickoff());

        // Indel ratio is 18/21 ~= 0.857
        assert!(FuzzyMatcher::new(0.85, SimilarityMetric::Indel).matches(&a, &b));
        assert!(!FuzzyMatcher::new(0.86, SimilarityMetric::Indel).matches(&a, &b));
    }

    #[test]
    #[should_panic(expected = "similarity threshold")]
    fn test_fuzzy_rejects_out_of_range_threshold() {
        let _ = FuzzyMatcher::new(1.2, SimilarityMetric::Indel);
    }

    #[test]
    fn test_matcher_from_config() {
        let exact = matcher_from_config(&MatcherConfig {
            strategy: MatcherStrategy::Exact,
            ..MatcherConfig::default()
        });
        assert_eq!(exact.name(), "exact");

        let fuzzy = matcher_from_config(&MatcherConfig::default());
        assert_eq!(fuzzy.name(), "fuzzy");
    }

    // ==================== Symmetry Tests ====================

    #[test]
    fn test_all_strategies_are_symmetric() {
        let records = vec![
            record("A", "Real", "City", kickoff()),
            record("B", "real madrid", "Man City", kickoff()),
            record("C", "FC Barcelona", "Barcelona", kickoff() + Duration::minutes(5)),
            record("D", "Barcelona", "FC Barcelona", kickoff()),
            record("E", "Inter", "Milan", kickoff()),
            record("F", "Internazionale", "AC Milan", kickoff()),
            record("G", "", "", kickoff()),
        ];

        let mut matchers: Vec<Box<dyn EntityMatcher>> = vec![Box::new(ExactMatcher)];
        for metric in SimilarityMetric::ALL {
            for threshold in [0.5, 0.8, 0.95] {
                matchers.push(Box::new(FuzzyMatcher::new(threshold, metric)));
            }
        }

        for matcher in &matchers {
            for a in &records {
                for b in &records {
                    assert_eq!(
                        matcher.matches(a, b),
                        matcher.matches(b, a),
                        "{} not symmetric for {} / {}",
                        matcher.name(),
                        a.fixture(),
                        b.fixture()
                    );
                }
            }
        }
    }
}
