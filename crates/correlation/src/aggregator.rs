//! Best-odds aggregation across the records of a cluster.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use surebet_core::{Outcome, Quote, SourceId};

use crate::cluster::Cluster;

/// The best quote found for one outcome and the source offering it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestQuote {
    pub source: SourceId,
    pub quote: Quote,
}

/// Best available quote per outcome, with an explicit gap for outcomes no
/// source in the cluster prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestOddsMap {
    entries: BTreeMap<Outcome, Option<BestQuote>>,
}

impl BestOddsMap {
    /// A map with every outcome missing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: Outcome::ALL.into_iter().map(|o| (o, None)).collect(),
        }
    }

    /// Records `best` for `outcome`, replacing any earlier entry.
    #[must_use]
    pub fn with(mut self, outcome: Outcome, best: BestQuote) -> Self {
        self.entries.insert(outcome, Some(best));
        self
    }

    #[must_use]
    pub fn get(&self, outcome: Outcome) -> Option<&BestQuote> {
        self.entries.get(&outcome).and_then(Option::as_ref)
    }

    /// True if every outcome has a best quote.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_outcomes().is_empty()
    }

    /// Outcomes without any quote, in [`Outcome::ALL`] order.
    #[must_use]
    pub fn missing_outcomes(&self) -> Vec<Outcome> {
        Outcome::ALL
            .into_iter()
            .filter(|o| self.get(*o).is_none())
            .collect()
    }

    /// Outcomes that have a best quote, in [`Outcome::ALL`] order.
    pub fn covered(&self) -> impl Iterator<Item = (Outcome, &BestQuote)> {
        Outcome::ALL
            .into_iter()
            .filter_map(|o| self.get(o).map(|best| (o, best)))
    }
}

impl Default for BestOddsMap {
    fn default() -> Self {
        Self::empty()
    }
}

/// Selects the highest quote per outcome across a cluster.
#[derive(Debug, Clone, Copy, Default)]
pub struct OddsAggregator;

impl OddsAggregator {
    /// Best quote per outcome.
    ///
    /// Records are visited in cluster order (anchor first), and a later
    /// record only replaces the current best with a strictly higher value, so
    /// ties go to the record seen first.
    #[must_use]
    pub fn best_odds(&self, cluster: &Cluster) -> BestOddsMap {
        let mut best = BestOddsMap::empty();

        for outcome in Outcome::ALL {
            let winner = cluster
                .records()
                .iter()
                .filter_map(|record| record.quote(outcome).map(|quote| (record, quote)))
                .fold(None::<BestQuote>, |current, (record, quote)| match current {
                    Some(current) if current.quote.value >= quote.value => Some(current),
                    _ => Some(BestQuote {
                        source: record.source.clone(),
                        quote: *quote,
                    }),
                });

            if let Some(winner) = winner {
                best = best.with(outcome, winner);
            }
        }

        best
    }
}
