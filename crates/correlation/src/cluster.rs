//! Batch-level correlation: grouping per-source records into clusters.
//!
//! Clusters are built with a greedy, anchor-based pass:
//!
//! 1. The source with the most records becomes the anchor (ties go to the
//!    source inserted first).
//! 2. Every anchor record seeds a cluster.
//! 3. The remaining sources are scanned in insertion order. Within a source,
//!    the first unconsumed record that matches the anchor record joins the
//!    cluster and is consumed, so no later anchor record can claim it.
//! 4. Clusters smaller than the minimum size are set aside.
//!
//! First match wins. If two records of one source both match an anchor
//! record, the one earlier in the batch is taken without scoring the
//! alternatives.

use serde::{Deserialize, Serialize};
use surebet_core::{Batch, Batches, SourceId, SourceRecord};
use tracing::{debug, info, trace};

use crate::matcher::EntityMatcher;

/// Default minimum number of sources in a usable cluster (one per outcome).
pub const DEFAULT_MIN_CLUSTER_SIZE: usize = 3;

// =============================================================================
// Cluster
// =============================================================================

/// Records from distinct sources believed to describe the same event.
///
/// The first record is the anchor the others were matched against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    records: Vec<SourceRecord>,
}

impl Cluster {
    /// Starts a cluster from its anchor record.
    #[must_use]
    pub fn new(anchor: SourceRecord) -> Self {
        Self {
            records: vec![anchor],
        }
    }

    /// Adds a record from a source not yet in the cluster.
    ///
    /// # Panics
    ///
    /// Panics if the cluster already holds a record from the same source.
    pub fn push(&mut self, record: SourceRecord) {
        assert!(
            !self.contains_source(&record.source),
            "cluster for {} already holds a record from {}",
            self.fixture(),
            record.source
        );
        self.records.push(record);
    }

    #[must_use]
    pub fn anchor(&self) -> &SourceRecord {
        &self.records[0]
    }

    /// Member records, anchor first, then in source scan order.
    #[must_use]
    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn contains_source(&self, source: &SourceId) -> bool {
        self.records.iter().any(|r| &r.source == source)
    }

    pub fn sources(&self) -> impl Iterator<Item = &SourceId> {
        self.records.iter().map(|r| &r.source)
    }

    /// Fixture label of the anchor record.
    #[must_use]
    pub fn fixture(&self) -> String {
        self.anchor().fixture()
    }
}

// =============================================================================
// Build Result
// =============================================================================

/// Counters describing one clustering pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterStats {
    /// Source chosen as anchor, if any batches were supplied.
    pub anchor_source: Option<SourceId>,
    /// Records in the anchor batch.
    pub anchor_records: usize,
    /// Records across all non-anchor batches.
    pub candidate_records: usize,
    /// Non-anchor records consumed into some cluster.
    pub matched_records: usize,
    /// Clusters meeting the minimum size.
    pub clusters: usize,
    /// Clusters set aside as too small.
    pub undersized: usize,
}

impl ClusterStats {
    /// Share of candidate records that were matched, in percent.
    #[must_use]
    pub fn match_rate_pct(&self) -> f64 {
        if self.candidate_records == 0 {
            return 0.0;
        }
        self.matched_records as f64 / self.candidate_records as f64 * 100.0
    }
}

/// Outcome of a clustering pass.
#[derive(Debug, Clone, Default)]
pub struct ClusterBuild {
    /// Clusters with at least the minimum number of records.
    pub clusters: Vec<Cluster>,
    /// Clusters below the minimum size, in anchor order.
    pub undersized: Vec<Cluster>,
    pub stats: ClusterStats,
}

// =============================================================================
// Source Pool
// =============================================================================

/// Unconsumed records of one source, tracked by index over the batch slice.
struct SourcePool<'a> {
    source: &'a SourceId,
    records: &'a [SourceRecord],
    consumed: Vec<bool>,
}

impl<'a> SourcePool<'a> {
    fn new(batch: &'a Batch) -> Self {
        Self {
            source: &batch.source,
            records: &batch.records,
            consumed: vec![false; batch.records.len()],
        }
    }

    /// Consumes and returns the first unconsumed record matching `anchor`.
    fn take_first_match(
        &mut self,
        anchor: &SourceRecord,
        matcher: &dyn EntityMatcher,
    ) -> Option<&'a SourceRecord> {
        let records = self.records;
        let index = records
            .iter()
            .enumerate()
            .find(|(i, candidate)| !self.consumed[*i] && matcher.matches(anchor, candidate))
            .map(|(i, _)| i)?;

        self.consumed[index] = true;
        Some(&records[index])
    }
}

// =============================================================================
// Cluster Builder
// =============================================================================

/// Groups per-source batches into clusters of matched records.
#[derive(Debug, Clone, Copy)]
pub struct ClusterBuilder {
    min_size: usize,
}

impl ClusterBuilder {
    /// Creates a builder keeping clusters of at least `min_size` records.
    ///
    /// # Panics
    ///
    /// Panics if `min_size` is zero.
    #[must_use]
    pub fn new(min_size: usize) -> Self {
        assert!(min_size > 0, "minimum cluster size must be positive");
        Self { min_size }
    }

    #[must_use]
    pub fn min_size(&self) -> usize {
        self.min_size
    }

    /// Builds clusters and returns only the usable ones.
    #[must_use]
    pub fn build_clusters(&self, batches: &Batches, matcher: &dyn EntityMatcher) -> Vec<Cluster> {
        self.build(batches, matcher).clusters
    }

    /// Builds clusters, keeping undersized ones and pass statistics.
    #[must_use]
    pub fn build(&self, batches: &Batches, matcher: &dyn EntityMatcher) -> ClusterBuild {
        let Some(anchor) = select_anchor(batches) else {
            debug!("No batches supplied, nothing to cluster");
            return ClusterBuild::default();
        };

        let mut pools: Vec<SourcePool<'_>> = batches
            .values()
            .filter(|batch| batch.source != anchor.source)
            .map(SourcePool::new)
            .collect();

        let mut build = ClusterBuild {
            stats: ClusterStats {
                anchor_source: Some(anchor.source.clone()),
                anchor_records: anchor.count(),
                candidate_records: pools.iter().map(|p| p.records.len()).sum(),
                ..ClusterStats::default()
            },
            ..ClusterBuild::default()
        };

        for anchor_record in &anchor.records {
            let mut cluster = Cluster::new(anchor_record.clone());

            for pool in &mut pools {
                if let Some(matched) = pool.take_first_match(anchor_record, matcher) {
                    trace!(
                        anchor = %anchor_record.fixture(),
                        source = %pool.source,
                        matched = %matched.fixture(),
                        "Record matched"
                    );
                    cluster.push(matched.clone());
                }
            }

            build.stats.matched_records += cluster.len() - 1;
            if cluster.len() >= self.min_size {
                build.clusters.push(cluster);
            } else {
                debug!(
                    fixture = %cluster.fixture(),
                    size = cluster.len(),
                    min_size = self.min_size,
                    "Cluster below minimum size"
                );
                build.undersized.push(cluster);
            }
        }

        build.stats.clusters = build.clusters.len();
        build.stats.undersized = build.undersized.len();

        info!(
            matcher = matcher.name(),
            anchor = %anchor.source,
            anchor_records = build.stats.anchor_records,
            matched = build.stats.matched_records,
            candidates = build.stats.candidate_records,
            match_rate_pct = %format!("{:.2}", build.stats.match_rate_pct()),
            clusters = build.stats.clusters,
            undersized = build.stats.undersized,
            "Clustering complete"
        );

        build
    }
}

impl Default for ClusterBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CLUSTER_SIZE)
    }
}

/// Largest batch by record count; the first one wins a tie.
fn select_anchor(batches: &Batches) -> Option<&Batch> {
    batches.values().fold(None, |best, batch| match best {
        Some(current) if current.count() >= batch.count() => Some(current),
        _ => Some(batch),
    })
}
