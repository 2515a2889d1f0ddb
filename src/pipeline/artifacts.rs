//! First-class pipeline artifacts.
//!
//! Each type is a typed intermediate result flowing between pipeline stages.
//! Every stage exclusively owns the artifact it emits and fully replaces its
//! input; no stage mutates another stage's output in place.

use crate::types::{AdjacencyRecord, RankedEntry};

/// Output of the parse stage: the canonical adjacency state plus the
/// pipeline-wide node count discovered while building it.
#[derive(Debug, Clone)]
pub struct ParsedGraph {
    /// One record per distinct node, id-sorted, each with rank `1/N`.
    pub records: Vec<AdjacencyRecord>,
    /// Total distinct node count (N). Required configuration for every
    /// later stage.
    pub page_count: usize,
    /// Total edge count, counting duplicates.
    pub edge_count: usize,
    /// Raw records skipped as malformed.
    pub malformed: usize,
}

impl ParsedGraph {
    /// Sum of ranks across all records (≈ 1 after parsing).
    pub fn total_rank(&self) -> f64 {
        self.records.iter().map(|r| r.rank).sum()
    }

    /// Number of nodes with no outgoing edges.
    pub fn dangling_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_dangling()).count()
    }
}

/// Per-iteration diagnostics from the propagator.
#[derive(Debug, Clone, Copy)]
pub struct IterationReport {
    /// Sum of rank over all dangling nodes at the start of the iteration.
    pub dangling_mass: f64,
    /// Sum of rank over all nodes after the iteration (≈ 1).
    pub total_mass: f64,
}

impl IterationReport {
    /// Absolute deviation of the total mass from 1.
    pub fn mass_drift(&self) -> f64 {
        (self.total_mass - 1.0).abs()
    }

    /// Whether total mass is conserved within `tolerance * n`.
    pub fn mass_conserved(&self, n: usize, tolerance: f64) -> bool {
        self.mass_drift() <= tolerance * n as f64
    }
}

/// Output of the sort stage: rank-descending entries, split across output
/// partitions whose key ranges never interleave. Concatenating the
/// partitions in order yields the global order.
#[derive(Debug, Clone)]
pub struct RankedOutput {
    pub partitions: Vec<Vec<RankedEntry>>,
}

impl RankedOutput {
    /// Iterate over all entries in global rank-descending order.
    pub fn iter(&self) -> impl Iterator<Item = &RankedEntry> {
        self.partitions.iter().flatten()
    }

    /// Total number of entries across all partitions.
    pub fn len(&self) -> usize {
        self.partitions.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.iter().all(Vec::is_empty)
    }

    /// Flatten into a single globally-ordered vector.
    pub fn into_vec(self) -> Vec<RankedEntry> {
        self.partitions.into_iter().flatten().collect()
    }
}
