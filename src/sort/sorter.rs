//! Rank Sorter stage.
//!
//! Consumes the final iteration's records (structure discarded, id + rank
//! kept) and produces one globally ordered sequence: rank descending, id
//! ascending on ties.
//!
//! With a single output partition this is a plain funnel sort. With more,
//! entries are routed by [`partition_for`] — a monotone split of the sort-key
//! space — and each partition is sorted independently (in parallel); because
//! partition ranges never interleave, concatenating them preserves the
//! global order. That is what lets a partitioned substrate write partition
//! files independently and still end up with one ordered result.

use rayon::prelude::*;

use crate::pipeline::artifacts::RankedOutput;
use crate::pipeline::errors::PipelineError;
use crate::pipeline::traits::RankSorter;
use crate::sort::key::{partition_for, SortKey};
use crate::types::{AdjacencyRecord, RankedEntry};

/// Default [`RankSorter`]: sort-key funnel with range partitioning.
#[derive(Debug, Clone)]
pub struct KeyOrderSorter {
    partitions: usize,
}

impl Default for KeyOrderSorter {
    fn default() -> Self {
        Self { partitions: 1 }
    }
}

impl KeyOrderSorter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of output partitions (1 = single funnel).
    pub fn with_partitions(mut self, partitions: usize) -> Self {
        self.partitions = partitions.max(1);
        self
    }
}

impl RankSorter for KeyOrderSorter {
    fn sort(&self, state: &[AdjacencyRecord]) -> Result<RankedOutput, PipelineError> {
        // Keep id + rank only; the graph structure has served its purpose.
        let mut buckets: Vec<Vec<(SortKey, RankedEntry)>> = vec![Vec::new(); self.partitions];
        for record in state {
            let key = SortKey::new(record.rank, record.id.clone());
            let bucket = partition_for(key.rank_key, self.partitions);
            buckets[bucket].push((key, RankedEntry::new(record.id.clone(), record.rank)));
        }

        // Each partition sorts independently; ranges never interleave.
        let partitions: Vec<Vec<RankedEntry>> = buckets
            .into_par_iter()
            .map(|mut bucket| {
                bucket.sort_unstable_by(|a, b| a.0.cmp(&b.0));
                bucket.into_iter().map(|(_, entry)| entry).collect()
            })
            .collect();

        Ok(RankedOutput { partitions })
    }
}
