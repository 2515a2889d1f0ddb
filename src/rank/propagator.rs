//! Rank Propagator stage — one PageRank transition per call.
//!
//! Each iteration is a full map/combine/reduce pass over the complete
//! adjacency state:
//!
//! - **map**: every record re-emits its structure (keyed by its own id) so
//!   the graph survives the iteration; a non-dangling record additionally
//!   emits one rank contribution of `rank / out_degree` per outgoing edge,
//!   keyed by the target; a dangling record's full rank goes into the
//!   shard's dangling-mass accumulator instead of the keyed shuffle.
//! - **combine**: same-key contributions are pre-aggregated inside each
//!   shard before crossing the shuffle boundary. Addition is associative
//!   and commutative, so this never changes a final sum; it can be disabled
//!   to exercise the uncombined path.
//! - **reduce**: messages grouped by id — exactly one structure plus any
//!   number of contributions — produce the node's next record:
//!
//!   `new_rank = (1 - alpha)/N + alpha * (contrib_sum + dangling_mass/N)`
//!
//! The dangling-mass aggregate is completed at the shard barrier before any
//! reduce runs, which is why an iteration may never start from a partial
//! state. Total mass stays ≈ 1 across iterations: the mass lost to dangling
//! nodes is redistributed uniformly, and the teleport term summed over N
//! nodes contributes exactly `1 - alpha`. Drift beyond tolerance indicates
//! a bug and is logged, not raised.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::pipeline::artifacts::IterationReport;
use crate::pipeline::errors::{PipelineError, StageName};
use crate::pipeline::traits::RankPropagator;
use crate::rank::IterationContext;
use crate::types::AdjacencyRecord;

/// Relative tolerance for the mass-conservation diagnostic (scaled by N).
pub const MASS_TOLERANCE: f64 = 1e-6;

/// A value routed through the keyed shuffle, addressed by node id.
///
/// Structure messages carry the target list forward unchanged; contribution
/// messages carry rank shares to be summed. Dangling rank travels outside
/// the shuffle as a per-shard scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum RankMessage {
    Structure(Vec<String>),
    Contribution(f64),
}

/// One shard's map-phase output.
#[derive(Debug, Default)]
struct ShardOutput {
    messages: Vec<(String, RankMessage)>,
    dangling_mass: f64,
}

/// Default [`RankPropagator`]: parallel shards, optional combiner.
#[derive(Debug, Clone)]
pub struct MapReducePropagator {
    shards: usize,
    combine: bool,
}

impl Default for MapReducePropagator {
    fn default() -> Self {
        Self {
            shards: 1,
            combine: true,
        }
    }
}

impl MapReducePropagator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of parallel map shards (1 = sequential).
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards.max(1);
        self
    }

    /// Disable shard-local pre-aggregation. Correctness-equivalent; the
    /// combiner only reduces shuffle volume.
    pub fn without_combiner(mut self) -> Self {
        self.combine = false;
        self
    }

    /// Map one record into keyed messages, or dangling mass.
    fn map_record(record: &AdjacencyRecord, out: &mut ShardOutput) {
        out.messages.push((
            record.id.clone(),
            RankMessage::Structure(record.targets.clone()),
        ));
        if record.is_dangling() {
            out.dangling_mass += record.rank;
        } else {
            let share = record.rank / record.out_degree() as f64;
            for target in &record.targets {
                out.messages
                    .push((target.clone(), RankMessage::Contribution(share)));
            }
        }
    }

    /// Map a whole shard, optionally combining same-key contributions
    /// before they cross the shuffle boundary.
    fn map_shard(&self, records: &[AdjacencyRecord]) -> ShardOutput {
        let mut out = ShardOutput::default();
        for record in records {
            Self::map_record(record, &mut out);
        }
        if self.combine {
            out.messages = Self::combine_shard(out.messages);
        }
        out
    }

    /// Shard-local pre-aggregation: sum contributions per key, pass
    /// structure messages through untouched.
    fn combine_shard(messages: Vec<(String, RankMessage)>) -> Vec<(String, RankMessage)> {
        let mut sums: FxHashMap<String, f64> = FxHashMap::default();
        let mut combined = Vec::new();
        for (key, message) in messages {
            match message {
                RankMessage::Contribution(share) => *sums.entry(key).or_insert(0.0) += share,
                structure => combined.push((key, structure)),
            }
        }
        combined.extend(
            sums.into_iter()
                .map(|(key, sum)| (key, RankMessage::Contribution(sum))),
        );
        combined
    }
}

impl RankPropagator for MapReducePropagator {
    fn propagate(
        &self,
        state: &[AdjacencyRecord],
        ctx: &IterationContext,
    ) -> Result<(Vec<AdjacencyRecord>, IterationReport), PipelineError> {
        let n = ctx.page_count();
        if state.len() != n {
            return Err(PipelineError::stage(
                StageName::Rank,
                format!("iteration input has {} records, expected {n}", state.len()),
            ));
        }

        // Map phase over disjoint shards.
        let chunk = ((state.len() + self.shards - 1) / self.shards).max(1);
        let shards: Vec<ShardOutput> = state
            .par_chunks(chunk)
            .map(|shard| self.map_shard(shard))
            .collect();

        // Barrier: the dangling aggregate must be complete before any
        // reduce group is finalized.
        let dangling_mass: f64 = shards.iter().map(|s| s.dangling_mass).sum();

        // Shuffle: group messages by node id.
        let mut groups: FxHashMap<String, (Option<Vec<String>>, f64)> = FxHashMap::default();
        for shard in shards {
            for (key, message) in shard.messages {
                let entry = groups.entry(key).or_insert((None, 0.0));
                match message {
                    RankMessage::Structure(targets) => {
                        if entry.0.replace(targets).is_some() {
                            return Err(PipelineError::stage(
                                StageName::Rank,
                                "duplicate structure record in shuffle group",
                            ));
                        }
                    }
                    RankMessage::Contribution(share) => entry.1 += share,
                }
            }
        }

        // Reduce: finalize each node's rank. Keys are emitted in id order,
        // the shuffle's key order in the reference implementation.
        let alpha = ctx.alpha();
        let teleport = ctx.teleport();
        let redistributed = dangling_mass / n as f64;

        let mut keyed: Vec<(String, (Option<Vec<String>>, f64))> = groups.into_iter().collect();
        keyed.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let next: Vec<AdjacencyRecord> = keyed
            .into_par_iter()
            .map(|(id, (structure, contrib_sum))| {
                let targets = structure.ok_or_else(|| {
                    PipelineError::stage(
                        StageName::Rank,
                        format!("node \"{id}\" received contributions but no structure record"),
                    )
                })?;
                let rank = teleport + alpha * (contrib_sum + redistributed);
                Ok(AdjacencyRecord::new(id, rank, targets))
            })
            .collect::<Result<_, PipelineError>>()?;

        if next.len() != n {
            return Err(PipelineError::stage(
                StageName::Rank,
                format!("iteration produced {} records, expected {n}", next.len()),
            ));
        }

        let total_mass: f64 = next.iter().map(|r| r.rank).sum();
        let report = IterationReport {
            dangling_mass,
            total_mass,
        };
        if !report.mass_conserved(n, MASS_TOLERANCE) {
            warn!(
                total_mass,
                drift = report.mass_drift(),
                "rank mass drifted outside tolerance"
            );
        }
        debug!(dangling_mass, total_mass, "iteration complete");

        Ok((next, report))
    }
}
