//! Graph Parser stage.
//!
//! Consumes raw link records — one edge or adjacency group per line — and
//! emits one [`AdjacencyRecord`] per distinct node with initial rank `1/N`.
//! Nodes referenced only as targets (never as a source) are discovered and
//! emitted with an empty target list, i.e. as dangling nodes.
//!
//! # Line grammar
//!
//! Whitespace-separated: the first token is the source id, every following
//! token a target id. Blank lines and lines starting with `#` are comments
//! and skipped silently. A line with a source but no target is malformed;
//! malformed lines are skipped with a warning and counted, never fatal.
//! A wholly empty graph is fatal — there is nothing to rank.
//!
//! Shards are parsed independently in parallel; per-shard partial adjacency
//! maps are merged at the stage barrier, so the output is independent of the
//! shard split and re-running the stage is idempotent.

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::pipeline::artifacts::ParsedGraph;
use crate::pipeline::errors::{PipelineError, RecordError};
use crate::pipeline::traits::GraphParser;
use crate::types::AdjacencyRecord;

/// One shard's partial parse result.
#[derive(Debug, Default)]
struct ShardParse {
    /// source id → accumulated targets, in input order.
    adjacency: FxHashMap<String, Vec<String>>,
    /// every id seen on the target side of an edge.
    targets: FxHashSet<String>,
    malformed: usize,
}

/// Default [`GraphParser`]: whitespace edge/adjacency lines.
#[derive(Debug, Clone)]
pub struct EdgeListParser {
    shards: usize,
}

impl Default for EdgeListParser {
    fn default() -> Self {
        Self { shards: 1 }
    }
}

impl EdgeListParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of parallel input shards (1 = sequential).
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards.max(1);
        self
    }

    /// Parse a single raw line into `(source, targets)`.
    ///
    /// Returns `Ok(None)` for comments and blank lines.
    fn parse_line(line: &str) -> Result<Option<(&str, Vec<String>)>, RecordError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }
        let mut tokens = trimmed.split_whitespace();
        let source = tokens.next().ok_or(RecordError::MissingField("source"))?;
        let targets: Vec<String> = tokens.map(str::to_string).collect();
        if targets.is_empty() {
            return Err(RecordError::MissingTarget);
        }
        Ok(Some((source, targets)))
    }

    fn parse_shard(lines: &[&str]) -> ShardParse {
        let mut shard = ShardParse::default();
        for &line in lines {
            match Self::parse_line(line) {
                Ok(Some((source, targets))) => {
                    for target in &targets {
                        shard.targets.insert(target.clone());
                    }
                    shard
                        .adjacency
                        .entry(source.to_string())
                        .or_default()
                        .extend(targets);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(%err, line, "skipping malformed input record");
                    shard.malformed += 1;
                }
            }
        }
        shard
    }
}

impl GraphParser for EdgeListParser {
    fn parse(&self, records: &[&str]) -> Result<ParsedGraph, PipelineError> {
        // Map: parse disjoint shards in parallel.
        let chunk = ((records.len() + self.shards - 1) / self.shards).max(1);
        let shards: Vec<ShardParse> = records
            .par_chunks(chunk)
            .map(Self::parse_shard)
            .collect();

        // Barrier + merge: group targets by source across shards.
        let mut adjacency: FxHashMap<String, Vec<String>> = FxHashMap::default();
        let mut targets_seen: FxHashSet<String> = FxHashSet::default();
        let mut malformed = 0;
        for shard in shards {
            malformed += shard.malformed;
            targets_seen.extend(shard.targets);
            for (source, targets) in shard.adjacency {
                adjacency.entry(source).or_default().extend(targets);
            }
        }

        // Nodes referenced only as targets become dangling records.
        for id in targets_seen {
            adjacency.entry(id).or_default();
        }

        if adjacency.is_empty() {
            return Err(PipelineError::EmptyGraph);
        }

        let page_count = adjacency.len();
        let initial_rank = 1.0 / page_count as f64;

        let mut records: Vec<AdjacencyRecord> = adjacency
            .into_iter()
            .map(|(id, targets)| AdjacencyRecord::new(id, initial_rank, targets))
            .collect();
        records.sort_unstable_by(|a, b| a.id.cmp(&b.id));

        let edge_count = records.iter().map(AdjacencyRecord::out_degree).sum();
        debug!(page_count, edge_count, malformed, "parse stage complete");

        Ok(ParsedGraph {
            records,
            page_count,
            edge_count,
            malformed,
        })
    }
}
