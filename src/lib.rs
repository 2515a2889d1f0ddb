//! # linkrank
//!
//! Staged map/combine/reduce PageRank over partitioned link graphs.
//!
//! The computation runs as three strictly sequenced stages, each a pure
//! transformation a parallel substrate can execute over disjoint shards:
//!
//! - **parse** ([`graph::parser`]) — raw link records → one
//!   [`AdjacencyRecord`] per node with uniform initial rank `1/N`; nodes
//!   referenced only as targets are discovered and emitted dangling.
//! - **rank** ([`rank::propagator`]) — a fixed number of synchronized
//!   iterations; each re-emits the graph structure and applies
//!   `(1-α)/N + α·(Σ contributions + dangling_mass/N)`, so total rank mass
//!   stays ≈ 1 across iterations.
//! - **sort** ([`sort`]) — final ranks funneled into one globally ordered
//!   sequence (rank descending, id ascending on ties), via an
//!   order-preserving fixed-width sort key and a monotone range partitioner.
//!
//! # Example
//!
//! ```
//! use linkrank::{rank_pages, PipelineSpec};
//!
//! let records = ["a b", "b a", "c a"];
//! let ranked = rank_pages(&records, &PipelineSpec::new(0.85, 20)).unwrap();
//! assert_eq!(ranked[0].id, "a");
//! ```

pub mod graph;
pub mod pipeline;
pub mod rank;
pub mod sort;
pub mod types;

pub use pipeline::artifacts::{ParsedGraph, RankedOutput};
pub use pipeline::errors::{PipelineError, RecordError};
pub use pipeline::observer::{NoopObserver, PipelineObserver};
pub use pipeline::runner::{DefaultPipeline, Pipeline, PipelineBuilder};
pub use pipeline::spec::PipelineSpec;
pub use types::{AdjacencyRecord, RankedEntry};

/// Run the default pipeline over raw link records and return the globally
/// ordered ranking.
pub fn rank_pages(
    records: &[&str],
    spec: &PipelineSpec,
) -> Result<Vec<RankedEntry>, PipelineError> {
    let pipeline = Pipeline::from_spec(spec)?;
    let output = pipeline.run(records, &mut NoopObserver)?;
    Ok(output.into_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_pages_end_to_end() {
        let ranked = rank_pages(&["a b", "b a"], &PipelineSpec::new(0.85, 5)).unwrap();
        assert_eq!(ranked.len(), 2);
        let total: f64 = ranked.iter().map(|e| e.rank).sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rank_pages_propagates_config_errors() {
        let err = rank_pages(&["a b"], &PipelineSpec::new(2.0, 5)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidSpec(_)));
    }
}
