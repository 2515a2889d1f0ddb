//! Stage trait definitions for the pipeline.
//!
//! Each trait represents one processing stage boundary. Implementations are
//! statically dispatched by the [`runner`](super::runner); the default stage
//! set is [`EdgeListParser`](crate::graph::parser::EdgeListParser) →
//! [`MapReducePropagator`](crate::rank::propagator::MapReducePropagator) →
//! [`KeyOrderSorter`](crate::sort::sorter::KeyOrderSorter).
//!
//! # Contracts
//!
//! - Stages are pure with respect to their inputs: re-running a stage (or a
//!   shard of one) on the same input produces the same output, so a
//!   substrate may retry transparently.
//! - A stage returning `Err` aborts the pipeline; its partial output is
//!   never promoted to the next stage's input.

use crate::pipeline::artifacts::{IterationReport, ParsedGraph, RankedOutput};
use crate::pipeline::errors::PipelineError;
use crate::rank::IterationContext;
use crate::types::AdjacencyRecord;

/// Turns raw link records into the canonical adjacency state.
///
/// Must emit exactly one [`AdjacencyRecord`] per distinct node — including
/// nodes referenced only as targets, which get an empty target list — each
/// with initial rank `1/N`. The discovered node count `N` is part of the
/// output and becomes pipeline-wide configuration.
pub trait GraphParser {
    fn parse(&self, records: &[&str]) -> Result<ParsedGraph, PipelineError>;
}

/// Applies one full PageRank map/combine/reduce transition.
///
/// Consumes the previous iteration's complete state and produces the next
/// one; the dangling-mass aggregate is computed from the full input before
/// any rank is finalized, so the caller must never hand a propagator a
/// partial state.
pub trait RankPropagator {
    fn propagate(
        &self,
        state: &[AdjacencyRecord],
        ctx: &IterationContext,
    ) -> Result<(Vec<AdjacencyRecord>, IterationReport), PipelineError>;
}

/// Produces one globally rank-ordered sequence from arbitrarily partitioned
/// final ranks: rank descending, id ascending on ties.
pub trait RankSorter {
    fn sort(&self, state: &[AdjacencyRecord]) -> Result<RankedOutput, PipelineError>;
}
