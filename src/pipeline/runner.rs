//! Pipeline runner — orchestrates stage execution and artifact flow.
//!
//! The [`Pipeline`] struct holds a statically-composed set of stages and the
//! immutable run configuration. [`Pipeline::run`] executes
//! Parse → N × Propagate → Sort strictly in sequence: every stage (and every
//! propagator iteration) completes fully before the next begins. The
//! dangling-mass aggregate of an iteration depends on that iteration's
//! complete input, so there is no overlap between iterations, and a failed
//! stage aborts the run without promoting partial output.
//!
//! # Static dispatch
//!
//! `Pipeline` is generic over the three stage traits, so each composition
//! monomorphizes into a concrete type. Use [`Pipeline::from_spec`] for the
//! default stage set, or [`PipelineBuilder`] to swap individual stages.

use tracing::info_span;

use crate::graph::parser::EdgeListParser;
use crate::pipeline::artifacts::RankedOutput;
use crate::pipeline::errors::PipelineError;
use crate::pipeline::observer::{
    PipelineObserver, StageClock, StageReportBuilder, STAGE_PARSE, STAGE_RANK, STAGE_SORT,
};
use crate::pipeline::spec::PipelineSpec;
use crate::pipeline::traits::{GraphParser, RankPropagator, RankSorter};
use crate::pipeline::validation::ValidationEngine;
use crate::rank::propagator::MapReducePropagator;
use crate::rank::IterationContext;
use crate::sort::sorter::KeyOrderSorter;

/// Validated scalars carried through the run. Set once, never mutated.
#[derive(Debug, Clone, Copy)]
struct RunConfig {
    alpha: f64,
    iterations: usize,
}

/// A pipeline composed of concrete stage implementations plus the validated
/// run configuration.
#[derive(Debug, Clone)]
pub struct Pipeline<P, R, S> {
    pub parser: P,
    pub propagator: R,
    pub sorter: S,
    config: RunConfig,
}

/// Type alias for the default stage composition.
pub type DefaultPipeline = Pipeline<EdgeListParser, MapReducePropagator, KeyOrderSorter>;

impl DefaultPipeline {
    /// Build the default pipeline from a spec, validating it first.
    ///
    /// Fails with [`PipelineError::InvalidSpec`] carrying every
    /// error-severity diagnostic if validation rejects the spec. No default
    /// is ever substituted for an invalid value.
    pub fn from_spec(spec: &PipelineSpec) -> Result<Self, PipelineError> {
        let report = ValidationEngine::with_defaults().validate(spec);
        if report.has_errors() {
            return Err(PipelineError::InvalidSpec(report.into_errors()));
        }
        Ok(Pipeline {
            parser: EdgeListParser::new().with_shards(spec.partitions),
            propagator: MapReducePropagator::new().with_shards(spec.partitions),
            sorter: KeyOrderSorter::new().with_partitions(spec.partitions),
            config: RunConfig {
                alpha: spec.alpha,
                iterations: spec.iterations,
            },
        })
    }
}

impl<P, R, S> Pipeline<P, R, S>
where
    P: GraphParser,
    R: RankPropagator,
    S: RankSorter,
{
    /// Execute the pipeline over raw input records.
    ///
    /// Stages run strictly in order with a full barrier between them:
    /// 1. Parse — adjacency records + page count N
    /// 2. Propagate × iterations — each a complete map/combine/reduce pass
    /// 3. Sort — global rank-descending order
    ///
    /// The `observer` receives callbacks at each stage boundary. Pass
    /// [`NoopObserver`](crate::pipeline::observer::NoopObserver) for
    /// zero-overhead execution.
    pub fn run(
        &self,
        records: &[&str],
        observer: &mut impl PipelineObserver,
    ) -> Result<RankedOutput, PipelineError> {
        // Stage 1: Parse.
        let _span = info_span!("pipeline_stage", stage = STAGE_PARSE).entered();
        observer.on_stage_start(STAGE_PARSE);
        let clock = StageClock::start();
        let parsed = self.parser.parse(records)?;
        let report = StageReportBuilder::new(clock.elapsed())
            .nodes(parsed.page_count)
            .edges(parsed.edge_count)
            .build();
        observer.on_stage_end(STAGE_PARSE, &report);
        observer.on_parsed(&parsed);
        drop(_span);

        // The page count becomes pipeline-wide configuration for every
        // iteration.
        let ctx = IterationContext::new(self.config.alpha, parsed.page_count)?;

        // Stage 2: N synchronized propagation iterations.
        let mut state = parsed.records;
        for iteration in 1..=self.config.iterations {
            let _span = info_span!("pipeline_stage", stage = STAGE_RANK, iteration).entered();
            observer.on_stage_start(STAGE_RANK);
            let clock = StageClock::start();
            let (next, iter_report) = self.propagator.propagate(&state, &ctx)?;
            let report = StageReportBuilder::new(clock.elapsed())
                .nodes(next.len())
                .iteration(iteration)
                .dangling_mass(iter_report.dangling_mass)
                .total_mass(iter_report.total_mass)
                .build();
            observer.on_stage_end(STAGE_RANK, &report);
            observer.on_iteration(iteration, &iter_report);
            // Barrier: `state` is fully replaced before the next iteration.
            state = next;
        }

        // Stage 3: Sort.
        let _span = info_span!("pipeline_stage", stage = STAGE_SORT).entered();
        observer.on_stage_start(STAGE_SORT);
        let clock = StageClock::start();
        let output = self.sorter.sort(&state)?;
        let report = StageReportBuilder::new(clock.elapsed())
            .nodes(output.len())
            .build();
        observer.on_stage_end(STAGE_SORT, &report);
        observer.on_sorted(&output);

        Ok(output)
    }
}

// ============================================================================
// PipelineBuilder — fluent construction with custom stages
// ============================================================================

/// Fluent builder for a [`Pipeline`] with custom stages.
///
/// Starts from the default stage set for the given spec and allows
/// overriding individual stages.
///
/// ```
/// use linkrank::pipeline::runner::PipelineBuilder;
/// use linkrank::pipeline::spec::PipelineSpec;
/// use linkrank::rank::propagator::MapReducePropagator;
///
/// let pipeline = PipelineBuilder::from_spec(&PipelineSpec::new(0.85, 5))
///     .unwrap()
///     .propagator(MapReducePropagator::new().without_combiner())
///     .build();
/// ```
pub struct PipelineBuilder<P = EdgeListParser, R = MapReducePropagator, S = KeyOrderSorter> {
    parser: P,
    propagator: R,
    sorter: S,
    config: RunConfig,
}

impl PipelineBuilder {
    /// Start building from the default stage set, validating the spec.
    pub fn from_spec(spec: &PipelineSpec) -> Result<Self, PipelineError> {
        let pipeline = Pipeline::from_spec(spec)?;
        Ok(PipelineBuilder {
            parser: pipeline.parser,
            propagator: pipeline.propagator,
            sorter: pipeline.sorter,
            config: pipeline.config,
        })
    }
}

impl<P, R, S> PipelineBuilder<P, R, S> {
    /// Override the parse stage.
    pub fn parser<P2: GraphParser>(self, parser: P2) -> PipelineBuilder<P2, R, S> {
        PipelineBuilder {
            parser,
            propagator: self.propagator,
            sorter: self.sorter,
            config: self.config,
        }
    }

    /// Override the propagation stage.
    pub fn propagator<R2: RankPropagator>(self, propagator: R2) -> PipelineBuilder<P, R2, S> {
        PipelineBuilder {
            parser: self.parser,
            propagator,
            sorter: self.sorter,
            config: self.config,
        }
    }

    /// Override the sort stage.
    pub fn sorter<S2: RankSorter>(self, sorter: S2) -> PipelineBuilder<P, R, S2> {
        PipelineBuilder {
            parser: self.parser,
            propagator: self.propagator,
            sorter,
            config: self.config,
        }
    }

    /// Consume the builder and produce a [`Pipeline`].
    pub fn build(self) -> Pipeline<P, R, S> {
        Pipeline {
            parser: self.parser,
            propagator: self.propagator,
            sorter: self.sorter,
            config: self.config,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
