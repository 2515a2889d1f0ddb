//! Rank propagation: the iterated PageRank map/combine/reduce transition.

pub mod propagator;

use crate::pipeline::errors::PipelineError;

/// Pipeline-wide scalars for one run's propagation iterations: the damping
/// factor and the node count discovered by the parser. Immutable once built.
#[derive(Debug, Clone, Copy)]
pub struct IterationContext {
    alpha: f64,
    page_count: usize,
}

impl IterationContext {
    /// Build a context, enforcing the stage preconditions: `page_count > 0`
    /// and `alpha ∈ (0, 1]`.
    pub fn new(alpha: f64, page_count: usize) -> Result<Self, PipelineError> {
        if page_count == 0 {
            return Err(PipelineError::InvalidContext(
                "page count must be greater than 0".into(),
            ));
        }
        if !(alpha.is_finite() && alpha > 0.0 && alpha <= 1.0) {
            return Err(PipelineError::InvalidContext(format!(
                "alpha must lie in (0, 1], got {alpha}"
            )));
        }
        Ok(Self { alpha, page_count })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// `(1 - alpha) / N`, the uniform teleport term of the update.
    pub fn teleport(&self) -> f64 {
        (1.0 - self.alpha) / self.page_count as f64
    }
}
