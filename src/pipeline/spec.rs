//! Pipeline specification types.
//!
//! A [`PipelineSpec`] is the immutable run configuration: damping factor,
//! iteration count, output-partition count, and strictness. It is set once
//! before the pipeline starts and never mutated by a stage. These types are
//! the input to the [`super::validation::ValidationEngine`].
//!
//! # JSON shape
//!
//! ```json
//! {
//!   "v": 1,
//!   "alpha": 0.85,
//!   "iterations": 10,
//!   "partitions": 4,
//!   "strict": false
//! }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Default damping factor: the conventional PageRank value.
pub const DEFAULT_ALPHA: f64 = 0.85;

/// Default number of propagation iterations.
pub const DEFAULT_ITERATIONS: usize = 10;

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

fn default_iterations() -> usize {
    DEFAULT_ITERATIONS
}

fn default_partitions() -> usize {
    1
}

/// Top-level pipeline specification (v1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSpec {
    /// Spec version (currently `1`).
    pub v: u32,

    /// Damping factor. Probability mass that follows graph edges rather
    /// than teleporting uniformly. Must lie in `(0, 1]`.
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Number of propagation iterations. Must be at least 1.
    #[serde(default = "default_iterations")]
    pub iterations: usize,

    /// Number of output partitions for the sorter (and shards for the
    /// parallel map/reduce passes). Must be at least 1.
    #[serde(default = "default_partitions")]
    pub partitions: usize,

    /// If `true`, unrecognized fields are errors; if `false`, warnings.
    #[serde(default)]
    pub strict: bool,

    /// Captures any fields not recognized by the schema.
    /// Used by the strict-mode validation rule.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

impl Default for PipelineSpec {
    fn default() -> Self {
        Self {
            v: 1,
            alpha: DEFAULT_ALPHA,
            iterations: DEFAULT_ITERATIONS,
            partitions: 1,
            strict: false,
            unknown_fields: HashMap::new(),
        }
    }
}

impl PipelineSpec {
    /// Spec with the given damping factor and iteration count, defaults
    /// elsewhere.
    pub fn new(alpha: f64, iterations: usize) -> Self {
        Self {
            alpha,
            iterations,
            ..Self::default()
        }
    }

    /// Set the output-partition count.
    pub fn with_partitions(mut self, partitions: usize) -> Self {
        self.partitions = partitions;
        self
    }
}
