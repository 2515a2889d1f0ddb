//! Error taxonomy for the pipeline.
//!
//! Three tiers:
//! - [`RecordError`] — a single unparseable record. Recoverable: the parser
//!   skips the record with a warning and keeps going.
//! - [`PipelineSpecError`] — a validation diagnostic with a stable code,
//!   JSON-pointer path, message, and optional hint. Collected by the
//!   validation engine; never raised one at a time.
//! - [`PipelineError`] — fatal. Aborts the run before (invalid spec, empty
//!   graph) or during (stage failure) execution. Partial output from a
//!   failed stage is never promoted to the next stage's input.

use serde::Serialize;
use thiserror::Error;

// ─── Record-level (recoverable) ─────────────────────────────────────────────

/// A single raw or serialized record that could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("missing field \"{0}\"")]
    MissingField(&'static str),
    #[error("invalid rank value \"{0}\"")]
    InvalidRank(String),
    #[error("edge line has a source but no target")]
    MissingTarget,
}

// ─── Validation diagnostics ─────────────────────────────────────────────────

/// Stable machine-readable code for a validation diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// A numeric setting lies outside its permitted interval.
    OutOfRange,
    /// A count setting is below its minimum.
    LimitExceeded,
    /// A field not recognized by the schema.
    UnknownField,
    /// Catch-all for rule-specific failures.
    ValidationFailed,
}

/// A single spec validation finding: code, JSON-pointer path, message, and
/// an optional remediation hint.
#[derive(Debug, Clone, Serialize, Error)]
#[error("{code:?} at \"{path}\": {message}")]
pub struct PipelineSpecError {
    pub code: ErrorCode,
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl PipelineSpecError {
    pub fn new(code: ErrorCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.into(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ─── Fatal pipeline errors ──────────────────────────────────────────────────

/// The stage a fatal error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    Parse,
    Rank,
    Sort,
}

impl StageName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::Rank => "rank",
            Self::Sort => "sort",
        }
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal failure: aborts the whole run with no output promotion.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// The spec failed validation. Carries every error-severity diagnostic.
    #[error("invalid pipeline spec ({} error{})", .0.len(), if .0.len() == 1 { "" } else { "s" })]
    InvalidSpec(Vec<PipelineSpecError>),

    /// The parsed graph contains no nodes — nothing to rank.
    #[error("input graph is empty: nothing to rank")]
    EmptyGraph,

    /// Iteration preconditions violated (zero page count, alpha outside
    /// `(0, 1]`). Normally caught by spec validation; re-checked at the
    /// stage boundary because the substrate may construct contexts directly.
    #[error("invalid iteration context: {0}")]
    InvalidContext(String),

    /// A shard of a stage failed irrecoverably.
    #[error("{stage} stage failed: {message}")]
    Stage { stage: StageName, message: String },
}

impl PipelineError {
    pub fn stage(stage: StageName, message: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_error_display_and_hint() {
        let err = PipelineSpecError::new(ErrorCode::OutOfRange, "/alpha", "alpha must be in (0, 1]")
            .with_hint("Use 0.85 unless you have a reason not to");
        assert!(err.to_string().contains("/alpha"));
        assert_eq!(err.hint.as_deref(), Some("Use 0.85 unless you have a reason not to"));
    }

    #[test]
    fn test_spec_error_serializes_code_snake_case() {
        let err = PipelineSpecError::new(ErrorCode::UnknownField, "/bogus", "unrecognized field");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "unknown_field");
        assert_eq!(json["path"], "/bogus");
        assert!(json.get("hint").is_none());
    }

    #[test]
    fn test_invalid_spec_counts_errors() {
        let errs = vec![
            PipelineSpecError::new(ErrorCode::OutOfRange, "/alpha", "bad alpha"),
            PipelineSpecError::new(ErrorCode::LimitExceeded, "/iterations", "bad count"),
        ];
        let err = PipelineError::InvalidSpec(errs);
        assert!(err.to_string().contains("2 errors"));
    }

    #[test]
    fn test_stage_error_names_stage() {
        let err = PipelineError::stage(StageName::Rank, "shard 3 produced no structure record");
        assert!(err.to_string().starts_with("rank stage failed"));
    }

    #[test]
    fn test_record_error_display() {
        assert_eq!(
            RecordError::MissingField("rank").to_string(),
            "missing field \"rank\""
        );
        assert!(RecordError::InvalidRank("x".into()).to_string().contains('x'));
    }
}
