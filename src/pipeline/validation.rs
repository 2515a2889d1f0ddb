//! Validation engine for pipeline specifications.
//!
//! The engine runs all registered [`ValidationRule`]s against a
//! [`PipelineSpec`](super::spec::PipelineSpec) and collects every diagnostic
//! into a [`ValidationReport`] — it never short-circuits on the first error,
//! so users see all problems at once.
//!
//! Invalid configuration is always fatal: no component substitutes a default
//! for a rejected value. [`Pipeline::from_spec`](super::runner::Pipeline)
//! refuses to construct from a spec whose report has errors.

use serde::Serialize;

use super::errors::{ErrorCode, PipelineSpecError};
use super::spec::PipelineSpec;

// ─── Severity ───────────────────────────────────────────────────────────────

/// Whether a diagnostic is a hard error or a soft warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

// ─── Diagnostic ─────────────────────────────────────────────────────────────

/// A single validation finding — an error or warning attached to a
/// [`PipelineSpecError`] that carries the code, path, message, and hint.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: Severity,
    #[serde(flatten)]
    pub error: PipelineSpecError,
}

impl ValidationDiagnostic {
    pub fn error(err: PipelineSpecError) -> Self {
        Self {
            severity: Severity::Error,
            error: err,
        }
    }

    pub fn warning(err: PipelineSpecError) -> Self {
        Self {
            severity: Severity::Warning,
            error: err,
        }
    }
}

// ─── Report ─────────────────────────────────────────────────────────────────

/// Collected diagnostics from running all validation rules.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    /// Iterate over error-severity diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &PipelineSpecError> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| &d.error)
    }

    /// Iterate over warning-severity diagnostics.
    pub fn warnings(&self) -> impl Iterator<Item = &PipelineSpecError> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .map(|d| &d.error)
    }

    /// Returns `true` if any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Returns `true` if there are no errors (warnings are acceptable).
    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    /// Total number of diagnostics (errors + warnings).
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Returns `true` if there are no diagnostics at all.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Clone the error-severity diagnostics into an owned list, for
    /// embedding in a fatal [`PipelineError`](super::errors::PipelineError).
    pub fn into_errors(self) -> Vec<PipelineSpecError> {
        self.diagnostics
            .into_iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| d.error)
            .collect()
    }
}

// ─── Rule trait ─────────────────────────────────────────────────────────────

/// A single validation rule that inspects a [`PipelineSpec`] and returns
/// zero or more diagnostics.
///
/// Rules are stateless and must be `Send + Sync` so they can be shared
/// across threads (e.g., in a long-lived validation engine).
pub trait ValidationRule: Send + Sync {
    /// Short, stable identifier for this rule (e.g., `"alpha_range"`).
    fn name(&self) -> &str;

    /// Inspect `spec` and return any findings.
    fn validate(&self, spec: &PipelineSpec) -> Vec<ValidationDiagnostic>;
}

// ─── Engine ─────────────────────────────────────────────────────────────────

/// Runs a set of [`ValidationRule`]s against a [`PipelineSpec`] and collects
/// all diagnostics into a [`ValidationReport`].
pub struct ValidationEngine {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl ValidationEngine {
    /// Create an empty engine with no rules.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create an engine pre-loaded with the default rule set.
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        engine.add_rule(Box::new(AlphaRangeRule));
        engine.add_rule(Box::new(IterationCountRule));
        engine.add_rule(Box::new(PartitionCountRule));
        engine.add_rule(Box::new(UnknownFieldsRule));
        engine
    }

    /// Register an additional rule.
    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    /// Run all rules against `spec` and return the collected report.
    pub fn validate(&self, spec: &PipelineSpec) -> ValidationReport {
        let mut report = ValidationReport::default();
        for rule in &self.rules {
            report.diagnostics.extend(rule.validate(spec));
        }
        report
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Concrete rules
// ═══════════════════════════════════════════════════════════════════════════

// ─── 1. alpha must lie in (0, 1] ────────────────────────────────────────────

struct AlphaRangeRule;

impl ValidationRule for AlphaRangeRule {
    fn name(&self) -> &str {
        "alpha_range"
    }

    fn validate(&self, spec: &PipelineSpec) -> Vec<ValidationDiagnostic> {
        if spec.alpha.is_finite() && spec.alpha > 0.0 && spec.alpha <= 1.0 {
            vec![]
        } else {
            vec![ValidationDiagnostic::error(
                PipelineSpecError::new(
                    ErrorCode::OutOfRange,
                    "/alpha",
                    format!("alpha must lie in (0, 1], got {}", spec.alpha),
                )
                .with_hint("The conventional damping factor is 0.85"),
            )]
        }
    }
}

// ─── 2. iteration count must be at least 1 ──────────────────────────────────

struct IterationCountRule;

impl ValidationRule for IterationCountRule {
    fn name(&self) -> &str {
        "iteration_count"
    }

    fn validate(&self, spec: &PipelineSpec) -> Vec<ValidationDiagnostic> {
        if spec.iterations >= 1 {
            vec![]
        } else {
            vec![ValidationDiagnostic::error(
                PipelineSpecError::new(
                    ErrorCode::LimitExceeded,
                    "/iterations",
                    "iterations must be at least 1",
                )
                .with_hint("A zero-iteration run would emit unpropagated uniform ranks"),
            )]
        }
    }
}

// ─── 3. partition count must be at least 1 ──────────────────────────────────

struct PartitionCountRule;

impl ValidationRule for PartitionCountRule {
    fn name(&self) -> &str {
        "partition_count"
    }

    fn validate(&self, spec: &PipelineSpec) -> Vec<ValidationDiagnostic> {
        if spec.partitions >= 1 {
            vec![]
        } else {
            vec![ValidationDiagnostic::error(
                PipelineSpecError::new(
                    ErrorCode::LimitExceeded,
                    "/partitions",
                    "partitions must be at least 1",
                )
                .with_hint("Use 1 for a single globally-sorted output"),
            )]
        }
    }
}

// ─── 4. Unknown fields (strict → error, non-strict → warning) ──────────────

struct UnknownFieldsRule;

impl ValidationRule for UnknownFieldsRule {
    fn name(&self) -> &str {
        "unknown_fields"
    }

    fn validate(&self, spec: &PipelineSpec) -> Vec<ValidationDiagnostic> {
        spec.unknown_fields
            .keys()
            .map(|key| {
                let diag_fn = if spec.strict {
                    ValidationDiagnostic::error
                } else {
                    ValidationDiagnostic::warning
                };
                diag_fn(
                    PipelineSpecError::new(
                        ErrorCode::UnknownField,
                        format!("/{key}"),
                        format!("unrecognized field \"{key}\""),
                    )
                    .with_hint("Check spelling or remove this field"),
                )
            })
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: build a PipelineSpec from JSON.
    fn spec(json: &str) -> PipelineSpec {
        serde_json::from_str(json).unwrap()
    }

    fn engine() -> ValidationEngine {
        ValidationEngine::with_defaults()
    }

    // ─── Valid specs ────────────────────────────────────────────────────

    #[test]
    fn test_minimal_spec_is_valid() {
        let report = engine().validate(&spec(r#"{ "v": 1 }"#));
        assert!(report.is_valid());
        assert!(report.is_empty());
    }

    #[test]
    fn test_full_spec_is_valid() {
        let report = engine().validate(&spec(
            r#"{ "v": 1, "alpha": 0.85, "iterations": 30, "partitions": 8 }"#,
        ));
        assert!(report.is_valid());
    }

    #[test]
    fn test_alpha_one_is_valid() {
        // alpha = 1 means no teleportation: a pure random walk.
        let report = engine().validate(&spec(r#"{ "v": 1, "alpha": 1.0 }"#));
        assert!(report.is_valid());
    }

    // ─── Rule: alpha_range ──────────────────────────────────────────────

    #[test]
    fn test_zero_alpha_fails() {
        let report = engine().validate(&spec(r#"{ "v": 1, "alpha": 0.0 }"#));
        assert!(report.has_errors());
        let errs: Vec<_> = report.errors().collect();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::OutOfRange);
        assert_eq!(errs[0].path, "/alpha");
    }

    #[test]
    fn test_alpha_above_one_fails() {
        let report = engine().validate(&spec(r#"{ "v": 1, "alpha": 1.5 }"#));
        assert!(report.has_errors());
    }

    #[test]
    fn test_negative_alpha_fails() {
        let report = engine().validate(&spec(r#"{ "v": 1, "alpha": -0.85 }"#));
        assert!(report.has_errors());
    }

    #[test]
    fn test_nan_alpha_fails() {
        let mut s = PipelineSpec::default();
        s.alpha = f64::NAN;
        let report = engine().validate(&s);
        assert!(report.has_errors());
    }

    // ─── Rule: iteration_count ──────────────────────────────────────────

    #[test]
    fn test_zero_iterations_fails() {
        let report = engine().validate(&spec(r#"{ "v": 1, "iterations": 0 }"#));
        assert!(report.has_errors());
        let errs: Vec<_> = report.errors().collect();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::LimitExceeded);
        assert_eq!(errs[0].path, "/iterations");
    }

    #[test]
    fn test_one_iteration_is_valid() {
        let report = engine().validate(&spec(r#"{ "v": 1, "iterations": 1 }"#));
        assert!(report.is_valid());
    }

    // ─── Rule: partition_count ──────────────────────────────────────────

    #[test]
    fn test_zero_partitions_fails() {
        let report = engine().validate(&spec(r#"{ "v": 1, "partitions": 0 }"#));
        assert!(report.has_errors());
        let errs: Vec<_> = report.errors().collect();
        assert_eq!(errs.len(), 1);
        assert!(errs[0].path.contains("partitions"));
    }

    // ─── Rule: unknown_fields (strict mode) ─────────────────────────────

    #[test]
    fn test_unknown_fields_non_strict_are_warnings() {
        let report = engine().validate(&spec(r#"{ "v": 1, "strict": false, "bogus": 42 }"#));
        assert!(report.is_valid()); // warnings don't make it invalid
        let warns: Vec<_> = report.warnings().collect();
        assert_eq!(warns.len(), 1);
        assert_eq!(warns[0].code, ErrorCode::UnknownField);
        assert!(warns[0].path.contains("bogus"));
    }

    #[test]
    fn test_unknown_fields_strict_are_errors() {
        let report = engine().validate(&spec(r#"{ "v": 1, "strict": true, "bogus": 42 }"#));
        assert!(report.has_errors());
        let errs: Vec<_> = report.errors().collect();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::UnknownField);
    }

    // ─── Multiple rules ─────────────────────────────────────────────────

    #[test]
    fn test_multiple_rules_fire_independently() {
        let report = engine().validate(&spec(
            r#"{ "v": 1, "strict": true, "alpha": 2.0, "iterations": 0, "bogus": true }"#,
        ));
        let errs: Vec<_> = report.errors().collect();
        assert_eq!(errs.len(), 3);
    }

    #[test]
    fn test_into_errors_keeps_only_errors() {
        let report = engine().validate(&spec(
            r#"{ "v": 1, "alpha": 2.0, "bogus": true }"#, // 1 error + 1 warning
        ));
        assert_eq!(report.len(), 2);
        let errs = report.into_errors();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].path, "/alpha");
    }

    // ─── Engine: custom rules ───────────────────────────────────────────

    #[test]
    fn test_custom_rule() {
        struct AlwaysWarnRule;
        impl ValidationRule for AlwaysWarnRule {
            fn name(&self) -> &str {
                "always_warn"
            }
            fn validate(&self, _spec: &PipelineSpec) -> Vec<ValidationDiagnostic> {
                vec![ValidationDiagnostic::warning(PipelineSpecError::new(
                    ErrorCode::ValidationFailed,
                    "",
                    "custom warning",
                ))]
            }
        }

        let mut eng = ValidationEngine::new();
        eng.add_rule(Box::new(AlwaysWarnRule));
        let report = eng.validate(&PipelineSpec::default());
        assert!(report.is_valid()); // warnings only
        assert_eq!(report.warnings().count(), 1);
    }

    // ─── Serialization ──────────────────────────────────────────────────

    #[test]
    fn test_report_serializes_to_json() {
        let report = engine().validate(&spec(r#"{ "v": 1, "iterations": 0 }"#));
        let json = serde_json::to_value(&report).unwrap();
        let diags = json["diagnostics"].as_array().unwrap();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0]["severity"], "error");
        assert_eq!(diags[0]["code"], "limit_exceeded");
    }
}
