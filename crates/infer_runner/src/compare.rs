//! Comparison of measured resource usage against the scaffold cost model.
//!
//! A configuration that wraps ports in reduction scaffolds measures the
//! entity plus its scaffolds. The modeled scaffold cost is subtracted to get
//! the residual usage of the entity itself, which is then judged against the
//! configuration's expectations within a [`Tolerance`].

use infer_config::{Configuration, ResourceCounts};
use infer_tools::{ResourceReport, SynthesisTool};
use serde::Serialize;
use std::fmt;

/// Slack absorbing float noise in otherwise integral counts.
const EPSILON: f64 = 1e-9;

/// Allowed deviation between a residual and its expected value.
///
/// A residual `r` satisfies an expected value `e` when
/// `|r - e| <= absolute + relative * |e|`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Tolerance {
    /// Deviation allowed regardless of the expected value, in primitives.
    pub absolute: f64,
    /// Deviation allowed as a fraction of the expected value.
    pub relative: f64,
}

impl Tolerance {
    /// Requires exact agreement.
    pub const EXACT: Tolerance = Tolerance {
        absolute: 0.0,
        relative: 0.0,
    };

    /// The allowed deviation around `expected`.
    pub fn band(&self, expected: f64) -> f64 {
        self.absolute + self.relative * expected.abs()
    }

    /// Returns true if `residual` is within tolerance of `expected`.
    pub fn allows(&self, expected: f64, residual: f64) -> bool {
        (residual - expected).abs() <= self.band(expected) + EPSILON
    }
}

/// Which rule a resource kind violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchRule {
    /// The residual differs from the declared expectation.
    Expected,
    /// No expectation was declared and the model predicts more than was measured.
    NonNegative,
}

/// One resource kind that failed its check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    /// Resource kind.
    pub kind: String,
    /// Expected residual (zero for [`MismatchRule::NonNegative`]).
    pub expected: f64,
    /// Measured usage minus modeled scaffold cost.
    pub residual: f64,
    /// The violated rule.
    pub rule: MismatchRule,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule {
            MismatchRule::Expected => write!(
                f,
                "{}: residual {} but expected {}",
                self.kind, self.residual, self.expected
            ),
            MismatchRule::NonNegative => write!(
                f,
                "{}: scaffold model exceeds measured usage by {}",
                self.kind, -self.residual
            ),
        }
    }
}

/// Result of judging one configuration's resource usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceCheck {
    /// Usage parsed from the tool's report.
    pub actual: ResourceReport,
    /// Modeled cost of the configuration's scaffolds.
    pub predicted: ResourceReport,
    /// `actual - predicted`.
    pub residual: ResourceReport,
    /// Kinds that failed.
    pub mismatches: Vec<Mismatch>,
}

impl ResourceCheck {
    /// Returns true if every checked kind is within tolerance.
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Sums the modeled cost of every in/out reduction scaffold of `config`.
///
/// No scaffold is generated here. The synthesized sources must already wrap
/// the entity in the reduction logic the configuration names, otherwise the
/// residual goes negative and the check fails with
/// [`MismatchRule::NonNegative`].
pub fn predicted_scaffold_cost(tool: &dyn SynthesisTool, config: &Configuration) -> ResourceReport {
    let inputs = config
        .in_reduce
        .values()
        .map(|&size| tool.in_reduce_resources(size));
    let outputs = config
        .out_reduce
        .values()
        .map(|&size| tool.out_reduce_resources(size));
    inputs.chain(outputs).sum()
}

/// Judges measured usage against the scaffold model.
///
/// With `expected`, every listed kind's residual must match within
/// `tolerance`; kinds not listed are not judged. Without it, every residual
/// must be at least `-tolerance.absolute`.
pub fn check_resources(
    actual: ResourceReport,
    predicted: ResourceReport,
    expected: Option<&ResourceCounts>,
    tolerance: Tolerance,
) -> ResourceCheck {
    let residual = &actual - &predicted;

    let mismatches = match expected {
        Some(expected) => expected
            .iter()
            .filter(|(kind, value)| !tolerance.allows(**value, residual.get(kind)))
            .map(|(kind, &value)| Mismatch {
                kind: kind.clone(),
                expected: value,
                residual: residual.get(kind),
                rule: MismatchRule::Expected,
            })
            .collect(),
        None => residual
            .iter()
            .filter(|(_, value)| *value < -(tolerance.absolute + EPSILON))
            .map(|(kind, value)| Mismatch {
                kind: kind.to_string(),
                expected: 0.0,
                residual: value,
                rule: MismatchRule::NonNegative,
            })
            .collect(),
    };

    ResourceCheck {
        actual,
        predicted,
        residual,
        mismatches,
    }
}
