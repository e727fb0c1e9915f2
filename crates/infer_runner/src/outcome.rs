//! Per-configuration outcomes and the aggregated run report.

use crate::compare::ResourceCheck;
use infer_config::Generics;
use infer_tools::ToolError;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Why a configuration did not pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The toolchain exited non-zero or could not be started.
    Synthesis,
    /// The toolchain was killed after its time bound.
    Timeout,
    /// A source path, entity or generic could not be handed to the toolchain.
    UnsupportedInput,
    /// The utilization log was missing after a successful run.
    ReportNotFound,
    /// A design-rule check failed.
    DrcViolation,
    /// The backend was driven out of order.
    InvalidState,
    /// The job directory or a log could not be accessed.
    Io,
    /// Synthesis succeeded but the residual usage did not match.
    ResourceMismatch,
}

impl FailureKind {
    /// Classifies a backend error that fails a single configuration.
    pub fn from_tool_error(err: &ToolError) -> Self {
        match err {
            ToolError::Synthesis { .. } => FailureKind::Synthesis,
            ToolError::Timeout { .. } => FailureKind::Timeout,
            ToolError::UnsupportedInput(_) => FailureKind::UnsupportedInput,
            ToolError::ReportNotFound { .. } => FailureKind::ReportNotFound,
            ToolError::DrcViolation(_) => FailureKind::DrcViolation,
            ToolError::InvalidState { .. } => FailureKind::InvalidState,
            ToolError::IoError(_) => FailureKind::Io,
            // Only reached if a factory reports these for a single job.
            ToolError::ToolUnavailable { .. } | ToolError::UnknownTool(_) => {
                FailureKind::Synthesis
            }
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Synthesis => "synthesis failed",
            FailureKind::Timeout => "timed out",
            FailureKind::UnsupportedInput => "unsupported input",
            FailureKind::ReportNotFound => "report not found",
            FailureKind::DrcViolation => "design rule violation",
            FailureKind::InvalidState => "invalid state",
            FailureKind::Io => "I/O error",
            FailureKind::ResourceMismatch => "resource mismatch",
        };
        f.write_str(s)
    }
}

/// A failed configuration's classification and message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    /// Classification.
    pub kind: FailureKind,
    /// Human-readable detail.
    pub message: String,
}

/// The result of running one configuration of one entity.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigOutcome {
    /// Top-level entity.
    pub entity: String,
    /// Configuration name.
    pub config: String,
    /// Job directory holding the script, logs and reports.
    pub project_dir: PathBuf,
    /// Effective generics the job was synthesized with.
    pub generics: Generics,
    /// Ports the configuration leaves unconnected.
    pub omitted_ports: Vec<String>,
    /// Resource comparison, present once resource usage was read.
    pub check: Option<ResourceCheck>,
    /// Set if the configuration did not pass.
    pub failure: Option<Failure>,
}

impl ConfigOutcome {
    /// Returns true if the configuration passed.
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }

    /// `entity/config`, as shown in status lines.
    pub fn label(&self) -> String {
        format!("{}/{}", self.entity, self.config)
    }
}

/// Aggregated result of an inference run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Backend name.
    pub tool: String,
    /// Version string reported by the backend.
    pub tool_version: String,
    /// One outcome per configuration run, in specification order.
    pub outcomes: Vec<ConfigOutcome>,
    /// Entities skipped through `exclude_entities`.
    pub skipped_entities: Vec<String>,
}

impl RunReport {
    /// Creates an empty report for `tool`.
    pub fn new(tool: impl Into<String>, tool_version: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            tool_version: tool_version.into(),
            outcomes: Vec::new(),
            skipped_entities: Vec::new(),
        }
    }

    /// Number of configurations that passed.
    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    /// Number of configurations that failed.
    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.passed_count()
    }

    /// Returns true if every configuration passed.
    pub fn success(&self) -> bool {
        self.outcomes.iter().all(ConfigOutcome::passed)
    }

    /// Iterates over the failed configurations.
    pub fn failures(&self) -> impl Iterator<Item = &ConfigOutcome> {
        self.outcomes.iter().filter(|o| !o.passed())
    }
}
