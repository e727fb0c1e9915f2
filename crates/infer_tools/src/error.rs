//! Error types for synthesis tool backends.

use crate::job::JobState;
use std::path::PathBuf;
use std::time::Duration;

/// Errors raised by a [`SynthesisTool`](crate::SynthesisTool).
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The toolchain exited non-zero or could not be started.
    #[error("{tool} synthesis of '{top_entity}' failed ({}) - see {}", describe_status(*status), log.display())]
    Synthesis {
        /// Backend name.
        tool: String,
        /// Top-level entity being synthesized.
        top_entity: String,
        /// Exit code, `None` if the process never ran or was killed by a signal.
        status: Option<i32>,
        /// Log capturing the toolchain output.
        log: PathBuf,
    },

    /// The toolchain did not finish within the backend's time bound.
    #[error("{tool} synthesis of '{top_entity}' timed out after {}s - see {}", timeout.as_secs(), log.display())]
    Timeout {
        /// Backend name.
        tool: String,
        /// Top-level entity being synthesized.
        top_entity: String,
        /// The bound that was exceeded.
        timeout: Duration,
        /// Log capturing the toolchain output up to the timeout.
        log: PathBuf,
    },

    /// The backend binary is missing or could not be queried.
    #[error("{tool} is not available: {message}")]
    ToolUnavailable {
        /// Backend name.
        tool: String,
        /// What went wrong while querying it.
        message: String,
    },

    /// The log artifact expected after a successful run is missing.
    #[error("report '{file}' not found in {}", project_dir.display())]
    ReportNotFound {
        /// File name that was searched for.
        file: String,
        /// Project directory that was searched.
        project_dir: PathBuf,
    },

    /// An input the toolchain cannot be given, such as a path yosys would split.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// A post-synthesis design-rule check failed.
    #[error("design rule violation: {0}")]
    DrcViolation(String),

    /// An operation was called in a job state that does not allow it.
    #[error("cannot {operation} while job is {state}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// The job state at the time of the call.
        state: JobState,
    },

    /// No backend with the requested name exists.
    #[error("unknown synthesis tool '{0}'")]
    UnknownTool(String),

    /// An I/O error while preparing the project directory or reading a log.
    #[error("tool I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ToolError {
    /// Returns true if no further job can succeed after this error.
    ///
    /// Everything else only fails the configuration that raised it.
    pub fn aborts_run(&self) -> bool {
        matches!(
            self,
            ToolError::ToolUnavailable { .. } | ToolError::UnknownTool(_)
        )
    }
}

fn describe_status(status: Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {code}"),
        None => "no exit code".to_string(),
    }
}
