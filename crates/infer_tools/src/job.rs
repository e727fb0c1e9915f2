//! Lifecycle of a single synthesis job.

use serde::Serialize;
use std::fmt;

/// The state of one synthesis job.
///
/// A tool instance runs exactly one job: `NotStarted → Running → Succeeded`,
/// `Failed` or `TimedOut`. Resource queries and design-rule checks are only
/// valid once the job has succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// `synthesize` has not been called yet.
    NotStarted,
    /// The external toolchain is running.
    Running,
    /// The toolchain exited with status zero.
    Succeeded,
    /// The toolchain exited non-zero, or could not be started (`None`).
    Failed {
        /// Exit code of the toolchain, if it produced one.
        status: Option<i32>,
    },
    /// The toolchain exceeded the backend's time bound and was killed.
    TimedOut,
}

impl JobState {
    /// Returns true once the job has reached a final state.
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed { .. } | JobState::TimedOut
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::NotStarted => f.write_str("not started"),
            JobState::Running => f.write_str("running"),
            JobState::Succeeded => f.write_str("succeeded"),
            JobState::Failed { status: Some(code) } => write!(f, "failed (exit code {code})"),
            JobState::Failed { status: None } => f.write_str("failed (not started)"),
            JobState::TimedOut => f.write_str("timed out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finished_states() {
        assert!(!JobState::NotStarted.is_finished());
        assert!(!JobState::Running.is_finished());
        assert!(JobState::Succeeded.is_finished());
        assert!(JobState::Failed { status: Some(1) }.is_finished());
        assert!(JobState::TimedOut.is_finished());
    }

    #[test]
    fn display() {
        assert_eq!(JobState::NotStarted.to_string(), "not started");
        assert_eq!(
            JobState::Failed { status: Some(2) }.to_string(),
            "failed (exit code 2)"
        );
        assert_eq!(
            JobState::Failed { status: None }.to_string(),
            "failed (not started)"
        );
    }
}
