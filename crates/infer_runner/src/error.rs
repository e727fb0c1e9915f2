//! Errors that abort an inference run.

use infer_tools::ToolError;

/// A condition under which no further configuration can be run.
///
/// Failures of individual configurations are not errors at this level; they
/// are recorded in the [`RunReport`](crate::RunReport).
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The backend is unknown or its toolchain cannot be queried.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The output directory could not be created.
    #[error("failed to prepare output directory: {0}")]
    IoError(#[from] std::io::Error),
}
