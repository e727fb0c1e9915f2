//! Synthesis tool backends for resource-inference regression tests.
//!
//! This crate provides the [`SynthesisTool`] trait that abstracts over the
//! external FPGA toolchains an entity can be built with, the
//! [`ResourceReport`] they produce, and the concrete backends. Each backend
//! knows how to drive its toolchain, where its utilization log lives, how to
//! read it, and what the reduction scaffolds used around unused ports cost on
//! its device.
//!
//! # Usage
//!
//! Use [`load_tool`] to create a backend by name, rooted at a project
//! directory:
//!
//! ```
//! use infer_tools::load_tool;
//!
//! let tool = load_tool("cologne", std::path::Path::new("build/fifo/Default")).unwrap();
//! assert_eq!(tool.name(), "cologne");
//! assert_eq!(tool.in_reduce_resources(8).get("CPE LT"), 28.0);
//! ```

#![warn(missing_docs)]

pub mod cologne;
pub mod error;
pub mod job;
pub mod parse;
pub mod process;
pub mod project;
pub mod report;

use std::path::{Path, PathBuf};

use infer_config::Generics;

pub use cologne::{CologneSettings, CologneTool};
pub use error::ToolError;
pub use job::JobState;
pub use parse::{parse_resource_log, ResourceKeyword};
pub use report::ResourceReport;

/// An external synthesis toolchain that builds one job.
///
/// An instance is rooted at one project directory, set at construction, and
/// runs exactly one job in it. The driver only ever holds a
/// `Box<dyn SynthesisTool>`.
pub trait SynthesisTool: std::fmt::Debug {
    /// Returns the backend name (e.g. `"cologne"`), used to select tool generics.
    fn name(&self) -> &str;

    /// Returns the directory the job's scripts and artifacts are written to.
    fn project_dir(&self) -> &Path;

    /// Returns the state of this instance's job.
    fn state(&self) -> JobState;

    /// Synthesizes `files` with `top_entity` as top level.
    ///
    /// `generics` override the top-level generics; an empty map synthesizes
    /// the entity's defaults. Blocks until the toolchain exits or the
    /// backend's time bound elapses.
    ///
    /// # Errors
    ///
    /// [`ToolError::Synthesis`] if the toolchain exits non-zero or cannot be
    /// started, [`ToolError::Timeout`] if it is killed after the time bound,
    /// [`ToolError::UnsupportedInput`] if an input cannot be handed to the
    /// toolchain, [`ToolError::InvalidState`] if this instance already ran a job.
    fn synthesize(
        &mut self,
        files: &[PathBuf],
        top_entity: &str,
        generics: &Generics,
    ) -> Result<(), ToolError>;

    /// Returns the toolchain's version string.
    ///
    /// # Errors
    ///
    /// [`ToolError::ToolUnavailable`] if the toolchain cannot be queried.
    fn version(&self) -> Result<String, ToolError>;

    /// Parses the resource usage of the last successful run.
    ///
    /// # Errors
    ///
    /// [`ToolError::InvalidState`] unless the job succeeded,
    /// [`ToolError::ReportNotFound`] if the utilization log is missing.
    fn resource_usage(&self) -> Result<ResourceReport, ToolError>;

    /// Modeled cost of an input reduction scaffold of `size` bits.
    fn in_reduce_resources(&self, size: u32) -> ResourceReport;

    /// Modeled cost of an output reduction scaffold of `size` bits.
    fn out_reduce_resources(&self, size: u32) -> ResourceReport;

    /// Runs backend-specific design-rule checks on the synthesized design.
    ///
    /// # Errors
    ///
    /// [`ToolError::InvalidState`] unless the job succeeded,
    /// [`ToolError::DrcViolation`] if a rule is violated.
    fn check_drc(&self) -> Result<(), ToolError>;

    /// Fails with [`ToolError::InvalidState`] unless the job has succeeded.
    fn ensure_succeeded(&self, operation: &'static str) -> Result<(), ToolError> {
        match self.state() {
            JobState::Succeeded => Ok(()),
            state => Err(ToolError::InvalidState { operation, state }),
        }
    }
}

/// Canonical names of the available backends.
pub fn available_tools() -> &'static [&'static str] {
    &[CologneTool::NAME]
}

/// Creates a backend by name, rooted at `project_dir`.
///
/// Supported names: `"cologne"` (aliases `"gatemate"`, `"cologne-chip"`,
/// `"oss-cad-suite"`). Matching is case-insensitive.
///
/// # Errors
///
/// Returns [`ToolError::UnknownTool`] if the name is not recognized.
pub fn load_tool(name: &str, project_dir: &Path) -> Result<Box<dyn SynthesisTool>, ToolError> {
    match name.to_ascii_lowercase().as_str() {
        "cologne" | "gatemate" | "cologne-chip" | "cologne_chip" | "oss-cad-suite" => {
            Ok(Box::new(CologneTool::new(project_dir)))
        }
        _ => Err(ToolError::UnknownTool(name.to_string())),
    }
}
