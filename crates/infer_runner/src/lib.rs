//! Driver for HDL resource-inference regression tests.
//!
//! Takes a loaded [`TestSpecification`](infer_config::TestSpecification) and
//! a [`ToolFactory`], synthesizes every configuration of every top level in
//! its own job directory, subtracts the modeled cost of the reduction
//! scaffolds from the measured usage and judges the residual. The result is
//! a [`RunReport`] that counts passes and failures and says why each failed
//! configuration failed.

#![warn(missing_docs)]

pub mod compare;
pub mod error;
pub mod outcome;
pub mod runner;

pub use compare::{
    check_resources, predicted_scaffold_cost, Mismatch, MismatchRule, ResourceCheck, Tolerance,
};
pub use error::RunError;
pub use outcome::{ConfigOutcome, Failure, FailureKind, RunReport};
pub use runner::{NamedToolFactory, RunOptions, Runner, ToolFactory};
