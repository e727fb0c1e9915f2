//! Parsing and validation of inference-test specification files.
//!
//! A specification is a YAML document listing the HDL source files of a
//! library (as include/exclude glob patterns) and the entities to synthesize,
//! each with a set of named configurations. Loading produces a
//! [`TestSpecification`] with the source files resolved and one [`TopLevel`]
//! per entity, ready to be expanded into synthesis jobs.

#![warn(missing_docs)]

pub mod error;
pub mod files;
pub mod loader;
pub mod top_level;
pub mod types;

pub use error::ConfigError;
pub use files::resolve_files;
pub use loader::TestSpecification;
pub use top_level::{TopLevel, DEFAULT_CONFIG_NAME};
pub use types::*;
