//! Error types for specification loading and validation.

/// Errors that can occur when loading or validating a test specification.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the specification or resolving files.
    #[error("failed to read specification: {0}")]
    IoError(#[from] std::io::Error),

    /// The YAML content could not be parsed into the expected shape.
    #[error("failed to parse specification: {0}")]
    ParseError(String),

    /// A required field is missing or empty.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A specification value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// An include or exclude glob pattern is malformed.
    #[error("invalid file pattern '{pattern}': {message}")]
    PatternError {
        /// The offending pattern as written in the specification.
        pattern: String,
        /// Why the pattern was rejected.
        message: String,
    },
}
