// src/error.rs

//! Error types shared by the resolver and the kitchen

use thiserror::Error;

/// Errors produced while resolving or cooking a recipe
#[derive(Error, Debug)]
pub enum Error {
    /// An option name that the recipe does not recognize
    #[error("Unknown option: {0}")]
    UnknownOptionError(String),

    /// An invariant was violated (for example a deleted option was read)
    /// or an explicit configuration input is missing
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A dependency request could not be resolved
    #[error("Unresolved dependency: {0}")]
    UnresolvedDependencyError(String),

    /// A required external build tool is not installed
    #[error("Build tool not found: {tool} (acquire {requirement} to continue)")]
    ToolNotFoundError { tool: String, requirement: String },

    /// A source edit or patch file failed to apply
    #[error("Failed to apply {target}: {reason}")]
    PatchApplicationError { target: String, reason: String },

    /// The external build tool exited unsuccessfully
    #[error("{phase} phase failed with exit code {code:?}\n{output}")]
    BuildToolError {
        phase: String,
        code: Option<i32>,
        output: String,
    },

    /// Source retrieval failed
    #[error("Fetch failed: {0}")]
    FetchError(String),

    /// Downloaded content does not match the recipe checksum
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// Recipe or value parsing failed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Filesystem plumbing failed with context
    #[error("I/O error: {0}")]
    IoError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error can be recovered from by acquiring a missing tool
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::ToolNotFoundError { .. })
    }
}
