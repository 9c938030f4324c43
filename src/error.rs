//! Fatal, session-aborting errors.
//!
//! These are distinct from [`crate::diagnostics::Diagnostics`]: a diagnostic is a recoverable
//! condition recorded while a pass keeps running, a fatal [`Error`] means the pass (or the whole
//! session) could not run to completion at all.

use std::path::PathBuf;

/// Errors that can abort a compilation session outright.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Execution fuel exhausted (too many parser or semantic-engine operations).
    #[error("execution limit exceeded")]
    ExecFuelExhausted,

    /// Recursion fuel exhausted (input nested too deeply).
    #[error("recursion limit exceeded")]
    RecursionLimitExceeded,

    #[error("failed to read source file {path:?}: {message}")]
    SourceLoad { path: PathBuf, message: String },

    #[error("source file {path:?} is not valid UTF-8 at byte {offset}")]
    InvalidUtf8 { path: PathBuf, offset: usize },

    #[error("parsing failed with {0} error(s)")]
    ParseFailed(usize),

    #[error("semantic analysis failed with {0} error(s)")]
    AnalysisFailed(usize),
}

/// Result type threaded through fatal-error-producing operations.
pub type Result<T> = std::result::Result<T, Error>;
