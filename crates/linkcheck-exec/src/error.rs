//! Error types for process execution.

/// Errors raised while running an artifact.
///
/// Deciding not to run an artifact is never an error; see
/// [`crate::SkipReason`].
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The plan was `Skip`; there is nothing to execute.
    #[error("cannot execute a skipped plan")]
    NothingToRun,

    /// The program could not be started.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on or killing the child failed.
    #[error("failed to wait for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A captured stream could not be read to completion.
    #[error("failed to read {stream} of '{program}': {source}")]
    Capture {
        program: String,
        stream: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for execution operations.
pub type Result<T> = std::result::Result<T, ExecError>;
