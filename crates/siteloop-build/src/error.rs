//! Build error type.

/// Error raised when the build tool could not be run.
///
/// A build that runs and exits non-zero is not an error; see
/// [`BuildReport`](crate::BuildReport).
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The build program could not be started.
    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        /// Command line that was attempted.
        command: String,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error while waiting for the build process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
