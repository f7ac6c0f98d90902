//! Watch error type.

use std::path::PathBuf;

/// Error raised by a watch session.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The recursive subscription on the root could not be established.
    #[error("Cannot watch {}: {source}", path.display())]
    Subscribe {
        /// Root that was being watched.
        path: PathBuf,
        /// Backend error.
        #[source]
        source: notify::Error,
    },

    /// The watcher backend failed after startup.
    #[error("File watcher failed: {0}")]
    Backend(#[from] notify::Error),

    /// An ignore pattern is not a valid glob.
    #[error("Invalid ignore pattern {pattern:?}: {source}")]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// Glob compile error.
        #[source]
        source: glob::PatternError,
    },

    /// `start()` was called on a session that is already running.
    #[error("Watch session already started")]
    AlreadyStarted,
}
