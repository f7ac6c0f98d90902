//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// No file in the output directory answers the request path.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The listen address could not be bound.
    #[error("Cannot listen on {address}: {source}")]
    Bind {
        /// Address as given in the configuration.
        address: String,
        /// Underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// The project watcher failed to start or stopped working.
    #[error(transparent)]
    Watch(#[from] siteloop_watch::WatchError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Bind { .. } | Self::Watch(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}
