//! Application state.
//!
//! Shared state for all request handlers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use siteloop_build::UpdateMarker;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Directory the build writes the site into.
    pub(crate) output_dir: PathBuf,
    /// Marker advanced by the build trigger.
    pub(crate) marker: Arc<UpdateMarker>,
    /// How often each live reload stream checks the marker.
    pub(crate) poll_interval: Duration,
}
