//! Build trigger.
//!
//! Runs one rebuild per change batch with the watcher paused, then advances
//! the shared [`UpdateMarker`] so connected browsers reload.

use std::io::{Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use siteloop_watch::{ChangeHandler, WatchControl, WatchEvent};

use crate::command::{BuildCommand, BuildReport};
use crate::error::BuildError;
use crate::marker::UpdateMarker;

/// Serialized rebuilds driven by watcher notifications.
///
/// Output of the build tool is forwarded to `W`, stdout by default.
pub struct BuildTrigger<W = Stdout> {
    command: BuildCommand,
    control: WatchControl,
    marker: Arc<UpdateMarker>,
    output: Mutex<W>,
    in_flight: AtomicBool,
}

impl BuildTrigger {
    /// Create a trigger that forwards build output to stdout.
    #[must_use]
    pub fn new(command: BuildCommand, control: WatchControl, marker: Arc<UpdateMarker>) -> Self {
        Self::with_output(command, control, marker, std::io::stdout())
    }
}

impl<W: Write + Send> BuildTrigger<W> {
    /// Create a trigger that forwards build output to `output`.
    #[must_use]
    pub fn with_output(
        command: BuildCommand,
        control: WatchControl,
        marker: Arc<UpdateMarker>,
        output: W,
    ) -> Self {
        Self {
            command,
            control,
            marker,
            output: Mutex::new(output),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Marker advanced after every completed rebuild attempt.
    #[must_use]
    pub fn marker(&self) -> &Arc<UpdateMarker> {
        &self.marker
    }

    /// Build command run by this trigger.
    #[must_use]
    pub fn command(&self) -> &BuildCommand {
        &self.command
    }

    /// Rebuild the site once.
    ///
    /// The watcher is paused from before spawn until after exit, then the
    /// marker advances whatever the exit status. Returns `Ok(None)` without
    /// running anything if another rebuild is already in flight.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if the build tool could not be run. The marker
    /// is left unchanged in that case since nothing was rebuilt.
    pub fn rebuild(&self) -> Result<Option<BuildReport>, BuildError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Rebuild already in flight, skipping");
            return Ok(None);
        }

        let result = {
            let _paused = self.control.ignore_events();
            tracing::info!(command = %self.command.display(), "Rebuilding site");
            self.command.run(&self.output)
        };

        let outcome = match result {
            Ok(report) => {
                let marker = self.marker.advance();
                let elapsed_ms = report.elapsed.as_secs_f64() * 1000.0;
                if report.success() {
                    tracing::info!(elapsed_ms, marker, "Rebuild finished");
                } else {
                    tracing::warn!(
                        elapsed_ms,
                        marker,
                        code = ?report.status.code(),
                        "Rebuild failed"
                    );
                }
                Ok(Some(report))
            }
            Err(e) => Err(e),
        };

        self.in_flight.store(false, Ordering::SeqCst);
        outcome
    }
}

impl<W: Write + Send + 'static> ChangeHandler for BuildTrigger<W> {
    fn on_change(&self, events: &[WatchEvent]) {
        for event in events {
            tracing::debug!(path = %event.path.display(), kind = ?event.kind, "Change detected");
        }
        tracing::info!(changes = events.len(), "Source changed");

        if let Err(e) = self.rebuild() {
            tracing::error!(error = %e, "Rebuild could not run");
        }
    }
}
