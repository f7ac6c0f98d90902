//! Recursive, pausable watch session.
//!
//! A [`WatchSession`] subscribes to a project root with `notify`, feeds raw
//! events into a debouncing buffer, and hands ready batches to a
//! [`ChangeHandler`] on a dedicated dispatcher thread.
//!
//! The session can be paused through a [`WatchControl`]. While paused, raw
//! events are dropped on arrival. Resuming waits one settle interval, drops
//! whatever is still buffered, and only then accepts events again, so the tail
//! of a build's own writes never reaches the handler.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::Duration;

use glob::Pattern;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::oneshot;

use crate::error::WatchError;
use crate::event::{ChangeHandler, WatchEvent, WatchEventKind};
use crate::pending::PendingChanges;

/// How often the dispatcher checks the buffer for ready events.
const DRAIN_TICK: Duration = Duration::from_millis(50);

/// Resolves with the first backend error reported after `start()`.
///
/// Closes without a value once the session stops.
pub type FailureReceiver = oneshot::Receiver<WatchError>;

/// Sender half shared by the notify callback and the running session.
///
/// Whoever takes it first wins: the callback on a backend error, or
/// `stop()`, which drops it to close the channel.
type FailureSender = Arc<Mutex<Option<oneshot::Sender<WatchError>>>>;

/// Options for a watch session.
#[derive(Clone, Debug)]
pub struct WatchOptions {
    /// Debounce window, and the wait performed by `resume()`.
    pub settle: Duration,
    /// Glob patterns relative to the root that are never reported.
    pub ignore: Vec<String>,
    /// Report metadata-only changes, such as a bare `touch`, as modifications.
    pub metadata: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(500),
            ignore: Vec::new(),
            metadata: false,
        }
    }
}

/// State shared by the notify callback, the dispatcher and every control.
struct WatchState {
    root: PathBuf,
    paused: AtomicBool,
    pending: PendingChanges,
    settle: Duration,
    ignore: Vec<Pattern>,
    metadata: bool,
}

impl WatchState {
    /// Record a raw notify event unless paused or ignored.
    fn record(&self, event: &notify::Event) {
        let Some(kind) = WatchEventKind::from_notify(&event.kind, self.metadata) else {
            return;
        };

        if self.paused.load(Ordering::SeqCst) {
            tracing::trace!(paths = ?event.paths, "Discarded event while paused");
            return;
        }

        for path in &event.paths {
            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            if self.ignore.iter().any(|p| p.matches_path(relative)) {
                continue;
            }

            self.pending.record(path.clone(), kind);
            tracing::debug!(path = %relative.display(), ?kind, "Recorded filesystem event");
        }
    }

    /// Take the batch of events whose debounce deadline has passed.
    ///
    /// Always empty while paused.
    fn take_ready(&self) -> Vec<WatchEvent> {
        if self.paused.load(Ordering::SeqCst) {
            return Vec::new();
        }

        self.pending
            .drain_ready()
            .into_iter()
            .filter_map(|event| {
                let relative = event.path.strip_prefix(&self.root).ok()?;
                Some(WatchEvent {
                    path: relative.to_path_buf(),
                    kind: event.kind,
                })
            })
            .collect()
    }
}

/// Cloneable handle for pausing and resuming a session.
#[derive(Clone)]
pub struct WatchControl {
    state: Arc<WatchState>,
}

impl WatchControl {
    /// Stop delivering events. Events arriving from now on are discarded.
    pub fn pause(&self) {
        self.state.paused.store(true, Ordering::SeqCst);
        tracing::debug!("Watcher paused");
    }

    /// Resume delivery after the settle interval.
    ///
    /// Blocks for the settle interval so in-flight events caused before the
    /// call land while still paused, then drops everything buffered.
    pub fn resume(&self) {
        std::thread::sleep(self.state.settle);
        let dropped = self.state.pending.clear();
        self.state.paused.store(false, Ordering::SeqCst);
        tracing::debug!(dropped, "Watcher resumed");
    }

    /// Whether the session is currently paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state.paused.load(Ordering::SeqCst)
    }

    /// Pause until the returned guard is dropped.
    ///
    /// The guard resumes on every exit path, including early returns and
    /// panics, so the watcher is never left paused.
    #[must_use = "the watcher resumes as soon as the guard is dropped"]
    pub fn ignore_events(&self) -> PauseGuard<'_> {
        self.pause();
        PauseGuard { control: self }
    }
}

/// Scoped pause created by [`WatchControl::ignore_events`].
pub struct PauseGuard<'a> {
    control: &'a WatchControl,
}

impl Drop for PauseGuard<'_> {
    fn drop(&mut self) {
        self.control.resume();
    }
}

/// Keeps the OS watcher and the dispatcher alive.
///
/// Dropping it stops the watcher and disconnects the dispatcher's shutdown
/// channel, which ends the dispatcher at its next tick. The notify backend
/// may free its callback later, so the failure sender is closed explicitly.
struct Running {
    _watcher: RecommendedWatcher,
    _shutdown: mpsc::Sender<()>,
    failure_tx: FailureSender,
}

impl Drop for Running {
    fn drop(&mut self) {
        self.failure_tx.lock().unwrap().take();
    }
}

/// Recursive watch on one project root.
pub struct WatchSession {
    state: Arc<WatchState>,
    running: Option<Running>,
}

impl WatchSession {
    /// Create a session for `root`.
    ///
    /// The root is canonicalized so it matches the absolute paths reported by
    /// the OS backend.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Subscribe`] if the root cannot be resolved and
    /// [`WatchError::Pattern`] for an invalid ignore glob.
    pub fn new(root: &Path, options: WatchOptions) -> Result<Self, WatchError> {
        let root = std::fs::canonicalize(root).map_err(|e| WatchError::Subscribe {
            path: root.to_path_buf(),
            source: notify::Error::io(e),
        })?;

        let ignore = options
            .ignore
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|source| WatchError::Pattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            state: Arc::new(WatchState {
                root,
                paused: AtomicBool::new(false),
                pending: PendingChanges::new(options.settle),
                settle: options.settle,
                ignore,
                metadata: options.metadata,
            }),
            running: None,
        })
    }

    /// Canonical root being watched.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.state.root
    }

    /// Handle for pausing and resuming this session from other threads.
    #[must_use]
    pub fn control(&self) -> WatchControl {
        WatchControl {
            state: Arc::clone(&self.state),
        }
    }

    /// Pause event delivery. See [`WatchControl::pause`].
    pub fn pause(&self) {
        self.control().pause();
    }

    /// Resume event delivery. See [`WatchControl::resume`].
    pub fn resume(&self) {
        self.control().resume();
    }

    /// Whether the OS subscription is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Start watching the root recursively.
    ///
    /// Ready batches are passed to `handler` on the dispatcher thread. A
    /// backend error after startup is delivered once on the returned
    /// [`FailureReceiver`].
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Subscribe`] if the recursive subscription fails
    /// and [`WatchError::AlreadyStarted`] if the session is running.
    pub fn start<H: ChangeHandler>(&mut self, handler: H) -> Result<FailureReceiver, WatchError> {
        if self.running.is_some() {
            return Err(WatchError::AlreadyStarted);
        }

        let (failure_tx, failure_rx) = oneshot::channel();
        let failure_tx: FailureSender = Arc::new(Mutex::new(Some(failure_tx)));
        let failure_tx_for_watcher = Arc::clone(&failure_tx);
        let state_for_watcher = Arc::clone(&self.state);

        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                match res {
                    Ok(event) => state_for_watcher.record(&event),
                    Err(e) => {
                        tracing::error!(error = %e, "File watcher backend failed");
                        if let Some(tx) = failure_tx_for_watcher.lock().unwrap().take() {
                            let _ = tx.send(WatchError::Backend(e));
                        }
                    }
                }
            })
            .map_err(|source| WatchError::Subscribe {
                path: self.state.root.clone(),
                source,
            })?;

        watcher
            .watch(&self.state.root, RecursiveMode::Recursive)
            .map_err(|source| WatchError::Subscribe {
                path: self.state.root.clone(),
                source,
            })?;

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let state = Arc::clone(&self.state);

        std::thread::spawn(move || {
            loop {
                match shutdown_rx.recv_timeout(DRAIN_TICK) {
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                }

                let events = state.take_ready();
                if !events.is_empty() {
                    handler.on_change(&events);
                }
            }
            tracing::debug!("Watch dispatcher stopped");
        });

        self.running = Some(Running {
            _watcher: watcher,
            _shutdown: shutdown_tx,
            failure_tx,
        });
        tracing::info!(root = %self.state.root.display(), "Watching for changes");

        Ok(failure_rx)
    }

    /// Stop watching. Does not wait for a handler call in progress.
    ///
    /// The [`FailureReceiver`] returned by `start()` is closed before this
    /// returns.
    pub fn stop(&mut self) {
        if self.running.take().is_some() {
            tracing::info!(root = %self.state.root.display(), "Stopped watching");
        }
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        self.stop();
    }
}
