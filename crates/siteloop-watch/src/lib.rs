//! Pausable recursive file watcher for siteloop.
//!
//! [`WatchSession`] watches a project root and delivers debounced batches of
//! [`WatchEvent`]s to a [`ChangeHandler`]. A [`WatchControl`] pauses delivery
//! while the project rebuilds itself, so the build's own writes never trigger
//! another build.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use siteloop_watch::{WatchOptions, WatchSession};
//!
//! let mut session = WatchSession::new(Path::new("blog"), WatchOptions::default())?;
//! let control = session.control();
//! session.start(move |events: &[siteloop_watch::WatchEvent]| {
//!     let _guard = control.ignore_events();
//!     rebuild(events);
//! })?;
//! ```

mod error;
mod event;
mod pending;
mod session;

pub use error::WatchError;
pub use event::{ChangeHandler, WatchEvent, WatchEventKind};
pub use session::{FailureReceiver, PauseGuard, WatchControl, WatchOptions, WatchSession};
