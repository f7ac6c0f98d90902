//! Watch event types and the change handler seam.

use std::path::PathBuf;

/// Kind of filesystem change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchEventKind {
    /// File or directory was created.
    Created,
    /// File contents changed.
    Modified,
    /// File or directory was removed.
    Removed,
}

impl WatchEventKind {
    /// Map a notify event kind, skipping reads.
    ///
    /// The HTTP server reads files under the watched root on every request, so
    /// access events must never count as changes. Metadata-only changes (a
    /// bare `touch`, a chmod) count as modifications only when `metadata` is
    /// set.
    pub(crate) fn from_notify(kind: &notify::EventKind, metadata: bool) -> Option<Self> {
        use notify::EventKind;
        use notify::event::ModifyKind;

        match kind {
            EventKind::Create(_) => Some(Self::Created),
            EventKind::Modify(ModifyKind::Metadata(_)) if !metadata => None,
            EventKind::Modify(_) => Some(Self::Modified),
            EventKind::Remove(_) => Some(Self::Removed),
            _ => None,
        }
    }
}

/// A debounced change under the watched root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchEvent {
    /// Path relative to the watched root (e.g., "content/post.md").
    pub path: PathBuf,
    /// Kind of change.
    pub kind: WatchEventKind,
}

/// Receives batches of changes from a running watch session.
///
/// Called synchronously on the session's dispatcher thread. No further batch
/// is delivered until the call returns.
pub trait ChangeHandler: Send + Sync + 'static {
    /// Handle a non-empty batch of changes.
    fn on_change(&self, events: &[WatchEvent]);
}

impl<F> ChangeHandler for F
where
    F: Fn(&[WatchEvent]) + Send + Sync + 'static,
{
    fn on_change(&self, events: &[WatchEvent]) {
        self(events);
    }
}
