//! Pending changes buffered until the project goes quiet.
//!
//! Changes accumulate as one batch. The batch is released only after no new
//! change has arrived for the settle interval, so a save touching several
//! files, or an editor writing a file in several steps, yields one rebuild.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::event::WatchEventKind;

/// A buffered change with its absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingChange {
    pub path: PathBuf,
    pub kind: WatchEventKind,
}

#[derive(Default)]
struct Batch {
    changes: BTreeMap<PathBuf, WatchEventKind>,
    last_change: Option<Instant>,
}

/// Thread-safe change buffer with a quiet-period release.
pub(crate) struct PendingChanges {
    batch: Mutex<Batch>,
    quiet: Duration,
}

impl PendingChanges {
    /// Create a buffer that releases after `quiet` without new changes.
    pub fn new(quiet: Duration) -> Self {
        Self {
            batch: Mutex::new(Batch::default()),
            quiet,
        }
    }

    /// Add a change and restart the quiet period.
    pub fn record(&self, path: PathBuf, kind: WatchEventKind) {
        let mut batch = self.batch.lock().unwrap();
        batch.last_change = Some(Instant::now());

        let merged = match batch.changes.get(&path) {
            Some(&earlier) => merge(earlier, kind),
            None => Some(kind),
        };
        match merged {
            Some(kind) => {
                batch.changes.insert(path, kind);
            }
            None => {
                batch.changes.remove(&path);
            }
        }
    }

    /// Take the whole batch if the quiet period has elapsed.
    ///
    /// Changes come back sorted by path.
    pub fn drain_ready(&self) -> Vec<PendingChange> {
        let mut batch = self.batch.lock().unwrap();
        let settled = batch
            .last_change
            .is_some_and(|at| at.elapsed() >= self.quiet);
        if !settled {
            return Vec::new();
        }

        batch.last_change = None;
        std::mem::take(&mut batch.changes)
            .into_iter()
            .map(|(path, kind)| PendingChange { path, kind })
            .collect()
    }

    /// Drop everything buffered. Returns how many changes were dropped.
    pub fn clear(&self) -> usize {
        let mut batch = self.batch.lock().unwrap();
        batch.last_change = None;
        let dropped = batch.changes.len();
        batch.changes.clear();
        dropped
    }

    /// Number of buffered changes.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.batch.lock().unwrap().changes.len()
    }
}

/// Fold a later change into an earlier one for the same path.
///
/// `None` means the path came and went within the batch.
fn merge(earlier: WatchEventKind, later: WatchEventKind) -> Option<WatchEventKind> {
    use WatchEventKind::{Created, Modified, Removed};

    match (earlier, later) {
        (Created, Removed) => None,
        (Created, _) => Some(Created),
        // Delete then create is how many editors save: treat as an edit.
        (Removed, Created) => Some(Modified),
        (Removed, _) | (Modified, Removed) => Some(Removed),
        (Modified, later) => Some(later),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::thread;

    const QUIET: Duration = Duration::from_millis(20);

    fn settle() {
        thread::sleep(QUIET + Duration::from_millis(10));
    }

    #[test]
    fn test_batch_released_after_quiet_period() {
        let pending = PendingChanges::new(QUIET);
        let path = PathBuf::from("/site/content/post.md");

        pending.record(path.clone(), WatchEventKind::Modified);
        assert!(pending.drain_ready().is_empty());

        settle();

        assert_eq!(
            pending.drain_ready(),
            vec![PendingChange {
                path,
                kind: WatchEventKind::Modified,
            }]
        );
        assert!(pending.drain_ready().is_empty());
    }

    #[test]
    fn test_new_change_restarts_quiet_period() {
        let pending = PendingChanges::new(Duration::from_millis(60));

        pending.record(PathBuf::from("/site/a.md"), WatchEventKind::Modified);
        thread::sleep(Duration::from_millis(40));
        pending.record(PathBuf::from("/site/b.md"), WatchEventKind::Modified);
        thread::sleep(Duration::from_millis(40));

        // 80ms since the first change, only 40ms since the second.
        assert!(pending.drain_ready().is_empty());

        thread::sleep(Duration::from_millis(40));
        let paths: Vec<_> = pending.drain_ready().into_iter().map(|c| c.path).collect();
        assert_eq!(
            paths,
            vec![PathBuf::from("/site/a.md"), PathBuf::from("/site/b.md")]
        );
    }

    #[test]
    fn test_repeated_changes_to_one_path_collapse() {
        let pending = PendingChanges::new(QUIET);
        let path = PathBuf::from("/site/content/post.md");

        for _ in 0..5 {
            pending.record(path.clone(), WatchEventKind::Modified);
        }
        settle();

        assert_eq!(pending.drain_ready().len(), 1);
    }

    #[test]
    fn test_swap_file_created_and_removed_vanishes() {
        let pending = PendingChanges::new(QUIET);
        let swap = PathBuf::from("/site/content/.post.md.swp");

        pending.record(swap.clone(), WatchEventKind::Created);
        pending.record(swap, WatchEventKind::Removed);
        pending.record(PathBuf::from("/site/content/post.md"), WatchEventKind::Modified);
        settle();

        let paths: Vec<_> = pending.drain_ready().into_iter().map(|c| c.path).collect();
        assert_eq!(paths, vec![PathBuf::from("/site/content/post.md")]);
    }

    #[test]
    fn test_clear_drops_batch() {
        let pending = PendingChanges::new(QUIET);

        pending.record(PathBuf::from("/site/a.md"), WatchEventKind::Modified);
        pending.record(PathBuf::from("/site/b.md"), WatchEventKind::Created);
        assert_eq!(pending.len(), 2);

        assert_eq!(pending.clear(), 2);
        assert_eq!(pending.len(), 0);

        settle();
        assert!(pending.drain_ready().is_empty());
    }

    #[test]
    fn test_merge() {
        use WatchEventKind::{Created, Modified, Removed};

        assert_eq!(merge(Created, Modified), Some(Created));
        assert_eq!(merge(Created, Removed), None);
        assert_eq!(merge(Modified, Modified), Some(Modified));
        assert_eq!(merge(Modified, Created), Some(Created));
        assert_eq!(merge(Modified, Removed), Some(Removed));
        assert_eq!(merge(Removed, Created), Some(Modified));
        assert_eq!(merge(Removed, Modified), Some(Removed));
    }
}
