//! Last-update marker shared between the build trigger and subscribers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Millisecond timestamp of the most recently completed rebuild attempt.
///
/// Starts at the creation time. [`advance`](Self::advance) moves it to the
/// current time but always by at least one, so the value strictly increases
/// even when two builds finish within the same millisecond or the wall clock
/// steps backwards.
#[derive(Debug)]
pub struct UpdateMarker {
    last: AtomicU64,
}

impl UpdateMarker {
    /// Create a marker stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last: AtomicU64::new(now_millis()),
        }
    }

    /// Current marker value.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }

    /// Advance to the current time and return the new value.
    pub fn advance(&self) -> u64 {
        let now = now_millis();
        let next = |current: u64| now.max(current.saturating_add(1));
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(next(current))
            })
            .unwrap_or_else(|current| current);
        next(previous)
    }
}

impl Default for UpdateMarker {
    fn default() -> Self {
        Self::new()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_new_marker_is_stamped_now() {
        let before = now_millis();
        let marker = UpdateMarker::new();
        assert!(marker.current() >= before);
    }

    #[test]
    fn test_advance_strictly_increases() {
        let marker = UpdateMarker::new();
        let mut last = marker.current();

        for _ in 0..1000 {
            let next = marker.advance();
            assert!(next > last, "{next} should be greater than {last}");
            assert_eq!(marker.current(), next);
            last = next;
        }
    }

    #[test]
    fn test_advance_from_future_value_still_increases() {
        let marker = UpdateMarker {
            last: AtomicU64::new(now_millis() + 60_000),
        };
        let before = marker.current();

        assert_eq!(marker.advance(), before + 1);
    }

    #[test]
    fn test_concurrent_advances_are_all_distinct() {
        let marker = Arc::new(UpdateMarker::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let marker = Arc::clone(&marker);
                std::thread::spawn(move || (0..100).map(|_| marker.advance()).collect::<Vec<_>>())
            })
            .collect();

        let mut values: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let total = values.len();
        values.sort_unstable();
        values.dedup();

        assert_eq!(values.len(), total);
    }
}
