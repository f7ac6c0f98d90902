//! Update publisher.
//!
//! Broadcast by polling: every subscriber remembers the last marker value it
//! saw and compares it with the shared marker on each tick. There is no
//! registry of subscribers and no history, so a subscriber only hears about
//! rebuilds that complete after it was created.

use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use siteloop_build::UpdateMarker;
use tokio::time::MissedTickBehavior;

/// One connected live reload client.
pub(crate) struct Subscriber {
    marker: Arc<UpdateMarker>,
    seen: u64,
}

impl Subscriber {
    /// Subscribe at the current marker value.
    pub(crate) fn new(marker: Arc<UpdateMarker>) -> Self {
        let seen = marker.current();
        Self { marker, seen }
    }

    /// Check the marker once.
    ///
    /// Returns `true` if it advanced since the last check. Any number of
    /// advances in between count as one.
    pub(crate) fn poll(&mut self) -> bool {
        let current = self.marker.current();
        if current > self.seen {
            self.seen = current;
            true
        } else {
            false
        }
    }
}

/// Stream yielding once per observed marker advance, checked every `interval`.
///
/// The subscription starts when this is called, not when the stream is
/// first polled.
pub(crate) fn updates(
    marker: Arc<UpdateMarker>,
    interval: Duration,
) -> impl Stream<Item = ()> + Send + 'static {
    let subscriber = Subscriber::new(marker);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    futures::stream::unfold(
        (subscriber, ticker),
        |(mut subscriber, mut ticker)| async move {
            loop {
                ticker.tick().await;
                if subscriber.poll() {
                    return Some(((), (subscriber, ticker)));
                }
            }
        },
    )
}
