//! Server-sent events endpoint.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};

use super::publisher;
use crate::state::AppState;

/// SSE event name the reload client listens for.
const UPDATE_EVENT: &str = "update";

/// Stream one `update` event per rebuild for as long as the client stays
/// connected.
pub(crate) async fn event_source(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!("Live reload client connected");

    let stream = publisher::updates(Arc::clone(&state.marker), state.poll_interval).map(|()| {
        tracing::debug!("Sending reload event");
        Ok(Event::default().event(UPDATE_EVENT).data("_"))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
