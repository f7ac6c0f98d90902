//! Live reload.
//!
//! Each open `/event_source` connection polls the shared update marker and
//! receives one `update` event whenever it has advanced.

mod event_source;
mod publisher;

pub(crate) use event_source::event_source;
