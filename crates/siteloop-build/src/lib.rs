//! Build trigger and update marker for siteloop.
//!
//! [`BuildTrigger`] reacts to watcher batches by running the site's build
//! command with the watcher paused, streaming the tool's output as it runs.
//! Every completed attempt advances the shared [`UpdateMarker`], which the
//! live reload endpoint polls.

mod command;
mod error;
mod marker;
mod trigger;

pub use command::{BuildCommand, BuildReport};
pub use error::BuildError;
pub use marker::UpdateMarker;
pub use trigger::BuildTrigger;
