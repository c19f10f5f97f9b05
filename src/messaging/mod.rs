//! Host event delivery
//!
//! The host pushes target-changed events into a bounded queue and returns
//! immediately; one worker thread drains the queue and calls the playback
//! controller serially, in submission order.
//!
//! ```text
//! ┌──────┐  submit   ┌────────────────┐  recv  ┌────────┐  notify/hover  ┌────────────┐
//! │ Host │ ────────> │ bounded(64)    │ ─────> │ Worker │ ─────────────> │ Controller │
//! └──────┘ (never    └────────────────┘        └────────┘                └────────────┘
//!           blocks)
//! ```

pub mod dispatcher;
pub mod events;

pub use dispatcher::{CueDispatcher, SubmitStatus, DEFAULT_QUEUE_CAPACITY};
pub use events::{EventKind, HostEvent};
