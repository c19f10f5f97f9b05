//! Cue playback policy
//!
//! [`PlaybackController`] turns host notifications into at most one audible
//! cue at a time:
//!
//! ```text
//! notify(target)
//!   ├── muted?            → Muted
//!   ├── same target <100ms → Debounced
//!   ├── role has no cue    → Unmapped
//!   └── deactivate all → map rect → derive gain → reset → activate → Played
//! ```

pub mod controller;
pub mod gain;

pub use controller::{CueTarget, NotifyOutcome, PlaybackController, TargetId, DEBOUNCE_MS};
pub use gain::{cue_gain, HRTF_GAIN_BOOST};
