//! Spatial audio cues for UI control roles.
//!
//! Each control role (button, checkbox, link, ...) has a short sound. When
//! focus, the navigator or the pointer lands on a control, its sound plays
//! from a direction matching the control's place on screen, and replaces
//! whatever cue was still sounding.

pub mod announce;
pub mod assets;
pub mod audio_system;
pub mod config;
pub mod error;
pub mod messaging;
pub mod playback;
pub mod role;
pub mod spatial;
pub mod utils;

pub use config::CueSettings;
pub use error::{AppResult, ConfigError, CueError, CueResult, DecodeError};
pub use playback::{CueTarget, NotifyOutcome, PlaybackController, TargetId};
pub use role::Role;
pub use spatial::{Rect, SpatialFrame, SpatialMapper};
