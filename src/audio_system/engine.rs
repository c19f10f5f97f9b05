//! Backend seam between the cue logic and an audio engine.
//!
//! An [`AudioEngine`] hands out [`Voice`]s: one positioned source paired with
//! one generator bound to a decoded buffer. Everything the playback core needs
//! from a backend goes through these two traits.

use std::fmt;
use std::sync::Arc;

use super::buffer::Buffer;
use super::reverb::ReverbSend;
use crate::error::CueResult;

/// Panning algorithm applied to 3D sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PannerStrategy {
    Stereo,
    Hrtf,
}

impl PannerStrategy {
    pub fn from_hrtf_enabled(enabled: bool) -> Self {
        if enabled {
            PannerStrategy::Hrtf
        } else {
            PannerStrategy::Stereo
        }
    }
}

impl fmt::Display for PannerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PannerStrategy::Stereo => write!(f, "stereo"),
            PannerStrategy::Hrtf => write!(f, "HRTF"),
        }
    }
}

/// Gain rolloff with listener distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistanceModel {
    /// No attenuation at any distance.
    None,
    /// `1 / max(distance, 1)`.
    Inverse,
}

impl DistanceModel {
    pub fn gain_at(&self, distance: f32) -> f32 {
        match self {
            DistanceModel::None => 1.0,
            DistanceModel::Inverse => 1.0 / distance.max(1.0),
        }
    }
}

/// Kind of positioned source a voice uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceKind {
    /// Azimuth/elevation positioned through the context's panner.
    ThreeD,
    /// Played as-is, no panning.
    Direct,
    /// Fixed left/right balance, `scalar` in [-1, 1].
    Panned { scalar: f32 },
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::ThreeD => write!(f, "3d"),
            SourceKind::Direct => write!(f, "direct"),
            SourceKind::Panned { scalar } => write!(f, "panned({:.2})", scalar),
        }
    }
}

/// Everything needed to allocate a voice.
#[derive(Clone)]
pub struct VoiceSpec {
    /// Used by backends for logging and inspection.
    pub label: String,
    pub buffer: Arc<Buffer>,
    pub kind: SourceKind,
    pub reverb: Option<ReverbSend>,
}

/// One source + generator pair.
///
/// `connect` makes the generator audible through the source from its current
/// cursor; `disconnect` silences it and keeps the cursor where it stopped.
pub trait Voice: Send {
    fn set_position(&mut self, position: [f32; 3]);

    fn set_gain(&mut self, gain: f32);

    /// Playback cursor in frames.
    fn cursor(&self) -> usize;

    fn set_cursor(&mut self, frame: usize);

    fn set_looping(&mut self, looping: bool);

    fn set_pitch(&mut self, pitch: f32);

    fn connect(&mut self) -> CueResult<()>;

    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;
}

/// An audio engine session.
pub trait AudioEngine: Send {
    fn name(&self) -> &'static str;

    fn create_voice(&mut self, spec: VoiceSpec) -> CueResult<Box<dyn Voice>>;

    /// Applies to voices connected after the call.
    fn set_panner_strategy(&mut self, strategy: PannerStrategy);

    fn set_distance_model(&mut self, model: DistanceModel);

    /// Release the device. Idempotent.
    fn close(&mut self);
}
