//! Audio effects module
//!
//! Source adapters that turn a buffer generator into a positioned cue:
//! panning, the reverb send, and volume/fade helpers.

pub mod fade;
pub mod panner;
pub mod reverb;
pub mod volume;

pub use fade::{FadeEffect, FadeRamp};
pub use panner::{HrtfParams, Spatializer};
pub use reverb::ReverbSendSource;
pub use volume::{db_to_gain, VolumeLevel};

use rodio::Source;

use super::engine::{DistanceModel, PannerStrategy, SourceKind};
use super::reverb::ReverbSend;

/// Processing applied to one play of a voice
#[derive(Debug, Clone)]
pub struct EffectChain {
    pub kind: SourceKind,

    /// `(azimuth, elevation, 0)` in degrees
    pub position: [f32; 3],

    pub panner: PannerStrategy,

    pub distance: DistanceModel,

    /// Route into the reverb bus
    pub reverb: Option<ReverbSend>,
}

impl EffectChain {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            position: [0.0; 3],
            panner: PannerStrategy::Stereo,
            distance: DistanceModel::None,
            reverb: None,
        }
    }

    pub fn with_position(mut self, position: [f32; 3]) -> Self {
        self.position = position;
        self
    }

    pub fn with_panner(mut self, panner: PannerStrategy) -> Self {
        self.panner = panner;
        self
    }

    pub fn with_distance(mut self, distance: DistanceModel) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_reverb(mut self, send: Option<ReverbSend>) -> Self {
        self.reverb = send;
        self
    }

    /// Wrap `source` in the chain.
    ///
    /// Each adapter changes the type, so the result is boxed.
    pub fn apply<S>(&self, source: S) -> Box<dyn Source<Item = f32> + Send>
    where
        S: Source<Item = f32> + Send + 'static,
    {
        let spatial = Spatializer::new(source, self.kind, self.position, self.panner, self.distance);
        match &self.reverb {
            Some(send) => Box::new(ReverbSendSource::new(spatial, send.clone())),
            None => Box::new(spatial),
        }
    }
}
