//! Positioning of a cue in the stereo field.
//!
//! Input of any channel count is downmixed to mono and rendered to stereo:
//! - **Stereo**: equal-power pan on azimuth, elevation ignored
//! - **HRTF**: simplified binaural model
//!   - ITD: Woodworth delay on the far ear
//!   - ILD: head-shadow level drop and lowpass on the far ear
//!   - Elevation: mild attenuation away from ear level

use std::f32::consts::FRAC_PI_4;
use std::time::Duration;

use rodio::Source;

use crate::audio_system::engine::{DistanceModel, PannerStrategy, SourceKind};

/// Speed of sound in air (meters per second) at 20°C.
const SPEED_OF_SOUND: f32 = 343.0;

/// Average human head radius in meters (Woodworth model).
const HEAD_RADIUS: f32 = 0.0875;

/// Level drop of the far ear at full lateral position.
const SHADOW_FACTOR: f32 = 0.4;

/// Listener-relative distance of every cue.
const CUE_DISTANCE: f32 = 1.0;

/// Equal-power gains for `pan` in [-1, 1].
pub fn equal_power(pan: f32) -> (f32, f32) {
    let angle = (pan.clamp(-1.0, 1.0) + 1.0) * FRAC_PI_4;
    (angle.cos(), angle.sin())
}

/// Per-ear parameters of the binaural model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HrtfParams {
    pub delay_left: f32,
    pub delay_right: f32,
    pub level_left: f32,
    pub level_right: f32,
    /// One-pole coefficient of the far-ear lowpass (1.0 = open).
    pub shadow_left: f32,
    pub shadow_right: f32,
    pub elevation_gain: f32,
}

impl HrtfParams {
    /// Parameters for a source at `azimuth`/`elevation` degrees.
    pub fn new(azimuth: f32, elevation: f32, sample_rate: u32) -> Self {
        let az = azimuth.clamp(-90.0, 90.0).to_radians();
        let lateral = az.sin().abs();

        // Woodworth: ITD = (r/c) * (θ + sin θ)
        let itd = (HEAD_RADIUS / SPEED_OF_SOUND) * (az.abs() + lateral);
        let itd_samples = itd * sample_rate as f32;

        let far_level = 1.0 - SHADOW_FACTOR * lateral;
        let far_shadow = 1.0 - 0.6 * lateral;

        let el = elevation.clamp(-90.0, 90.0).to_radians();
        let elevation_gain = (1.0 - 0.1 * el.abs() / std::f32::consts::FRAC_PI_2).clamp(0.8, 1.0);

        // Positive azimuth = right side → the left ear is far
        if az >= 0.0 {
            Self {
                delay_left: itd_samples,
                delay_right: 0.0,
                level_left: far_level,
                level_right: 1.0,
                shadow_left: far_shadow,
                shadow_right: 1.0,
                elevation_gain,
            }
        } else {
            Self {
                delay_left: 0.0,
                delay_right: itd_samples,
                level_left: 1.0,
                level_right: far_level,
                shadow_left: 1.0,
                shadow_right: far_shadow,
                elevation_gain,
            }
        }
    }
}

/// Fixed-length delay for one ear.
struct DelayLine {
    buffer: Vec<f32>,
    pos: usize,
}

impl DelayLine {
    fn new(samples: f32) -> Self {
        Self {
            buffer: vec![0.0; samples.round() as usize],
            pos: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        if self.buffer.is_empty() {
            return input;
        }
        let output = self.buffer[self.pos];
        self.buffer[self.pos] = input;
        self.pos = (self.pos + 1) % self.buffer.len();
        output
    }
}

/// Processing path of one [`Spatializer`].
enum PanMode {
    /// Left/right gains applied to the mono downmix.
    Gains { left: f32, right: f32 },
    /// First two input channels passed through.
    Passthrough,
    Binaural {
        params: HrtfParams,
        delay_left: DelayLine,
        delay_right: DelayLine,
        lowpass_left: f32,
        lowpass_right: f32,
    },
}

/// Renders an input source to positioned stereo.
pub struct Spatializer<S> {
    input: S,
    in_channels: u16,
    sample_rate: u32,
    gain: f32,
    mode: PanMode,
    pending_right: Option<f32>,
}

impl<S> Spatializer<S>
where
    S: Source<Item = f32>,
{
    pub fn new(
        input: S,
        kind: SourceKind,
        position: [f32; 3],
        panner: PannerStrategy,
        distance: DistanceModel,
    ) -> Self {
        let in_channels = input.channels().max(1);
        let sample_rate = input.sample_rate();
        let [azimuth, elevation, _] = position;

        let mode = match kind {
            SourceKind::Direct if in_channels >= 2 => PanMode::Passthrough,
            SourceKind::Direct => PanMode::Gains {
                left: 1.0,
                right: 1.0,
            },
            SourceKind::Panned { scalar } => {
                let (left, right) = equal_power(scalar);
                PanMode::Gains { left, right }
            }
            SourceKind::ThreeD => match panner {
                PannerStrategy::Stereo => {
                    let (left, right) = equal_power(azimuth.to_radians().sin());
                    PanMode::Gains { left, right }
                }
                PannerStrategy::Hrtf => {
                    let params = HrtfParams::new(azimuth, elevation, sample_rate);
                    PanMode::Binaural {
                        params,
                        delay_left: DelayLine::new(params.delay_left),
                        delay_right: DelayLine::new(params.delay_right),
                        lowpass_left: 0.0,
                        lowpass_right: 0.0,
                    }
                }
            },
        };

        Self {
            input,
            in_channels,
            sample_rate,
            gain: distance.gain_at(CUE_DISTANCE),
            mode,
            pending_right: None,
        }
    }

    /// Pull one input frame: `(mono downmix, first, second)`.
    fn next_frame(&mut self) -> Option<(f32, f32, f32)> {
        let first = self.input.next()?;
        let mut sum = first;
        let mut second = first;
        for ch in 1..self.in_channels {
            let sample = self.input.next().unwrap_or(0.0);
            if ch == 1 {
                second = sample;
            }
            sum += sample;
        }
        Some((sum / self.in_channels as f32, first, second))
    }
}

impl<S> Iterator for Spatializer<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if let Some(right) = self.pending_right.take() {
            return Some(right);
        }

        let (mono, first, second) = self.next_frame()?;
        let (left, right) = match &mut self.mode {
            PanMode::Gains { left, right } => (mono * *left, mono * *right),
            PanMode::Passthrough => (first, second),
            PanMode::Binaural {
                params,
                delay_left,
                delay_right,
                lowpass_left,
                lowpass_right,
            } => {
                let input = mono * params.elevation_gain;
                let l = delay_left.process(input * params.level_left);
                let r = delay_right.process(input * params.level_right);
                *lowpass_left += params.shadow_left * (l - *lowpass_left);
                *lowpass_right += params.shadow_right * (r - *lowpass_right);
                (*lowpass_left, *lowpass_right)
            }
        };

        self.pending_right = Some(right * self.gain);
        Some(left * self.gain)
    }
}

impl<S> Source for Spatializer<S>
where
    S: Source<Item = f32>,
{
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        2
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        self.input.total_duration()
    }
}
