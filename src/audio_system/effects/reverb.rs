//! Reverb send renderer.
//!
//! Adds the wet signal of the shared bus to a stereo source:
//! - Parallel comb filters for the decaying tail
//! - Series all-pass filters for diffusion
//! - Comb feedback derived from the bus T60
//!
//! Bus gain and T60 are re-read while the sound plays. After the dry signal
//! ends the tail keeps ringing for one T60.

use std::time::Duration;

use rodio::Source;

use crate::audio_system::reverb::ReverbSend;

/// Comb delay lengths in samples at 44.1kHz
const COMB_LENGTHS: [usize; 4] = [1116, 1188, 1277, 1356];

/// Allpass delay lengths
const ALLPASS_LENGTHS: [usize; 2] = [556, 441];

/// Offset for right channel delay lines (in samples)
const STEREO_SPREAD: usize = 23;

const ALLPASS_FEEDBACK: f32 = 0.5;
const DAMPING: f32 = 0.2;
const WET_SCALE: f32 = 0.3;

/// Frames between parameter refreshes.
const PARAM_REFRESH_FRAMES: usize = 64;

struct CombFilter {
    buffer: Vec<f32>,
    pos: usize,
    filter_state: f32,
    feedback: f32,
}

impl CombFilter {
    fn new(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length.max(1)],
            pos: 0,
            filter_state: 0.0,
            feedback: 0.0,
        }
    }

    /// Feedback so the loop decays 60dB in `t60` seconds.
    fn tune(&mut self, t60: f32, sample_rate: u32) {
        let delay_seconds = self.buffer.len() as f32 / sample_rate as f32;
        self.feedback = 10f32.powf(-3.0 * delay_seconds / t60.max(1e-3));
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.pos];
        self.filter_state = output * (1.0 - DAMPING) + self.filter_state * DAMPING;
        self.buffer[self.pos] = input + self.filter_state * self.feedback;
        self.pos = (self.pos + 1) % self.buffer.len();
        output
    }
}

struct AllpassFilter {
    buffer: Vec<f32>,
    pos: usize,
}

impl AllpassFilter {
    fn new(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length.max(1)],
            pos: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let buffered = self.buffer[self.pos];
        let output = -input + buffered;
        self.buffer[self.pos] = input + buffered * ALLPASS_FEEDBACK;
        self.pos = (self.pos + 1) % self.buffer.len();
        output
    }
}

/// One channel of the reverb network.
struct ReverbChannel {
    combs: Vec<CombFilter>,
    allpasses: Vec<AllpassFilter>,
}

impl ReverbChannel {
    fn new(sample_rate: u32, spread: usize) -> Self {
        let scale = sample_rate as f32 / 44_100.0;
        let scaled = |len: usize| ((len + spread) as f32 * scale) as usize;
        Self {
            combs: COMB_LENGTHS.iter().map(|&len| CombFilter::new(scaled(len))).collect(),
            allpasses: ALLPASS_LENGTHS
                .iter()
                .map(|&len| AllpassFilter::new(scaled(len)))
                .collect(),
        }
    }

    fn tune(&mut self, t60: f32, sample_rate: u32) {
        for comb in &mut self.combs {
            comb.tune(t60, sample_rate);
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let mut wet = 0.0;
        for comb in &mut self.combs {
            wet += comb.process(input);
        }
        wet /= self.combs.len() as f32;
        for allpass in &mut self.allpasses {
            wet = allpass.process(wet);
        }
        wet
    }
}

/// Stereo source with the bus reverb mixed in.
pub struct ReverbSendSource<S> {
    input: S,
    send: ReverbSend,
    sample_rate: u32,
    left: ReverbChannel,
    right: ReverbChannel,
    t60: f32,
    gain: f32,
    frames_until_refresh: usize,
    tail_frames: Option<usize>,
    pending_right: Option<f32>,
}

impl<S> ReverbSendSource<S>
where
    S: Source<Item = f32>,
{
    /// `input` must be stereo.
    pub fn new(input: S, send: ReverbSend) -> Self {
        let sample_rate = input.sample_rate();
        let mut source = Self {
            input,
            sample_rate,
            left: ReverbChannel::new(sample_rate, 0),
            right: ReverbChannel::new(sample_rate, STEREO_SPREAD),
            t60: send.t60(),
            gain: send.gain(),
            send,
            frames_until_refresh: PARAM_REFRESH_FRAMES,
            tail_frames: None,
            pending_right: None,
        };
        source.left.tune(source.t60, sample_rate);
        source.right.tune(source.t60, sample_rate);
        source
    }

    fn refresh_params(&mut self) {
        self.gain = self.send.gain();
        let t60 = self.send.t60();
        if t60 != self.t60 {
            self.t60 = t60;
            self.left.tune(t60, self.sample_rate);
            self.right.tune(t60, self.sample_rate);
        }
        self.frames_until_refresh = PARAM_REFRESH_FRAMES;
    }

    /// Next dry frame, or silence while the tail rings out.
    fn next_dry(&mut self) -> Option<(f32, f32)> {
        if self.tail_frames.is_none() {
            if let Some(left) = self.input.next() {
                let right = self.input.next().unwrap_or(left);
                return Some((left, right));
            }
            let tail = (self.t60 * self.sample_rate as f32).ceil() as usize;
            self.tail_frames = Some(tail);
        }

        match self.tail_frames.as_mut() {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Some((0.0, 0.0))
            }
            _ => None,
        }
    }
}

impl<S> Iterator for ReverbSendSource<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if let Some(right) = self.pending_right.take() {
            return Some(right);
        }

        if self.frames_until_refresh == 0 {
            self.refresh_params();
        }
        self.frames_until_refresh -= 1;

        let (dry_left, dry_right) = self.next_dry()?;
        // Identity input filter, zero pre-delay
        let wet_left = self.left.process(dry_left);
        let wet_right = self.right.process(dry_right);
        let wet_gain = self.gain * WET_SCALE;

        self.pending_right = Some(dry_right + wet_right * wet_gain);
        Some(dry_left + wet_left * wet_gain)
    }
}

impl<S> Source for ReverbSendSource<S>
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
        self.input
            .total_duration()
            .map(|dry| dry + Duration::from_secs_f32(self.t60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_system::reverb::ReverbBus;
    use rodio::buffer::SamplesBuffer;

    fn impulse(frames: usize) -> SamplesBuffer<f32> {
        let mut samples = vec![0.0f32; frames * 2];
        samples[0] = 1.0;
        samples[1] = 1.0;
        SamplesBuffer::new(2, 44_100, samples)
    }

    #[test]
    fn test_tail_lasts_one_t60() {
        let bus = ReverbBus::new(1.0, 0.1).unwrap();
        let output: Vec<f32> = ReverbSendSource::new(impulse(100), bus.send()).collect();
        assert_eq!(output.len(), (100 + 4_410) * 2);
    }

    #[test]
    fn test_wet_signal_follows_dry() {
        let bus = ReverbBus::new(1.0, 0.5).unwrap();
        let output: Vec<f32> = ReverbSendSource::new(impulse(100), bus.send()).collect();

        // Dry impulse passes unchanged
        assert_eq!(output[0], 1.0);
        // Reflections appear after the shortest comb delay
        let late_energy: f32 = output[2 * 1_200..].iter().map(|s| s * s).sum();
        assert!(late_energy > 0.0);
    }

    #[test]
    fn test_zero_gain_is_dry_only() {
        let bus = ReverbBus::new(0.0, 0.2).unwrap();
        let output: Vec<f32> = ReverbSendSource::new(impulse(10), bus.send()).collect();
        let tail_energy: f32 = output[20..].iter().map(|s| s * s).sum();
        assert_eq!(tail_energy, 0.0);
    }

    #[test]
    fn test_comb_feedback_from_t60() {
        let mut comb = CombFilter::new(4_410);
        comb.tune(0.3, 44_100);
        // 0.1s delay in a 0.3s T60 loses 20dB per pass
        assert!((comb.feedback - 0.1).abs() < 1e-4);
    }
}
