//! Cue loudness derived from the host's output volume.

/// Flat boost added under HRTF panning, which sounds quieter than stereo.
pub const HRTF_GAIN_BOOST: f32 = 0.25;

/// Gain for the next cue.
///
/// With volume adjust off every cue plays at unity. Otherwise the host volume
/// percentage is normalized to 0-1 and HRTF adds [`HRTF_GAIN_BOOST`] on top.
/// The boosted value is not capped, so it can exceed 1.0.
pub fn cue_gain(volume_adjust: bool, hrtf: bool, volume_percent: u8) -> f32 {
    if !volume_adjust {
        return 1.0;
    }

    let mut gain = (f32::from(volume_percent) / 100.0).clamp(0.0, 1.0);
    if hrtf {
        gain += HRTF_GAIN_BOOST;
    }
    gain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_adjust_off_is_unity() {
        assert_eq!(cue_gain(false, false, 10), 1.0);
        assert_eq!(cue_gain(false, true, 100), 1.0);
    }

    #[test]
    fn test_follows_host_volume() {
        assert_eq!(cue_gain(true, false, 50), 0.5);
        assert_eq!(cue_gain(true, false, 0), 0.0);
        // Out-of-range percentages are clamped
        assert_eq!(cue_gain(true, false, 250), 1.0);
    }

    #[test]
    fn test_hrtf_boost_is_unclamped() {
        assert_eq!(cue_gain(true, true, 50), 0.75);
        assert_eq!(cue_gain(true, true, 100), 1.25);
    }
}
