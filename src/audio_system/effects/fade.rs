//! Stepped volume fade.
//!
//! Walks a level toward a destination one dB at a time. The caller applies
//! each step and waits `step_interval` between them.

use std::time::Duration;

use super::volume::{VolumeLevel, MIN_DB};
use crate::error::{CueError, CueResult};

/// Fade configuration
#[derive(Debug, Clone, Copy)]
pub struct FadeEffect {
    /// Destination level in dB
    pub target_db: f32,

    /// Delay between 1 dB steps
    pub step_interval: Duration,
}

impl FadeEffect {
    pub fn new(target_db: f32, step_interval: Duration) -> CueResult<Self> {
        Ok(Self {
            target_db: finite_db(target_db, "fade target")?.clamp(MIN_DB, 0.0),
            step_interval,
        })
    }

    pub fn ramp_from(&self, start: VolumeLevel) -> CueResult<FadeRamp> {
        FadeRamp::new(start.db(), self.target_db)
    }

    /// Total time to fade from `start`.
    pub fn duration_from(&self, start: VolumeLevel) -> CueResult<Duration> {
        Ok(self.step_interval * self.ramp_from(start)?.count() as u32)
    }
}

fn finite_db(db: f32, what: &str) -> CueResult<f32> {
    if db.is_finite() {
        Ok(db)
    } else {
        Err(CueError::InvalidParameter(format!("{} {} dB", what, db)))
    }
}

/// Levels visited by a fade, ending exactly on the destination.
#[derive(Debug, Clone)]
pub struct FadeRamp {
    current: f32,
    target: f32,
    done: bool,
}

impl FadeRamp {
    pub fn new(from_db: f32, to_db: f32) -> CueResult<Self> {
        let current = finite_db(from_db, "fade start")?.clamp(MIN_DB, 0.0);
        let target = finite_db(to_db, "fade target")?.clamp(MIN_DB, 0.0);
        Ok(Self {
            current,
            target,
            done: current == target,
        })
    }
}

impl Iterator for FadeRamp {
    type Item = VolumeLevel;

    fn next(&mut self) -> Option<VolumeLevel> {
        if self.done {
            return None;
        }

        let remaining = self.target - self.current;
        if remaining.abs() <= 1.0 {
            self.current = self.target;
            self.done = true;
        } else {
            self.current += remaining.signum();
        }

        Some(VolumeLevel::new(self.current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_steps_down() {
        let steps: Vec<f32> = FadeRamp::new(0.0, -3.0).unwrap().map(|v| v.db()).collect();
        assert_eq!(steps, vec![-1.0, -2.0, -3.0]);
    }

    #[test]
    fn test_ramp_steps_up_and_lands_on_fraction() {
        let steps: Vec<f32> = FadeRamp::new(-2.5, 0.0).unwrap().map(|v| v.db()).collect();
        assert_eq!(steps, vec![-1.5, -0.5, 0.0]);
    }

    #[test]
    fn test_ramp_at_target_is_empty() {
        assert_eq!(FadeRamp::new(-6.0, -6.0).unwrap().count(), 0);
    }

    #[test]
    fn test_fade_out_duration() {
        let fade = FadeEffect::new(MIN_DB, Duration::from_millis(2)).unwrap();
        let duration = fade.duration_from(VolumeLevel::new(0.0)).unwrap();
        assert_eq!(duration, Duration::from_millis(200));
    }

    #[test]
    fn test_non_finite_levels_are_rejected() {
        assert!(matches!(
            FadeEffect::new(f32::NAN, Duration::ZERO),
            Err(CueError::InvalidParameter(_))
        ));
        assert!(FadeEffect::new(f32::NEG_INFINITY, Duration::ZERO).is_err());
        assert!(FadeRamp::new(f32::NAN, -3.0).is_err());
        assert!(FadeRamp::new(0.0, f32::NAN).is_err());
    }
}
