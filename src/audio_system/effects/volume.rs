//! Volume in decibels of attenuation.
//!
//! Emitter volume is expressed as dB at or below 0; the engine receives a
//! linear gain of `10^(db/20)`.

/// Quietest level tracked; anything below is treated as silence.
pub const MIN_DB: f32 = -100.0;

/// Linear gain for a level in dB.
pub fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Attenuation level, clamped to `[MIN_DB, 0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeLevel {
    db: f32,
}

impl VolumeLevel {
    pub fn new(db: f32) -> Self {
        Self {
            db: db.clamp(MIN_DB, 0.0),
        }
    }

    pub fn db(&self) -> f32 {
        self.db
    }
}
