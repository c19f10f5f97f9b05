//! The shared reverb bus.
//!
//! One bus exists per session. Emitters that were created with reverb routing
//! hold a [`ReverbSend`] that reads the bus parameters live, so gain and decay
//! changes reach sounds already routed to it.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::error::{CueError, CueResult};

pub const DEFAULT_REVERB_GAIN: f32 = 1.0;
pub const DEFAULT_REVERB_T60: f32 = 0.2;

/// Filter applied to the bus input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFilter {
    /// Pass-through.
    Identity,
}

#[derive(Debug)]
struct ReverbParams {
    gain: AtomicU32,
    t60: AtomicU32,
}

impl ReverbParams {
    fn load(cell: &AtomicU32) -> f32 {
        f32::from_bits(cell.load(Ordering::Relaxed))
    }

    fn store(cell: &AtomicU32, value: f32) {
        cell.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Handle to the bus parameters given to routed voices.
#[derive(Debug, Clone)]
pub struct ReverbSend {
    params: Arc<ReverbParams>,
}

impl ReverbSend {
    pub fn gain(&self) -> f32 {
        ReverbParams::load(&self.params.gain)
    }

    pub fn t60(&self) -> f32 {
        ReverbParams::load(&self.params.t60)
    }

    /// Early reflections start immediately.
    pub fn pre_delay(&self) -> f32 {
        0.0
    }

    pub fn input_filter(&self) -> InputFilter {
        InputFilter::Identity
    }
}

/// Shared reverb effect.
#[derive(Debug)]
pub struct ReverbBus {
    params: Arc<ReverbParams>,
}

impl ReverbBus {
    pub fn new(gain: f32, t60: f32) -> CueResult<Self> {
        let bus = Self {
            params: Arc::new(ReverbParams {
                gain: AtomicU32::new(DEFAULT_REVERB_GAIN.to_bits()),
                t60: AtomicU32::new(DEFAULT_REVERB_T60.to_bits()),
            }),
        };
        bus.set_gain(gain)?;
        bus.set_t60(t60)?;
        Ok(bus)
    }

    /// A new send for an emitter routed through this bus.
    pub fn send(&self) -> ReverbSend {
        ReverbSend {
            params: Arc::clone(&self.params),
        }
    }

    pub fn gain(&self) -> f32 {
        ReverbParams::load(&self.params.gain)
    }

    pub fn set_gain(&self, gain: f32) -> CueResult<()> {
        if !(0.0..=1.0).contains(&gain) {
            return Err(CueError::InvalidParameter(format!(
                "reverb gain {} is outside 0.0-1.0",
                gain
            )));
        }
        ReverbParams::store(&self.params.gain, gain);
        Ok(())
    }

    pub fn t60(&self) -> f32 {
        ReverbParams::load(&self.params.t60)
    }

    pub fn set_t60(&self, seconds: f32) -> CueResult<()> {
        if !(seconds > 0.0 && seconds.is_finite()) {
            return Err(CueError::InvalidParameter(format!(
                "reverb decay {} must be a positive number of seconds",
                seconds
            )));
        }
        ReverbParams::store(&self.params.t60, seconds);
        Ok(())
    }
}

impl Default for ReverbBus {
    fn default() -> Self {
        Self {
            params: Arc::new(ReverbParams {
                gain: AtomicU32::new(DEFAULT_REVERB_GAIN.to_bits()),
                t60: AtomicU32::new(DEFAULT_REVERB_T60.to_bits()),
            }),
        }
    }
}
