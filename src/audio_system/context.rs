//! The audio engine session and its global output configuration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::engine::{AudioEngine, DistanceModel, PannerStrategy, Voice, VoiceSpec};
use crate::error::{CueError, CueResult};

/// Shared liveness flag of a session.
///
/// Emitters keep a clone and check it before touching their voice, so any
/// call after shutdown fails with [`CueError::EngineShutdown`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    open: Arc<AtomicBool>,
}

impl SessionHandle {
    fn new() -> Self {
        Self {
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    pub fn ensure_open(&self) -> CueResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(CueError::EngineShutdown)
        }
    }

    fn close(&self) -> bool {
        self.open.swap(false, Ordering::AcqRel)
    }
}

/// Owns the one engine session of the process.
pub struct AudioContext {
    engine: Box<dyn AudioEngine>,
    session: SessionHandle,
    panner: PannerStrategy,
    distance: DistanceModel,
}

impl AudioContext {
    /// Open a session on `engine`. Distance attenuation is always off.
    pub fn new(mut engine: Box<dyn AudioEngine>, panner: PannerStrategy) -> Self {
        engine.set_panner_strategy(panner);
        engine.set_distance_model(DistanceModel::None);
        tracing::info!(
            "Audio context opened on {} backend (panner: {})",
            engine.name(),
            panner
        );

        Self {
            engine,
            session: SessionHandle::new(),
            panner,
            distance: DistanceModel::None,
        }
    }

    pub fn session(&self) -> SessionHandle {
        self.session.clone()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_open()
    }

    pub fn backend_name(&self) -> &'static str {
        self.engine.name()
    }

    pub fn panner_strategy(&self) -> PannerStrategy {
        self.panner
    }

    /// Switch panning for sounds triggered from now on.
    pub fn set_panner_strategy(&mut self, strategy: PannerStrategy) -> CueResult<()> {
        self.session.ensure_open()?;
        if strategy != self.panner {
            tracing::info!("Panner strategy: {} -> {}", self.panner, strategy);
            self.engine.set_panner_strategy(strategy);
            self.panner = strategy;
        }
        Ok(())
    }

    pub fn distance_model(&self) -> DistanceModel {
        self.distance
    }

    pub(crate) fn create_voice(&mut self, spec: VoiceSpec) -> CueResult<Box<dyn Voice>> {
        self.session.ensure_open()?;
        self.engine.create_voice(spec)
    }

    /// Close the session. Idempotent.
    pub fn shutdown(&mut self) {
        if self.session.close() {
            self.engine.close();
            tracing::info!("Audio context closed");
        }
    }
}

impl Drop for AudioContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}
