//! The process-wide set of role emitters.

use std::collections::HashMap;
use std::path::Path;

use super::buffer::BufferCache;
use super::context::AudioContext;
use super::emitter::RoleEmitter;
use super::engine::{AudioEngine, PannerStrategy, SourceKind};
use super::reverb::ReverbBus;
use crate::config::CueSettings;
use crate::error::{CueError, CueResult};
use crate::role::{Role, SOUND_ASSETS};

/// Owns the audio session, the reverb bus, the decoded buffers and one
/// emitter per role listed in [`SOUND_ASSETS`].
///
/// Built once at startup and torn down once at shutdown. Nothing is added or
/// removed in between.
pub struct EmitterRegistry {
    // Emitters go before the context so their voices drop first
    emitters: HashMap<Role, RoleEmitter>,
    cache: BufferCache,
    reverb: ReverbBus,
    reverb_routing: bool,
    context: AudioContext,
}

impl EmitterRegistry {
    /// Open a session on `engine` and create every emitter from the cue files
    /// in `sounds_dir`.
    ///
    /// Any missing or undecodable file, or any voice the engine cannot
    /// allocate, aborts the whole build.
    pub fn build(
        engine: Box<dyn AudioEngine>,
        settings: &CueSettings,
        sounds_dir: &Path,
    ) -> CueResult<Self> {
        let mut context = AudioContext::new(engine, PannerStrategy::from_hrtf_enabled(settings.hrtf));
        let reverb = ReverbBus::new(settings.reverb_level, settings.reverb_time)?;
        let mut cache = BufferCache::new();
        let mut emitters = HashMap::with_capacity(SOUND_ASSETS.len());

        for asset in SOUND_ASSETS {
            let path = sounds_dir.join(asset.file);
            let buffer = cache.get(&path).map_err(|source| CueError::AssetLoad {
                role: asset.role,
                path: path.clone(),
                source,
            })?;

            let send = if settings.reverb { Some(&reverb) } else { None };
            let emitter =
                RoleEmitter::create(asset.role, buffer, SourceKind::ThreeD, send, &mut context)?;
            emitters.insert(asset.role, emitter);
        }

        tracing::info!(
            "Registered {} role emitters from {} sound files on the {} engine (reverb {})",
            emitters.len(),
            cache.len(),
            context.backend_name(),
            if settings.reverb { "on" } else { "off" }
        );

        Ok(Self {
            emitters,
            cache,
            reverb,
            reverb_routing: settings.reverb,
            context,
        })
    }

    pub fn get(&self, role: Role) -> Option<&RoleEmitter> {
        self.emitters.get(&role)
    }

    pub fn get_mut(&mut self, role: Role) -> Option<&mut RoleEmitter> {
        self.emitters.get_mut(&role)
    }

    pub fn contains(&self, role: Role) -> bool {
        self.emitters.contains_key(&role)
    }

    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }

    /// Silence every emitter.
    pub fn deactivate_all(&mut self) -> CueResult<()> {
        self.context.session().ensure_open()?;
        for emitter in self.emitters.values_mut() {
            emitter.deactivate()?;
        }
        Ok(())
    }

    /// Roles whose emitter is currently audible.
    pub fn connected_roles(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self
            .emitters
            .values()
            .filter(|e| e.is_connected())
            .map(RoleEmitter::role)
            .collect();
        roles.sort();
        roles
    }

    pub fn context(&self) -> &AudioContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut AudioContext {
        &mut self.context
    }

    pub fn reverb(&self) -> &ReverbBus {
        &self.reverb
    }

    pub fn cache(&self) -> &BufferCache {
        &self.cache
    }

    /// Whether emitters were built with a reverb send.
    pub fn reverb_routing(&self) -> bool {
        self.reverb_routing
    }

    /// Silence everything and close the session. Idempotent.
    pub fn shutdown(&mut self) {
        if !self.context.is_open() {
            return;
        }
        if let Err(e) = self.deactivate_all() {
            tracing::debug!("Deactivation during shutdown failed: {}", e);
        }
        self.context.shutdown();
    }
}
