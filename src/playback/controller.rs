//! Playback controller
//!
//! Serializes every host notification behind one lock and keeps at most one
//! emitter audible across the registry.

use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::gain::cue_gain;
use crate::audio_system::effects::{FadeEffect, VolumeLevel};
use crate::audio_system::engine::PannerStrategy;
use crate::audio_system::registry::EmitterRegistry;
use crate::config::CueSettings;
use crate::error::{CueError, CueResult};
use crate::role::Role;
use crate::spatial::{Rect, SpatialFrame, SpatialMapper};
use crate::utils::Debouncer;

/// Quiet interval for repeats on one target.
pub const DEBOUNCE_MS: u64 = 100;

/// Host identity of a UI object. Two notifications for the same object carry
/// the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(pub u64);

/// The object a cue is played for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CueTarget {
    pub id: TargetId,
    pub role: Role,
    /// Screen rectangle, when the host knows it.
    pub rect: Option<Rect>,
}

impl CueTarget {
    pub fn new(id: u64, role: Role, rect: Option<Rect>) -> Self {
        Self {
            id: TargetId(id),
            role,
            rect,
        }
    }
}

/// What a notification did.
#[derive(Debug, Clone, PartialEq)]
pub enum NotifyOutcome {
    Played {
        role: Role,
        frame: SpatialFrame,
        gain: f32,
    },
    Muted,
    /// Same target again inside the quiet interval.
    Debounced,
    /// The role has no cue.
    Unmapped,
    /// Pointer still over the previously hovered object.
    Unchanged,
    ShutDown,
    /// Engine call failed; the cue was skipped.
    Failed,
}

impl NotifyOutcome {
    pub fn is_played(&self) -> bool {
        matches!(self, NotifyOutcome::Played { .. })
    }
}

struct ControllerState {
    /// `None` once shut down.
    registry: Option<EmitterRegistry>,
    mapper: SpatialMapper,
    debouncer: Debouncer<TargetId>,
    previous_hover: Option<TargetId>,
    /// Bumped on every played cue.
    plays: u64,
    muted: bool,
    hrtf: bool,
    volume_adjust: bool,
    reverb_routing: bool,
}

impl ControllerState {
    fn notify(
        &mut self,
        target: &CueTarget,
        desktop: Rect,
        volume_percent: u8,
        now: Instant,
    ) -> NotifyOutcome {
        let Some(registry) = self.registry.as_mut() else {
            return NotifyOutcome::ShutDown;
        };
        if self.muted {
            return NotifyOutcome::Muted;
        }
        if self.debouncer.is_suppressed(&target.id, now) {
            tracing::trace!("Debounced {} cue for {:?}", target.role, target.id);
            return NotifyOutcome::Debounced;
        }
        // Every notified target counts, with or without a cue
        self.debouncer.record(target.id, now);
        if !registry.contains(target.role) {
            return NotifyOutcome::Unmapped;
        }

        let frame = self.mapper.map(target.rect, desktop);
        let gain = cue_gain(self.volume_adjust, self.hrtf, volume_percent);

        match play(registry, target.role, frame, gain) {
            Ok(()) => {
                self.plays = self.plays.wrapping_add(1);
                tracing::debug!(
                    "Played {} at az {:.1} el {:.1} gain {:.2}",
                    target.role,
                    frame.azimuth,
                    frame.elevation,
                    gain
                );
                NotifyOutcome::Played {
                    role: target.role,
                    frame,
                    gain,
                }
            }
            Err(CueError::EngineShutdown) => {
                tracing::debug!("Skipped {} cue: engine is shut down", target.role);
                NotifyOutcome::ShutDown
            }
            Err(e) => {
                tracing::warn!("Skipped {} cue: {}", target.role, e);
                NotifyOutcome::Failed
            }
        }
    }
}

/// Silence everything, then sound `role` from its first frame.
fn play(registry: &mut EmitterRegistry, role: Role, frame: SpatialFrame, gain: f32) -> CueResult<()> {
    registry.deactivate_all()?;
    let emitter = registry
        .get_mut(role)
        .ok_or_else(|| CueError::TransientPlayback(format!("no emitter for {}", role)))?;
    emitter.reset()?;
    emitter.set_volume_db(0.0)?;
    emitter.activate(frame.position(), gain)
}

/// Orchestrates cue playback for host notifications.
///
/// All methods take `&self` and may be called from any thread; each call runs
/// as one critical section.
pub struct PlaybackController {
    state: Mutex<ControllerState>,
}

impl PlaybackController {
    pub fn new(registry: EmitterRegistry, settings: &CueSettings) -> Self {
        Self::with_mapper(registry, settings, SpatialMapper::default())
    }

    pub fn with_mapper(
        registry: EmitterRegistry,
        settings: &CueSettings,
        mapper: SpatialMapper,
    ) -> Self {
        let reverb_routing = registry.reverb_routing();
        Self {
            state: Mutex::new(ControllerState {
                registry: Some(registry),
                mapper,
                debouncer: Debouncer::new(DEBOUNCE_MS),
                previous_hover: None,
                plays: 0,
                muted: settings.muted,
                hrtf: settings.hrtf,
                volume_adjust: settings.volume_adjust,
                reverb_routing,
            }),
        }
    }

    /// Play the cue for `target`, subject to mute, debounce and role mapping.
    ///
    /// Never fails: engine errors are logged and reported as
    /// [`NotifyOutcome::Failed`] or [`NotifyOutcome::ShutDown`].
    pub fn notify(&self, target: &CueTarget, desktop: Rect, volume_percent: u8) -> NotifyOutcome {
        self.notify_at(target, desktop, volume_percent, Instant::now())
    }

    /// [`notify`](Self::notify) with an explicit clock reading.
    pub fn notify_at(
        &self,
        target: &CueTarget,
        desktop: Rect,
        volume_percent: u8,
        now: Instant,
    ) -> NotifyOutcome {
        self.state.lock().notify(target, desktop, volume_percent, now)
    }

    /// Pointer moved over `target`. Plays only when the hovered object
    /// changed since the previous hover.
    pub fn hover(&self, target: &CueTarget, desktop: Rect, volume_percent: u8) -> NotifyOutcome {
        self.hover_at(target, desktop, volume_percent, Instant::now())
    }

    pub fn hover_at(
        &self,
        target: &CueTarget,
        desktop: Rect,
        volume_percent: u8,
        now: Instant,
    ) -> NotifyOutcome {
        let mut state = self.state.lock();
        if state.registry.is_none() {
            return NotifyOutcome::ShutDown;
        }
        if state.previous_hover == Some(target.id) {
            return NotifyOutcome::Unchanged;
        }
        state.previous_hover = Some(target.id);
        state.notify(target, desktop, volume_percent, now)
    }

    pub fn set_muted(&self, muted: bool) {
        let mut state = self.state.lock();
        if state.muted != muted {
            tracing::info!("Cues {}", if muted { "muted" } else { "unmuted" });
            state.muted = muted;
        }
    }

    pub fn is_muted(&self) -> bool {
        self.state.lock().muted
    }

    /// Switch between HRTF and stereo panning for the next cues.
    pub fn set_hrtf_enabled(&self, enabled: bool) {
        let mut state = self.state.lock();
        state.hrtf = enabled;
        if let Some(registry) = state.registry.as_mut() {
            let strategy = PannerStrategy::from_hrtf_enabled(enabled);
            if let Err(e) = registry.context_mut().set_panner_strategy(strategy) {
                tracing::debug!("Panner not switched: {}", e);
            }
        }
    }

    pub fn hrtf_enabled(&self) -> bool {
        self.state.lock().hrtf
    }

    /// Emitters keep the routing they were built with; the new value is only
    /// remembered for the next startup.
    pub fn set_reverb_enabled(&self, enabled: bool) {
        let mut state = self.state.lock();
        if state.reverb_routing != enabled {
            tracing::info!(
                "Reverb {} (applies after restart)",
                if enabled { "enabled" } else { "disabled" }
            );
            state.reverb_routing = enabled;
        }
    }

    pub fn reverb_enabled(&self) -> bool {
        self.state.lock().reverb_routing
    }

    /// Reverb send gain, 0.0-1.0. Applies live.
    pub fn set_reverb_gain(&self, gain: f32) -> CueResult<()> {
        let state = self.state.lock();
        match state.registry.as_ref() {
            Some(registry) => registry.reverb().set_gain(gain),
            None => Ok(()),
        }
    }

    /// Reverb T60 in seconds, must be positive. Applies live.
    pub fn set_reverb_decay_seconds(&self, seconds: f32) -> CueResult<()> {
        let state = self.state.lock();
        match state.registry.as_ref() {
            Some(registry) => registry.reverb().set_t60(seconds),
            None => Ok(()),
        }
    }

    pub fn set_volume_adjust_enabled(&self, enabled: bool) {
        self.state.lock().volume_adjust = enabled;
    }

    pub fn volume_adjust_enabled(&self) -> bool {
        self.state.lock().volume_adjust
    }

    /// Push a full settings value into the live controller.
    pub fn apply_settings(&self, settings: &CueSettings) -> CueResult<()> {
        settings
            .validate()
            .map_err(|e| CueError::InvalidParameter(e.to_string()))?;

        self.set_reverb_gain(settings.reverb_level)?;
        self.set_reverb_decay_seconds(settings.reverb_time)?;
        self.set_muted(settings.muted);
        self.set_hrtf_enabled(settings.hrtf);
        self.set_volume_adjust_enabled(settings.volume_adjust);
        self.set_reverb_enabled(settings.reverb);
        Ok(())
    }

    /// Roles whose emitter is audible right now.
    pub fn connected_roles(&self) -> Vec<Role> {
        self.state
            .lock()
            .registry
            .as_ref()
            .map(EmitterRegistry::connected_roles)
            .unwrap_or_default()
    }

    /// Fade `role` to `dest_db` in 1 dB steps `step` apart, then silence it.
    ///
    /// The lock is released between steps. Any cue played meanwhile, for this
    /// role or another, ends the fade and is left untouched.
    pub fn fade_out(&self, role: Role, dest_db: f32, step: Duration) -> CueResult<()> {
        let fade = FadeEffect::new(dest_db, step)?;
        let (start, generation) = {
            let state = self.state.lock();
            let registry = state.registry.as_ref().ok_or(CueError::EngineShutdown)?;
            let emitter = registry
                .get(role)
                .ok_or_else(|| CueError::InvalidParameter(format!("no emitter for {}", role)))?;
            (VolumeLevel::new(emitter.volume_db()), state.plays)
        };

        for level in fade.ramp_from(start)? {
            {
                let mut state = self.state.lock();
                if state.plays != generation {
                    tracing::trace!("Fade of {} interrupted by a new cue", role);
                    return Ok(());
                }
                let Some(emitter) = state.registry.as_mut().and_then(|r| r.get_mut(role)) else {
                    return Err(CueError::EngineShutdown);
                };
                if !emitter.is_connected() {
                    emitter.set_volume_db(0.0)?;
                    return Ok(());
                }
                emitter.set_volume_db(level.db())?;
            }
            thread::sleep(fade.step_interval);
        }

        let mut state = self.state.lock();
        if state.plays != generation {
            return Ok(());
        }
        if let Some(emitter) = state.registry.as_mut().and_then(|r| r.get_mut(role)) {
            emitter.deactivate()?;
            emitter.set_volume_db(0.0)?;
        }
        Ok(())
    }

    /// Silence everything and release the engine. Idempotent; later
    /// notifications return [`NotifyOutcome::ShutDown`].
    pub fn shutdown(&self) {
        let registry = self.state.lock().registry.take();
        if let Some(mut registry) = registry {
            registry.shutdown();
            tracing::info!("Playback controller shut down");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.state.lock().registry.is_none()
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::generate_placeholder_assets;
    use crate::audio_system::headless::{HeadlessEngine, HeadlessProbe};
    use crate::role::SOUND_ASSETS;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::path::{Path, PathBuf};
    use std::sync::OnceLock;

    const DESKTOP: Rect = Rect::new(0, 0, 1920, 1080);

    fn sounds_dir() -> &'static Path {
        static DIR: OnceLock<PathBuf> = OnceLock::new();
        DIR.get_or_init(|| {
            let dir =
                std::env::temp_dir().join(format!("unspoken-controller-{}", std::process::id()));
            generate_placeholder_assets(&dir).unwrap();
            dir
        })
    }

    fn controller_with(settings: CueSettings) -> (PlaybackController, HeadlessProbe) {
        let engine = HeadlessEngine::new();
        let probe = engine.probe();
        let registry = EmitterRegistry::build(Box::new(engine), &settings, sounds_dir()).unwrap();
        (PlaybackController::new(registry, &settings), probe)
    }

    fn controller() -> (PlaybackController, HeadlessProbe) {
        controller_with(CueSettings::default())
    }

    fn centered(id: u64, role: Role) -> CueTarget {
        CueTarget::new(id, role, Some(Rect::new(910, 490, 100, 100)))
    }

    #[test]
    fn test_notify_plays_at_mapped_position() {
        let (controller, probe) = controller();

        let outcome = controller.notify(&centered(1, Role::Button), DESKTOP, 100);

        match outcome {
            NotifyOutcome::Played { role, frame, .. } => {
                assert_eq!(role, Role::Button);
                assert!(frame.azimuth.abs() < 1e-9);
                assert!((frame.elevation + 15.0).abs() < 1e-9);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        let snapshot = probe.snapshot("button").unwrap();
        assert!(snapshot.connected);
        assert_eq!(snapshot.position, [0.0, -15.0, 0.0]);
        assert_eq!(snapshot.cursor, 0);
    }

    #[test]
    fn test_single_active_across_random_sequence() {
        let (controller, probe) = controller();
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut now = Instant::now();
        let roles = [Role::Heading, Role::Window, Role::Unknown];

        for _ in 0..500 {
            let role = if rng.gen_bool(0.1) {
                roles[rng.gen_range(0..roles.len())]
            } else {
                SOUND_ASSETS[rng.gen_range(0..SOUND_ASSETS.len())].role
            };
            let rect = Rect::new(
                rng.gen_range(-200..2200),
                rng.gen_range(-200..1300),
                rng.gen_range(0..300),
                rng.gen_range(0..300),
            );
            let target = CueTarget::new(rng.gen_range(0..20), role, Some(rect));
            now += Duration::from_millis(rng.gen_range(0..150));

            let outcome = controller.notify_at(&target, DESKTOP, rng.gen(), now);
            if outcome.is_played() {
                assert_eq!(controller.connected_roles(), vec![role]);
            }
            assert!(probe.connected_count() <= 1);
        }
    }

    #[test]
    fn test_debounce_same_target() {
        let (controller, probe) = controller();
        let target = centered(7, Role::Checkbox);
        let start = Instant::now();

        assert!(controller.notify_at(&target, DESKTOP, 100, start).is_played());
        assert_eq!(
            controller.notify_at(&target, DESKTOP, 100, start + Duration::from_millis(99)),
            NotifyOutcome::Debounced
        );
        assert_eq!(probe.play_count("checkbox"), 1);

        assert!(controller
            .notify_at(&target, DESKTOP, 100, start + Duration::from_millis(100))
            .is_played());
        assert_eq!(probe.play_count("checkbox"), 2);
    }

    #[test]
    fn test_debounce_does_not_block_other_targets() {
        let (controller, _probe) = controller();
        let start = Instant::now();

        assert!(controller.notify_at(&centered(1, Role::Link), DESKTOP, 100, start).is_played());
        assert!(controller.notify_at(&centered(2, Role::Link), DESKTOP, 100, start).is_played());
        // Back to the first object: it is no longer the last played one
        assert!(controller.notify_at(&centered(1, Role::Link), DESKTOP, 100, start).is_played());
    }

    #[test]
    fn test_unmapped_target_breaks_debounce_window() {
        let (controller, probe) = controller();
        let start = Instant::now();
        let button = centered(1, Role::Button);

        assert!(controller.notify_at(&button, DESKTOP, 100, start).is_played());
        let heading = centered(2, Role::Heading);
        assert_eq!(
            controller.notify_at(&heading, DESKTOP, 100, start + Duration::from_millis(10)),
            NotifyOutcome::Unmapped
        );
        // The heading was the last notified target, so the button plays again
        assert!(controller
            .notify_at(&button, DESKTOP, 100, start + Duration::from_millis(20))
            .is_played());
        assert_eq!(probe.play_count("button"), 2);
    }

    #[test]
    fn test_failed_connect_is_reported_and_recovers() {
        let (controller, probe) = controller();
        let start = Instant::now();
        let target = centered(9, Role::ComboBox);
        controller.notify_at(&centered(8, Role::Link), DESKTOP, 100, start);

        probe.fail_next_connects(1);
        assert_eq!(
            controller.notify_at(&target, DESKTOP, 100, start),
            NotifyOutcome::Failed
        );
        assert_eq!(probe.connected_count(), 0);
        assert!(controller.connected_roles().is_empty());

        let retry = start + Duration::from_millis(DEBOUNCE_MS);
        assert!(controller.notify_at(&target, DESKTOP, 100, retry).is_played());
        assert_eq!(probe.connected_labels(), vec!["combo box".to_string()]);
    }

    #[test]
    fn test_unmapped_role_is_silent() {
        let (controller, probe) = controller();
        controller.notify(&centered(1, Role::Tab), DESKTOP, 100);

        let outcome = controller.notify(&centered(2, Role::Heading), DESKTOP, 100);

        assert_eq!(outcome, NotifyOutcome::Unmapped);
        // The previous cue is left alone
        assert_eq!(probe.connected_labels(), vec!["tab".to_string()]);
    }

    #[test]
    fn test_muted_plays_nothing() {
        let (controller, probe) = controller();
        controller.set_muted(true);

        assert_eq!(
            controller.notify(&centered(1, Role::Button), DESKTOP, 100),
            NotifyOutcome::Muted
        );
        assert_eq!(probe.total_plays(), 0);

        controller.set_muted(false);
        assert!(controller.notify(&centered(1, Role::Button), DESKTOP, 100).is_played());
    }

    #[test]
    fn test_gain_derivation() {
        let (controller, probe) = controller();
        let start = Instant::now();

        controller.notify_at(&centered(1, Role::Button), DESKTOP, 50, start);
        assert_eq!(probe.snapshot("button").unwrap().gain, 0.75);

        controller.set_hrtf_enabled(false);
        controller.notify_at(&centered(2, Role::Button), DESKTOP, 50, start);
        assert_eq!(probe.snapshot("button").unwrap().gain, 0.5);

        controller.set_volume_adjust_enabled(false);
        controller.notify_at(&centered(3, Role::Button), DESKTOP, 50, start);
        assert_eq!(probe.snapshot("button").unwrap().gain, 1.0);
    }

    #[test]
    fn test_hrtf_toggle_switches_panner() {
        let (controller, probe) = controller();
        assert_eq!(probe.panner_strategy(), Some(PannerStrategy::Hrtf));

        controller.set_hrtf_enabled(false);
        controller.notify(&centered(1, Role::Slider), DESKTOP, 100);

        assert_eq!(probe.panner_strategy(), Some(PannerStrategy::Stereo));
        assert_eq!(
            probe.snapshot("slider").unwrap().panner_at_connect,
            Some(PannerStrategy::Stereo)
        );
    }

    #[test]
    fn test_hover_plays_only_on_change() {
        let (controller, probe) = controller();
        let start = Instant::now();
        let target = centered(3, Role::MenuItem);

        assert!(controller.hover_at(&target, DESKTOP, 100, start).is_played());
        assert_eq!(
            controller.hover_at(&target, DESKTOP, 100, start + Duration::from_secs(1)),
            NotifyOutcome::Unchanged
        );
        assert!(controller
            .hover_at(&centered(4, Role::MenuItem), DESKTOP, 100, start)
            .is_played());
        assert_eq!(probe.play_count("menu item"), 2);
    }

    #[test]
    fn test_reverb_setters() {
        let (controller, _probe) = controller();

        assert!(controller.set_reverb_gain(0.5).is_ok());
        assert!(controller.set_reverb_gain(1.5).is_err());
        assert!(controller.set_reverb_decay_seconds(0.8).is_ok());
        assert!(controller.set_reverb_decay_seconds(0.0).is_err());

        controller.set_reverb_enabled(false);
        assert!(!controller.reverb_enabled());
    }

    #[test]
    fn test_apply_settings() {
        let (controller, probe) = controller();
        let settings = CueSettings {
            hrtf: false,
            volume_adjust: false,
            reverb_level: 0.3,
            ..CueSettings::default()
        };

        controller.apply_settings(&settings).unwrap();

        assert!(!controller.hrtf_enabled());
        assert!(!controller.volume_adjust_enabled());
        assert_eq!(probe.panner_strategy(), Some(PannerStrategy::Stereo));

        let invalid = CueSettings {
            reverb_time: -1.0,
            ..CueSettings::default()
        };
        assert!(matches!(
            controller.apply_settings(&invalid),
            Err(CueError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_fade_out_silences_and_restores_volume() {
        let (controller, probe) = controller();
        controller.notify(&centered(1, Role::Tab), DESKTOP, 100);

        controller.fade_out(Role::Tab, -3.0, Duration::ZERO).unwrap();

        let snapshot = probe.snapshot("tab").unwrap();
        assert!(!snapshot.connected);
        // Replayed at full level
        controller.notify(&centered(2, Role::Tab), DESKTOP, 100);
        assert_eq!(probe.snapshot("tab").unwrap().gain, 1.25);
    }

    #[test]
    fn test_replaying_faded_role_ends_fade_at_full_level() {
        let (controller, probe) = controller();
        let controller = std::sync::Arc::new(controller);
        controller.notify(&centered(1, Role::Tab), DESKTOP, 100);

        let fader = std::sync::Arc::clone(&controller);
        let fade = thread::spawn(move || fader.fade_out(Role::Tab, -40.0, Duration::from_millis(10)));

        let deadline = Instant::now() + Duration::from_secs(5);
        while probe.snapshot("tab").unwrap().gain >= 1.25 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(probe.snapshot("tab").unwrap().gain < 1.25);

        let outcome = controller.notify(&centered(2, Role::Tab), DESKTOP, 100);
        assert!(outcome.is_played());
        fade.join().unwrap().unwrap();

        let snapshot = probe.snapshot("tab").unwrap();
        assert!(snapshot.connected);
        assert_eq!(snapshot.gain, 1.25);
    }

    #[test]
    fn test_notify_after_shutdown_is_noop() {
        let (controller, probe) = controller();
        controller.notify(&centered(1, Role::Button), DESKTOP, 100);

        controller.shutdown();
        controller.shutdown();

        assert!(controller.is_shut_down());
        assert!(probe.is_closed());
        assert_eq!(
            controller.notify(&centered(2, Role::Link), DESKTOP, 100),
            NotifyOutcome::ShutDown
        );
        assert_eq!(
            controller.hover(&centered(3, Role::Link), DESKTOP, 100),
            NotifyOutcome::ShutDown
        );
        assert!(controller.set_reverb_gain(0.5).is_ok());
        assert!(controller.connected_roles().is_empty());
    }

    #[test]
    fn test_concurrent_notifications_keep_one_active() {
        let (controller, probe) = controller();
        let controller = std::sync::Arc::new(controller);

        let handles: Vec<_> = (0..4u64)
            .map(|worker| {
                let controller = std::sync::Arc::clone(&controller);
                thread::spawn(move || {
                    for i in 0..50u64 {
                        let asset = &SOUND_ASSETS[((worker * 50 + i) as usize) % SOUND_ASSETS.len()];
                        controller.notify(&centered(worker * 1_000 + i, asset.role), DESKTOP, 80);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(probe.connected_count(), 1);
        assert_eq!(controller.connected_roles().len(), 1);
    }
}
