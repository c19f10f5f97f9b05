//! One persistent positioned cue per role.

use std::sync::Arc;
use std::time::Duration;

use super::buffer::Buffer;
use super::context::{AudioContext, SessionHandle};
use super::effects::volume::{db_to_gain, MIN_DB};
use super::engine::{SourceKind, Voice, VoiceSpec};
use super::reverb::ReverbBus;
use crate::error::{CueError, CueResult};
use crate::role::Role;

/// Pitch bend range as a playback rate multiplier.
const MIN_PITCH: f32 = 0.1;
const MAX_PITCH: f32 = 10.0;

/// A source + generator pair bound to one buffer, reused for every play of
/// its role.
///
/// The emitter does not know about other emitters. Keeping a single emitter
/// audible is the controller's job.
pub struct RoleEmitter {
    role: Role,
    buffer: Arc<Buffer>,
    voice: Box<dyn Voice>,
    session: SessionHandle,
    kind: SourceKind,
    routes_reverb: bool,
    gain: f32,
    volume_db: f32,
}

impl RoleEmitter {
    /// Allocate the voice for `role`. Routing to `reverb` is fixed for the
    /// emitter's lifetime.
    pub fn create(
        role: Role,
        buffer: Arc<Buffer>,
        kind: SourceKind,
        reverb: Option<&ReverbBus>,
        context: &mut AudioContext,
    ) -> CueResult<Self> {
        let spec = VoiceSpec {
            label: role.name().to_string(),
            buffer: Arc::clone(&buffer),
            kind,
            reverb: reverb.map(ReverbBus::send),
        };
        let voice = context.create_voice(spec)?;

        Ok(Self {
            role,
            buffer,
            voice,
            session: context.session(),
            kind,
            routes_reverb: reverb.is_some(),
            gain: 1.0,
            volume_db: 0.0,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn routes_reverb(&self) -> bool {
        self.routes_reverb
    }

    /// Rewind to the first frame and clear the loop flag.
    pub fn reset(&mut self) -> CueResult<()> {
        self.session.ensure_open()?;
        self.voice.set_cursor(0);
        self.voice.set_looping(false);
        Ok(())
    }

    /// Position the source at `(azimuth, elevation, 0)` degrees, apply `gain`
    /// and start sounding from the current cursor.
    pub fn activate(&mut self, position: [f32; 3], gain: f32) -> CueResult<()> {
        self.session.ensure_open()?;
        self.voice.set_position(position);
        self.gain = gain;
        self.voice.set_gain(self.effective_gain());
        self.voice.connect()
    }

    /// Silence the emitter, keeping its cursor. Idempotent.
    pub fn deactivate(&mut self) -> CueResult<()> {
        self.session.ensure_open()?;
        if self.voice.is_connected() {
            self.voice.disconnect();
        }
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_open() && self.voice.is_connected()
    }

    /// Restart from the top and keep repeating until deactivated.
    pub fn play_looped(&mut self, position: [f32; 3], gain: f32) -> CueResult<()> {
        self.reset()?;
        self.voice.set_looping(true);
        self.activate(position, gain)
    }

    /// Bend pitch to `percent` of the original rate.
    pub fn set_pitch(&mut self, percent: f32) -> CueResult<()> {
        self.session.ensure_open()?;
        if !percent.is_finite() {
            return Err(CueError::InvalidParameter(format!("pitch {}%", percent)));
        }
        self.voice.set_pitch((percent / 100.0).clamp(MIN_PITCH, MAX_PITCH));
        Ok(())
    }

    /// Attenuation in dB applied on top of the gain passed to `activate`.
    /// Positive values are capped at 0. Takes effect immediately, also on a
    /// sounding emitter.
    pub fn set_volume_db(&mut self, db: f32) -> CueResult<()> {
        self.session.ensure_open()?;
        if db.is_nan() {
            return Err(CueError::InvalidParameter("volume NaN dB".to_string()));
        }
        self.volume_db = db.clamp(MIN_DB, 0.0);
        self.voice.set_gain(self.effective_gain());
        Ok(())
    }

    fn effective_gain(&self) -> f32 {
        self.gain * db_to_gain(self.volume_db)
    }

    pub fn volume_db(&self) -> f32 {
        self.volume_db
    }

    /// Cursor position in seconds.
    pub fn playback_position(&self) -> Duration {
        Duration::from_secs_f64(self.voice.cursor() as f64 / self.buffer.sample_rate() as f64)
    }

    /// Length of the bound buffer.
    pub fn duration(&self) -> Duration {
        self.buffer.duration()
    }
}

impl std::fmt::Debug for RoleEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleEmitter")
            .field("role", &self.role)
            .field("kind", &self.kind)
            .field("routes_reverb", &self.routes_reverb)
            .field("volume_db", &self.volume_db)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_system::engine::PannerStrategy;
    use crate::audio_system::headless::{HeadlessEngine, HeadlessProbe};

    fn setup() -> (AudioContext, HeadlessProbe, Arc<Buffer>) {
        let engine = HeadlessEngine::new();
        let probe = engine.probe();
        let context = AudioContext::new(Box::new(engine), PannerStrategy::Hrtf);
        let buffer = Arc::new(Buffer::from_samples(vec![0.1; 44_100], 1, 44_100));
        (context, probe, buffer)
    }

    #[test]
    fn test_activate_positions_and_connects() {
        let (mut context, probe, buffer) = setup();
        let mut emitter =
            RoleEmitter::create(Role::Button, buffer, SourceKind::ThreeD, None, &mut context)
                .unwrap();

        emitter.reset().unwrap();
        emitter.activate([-45.0, -15.0, 0.0], 0.75).unwrap();

        let snapshot = probe.snapshot("button").unwrap();
        assert!(emitter.is_connected());
        assert_eq!(snapshot.position, [-45.0, -15.0, 0.0]);
        assert_eq!(snapshot.gain, 0.75);
        assert_eq!(snapshot.kind, SourceKind::ThreeD);
    }

    #[test]
    fn test_deactivate_is_idempotent_and_keeps_cursor() {
        let (mut context, probe, buffer) = setup();
        let mut emitter =
            RoleEmitter::create(Role::Link, buffer, SourceKind::ThreeD, None, &mut context)
                .unwrap();

        emitter.activate([0.0, 0.0, 0.0], 1.0).unwrap();
        emitter.voice.set_cursor(22_050);
        emitter.deactivate().unwrap();
        emitter.deactivate().unwrap();

        assert!(!emitter.is_connected());
        assert_eq!(probe.snapshot("link").unwrap().cursor, 22_050);
        assert_eq!(emitter.playback_position(), Duration::from_millis(500));
    }

    #[test]
    fn test_reset_rewinds_and_clears_loop() {
        let (mut context, probe, buffer) = setup();
        let mut emitter =
            RoleEmitter::create(Role::Slider, buffer, SourceKind::ThreeD, None, &mut context)
                .unwrap();

        emitter.play_looped([0.0, 0.0, 0.0], 1.0).unwrap();
        assert!(probe.snapshot("slider").unwrap().looping);

        emitter.voice.set_cursor(100);
        emitter.reset().unwrap();
        let snapshot = probe.snapshot("slider").unwrap();
        assert_eq!(snapshot.cursor, 0);
        assert!(!snapshot.looping);
    }

    #[test]
    fn test_reverb_routing_is_fixed_at_creation() {
        let (mut context, probe, buffer) = setup();
        let bus = ReverbBus::default();
        let routed = RoleEmitter::create(
            Role::Checkbox,
            Arc::clone(&buffer),
            SourceKind::ThreeD,
            Some(&bus),
            &mut context,
        )
        .unwrap();
        let dry =
            RoleEmitter::create(Role::Tab, buffer, SourceKind::ThreeD, None, &mut context)
                .unwrap();

        assert!(routed.routes_reverb());
        assert!(!dry.routes_reverb());
        assert!(probe.snapshot("checkbox").unwrap().routed_to_reverb);
    }

    #[test]
    fn test_pitch_and_volume() {
        let (mut context, probe, buffer) = setup();
        let mut emitter =
            RoleEmitter::create(Role::Menu, buffer, SourceKind::ThreeD, None, &mut context)
                .unwrap();

        emitter.set_pitch(150.0).unwrap();
        assert_eq!(probe.snapshot("menu").unwrap().pitch, 1.5);
        emitter.set_pitch(5.0).unwrap();
        assert_eq!(probe.snapshot("menu").unwrap().pitch, MIN_PITCH);
        emitter.set_pitch(5_000.0).unwrap();
        assert_eq!(probe.snapshot("menu").unwrap().pitch, MAX_PITCH);

        emitter.set_volume_db(6.0).unwrap();
        assert_eq!(emitter.volume_db(), 0.0);
        emitter.set_volume_db(-20.0).unwrap();
        emitter.activate([0.0, 0.0, 0.0], 0.5).unwrap();
        assert!((probe.snapshot("menu").unwrap().gain - 0.05).abs() < 1e-6);

        // Applies live to the sounding voice
        emitter.set_volume_db(0.0).unwrap();
        assert_eq!(probe.snapshot("menu").unwrap().gain, 0.5);
    }

    #[test]
    fn test_duration() {
        let (mut context, _probe, buffer) = setup();
        let emitter =
            RoleEmitter::create(Role::Icon, buffer, SourceKind::ThreeD, None, &mut context)
                .unwrap();
        assert_eq!(emitter.duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_calls_after_shutdown_fail() {
        let (mut context, _probe, buffer) = setup();
        let mut emitter =
            RoleEmitter::create(Role::Clock, buffer, SourceKind::ThreeD, None, &mut context)
                .unwrap();
        emitter.activate([0.0, 0.0, 0.0], 1.0).unwrap();

        context.shutdown();

        assert!(!emitter.is_connected());
        assert!(matches!(emitter.reset(), Err(CueError::EngineShutdown)));
        assert!(matches!(
            emitter.activate([0.0, 0.0, 0.0], 1.0),
            Err(CueError::EngineShutdown)
        ));
        assert!(matches!(emitter.deactivate(), Err(CueError::EngineShutdown)));
    }
}
