//! Device-less engine backend.
//!
//! Keeps the full voice state in memory without producing sound. Used where no
//! output device exists (CI, `--headless`) and by the test-suite, which reads
//! the recorded state back through a [`HeadlessProbe`].

use std::sync::Arc;

use parking_lot::Mutex;

use super::engine::{AudioEngine, DistanceModel, PannerStrategy, SourceKind, Voice, VoiceSpec};
use crate::error::{CueError, CueResult};

/// Recorded state of one voice.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSnapshot {
    pub label: String,
    pub kind: SourceKind,
    pub routed_to_reverb: bool,
    pub connected: bool,
    pub position: [f32; 3],
    pub gain: f32,
    pub cursor: usize,
    pub looping: bool,
    pub pitch: f32,
    pub connect_count: usize,
    /// Panner in effect when the voice was last connected.
    pub panner_at_connect: Option<PannerStrategy>,
}

#[derive(Debug, Default)]
struct HeadlessState {
    voices: Vec<VoiceSnapshot>,
    panner: Option<PannerStrategy>,
    distance: Option<DistanceModel>,
    /// Upcoming `connect` calls that fail.
    connect_failures: usize,
    closed: bool,
}

pub struct HeadlessEngine {
    state: Arc<Mutex<HeadlessState>>,
    voice_limit: Option<usize>,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(HeadlessState::default())),
            voice_limit: None,
        }
    }

    /// Fail allocation once `limit` voices exist.
    pub fn with_voice_limit(mut self, limit: usize) -> Self {
        self.voice_limit = Some(limit);
        self
    }

    /// Make the next `count` voice connections fail as a transient error.
    pub fn with_connect_failures(self, count: usize) -> Self {
        self.state.lock().connect_failures = count;
        self
    }

    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine for HeadlessEngine {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn create_voice(&mut self, spec: VoiceSpec) -> CueResult<Box<dyn Voice>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(CueError::EngineShutdown);
        }
        if let Some(limit) = self.voice_limit {
            if state.voices.len() >= limit {
                return Err(CueError::ResourceExhausted(format!(
                    "voice for {} (limit {})",
                    spec.label, limit
                )));
            }
        }

        let index = state.voices.len();
        state.voices.push(VoiceSnapshot {
            label: spec.label,
            kind: spec.kind,
            routed_to_reverb: spec.reverb.is_some(),
            connected: false,
            position: [0.0; 3],
            gain: 1.0,
            cursor: 0,
            looping: false,
            pitch: 1.0,
            connect_count: 0,
            panner_at_connect: None,
        });

        Ok(Box::new(HeadlessVoice {
            index,
            state: Arc::clone(&self.state),
        }))
    }

    fn set_panner_strategy(&mut self, strategy: PannerStrategy) {
        self.state.lock().panner = Some(strategy);
    }

    fn set_distance_model(&mut self, model: DistanceModel) {
        self.state.lock().distance = Some(model);
    }

    fn close(&mut self) {
        let mut state = self.state.lock();
        state.closed = true;
        for voice in state.voices.iter_mut() {
            voice.connected = false;
        }
    }
}

struct HeadlessVoice {
    index: usize,
    state: Arc<Mutex<HeadlessState>>,
}

impl HeadlessVoice {
    fn update(&self, f: impl FnOnce(&mut VoiceSnapshot)) {
        let mut state = self.state.lock();
        if let Some(voice) = state.voices.get_mut(self.index) {
            f(voice);
        }
    }
}

impl Voice for HeadlessVoice {
    fn set_position(&mut self, position: [f32; 3]) {
        self.update(|v| v.position = position);
    }

    fn set_gain(&mut self, gain: f32) {
        self.update(|v| v.gain = gain);
    }

    fn cursor(&self) -> usize {
        self.state
            .lock()
            .voices
            .get(self.index)
            .map(|v| v.cursor)
            .unwrap_or(0)
    }

    fn set_cursor(&mut self, frame: usize) {
        self.update(|v| v.cursor = frame);
    }

    fn set_looping(&mut self, looping: bool) {
        self.update(|v| v.looping = looping);
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.update(|v| v.pitch = pitch);
    }

    fn connect(&mut self) -> CueResult<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(CueError::EngineShutdown);
        }
        if state.connect_failures > 0 {
            state.connect_failures -= 1;
            return Err(CueError::TransientPlayback("injected connect failure".to_string()));
        }
        let panner = state.panner;
        let voice = state
            .voices
            .get_mut(self.index)
            .ok_or_else(|| CueError::TransientPlayback("voice record missing".to_string()))?;
        voice.connected = true;
        voice.connect_count += 1;
        voice.panner_at_connect = panner;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.update(|v| v.connected = false);
    }

    fn is_connected(&self) -> bool {
        self.state
            .lock()
            .voices
            .get(self.index)
            .map(|v| v.connected)
            .unwrap_or(false)
    }
}

/// View of a [`HeadlessEngine`]'s state.
#[derive(Clone)]
pub struct HeadlessProbe {
    state: Arc<Mutex<HeadlessState>>,
}

impl HeadlessProbe {
    pub fn voice_count(&self) -> usize {
        self.state.lock().voices.len()
    }

    /// Labels of voices currently connected.
    pub fn connected_labels(&self) -> Vec<String> {
        self.state
            .lock()
            .voices
            .iter()
            .filter(|v| v.connected)
            .map(|v| v.label.clone())
            .collect()
    }

    pub fn connected_count(&self) -> usize {
        self.state.lock().voices.iter().filter(|v| v.connected).count()
    }

    pub fn snapshot(&self, label: &str) -> Option<VoiceSnapshot> {
        self.state
            .lock()
            .voices
            .iter()
            .find(|v| v.label == label)
            .cloned()
    }

    /// How many times the voice labelled `label` was connected.
    pub fn play_count(&self, label: &str) -> usize {
        self.snapshot(label).map(|v| v.connect_count).unwrap_or(0)
    }

    /// Connections across all voices.
    pub fn total_plays(&self) -> usize {
        self.state.lock().voices.iter().map(|v| v.connect_count).sum()
    }

    pub fn panner_strategy(&self) -> Option<PannerStrategy> {
        self.state.lock().panner
    }

    pub fn distance_model(&self) -> Option<DistanceModel> {
        self.state.lock().distance
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Fail the next `count` connections, wherever the engine has gone.
    pub fn fail_next_connects(&self, count: usize) {
        self.state.lock().connect_failures = count;
    }
}
