//! Real output backend on rodio.
//!
//! The output stream lives on its own thread for the life of the engine; the
//! engine and its voices only hold the stream handle. Every voice owns one
//! `Sink` and replays its buffer through the effect chain on each connect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender};
use parking_lot::RwLock;
use rodio::{OutputStream, OutputStreamHandle, Sink};

use super::buffer::Buffer;
use super::effects::EffectChain;
use super::engine::{AudioEngine, DistanceModel, PannerStrategy, SourceKind, Voice, VoiceSpec};
use super::reverb::ReverbSend;
use super::source::{BufferSource, PlaybackCursor};
use crate::error::{CueError, CueResult};

/// Sinks allocated before the engine reports exhaustion.
pub const DEFAULT_MAX_VOICES: usize = 64;

pub struct RodioEngine {
    handle: OutputStreamHandle,
    open: Arc<AtomicBool>,
    shutdown_tx: Option<Sender<()>>,
    stream_thread: Option<JoinHandle<()>>,
    panner: Arc<RwLock<PannerStrategy>>,
    distance: Arc<RwLock<DistanceModel>>,
    voice_count: usize,
    max_voices: usize,
}

impl RodioEngine {
    /// Open the default output device.
    pub fn new() -> CueResult<Self> {
        Self::with_max_voices(DEFAULT_MAX_VOICES)
    }

    pub fn with_max_voices(max_voices: usize) -> CueResult<Self> {
        let (handle_tx, handle_rx) = bounded(1);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        let stream_thread = thread::Builder::new()
            .name("unspoken-audio".to_string())
            .spawn(move || match OutputStream::try_default() {
                Ok((stream, handle)) => {
                    let _ = handle_tx.send(Ok(handle));
                    // Keep the stream alive until shutdown or engine drop
                    let _ = shutdown_rx.recv();
                    drop(stream);
                    tracing::debug!("Audio output stream closed");
                }
                Err(e) => {
                    let _ = handle_tx.send(Err(e.to_string()));
                }
            })
            .map_err(|e| CueError::ResourceExhausted(format!("audio thread ({})", e)))?;

        let handle = handle_rx
            .recv()
            .map_err(|_| CueError::ResourceExhausted("audio output stream".to_string()))?
            .map_err(|e| CueError::ResourceExhausted(format!("audio output stream ({})", e)))?;

        tracing::info!("Opened default audio output device");

        Ok(Self {
            handle,
            open: Arc::new(AtomicBool::new(true)),
            shutdown_tx: Some(shutdown_tx),
            stream_thread: Some(stream_thread),
            panner: Arc::new(RwLock::new(PannerStrategy::Stereo)),
            distance: Arc::new(RwLock::new(DistanceModel::None)),
            voice_count: 0,
            max_voices,
        })
    }
}

impl AudioEngine for RodioEngine {
    fn name(&self) -> &'static str {
        "rodio"
    }

    fn create_voice(&mut self, spec: VoiceSpec) -> CueResult<Box<dyn Voice>> {
        if !self.open.load(Ordering::Acquire) {
            return Err(CueError::EngineShutdown);
        }
        if self.voice_count >= self.max_voices {
            return Err(CueError::ResourceExhausted(format!(
                "sink for {} ({} in use)",
                spec.label, self.voice_count
            )));
        }

        let sink = Sink::try_new(&self.handle)
            .map_err(|e| CueError::ResourceExhausted(format!("sink for {} ({})", spec.label, e)))?;
        self.voice_count += 1;

        tracing::debug!(
            "Created {} voice for {}{}",
            spec.kind,
            spec.label,
            if spec.reverb.is_some() { " (reverb)" } else { "" }
        );

        Ok(Box::new(RodioVoice {
            label: spec.label,
            handle: self.handle.clone(),
            sink,
            buffer: spec.buffer,
            cursor: Arc::new(PlaybackCursor::new()),
            kind: spec.kind,
            reverb: spec.reverb,
            position: [0.0; 3],
            gain: 1.0,
            pitch: 1.0,
            panner: Arc::clone(&self.panner),
            distance: Arc::clone(&self.distance),
            engine_open: Arc::clone(&self.open),
            connected: false,
        }))
    }

    fn set_panner_strategy(&mut self, strategy: PannerStrategy) {
        *self.panner.write() = strategy;
    }

    fn set_distance_model(&mut self, model: DistanceModel) {
        *self.distance.write() = model;
    }

    fn close(&mut self) {
        if !self.open.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.stream_thread.take() {
            if thread.join().is_err() {
                tracing::warn!("Audio output thread panicked during shutdown");
            }
        }
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        self.close();
    }
}

struct RodioVoice {
    label: String,
    handle: OutputStreamHandle,
    sink: Sink,
    buffer: Arc<Buffer>,
    cursor: Arc<PlaybackCursor>,
    kind: SourceKind,
    reverb: Option<ReverbSend>,
    position: [f32; 3],
    gain: f32,
    pitch: f32,
    panner: Arc<RwLock<PannerStrategy>>,
    distance: Arc<RwLock<DistanceModel>>,
    engine_open: Arc<AtomicBool>,
    connected: bool,
}

impl Voice for RodioVoice {
    fn set_position(&mut self, position: [f32; 3]) {
        self.position = position;
    }

    fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
        self.sink.set_volume(gain);
    }

    fn cursor(&self) -> usize {
        self.cursor.frame()
    }

    fn set_cursor(&mut self, frame: usize) {
        self.cursor.set_frame(frame.min(self.buffer.frames()));
    }

    fn set_looping(&mut self, looping: bool) {
        self.cursor.set_looping(looping);
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch;
        self.sink.set_speed(pitch);
    }

    fn connect(&mut self) -> CueResult<()> {
        if !self.engine_open.load(Ordering::Acquire) {
            return Err(CueError::EngineShutdown);
        }
        if self.connected {
            self.disconnect();
        }

        let chain = EffectChain::new(self.kind)
            .with_position(self.position)
            .with_panner(*self.panner.read())
            .with_distance(*self.distance.read())
            .with_reverb(self.reverb.clone());
        let source = chain.apply(BufferSource::new(
            Arc::clone(&self.buffer),
            Arc::clone(&self.cursor),
        ));

        self.sink.set_volume(self.gain);
        self.sink.set_speed(self.pitch);
        self.sink.append(source);
        self.sink.play();
        self.connected = true;

        tracing::trace!("Connected {} at {:?}", self.label, self.position);
        Ok(())
    }

    fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        self.cursor.invalidate();
        self.sink.stop();
        // A stopped sink drops later appends; start over with a fresh one
        match Sink::try_new(&self.handle) {
            Ok(sink) => self.sink = sink,
            Err(e) => tracing::warn!("Could not renew sink for {}: {}", self.label, e),
        }
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
