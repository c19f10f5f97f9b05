//! Placeholder cue sounds for a fresh install.
//!
//! Writes a short enveloped sine tone for every cue file that is missing from
//! the sounds directory, each file at its own pitch so cues stay tellable
//! apart until real recordings are dropped in.

use std::f32::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use crate::role::sound_files;

const SAMPLE_RATE: u32 = 22_050;
const TONE_MS: u32 = 80;
const BASE_FREQUENCY: f32 = 440.0;
const AMPLITUDE: f32 = 0.4;

/// Write every missing cue file under `dir`. Existing files are left alone.
///
/// Returns the paths that were written.
pub fn generate_placeholder_assets(dir: &Path) -> Result<Vec<PathBuf>, hound::Error> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for (index, file) in sound_files().into_iter().enumerate() {
        let path = dir.join(file);
        if path.exists() {
            continue;
        }
        // Semitone steps up from A4
        let frequency = BASE_FREQUENCY * 2f32.powf(index as f32 / 12.0);
        write_tone(&path, frequency)?;
        tracing::debug!("Wrote placeholder {} at {:.0} Hz", path.display(), frequency);
        written.push(path);
    }

    if !written.is_empty() {
        tracing::info!(
            "Generated {} placeholder sounds in {}",
            written.len(),
            dir.display()
        );
    }
    Ok(written)
}

fn write_tone(path: &Path, frequency: f32) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;

    let frames = SAMPLE_RATE * TONE_MS / 1000;
    for i in 0..frames {
        let t = i as f32 / SAMPLE_RATE as f32;
        // Linear attack over the first 5ms, linear release to the end
        let attack = (i as f32 / (SAMPLE_RATE as f32 * 0.005)).min(1.0);
        let release = 1.0 - i as f32 / frames as f32;
        let sample = (2.0 * PI * frequency * t).sin() * AMPLITUDE * attack * release;
        writer.write_sample((sample * i16::MAX as f32) as i16)?;
    }
    writer.finalize()
}
