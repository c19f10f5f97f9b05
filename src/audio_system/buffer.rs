//! Decoded sound buffers and the path-keyed cache that owns them.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rodio::{Decoder, Source};

use crate::error::DecodeError;

/// Interleaved f32 samples of one sound file.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl Buffer {
    pub fn from_samples(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            channels: channels.max(1),
            sample_rate: sample_rate.max(1),
        }
    }

    /// Decode a sound file fully into memory.
    pub fn decode_file(path: &Path) -> Result<Self, DecodeError> {
        let file = File::open(path)?;
        let decoder = Decoder::new(BufReader::new(file))?;

        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let samples: Vec<f32> = decoder.convert_samples::<f32>().collect();
        if samples.is_empty() {
            return Err(DecodeError::Empty);
        }

        Ok(Self::from_samples(samples, channels, sample_rate))
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }
}

/// Memoizes decoded buffers by path. Never evicts.
#[derive(Default)]
pub struct BufferCache {
    buffers: HashMap<PathBuf, Arc<Buffer>>,
    decode_count: usize,
}

impl BufferCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the buffer for `path`, decoding it on first use.
    pub fn get(&mut self, path: &Path) -> Result<Arc<Buffer>, DecodeError> {
        if let Some(buffer) = self.buffers.get(path) {
            return Ok(Arc::clone(buffer));
        }

        let buffer = Arc::new(Buffer::decode_file(path)?);
        self.decode_count += 1;
        tracing::debug!(
            "Decoded {} ({} frames, {} ch, {} Hz)",
            path.display(),
            buffer.frames(),
            buffer.channels(),
            buffer.sample_rate()
        );

        self.buffers.insert(path.to_path_buf(), Arc::clone(&buffer));
        Ok(buffer)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.buffers.contains_key(path)
    }

    /// Number of cached buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Number of files actually decoded (cache misses).
    pub fn decode_count(&self) -> usize {
        self.decode_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(name: &str, frames: usize) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("unspoken-buffer-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..frames {
            let sample = ((i as f32 * 0.05).sin() * 8_000.0) as i16;
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn test_decode_wav() {
        let path = write_wav("decode.wav", 2_205);
        let buffer = Buffer::decode_file(&path).unwrap();

        assert_eq!(buffer.channels(), 1);
        assert_eq!(buffer.sample_rate(), 22_050);
        assert_eq!(buffer.frames(), 2_205);
        assert!((buffer.duration().as_secs_f64() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_cache_decodes_once() {
        let path = write_wav("cached.wav", 500);
        let mut cache = BufferCache::new();

        let first = cache.get(&path).unwrap();
        let second = cache.get(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.decode_count(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&path));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let mut cache = BufferCache::new();
        let result = cache.get(Path::new("/definitely/not/here.wav"));

        assert!(matches!(result, Err(DecodeError::Io(_))));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_garbage_file_is_a_decode_error() {
        let path = std::env::temp_dir().join(format!("unspoken-garbage-{}.wav", std::process::id()));
        std::fs::write(&path, b"not a sound file at all").unwrap();

        let result = Buffer::decode_file(&path);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(DecodeError::Decoder(_))));
    }

    #[test]
    fn test_frames_for_stereo_buffer() {
        let buffer = Buffer::from_samples(vec![0.0; 200], 2, 100);
        assert_eq!(buffer.frames(), 100);
        assert_eq!(buffer.duration(), Duration::from_secs(1));
    }
}
