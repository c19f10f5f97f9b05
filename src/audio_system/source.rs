//! Buffer generator: plays a shared [`Buffer`] from a shared cursor.
//!
//! The cursor lives outside the rodio source so a voice can be disconnected
//! and later resumed or rewound without owning the source that rodio consumed.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rodio::Source;

use super::buffer::Buffer;

/// Low bits of the packed cursor hold the frame, high bits the epoch.
const FRAME_BITS: u32 = 40;
const FRAME_MASK: u64 = (1 << FRAME_BITS) - 1;
const EPOCH_MASK: u64 = u64::MAX >> FRAME_BITS;

fn pack(epoch: u64, frame: u64) -> u64 {
    ((epoch & EPOCH_MASK) << FRAME_BITS) | (frame & FRAME_MASK)
}

fn epoch_of(packed: u64) -> u64 {
    packed >> FRAME_BITS
}

fn frame_of(packed: u64) -> u64 {
    packed & FRAME_MASK
}

/// Playback cursor shared between a voice and the sources it spawns.
///
/// Frame and epoch share one atomic word, so a source from an older epoch
/// can never move the cursor after a rewind.
#[derive(Debug, Default)]
pub struct PlaybackCursor {
    state: AtomicU64,
    looping: AtomicBool,
}

impl PlaybackCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> usize {
        frame_of(self.state.load(Ordering::Acquire)) as usize
    }

    pub fn set_frame(&self, frame: usize) {
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |s| {
                Some(pack(epoch_of(s), frame as u64))
            });
    }

    pub fn looping(&self) -> bool {
        self.looping.load(Ordering::Relaxed)
    }

    pub fn set_looping(&self, looping: bool) {
        self.looping.store(looping, Ordering::Relaxed);
    }

    /// Bumped on every disconnect; sources from an older epoch go quiet.
    pub fn epoch(&self) -> u64 {
        epoch_of(self.state.load(Ordering::Acquire))
    }

    /// Detach every source spawned so far.
    pub fn invalidate(&self) -> u64 {
        let previous = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |s| {
                Some(pack(epoch_of(s).wrapping_add(1), frame_of(s)))
            })
            .unwrap_or_else(|s| s);
        epoch_of(previous).wrapping_add(1) & EPOCH_MASK
    }

    /// Move the cursor to `frame` on behalf of a source from `epoch`.
    /// Returns false, leaving the cursor alone, once that epoch is over.
    pub fn advance(&self, epoch: u64, frame: usize) -> bool {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |s| {
                (epoch_of(s) == epoch).then(|| pack(epoch, frame as u64))
            })
            .is_ok()
    }
}

/// Rodio source over a [`Buffer`], starting at the shared cursor.
pub struct BufferSource {
    buffer: Arc<Buffer>,
    cursor: Arc<PlaybackCursor>,
    epoch: u64,
    frame: usize,
    channel: usize,
}

impl BufferSource {
    pub fn new(buffer: Arc<Buffer>, cursor: Arc<PlaybackCursor>) -> Self {
        let epoch = cursor.epoch();
        let frame = cursor.frame().min(buffer.frames());
        Self {
            buffer,
            cursor,
            epoch,
            frame,
            channel: 0,
        }
    }

    fn is_detached(&self) -> bool {
        self.cursor.epoch() != self.epoch
    }
}

impl Iterator for BufferSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.is_detached() {
            return None;
        }

        if self.frame >= self.buffer.frames() {
            if self.cursor.looping() && self.buffer.frames() > 0 {
                self.frame = 0;
            } else {
                return None;
            }
        }

        let channels = self.buffer.channels() as usize;
        let sample = self.buffer.samples()[self.frame * channels + self.channel];

        self.channel += 1;
        if self.channel == channels {
            self.channel = 0;
            self.frame += 1;
            if !self.cursor.advance(self.epoch, self.frame) {
                return None;
            }
        }

        Some(sample)
    }
}

impl Source for BufferSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.buffer.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        if self.cursor.looping() {
            None
        } else {
            Some(self.buffer.duration())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_buffer(frames: usize, channels: u16) -> Arc<Buffer> {
        let samples = (0..frames * channels as usize).map(|i| i as f32).collect();
        Arc::new(Buffer::from_samples(samples, channels, 1_000))
    }

    #[test]
    fn test_plays_from_cursor_and_advances_it() {
        let cursor = Arc::new(PlaybackCursor::new());
        cursor.set_frame(2);
        let source = BufferSource::new(ramp_buffer(4, 1), Arc::clone(&cursor));

        let played: Vec<f32> = source.collect();
        assert_eq!(played, vec![2.0, 3.0]);
        assert_eq!(cursor.frame(), 4);
    }

    #[test]
    fn test_stereo_frames_advance_cursor_once() {
        let cursor = Arc::new(PlaybackCursor::new());
        let mut source = BufferSource::new(ramp_buffer(3, 2), Arc::clone(&cursor));

        assert_eq!(source.next(), Some(0.0));
        assert_eq!(cursor.frame(), 0);
        assert_eq!(source.next(), Some(1.0));
        assert_eq!(cursor.frame(), 1);
        assert_eq!(source.channels(), 2);
    }

    #[test]
    fn test_invalidate_detaches_running_source() {
        let cursor = Arc::new(PlaybackCursor::new());
        let mut source = BufferSource::new(ramp_buffer(8, 1), Arc::clone(&cursor));

        assert!(source.next().is_some());
        cursor.invalidate();
        assert!(source.next().is_none());
        assert_eq!(cursor.frame(), 1);
    }

    #[test]
    fn test_stale_source_cannot_move_rewound_cursor() {
        let cursor = Arc::new(PlaybackCursor::new());
        let mut stale = BufferSource::new(ramp_buffer(8, 1), Arc::clone(&cursor));
        assert_eq!(stale.next(), Some(0.0));
        let old_epoch = cursor.epoch();

        // Disconnect and rewind while the old source is mid-frame
        cursor.invalidate();
        cursor.set_frame(0);
        assert!(!cursor.advance(old_epoch, 5));
        assert_eq!(cursor.frame(), 0);

        assert!(stale.next().is_none());
        assert_eq!(cursor.frame(), 0);
    }

    #[test]
    fn test_invalidate_keeps_frame() {
        let cursor = PlaybackCursor::new();
        cursor.set_frame(12);
        assert_eq!(cursor.invalidate(), 1);
        assert_eq!(cursor.epoch(), 1);
        assert_eq!(cursor.frame(), 12);
    }

    #[test]
    fn test_looping_wraps() {
        let cursor = Arc::new(PlaybackCursor::new());
        cursor.set_looping(true);
        let source = BufferSource::new(ramp_buffer(2, 1), Arc::clone(&cursor));

        let played: Vec<f32> = source.take(5).collect();
        assert_eq!(played, vec![0.0, 1.0, 0.0, 1.0, 0.0]);
    }
}
