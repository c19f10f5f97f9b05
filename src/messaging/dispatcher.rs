//! Bounded event queue with a single consumer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::Mutex;

use super::events::HostEvent;
use crate::error::{CueError, CueResult};
use crate::playback::PlaybackController;

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Result of [`CueDispatcher::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStatus {
    Queued,
    /// Queue full; the event was discarded.
    Dropped,
    /// Dispatcher already shut down.
    Closed,
}

#[derive(Debug, Default)]
struct Counters {
    processed: AtomicUsize,
    dropped: AtomicUsize,
}

/// Feeds host events to a [`PlaybackController`] from a worker thread.
pub struct CueDispatcher {
    controller: Arc<PlaybackController>,
    sender: Mutex<Option<Sender<HostEvent>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl CueDispatcher {
    pub fn new(controller: Arc<PlaybackController>) -> CueResult<Self> {
        Self::with_capacity(controller, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(controller: Arc<PlaybackController>, capacity: usize) -> CueResult<Self> {
        let (tx, rx) = bounded::<HostEvent>(capacity.max(1));
        let counters = Arc::new(Counters::default());

        let worker_controller = Arc::clone(&controller);
        let worker_counters = Arc::clone(&counters);
        let worker = thread::Builder::new()
            .name("unspoken-dispatch".to_string())
            .spawn(move || {
                // Ends once every sender is gone and the queue is empty
                for event in rx.iter() {
                    let outcome = event.dispatch(&worker_controller);
                    worker_counters.processed.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!("{} -> {:?}", event.description(), outcome);
                }
                tracing::debug!("Dispatch worker stopped");
            })
            .map_err(|e| CueError::ResourceExhausted(format!("dispatch thread ({})", e)))?;

        Ok(Self {
            controller,
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            counters,
        })
    }

    /// Queue `event` without blocking.
    pub fn submit(&self, event: HostEvent) -> SubmitStatus {
        let sender = self.sender.lock();
        let Some(tx) = sender.as_ref() else {
            return SubmitStatus::Closed;
        };

        match tx.try_send(event) {
            Ok(()) => SubmitStatus::Queued,
            Err(TrySendError::Full(event)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Cue queue full, dropped {}", event.description());
                SubmitStatus::Dropped
            }
            Err(TrySendError::Disconnected(_)) => SubmitStatus::Closed,
        }
    }

    pub fn controller(&self) -> &Arc<PlaybackController> {
        &self.controller
    }

    /// Events handed to the controller so far.
    pub fn processed_count(&self) -> usize {
        self.counters.processed.load(Ordering::Relaxed)
    }

    /// Events discarded because the queue was full.
    pub fn dropped_count(&self) -> usize {
        self.counters.dropped.load(Ordering::Relaxed)
    }

    /// Stop accepting events, finish the queued ones, then shut the
    /// controller down. Idempotent.
    pub fn shutdown(&self) {
        // Dropping the sender lets the worker drain and exit
        let sender = self.sender.lock().take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                tracing::error!("Dispatch worker panicked");
            }
        }
        self.controller.shutdown();
        tracing::info!(
            "Dispatcher shut down ({} processed, {} dropped)",
            self.processed_count(),
            self.dropped_count()
        );
    }
}

impl Drop for CueDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
