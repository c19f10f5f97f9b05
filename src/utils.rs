use std::time::{Duration, Instant};

/// Debounce helper keyed on the most recent trigger.
///
/// Only repeats of the *same* key inside the quiet interval are suppressed;
/// a different key always passes.
pub struct Debouncer<K> {
    last_trigger: Option<(K, Instant)>,
    debounce_duration: Duration,
}

impl<K: PartialEq> Debouncer<K> {
    /// Create a new debouncer with specified duration in milliseconds
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            last_trigger: None,
            debounce_duration: Duration::from_millis(debounce_ms),
        }
    }

    /// Returns true if `key` was the last trigger and less than the quiet
    /// interval has elapsed since it at `now`.
    pub fn is_suppressed(&self, key: &K, now: Instant) -> bool {
        match &self.last_trigger {
            Some((last_key, last)) if last_key == key => {
                now.saturating_duration_since(*last) < self.debounce_duration
            }
            _ => false,
        }
    }

    /// Remember `key` as the most recent trigger.
    pub fn record(&mut self, key: K, now: Instant) {
        self.last_trigger = Some((key, now));
    }
}
