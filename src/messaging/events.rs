//! Events pushed by the host.

use std::fmt;

use crate::playback::{CueTarget, NotifyOutcome, PlaybackController};
use crate::spatial::Rect;

/// What happened in the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Keyboard focus moved to the target
    FocusGained,
    /// Review cursor / object navigator moved to the target
    NavigatorChanged,
    /// Pointer moved over the target
    MouseMoved,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::FocusGained => write!(f, "focus"),
            EventKind::NavigatorChanged => write!(f, "navigator"),
            EventKind::MouseMoved => write!(f, "mouse"),
        }
    }
}

/// A target-changed notification with everything the controller needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostEvent {
    pub kind: EventKind,
    pub target: CueTarget,
    /// Current desktop rectangle
    pub desktop: Rect,
    /// Host output volume, 0-100
    pub volume_percent: u8,
}

impl HostEvent {
    pub fn new(kind: EventKind, target: CueTarget, desktop: Rect, volume_percent: u8) -> Self {
        Self {
            kind,
            target,
            desktop,
            volume_percent,
        }
    }

    /// Hand the event to `controller`.
    pub fn dispatch(&self, controller: &PlaybackController) -> NotifyOutcome {
        match self.kind {
            EventKind::MouseMoved => controller.hover(&self.target, self.desktop, self.volume_percent),
            EventKind::FocusGained | EventKind::NavigatorChanged => {
                controller.notify(&self.target, self.desktop, self.volume_percent)
            }
        }
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        format!("{} on {} ({:?})", self.kind, self.target.role, self.target.id)
    }
}
