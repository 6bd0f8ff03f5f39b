use parking_lot::Mutex;
use std::sync::Arc;

/// What the player tells the interface while a session runs.
pub trait UiCallbacks: Send {
    /// Playhead position in beats
    fn set_playhead_position(&mut self, position: f64);

    fn set_playing(&mut self, playing: bool);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiCall {
    PlayheadPosition(f64),
    Playing(bool),
}

/// Keeps every callback for later inspection. Clones share the same record.
#[derive(Clone, Default)]
pub struct RecordingCallbacks {
    calls: Arc<Mutex<Vec<UiCall>>>,
}

impl RecordingCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<UiCall> {
        self.calls.lock().clone()
    }

    pub fn last_position(&self) -> Option<f64> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            UiCall::PlayheadPosition(position) => Some(*position),
            UiCall::Playing(_) => None,
        })
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

impl UiCallbacks for RecordingCallbacks {
    fn set_playhead_position(&mut self, position: f64) {
        self.calls.lock().push(UiCall::PlayheadPosition(position));
    }

    fn set_playing(&mut self, playing: bool) {
        self.calls.lock().push(UiCall::Playing(playing));
    }
}
