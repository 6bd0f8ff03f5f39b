//! The sound engine the player drives, and the gate that holds triggers
//! back until its assets are loaded.

use crate::clock::Clock;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, trace};

/// All `at` arguments are in the engine's own time, see `current_time`.
pub trait SoundEngine: Send {
    /// Flips to true once and stays true.
    fn assets_loaded(&self) -> bool {
        true
    }

    fn current_time(&self) -> f64;

    fn attack(&mut self, freq: f64, at: f64);

    fn attack_release(&mut self, freq: f64, duration: f64, at: f64);

    fn release(&mut self, freqs: &[f64], at: f64);

    /// Metronome voice
    fn click(&mut self, freq: f64, duration: f64, at: f64);
}

/// Holds actions back until the sound engine reports its assets loaded.
/// After the first positive check the gate stays open for good.
pub struct AssetGate<T> {
    ready: bool,
    backlog: VecDeque<T>,
}

impl<T> AssetGate<T> {
    pub fn new() -> Self {
        Self {
            ready: false,
            backlog: VecDeque::new(),
        }
    }

    pub fn check(&mut self, sound: &dyn SoundEngine) -> bool {
        if !self.ready && sound.assets_loaded() {
            info!(queued = self.backlog.len(), "sound assets loaded");
            self.ready = true;
        }
        self.ready
    }

    pub fn defer(&mut self, action: T) {
        debug!(queued = self.backlog.len() + 1, "deferring trigger until assets load");
        self.backlog.push_back(action);
    }

    /// Queued actions in arrival order. Empty until the gate is open.
    pub fn take_backlog(&mut self) -> Vec<T> {
        if !self.ready {
            return Vec::new();
        }
        self.backlog.drain(..).collect()
    }

    pub fn queued(&self) -> usize {
        self.backlog.len()
    }
}

impl<T> Default for AssetGate<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Sound engine that only logs what it is asked to play.
pub struct TracingSoundEngine {
    clock: Arc<dyn Clock>,
}

impl TracingSoundEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl SoundEngine for TracingSoundEngine {
    fn current_time(&self) -> f64 {
        self.clock.now()
    }

    fn attack(&mut self, freq: f64, at: f64) {
        info!(freq, at, "attack");
    }

    fn attack_release(&mut self, freq: f64, duration: f64, at: f64) {
        info!(freq, duration, at, "attack+release");
    }

    fn release(&mut self, freqs: &[f64], at: f64) {
        info!(notes = freqs.len(), at, "release");
    }

    fn click(&mut self, _freq: f64, _duration: f64, at: f64) {
        trace!(at, "click");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SoundCall {
    Attack { freq: f64, at: f64 },
    AttackRelease { freq: f64, duration: f64, at: f64 },
    Release { freqs: Vec<f64>, at: f64 },
    Click { freq: f64, duration: f64, at: f64 },
}

impl SoundCall {
    pub fn is_click(&self) -> bool {
        matches!(self, SoundCall::Click { .. })
    }
}

/// Sound engine that keeps every call for later inspection. Clones share
/// the same record.
#[derive(Clone)]
pub struct RecordingSoundEngine {
    clock: Arc<dyn Clock>,
    calls: Arc<Mutex<Vec<SoundCall>>>,
    loaded: Arc<AtomicBool>,
}

impl RecordingSoundEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            calls: Arc::new(Mutex::new(Vec::new())),
            loaded: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_loaded(&self, loaded: bool) {
        self.loaded.store(loaded, Ordering::Relaxed);
    }

    pub fn calls(&self) -> Vec<SoundCall> {
        self.calls.lock().clone()
    }

    /// Calls other than metronome clicks.
    pub fn note_calls(&self) -> Vec<SoundCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| !call.is_click())
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: SoundCall) {
        self.calls.lock().push(call);
    }
}

impl SoundEngine for RecordingSoundEngine {
    fn assets_loaded(&self) -> bool {
        self.loaded.load(Ordering::Relaxed)
    }

    fn current_time(&self) -> f64 {
        self.clock.now()
    }

    fn attack(&mut self, freq: f64, at: f64) {
        self.record(SoundCall::Attack { freq, at });
    }

    fn attack_release(&mut self, freq: f64, duration: f64, at: f64) {
        self.record(SoundCall::AttackRelease { freq, duration, at });
    }

    fn release(&mut self, freqs: &[f64], at: f64) {
        self.record(SoundCall::Release {
            freqs: freqs.to_vec(),
            at,
        });
    }

    fn click(&mut self, freq: f64, duration: f64, at: f64) {
        self.record(SoundCall::Click { freq, duration, at });
    }
}
