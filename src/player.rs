//! Playback of chord sequences.
//!
//! `Player` owns everything a session needs: the tempo, the built timeline,
//! the transport and metronome clocks, the playhead poller and the cooldown
//! shared by the live preview triggers. At most one session runs at a time.
//! There is no pause: a session is either playing or stopped, and resuming
//! means starting a new session at the old playhead.
//!
//! Calls that make no sense in the current state (starting twice, seeking
//! while stopped, previewing inside a cooldown) are ignored rather than
//! reported as errors.

use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::clock::Clock;
use crate::config::PlayerConfig;
use crate::error::{PlayerError, Result};
use crate::events::{DueTrigger, ScheduledTrigger, Trigger};
use crate::sound::{AssetGate, SoundEngine};
use crate::theory::{MusicTheory, UNKNOWN_CHORD};
use crate::timing::{
    ChordEvent, Metronome, PlayheadPoller, PollOutcome, RateLimiter, Tempo, Timeline, Transport,
    TriggerSource, midi_to_freq,
};
use crate::ui::UiCallbacks;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Stopped,
    Playing,
}

/// Work that has to wait for the sound engine's assets.
enum Deferred {
    Preview { freqs: Vec<f64> },
    Start(SessionStart),
}

struct SessionStart {
    timeline: Timeline,
    /// Tempo the timeline and target were converted at
    tempo: Tempo,
    /// Seconds
    target: f64,
    metronome: bool,
}

pub struct Player {
    config: PlayerConfig,
    clock: Arc<dyn Clock>,
    sound: Box<dyn SoundEngine>,
    ui: Box<dyn UiCallbacks>,
    theory: Arc<dyn MusicTheory>,
    state: SessionState,
    tempo: Tempo,
    /// Tempo of the running session, which can differ from `tempo` when a
    /// start waited on the assets across a tempo change.
    session_tempo: Tempo,
    limiter: RateLimiter,
    gate: AssetGate<Deferred>,
    timeline: Option<Timeline>,
    transport: Transport,
    metronome: Metronome,
    poller: PlayheadPoller,
}

impl Player {
    pub fn new(
        config: PlayerConfig,
        clock: Arc<dyn Clock>,
        sound: Box<dyn SoundEngine>,
        ui: Box<dyn UiCallbacks>,
        theory: Arc<dyn MusicTheory>,
    ) -> Self {
        let metronome = Metronome::new(
            midi_to_freq(config.click_pitch),
            config.click_duration_secs,
        );

        Self {
            tempo: config.tempo_bpm,
            session_tempo: config.tempo_bpm,
            limiter: RateLimiter::new(config.cooldowns),
            poller: PlayheadPoller::new(config.poll_interval_secs()),
            transport: Transport::new(clock.clone()),
            gate: AssetGate::new(),
            timeline: None,
            state: SessionState::Stopped,
            metronome,
            config,
            clock,
            sound,
            ui,
            theory,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == SessionState::Playing
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn timeline(&self) -> Option<&Timeline> {
        self.timeline.as_ref()
    }

    /// Transport position converted to playhead units (beats).
    pub fn playhead(&self) -> f64 {
        self.session_tempo.seconds_to_beats(self.transport.now())
    }

    /// Triggers still waiting on the transport.
    pub fn pending_triggers(&self) -> usize {
        self.transport.pending()
    }

    pub fn is_metronome_muted(&self) -> bool {
        self.metronome.is_muted()
    }

    /// Plays `pitches` (MIDI) right away, outside of any sequence.
    /// Returns whether the preview was accepted.
    pub fn play_preview_notes(&mut self, pitches: &[u8]) -> bool {
        self.flush_deferred();

        if self.is_playing() {
            debug!("note preview ignored while playing");
            return false;
        }
        if !self.limiter.try_acquire(TriggerSource::PreviewNotes, self.clock.now_ms()) {
            debug!("note preview inside cooldown");
            return false;
        }

        let freqs = pitches.iter().copied().map(midi_to_freq).collect();
        self.run_or_defer(Deferred::Preview { freqs });
        true
    }

    /// Plays the voicing of `symbol` right away. The unknown-chord symbol is
    /// ignored; a symbol missing from the tables is an error.
    pub fn play_preview_chord(&mut self, symbol: &str) -> Result<bool> {
        self.flush_deferred();

        if symbol == UNKNOWN_CHORD || self.is_playing() {
            debug!(symbol, playing = self.is_playing(), "chord preview ignored");
            return Ok(false);
        }

        let freqs: Vec<f64> = self
            .theory
            .chord_to_notes(symbol)
            .ok_or_else(|| PlayerError::UnknownChord(symbol.to_string()))?
            .iter()
            .copied()
            .map(midi_to_freq)
            .collect();

        if !self.limiter.try_acquire(TriggerSource::PreviewChord, self.clock.now_ms()) {
            debug!(symbol, "chord preview inside cooldown");
            return Ok(false);
        }

        self.run_or_defer(Deferred::Preview { freqs });
        Ok(true)
    }

    /// Starts a session at `playhead` (beats). Ignored while a session is
    /// already playing. The metronome always runs; `metronome` only decides
    /// whether it starts muted.
    pub fn play_sequence(
        &mut self,
        chords: &[ChordEvent],
        playhead: f64,
        metronome: bool,
    ) -> Result<bool> {
        self.flush_deferred();

        if self.is_playing() {
            debug!("play request ignored, already playing");
            return Ok(false);
        }

        let target = self.tempo.beats_to_seconds(playhead);
        if !target.is_finite() {
            return Err(PlayerError::InvalidPlayhead(playhead));
        }
        let timeline = Timeline::build(chords, self.tempo, self.theory.as_ref())?;
        self.run_or_defer(Deferred::Start(SessionStart {
            timeline,
            tempo: self.tempo,
            target,
            metronome,
        }));
        Ok(true)
    }

    /// Moves the playhead of the running session to `playhead` (beats).
    pub fn on_playhead_position_change(&mut self, playhead: f64) {
        self.flush_deferred();

        if !self.is_playing() {
            trace!(playhead, "seek ignored while stopped");
            return;
        }

        let target = self.session_tempo.beats_to_seconds(playhead);
        if !target.is_finite() {
            warn!(playhead, "seek to invalid playhead ignored");
            return;
        }
        self.transport.seek(target);
        self.metronome.seek(target);

        if !self.limiter.try_acquire(TriggerSource::SeekCatchUp, self.clock.now_ms()) {
            debug!(playhead, "seek catch-up inside cooldown");
            return;
        }

        if let Some(timeline) = &self.timeline {
            let resumed = catch_up(self.sound.as_mut(), timeline, target);
            debug!(playhead, resumed, "seek");
        }
    }

    /// Ends the session and drops everything still scheduled. The interface
    /// learns about it from the poller's next sample.
    pub fn stop(&mut self) {
        if self.is_playing() {
            info!(playhead = self.playhead(), "stopping playback");
        }
        self.state = SessionState::Stopped;
        self.transport.stop();
        self.metronome.stop();
        self.timeline = None;
    }

    /// Changing tempo stops a running session; scheduled triggers are in
    /// absolute time and would no longer line up.
    pub fn set_tempo(&mut self, bpm: f64) -> Result<()> {
        let tempo = Tempo::new(bpm)?;
        self.tempo = tempo;

        if self.is_playing() {
            info!(bpm, "tempo changed during playback");
            self.stop();
        }
        Ok(())
    }

    pub fn set_metronome_muted(&mut self, muted: bool) {
        if !self.is_playing() {
            return;
        }
        self.metronome.set_muted(muted);
    }

    /// One turn of the loop: releases queued work once assets are loaded,
    /// hands due triggers to the sound engine, and samples the playhead.
    pub fn tick(&mut self) {
        self.flush_deferred();
        self.dispatch_due();

        let now = self.clock.now();
        let playing = self.is_playing();
        let position = self.transport.now();
        let outcome = self.poller.sample(now, playing, position, self.session_tempo);

        match outcome {
            PollOutcome::Idle => {}
            PollOutcome::Progress(playhead) => {
                trace!(playhead, "playhead");
                self.ui.set_playhead_position(playhead);
            }
            PollOutcome::Ended { reached_end } => {
                if reached_end {
                    info!("reached end of sequence");
                }
                self.ui.set_playing(false);
                self.stop();
                if reached_end {
                    self.ui.set_playhead_position(0.0);
                }
            }
        }
    }

    /// Clock time at which `tick` next has work to do.
    pub fn next_deadline(&self) -> Option<f64> {
        let mut deadline = self.poller.next_due();
        if self.is_playing() || self.gate.queued() > 0 {
            let soon = self.clock.now() + self.config.poll_interval_secs();
            deadline = Some(deadline.map_or(soon, |due| due.min(soon)));
        }
        deadline
    }

    fn run_or_defer(&mut self, action: Deferred) {
        if self.gate.check(self.sound.as_ref()) {
            self.execute(action);
        } else {
            self.gate.defer(action);
        }
    }

    fn flush_deferred(&mut self) {
        if self.gate.queued() == 0 || !self.gate.check(self.sound.as_ref()) {
            return;
        }
        for action in self.gate.take_backlog() {
            self.execute(action);
        }
    }

    fn execute(&mut self, action: Deferred) {
        match action {
            Deferred::Preview { freqs } => {
                let now = self.sound.current_time();
                for &freq in &freqs {
                    self.sound.attack(freq, now);
                }
                self.sound
                    .release(&freqs, now + self.config.preview_release_secs);
            }
            Deferred::Start(start) => self.start_session(start),
        }
    }

    fn start_session(&mut self, start: SessionStart) {
        if self.is_playing() {
            debug!("queued session dropped, already playing");
            return;
        }
        let SessionStart {
            timeline,
            tempo,
            target,
            metronome,
        } = start;

        info!(
            notes = timeline.events().len(),
            duration = timeline.total_duration(),
            bpm = tempo.bpm(),
            start = target,
            "starting playback"
        );

        self.state = SessionState::Playing;
        self.session_tempo = tempo;
        self.transport.start();
        for event in timeline.events() {
            self.transport.schedule(ScheduledTrigger {
                time: event.start_time,
                trigger: Trigger::AttackRelease {
                    freq: event.freq,
                    duration: event.duration,
                },
            });
        }
        self.metronome.start(tempo.beat_period());

        self.transport.seek(target);
        self.metronome.seek(target);
        catch_up(self.sound.as_mut(), &timeline, target);

        if !metronome {
            self.metronome.set_muted(true);
        }

        self.poller.arm(timeline.total_duration(), self.clock.now());
        self.timeline = Some(timeline);
        self.dispatch_due();
    }

    fn dispatch_due(&mut self) {
        if !self.is_playing() {
            return;
        }
        let lookahead = self.config.lookahead_secs();
        let position = self.transport.now();

        let mut due = self.transport.drain_due(lookahead);
        due.extend(self.metronome.drain_due(position, lookahead));
        if due.is_empty() {
            return;
        }

        let base = self.sound.current_time();
        for DueTrigger { offset, trigger } in due {
            let at = base + offset;
            match trigger {
                Trigger::AttackRelease { freq, duration } => {
                    trace!(freq, duration, at, "note");
                    self.sound.attack_release(freq, duration, at);
                }
                Trigger::Click { freq, duration } => {
                    self.sound.click(freq, duration, at);
                }
            }
        }
    }
}

/// Replays the unfinished part of every note already sounding at `target`.
/// These notes started before the target, so the transport will never fire
/// them; they go straight to the sound engine.
fn catch_up(sound: &mut dyn SoundEngine, timeline: &Timeline, target: f64) -> usize {
    let now = sound.current_time();
    let mut resumed = 0;
    for (event, remaining) in timeline.sounding_at(target) {
        sound.attack_release(event.freq, remaining, now);
        resumed += 1;
    }
    resumed
}
