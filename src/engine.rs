use crate::clock::{Clock, SystemClock};
use crate::config::PlayerConfig;
use crate::error::{PlayerError, Result};
use crate::player::Player;
use crate::sound::SoundEngine;
use crate::theory::MusicTheory;
use crate::timing::ChordEvent;
use crate::ui::UiCallbacks;
use arc_swap::ArcSwap;
use crossbeam::channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub enum EngineCommand {
    PlayPreviewNotes(Vec<u8>),
    PlayPreviewChord(String),
    PlaySequence {
        chords: Vec<ChordEvent>,
        playhead: f64,
        metronome: bool,
    },
    Seek(f64),
    Stop,
    SetMetronomeMuted(bool),
    SetTempo(f64),
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineUpdate {
    PlayheadPosition { position: f64 },
    PlaybackState { playing: bool },
    Error { message: String },
}

/// Last state published by the engine thread.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackSnapshot {
    pub playing: bool,
    pub tempo_bpm: f64,
    /// Beats
    pub playhead: f64,
}

pub struct EngineHandle {
    pub command_tx: Sender<EngineCommand>,
    pub update_rx: Receiver<EngineUpdate>,
    snapshot: Arc<ArcSwap<PlaybackSnapshot>>,
    thread: Option<JoinHandle<()>>,
}

impl EngineHandle {
    pub fn send(&self, command: EngineCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| PlayerError::EngineDisconnected)
    }

    pub fn play_preview_notes(&self, pitches: &[u8]) -> Result<()> {
        self.send(EngineCommand::PlayPreviewNotes(pitches.to_vec()))
    }

    pub fn play_preview_chord(&self, symbol: &str) -> Result<()> {
        self.send(EngineCommand::PlayPreviewChord(symbol.to_string()))
    }

    pub fn play_sequence(&self, chords: &[ChordEvent], playhead: f64, metronome: bool) -> Result<()> {
        self.send(EngineCommand::PlaySequence {
            chords: chords.to_vec(),
            playhead,
            metronome,
        })
    }

    pub fn on_playhead_position_change(&self, playhead: f64) -> Result<()> {
        self.send(EngineCommand::Seek(playhead))
    }

    pub fn stop(&self) -> Result<()> {
        self.send(EngineCommand::Stop)
    }

    pub fn set_metronome_muted(&self, muted: bool) -> Result<()> {
        self.send(EngineCommand::SetMetronomeMuted(muted))
    }

    pub fn set_tempo(&self, bpm: f64) -> Result<()> {
        self.send(EngineCommand::SetTempo(bpm))
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        **self.snapshot.load()
    }

    /// Stops the engine thread and waits for it to exit.
    pub fn shutdown(mut self) {
        self.join();
    }

    fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.command_tx.send(EngineCommand::Shutdown);
            if thread.join().is_err() {
                warn!("engine thread panicked");
            }
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.join();
    }
}

/// Forwards the player's callbacks to the update channel.
struct UpdateSender(Sender<EngineUpdate>);

impl UiCallbacks for UpdateSender {
    fn set_playhead_position(&mut self, position: f64) {
        let _ = self.0.send(EngineUpdate::PlayheadPosition { position });
    }

    fn set_playing(&mut self, playing: bool) {
        let _ = self.0.send(EngineUpdate::PlaybackState { playing });
    }
}

pub fn spawn_engine(
    config: PlayerConfig,
    sound: Box<dyn SoundEngine>,
    theory: Arc<dyn MusicTheory>,
) -> EngineHandle {
    spawn_engine_with_clock(config, Arc::new(SystemClock::new()), sound, theory)
}

/// Moves a `Player` onto its own thread. Every operation reaches it through
/// the command channel, so only that thread ever touches session state.
pub fn spawn_engine_with_clock(
    config: PlayerConfig,
    clock: Arc<dyn Clock>,
    sound: Box<dyn SoundEngine>,
    theory: Arc<dyn MusicTheory>,
) -> EngineHandle {
    let (command_tx, command_rx) = crossbeam::channel::unbounded();
    let (update_tx, update_rx) = crossbeam::channel::unbounded();

    let snapshot = Arc::new(ArcSwap::from_pointee(PlaybackSnapshot {
        playing: false,
        tempo_bpm: config.tempo_bpm.bpm(),
        playhead: 0.0,
    }));

    let player = Player::new(
        config,
        clock.clone(),
        sound,
        Box::new(UpdateSender(update_tx.clone())),
        theory,
    );

    let published = snapshot.clone();
    let thread = std::thread::spawn(move || {
        engine_thread(player, clock, command_rx, update_tx, published);
    });

    EngineHandle {
        command_tx,
        update_rx,
        snapshot,
        thread: Some(thread),
    }
}

fn engine_thread(
    mut player: Player,
    clock: Arc<dyn Clock>,
    command_rx: Receiver<EngineCommand>,
    update_tx: Sender<EngineUpdate>,
    snapshot: Arc<ArcSwap<PlaybackSnapshot>>,
) {
    info!("playback engine started");
    let mut was_playing = false;

    loop {
        let received = match player.next_deadline() {
            Some(deadline) => {
                let wait = Duration::from_secs_f64((deadline - clock.now()).max(0.0));
                match command_rx.recv_timeout(wait) {
                    Ok(command) => Some(command),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match command_rx.recv() {
                Ok(command) => Some(command),
                Err(_) => break,
            },
        };

        if let Some(command) = received {
            if !handle_command(&mut player, command, &update_tx) {
                break;
            }
        }

        player.tick();

        let playing = player.is_playing();
        if playing && !was_playing {
            let _ = update_tx.send(EngineUpdate::PlaybackState { playing: true });
        }
        was_playing = playing;

        snapshot.store(Arc::new(PlaybackSnapshot {
            playing,
            tempo_bpm: player.tempo().bpm(),
            playhead: player.playhead(),
        }));
    }

    player.stop();
    info!("playback engine stopped");
}

/// Returns false when the engine should shut down.
fn handle_command(player: &mut Player, command: EngineCommand, update_tx: &Sender<EngineUpdate>) -> bool {
    let outcome = match command {
        EngineCommand::PlayPreviewNotes(pitches) => {
            player.play_preview_notes(&pitches);
            Ok(())
        }
        EngineCommand::PlayPreviewChord(symbol) => player.play_preview_chord(&symbol).map(|_| ()),
        EngineCommand::PlaySequence {
            chords,
            playhead,
            metronome,
        } => player.play_sequence(&chords, playhead, metronome).map(|_| ()),
        EngineCommand::Seek(playhead) => {
            player.on_playhead_position_change(playhead);
            Ok(())
        }
        EngineCommand::Stop => {
            player.stop();
            Ok(())
        }
        EngineCommand::SetMetronomeMuted(muted) => {
            player.set_metronome_muted(muted);
            Ok(())
        }
        EngineCommand::SetTempo(bpm) => player.set_tempo(bpm),
        EngineCommand::Shutdown => return false,
    };

    if let Err(e) = outcome {
        warn!("{}", e);
        let _ = update_tx.send(EngineUpdate::Error {
            message: e.to_string(),
        });
    }
    true
}
