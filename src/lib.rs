pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod player;
pub mod sound;
pub mod theory;
pub mod timing;
pub mod ui;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::PlayerConfig;
pub use engine::{
    EngineCommand, EngineHandle, EngineUpdate, PlaybackSnapshot, spawn_engine,
    spawn_engine_with_clock,
};
pub use error::{PlayerError, Result};
pub use player::{Player, SessionState};
pub use sound::{RecordingSoundEngine, SoundCall, SoundEngine, TracingSoundEngine};
pub use theory::{ChordTables, MusicTheory, UNKNOWN_CHORD};
pub use timing::{ChordEvent, NoteEvent, Tempo, Timeline, midi_to_freq};
pub use ui::{RecordingCallbacks, UiCall, UiCallbacks};
