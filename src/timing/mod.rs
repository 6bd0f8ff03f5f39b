mod limiter;
mod metronome;
mod poller;
mod tempo;
mod timeline;
mod transport;

pub use limiter::{Cooldowns, RateLimiter, TriggerSource};
pub use metronome::Metronome;
pub use poller::{PlayheadPoller, PollOutcome};
pub use tempo::Tempo;
pub use timeline::{ChordEvent, NoteEvent, REST_TOKEN, Timeline, midi_to_freq};
pub use transport::Transport;
