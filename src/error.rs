use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlayerError {
    /// Tempo must be a finite number of beats per minute above zero.
    #[error("invalid tempo {0} bpm: tempo must be finite and greater than zero")]
    InvalidTempo(f64),

    /// Playhead positions are in beats and must be finite once converted
    /// to seconds.
    #[error("invalid playhead position {0}")]
    InvalidPlayhead(f64),

    #[error("chord {index} has invalid duration {duration}")]
    InvalidDuration { index: usize, duration: f64 },

    #[error("no chord for token {token} variant {variant}")]
    UnknownToken { token: i32, variant: usize },

    #[error("no voicing for chord symbol '{0}'")]
    UnknownChord(String),

    #[error("pitch {0} is outside the MIDI range 0..=127")]
    InvalidPitch(i32),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("playback engine is no longer running")]
    EngineDisconnected,
}

pub type Result<T> = std::result::Result<T, PlayerError>;

impl From<std::io::Error> for PlayerError {
    fn from(err: std::io::Error) -> Self {
        PlayerError::Config(err.to_string())
    }
}

impl From<ron::error::SpannedError> for PlayerError {
    fn from(err: ron::error::SpannedError) -> Self {
        PlayerError::Config(err.to_string())
    }
}

impl From<ron::Error> for PlayerError {
    fn from(err: ron::Error) -> Self {
        PlayerError::Config(err.to_string())
    }
}
