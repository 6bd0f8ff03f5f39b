use crate::error::{PlayerError, Result};
use serde::{Deserialize, Serialize};

/// Tempo in beats per minute. Always finite and above zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    pub fn new(bpm: f64) -> Result<Self> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(PlayerError::InvalidTempo(bpm));
        }
        Ok(Self { bpm })
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn beats_per_second(&self) -> f64 {
        self.bpm / 60.0
    }

    /// Length of one beat in seconds
    pub fn beat_period(&self) -> f64 {
        60.0 / self.bpm
    }

    pub fn beats_to_seconds(&self, beats: f64) -> f64 {
        beats / self.beats_per_second()
    }

    pub fn seconds_to_beats(&self, seconds: f64) -> f64 {
        seconds * self.beats_per_second()
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: 120.0 }
    }
}

impl TryFrom<f64> for Tempo {
    type Error = PlayerError;

    fn try_from(bpm: f64) -> Result<Self> {
        Tempo::new(bpm)
    }
}

impl From<Tempo> for f64 {
    fn from(tempo: Tempo) -> f64 {
        tempo.bpm
    }
}
