use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::timing::{Cooldowns, Tempo};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub tempo_bpm: Tempo,
    pub poll_interval_ms: u64,
    /// How far ahead of the transport triggers go to the sound engine
    pub lookahead_ms: u64,
    pub cooldowns: Cooldowns,
    /// Gap between attack and release of a preview
    pub preview_release_secs: f64,
    pub click_pitch: u8,
    pub click_duration_secs: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tempo_bpm: Tempo::default(),
            poll_interval_ms: 10,
            lookahead_ms: 100,
            cooldowns: Cooldowns::default(),
            preview_release_secs: 0.5,
            click_pitch: 60,
            click_duration_secs: 0.25,
        }
    }
}

impl PlayerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let ron_string = fs::read_to_string(path)?;
        let config: PlayerConfig = ron::from_str(&ron_string)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, ron_string)?;
        Ok(())
    }

    pub fn poll_interval_secs(&self) -> f64 {
        self.poll_interval_ms as f64 / 1000.0
    }

    pub fn lookahead_secs(&self) -> f64 {
        self.lookahead_ms as f64 / 1000.0
    }
}
