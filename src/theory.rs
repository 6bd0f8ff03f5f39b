//! Chord symbol lookup.
//!
//! A chord event names its chord indirectly: a `(token, variant)` pair
//! resolves to a chord symbol, and the symbol resolves to a voicing, the
//! ordered MIDI pitches that sound when the chord plays.

use crate::error::{PlayerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Symbol used by callers for a chord that could not be recognised.
pub const UNKNOWN_CHORD: &str = "?";

pub trait MusicTheory: Send + Sync {
    fn token_to_chord(&self, token: i32, variant: usize) -> Option<&str>;

    fn chord_to_notes(&self, symbol: &str) -> Option<&[u8]>;

    fn voicing(&self, token: i32, variant: usize) -> Result<&[u8]> {
        let symbol = self
            .token_to_chord(token, variant)
            .ok_or(PlayerError::UnknownToken { token, variant })?;
        self.chord_to_notes(symbol)
            .ok_or_else(|| PlayerError::UnknownChord(symbol.to_string()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChordTables {
    /// token -> variant -> chord symbol
    pub tokens: Vec<Vec<String>>,
    /// chord symbol -> MIDI pitches
    pub voicings: HashMap<String, Vec<u8>>,
}

impl ChordTables {
    pub fn load(path: &Path) -> Result<Self> {
        let ron_string = fs::read_to_string(path)?;
        let tables: ChordTables = ron::from_str(&ron_string)?;
        tables.validate()?;
        Ok(tables)
    }

    pub fn validate(&self) -> Result<()> {
        for pitches in self.voicings.values() {
            if let Some(&bad) = pitches.iter().find(|&&p| p > 127) {
                return Err(PlayerError::InvalidPitch(bad as i32));
            }
        }
        for symbol in self.tokens.iter().flatten() {
            if symbol != UNKNOWN_CHORD && !self.voicings.contains_key(symbol) {
                return Err(PlayerError::UnknownChord(symbol.clone()));
            }
        }
        Ok(())
    }

    /// Diatonic triads and sevenths of C major, voiced from the fourth octave.
    /// Token `n` is scale degree `n + 1`; variant 0 is the triad, 1 the seventh.
    pub fn builtin() -> Self {
        const DEGREES: [(&str, &str, u8, [u8; 4]); 7] = [
            ("C", "Cmaj7", 60, [0, 4, 7, 11]),
            ("Dm", "Dm7", 62, [0, 3, 7, 10]),
            ("Em", "Em7", 64, [0, 3, 7, 10]),
            ("F", "Fmaj7", 65, [0, 4, 7, 11]),
            ("G", "G7", 67, [0, 4, 7, 10]),
            ("Am", "Am7", 69, [0, 3, 7, 10]),
            ("Bdim", "Bm7b5", 71, [0, 3, 6, 10]),
        ];

        let mut tables = ChordTables::default();
        for (triad, seventh, root, intervals) in DEGREES {
            let pitches: Vec<u8> = intervals.iter().map(|i| root + i).collect();
            tables.voicings.insert(triad.to_string(), pitches[..3].to_vec());
            tables.voicings.insert(seventh.to_string(), pitches);
            tables
                .tokens
                .push(vec![triad.to_string(), seventh.to_string()]);
        }
        tables
    }
}

impl MusicTheory for ChordTables {
    fn token_to_chord(&self, token: i32, variant: usize) -> Option<&str> {
        let variants = self.tokens.get(usize::try_from(token).ok()?)?;
        variants.get(variant).map(String::as_str)
    }

    fn chord_to_notes(&self, symbol: &str) -> Option<&[u8]> {
        self.voicings.get(symbol).map(Vec::as_slice)
    }
}
