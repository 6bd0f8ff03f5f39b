use super::Tempo;
use crate::error::{PlayerError, Result};
use crate::theory::MusicTheory;
use serde::{Deserialize, Serialize};

/// Token value marking a rest.
pub const REST_TOKEN: i32 = -1;

/// One entry of a chord sequence. `duration` is in beats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordEvent {
    pub index: usize,
    pub token: i32,
    pub duration: f64,
    pub variant: usize,
}

impl ChordEvent {
    pub fn new(index: usize, token: i32, variant: usize, duration: f64) -> Self {
        Self {
            index,
            token,
            duration,
            variant,
        }
    }

    pub fn rest(index: usize, duration: f64) -> Self {
        Self::new(index, REST_TOKEN, 0, duration)
    }

    pub fn is_rest(&self) -> bool {
        self.token == REST_TOKEN
    }
}

/// A single pitch of a chord, placed on the transport in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteEvent {
    pub start_time: f64,
    pub freq: f64,
    pub duration: f64,
}

impl NoteEvent {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Time left to sound if playback resumes at `target`, when the note has
    /// already started but not yet finished there.
    pub fn remaining_at(&self, target: f64) -> Option<f64> {
        let remaining = self.end_time() - target;
        if self.start_time < target && remaining > 0.0 {
            Some(remaining)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Timeline {
    events: Vec<NoteEvent>,
    total_duration: f64,
}

impl Timeline {
    /// Lays the chords end to end. Rests emit nothing but still take time.
    /// Events are ordered by start time by construction.
    pub fn build(chords: &[ChordEvent], tempo: Tempo, theory: &dyn MusicTheory) -> Result<Self> {
        let mut events = Vec::new();
        let mut total_time = 0.0;

        for chord in chords {
            if !chord.duration.is_finite() || chord.duration < 0.0 {
                return Err(PlayerError::InvalidDuration {
                    index: chord.index,
                    duration: chord.duration,
                });
            }
            let duration = tempo.beats_to_seconds(chord.duration);

            if !chord.is_rest() {
                let pitches = theory.voicing(chord.token, chord.variant)?;
                events.extend(pitches.iter().map(|&pitch| NoteEvent {
                    start_time: total_time,
                    freq: midi_to_freq(pitch),
                    duration,
                }));
            }

            total_time += duration;
        }

        Ok(Self {
            events,
            total_duration: total_time,
        })
    }

    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    /// Notes already sounding at `target`, paired with how long they have left.
    pub fn sounding_at(&self, target: f64) -> impl Iterator<Item = (&NoteEvent, f64)> + '_ {
        self.events
            .iter()
            .filter_map(move |event| event.remaining_at(target).map(|rest| (event, rest)))
    }
}

/// Equal-temperament frequency of a MIDI pitch, A4 = 440 Hz.
pub fn midi_to_freq(note: u8) -> f64 {
    440.0 * 2.0_f64.powf((note as f64 - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlayerError;
    use crate::theory::ChordTables;

    fn tempo(bpm: f64) -> Tempo {
        Tempo::new(bpm).unwrap()
    }

    #[test]
    fn rest_then_chord() {
        let tables = ChordTables::builtin();
        let chords = [ChordEvent::rest(0, 1.0), ChordEvent::new(1, 0, 0, 2.0)];

        let timeline = Timeline::build(&chords, tempo(60.0), &tables).unwrap();

        assert_eq!(timeline.total_duration(), 3.0);
        assert_eq!(timeline.events().len(), 3);
        for event in timeline.events() {
            assert_eq!(event.start_time, 1.0);
            assert_eq!(event.duration, 2.0);
        }
        let freqs: Vec<f64> = timeline.events().iter().map(|e| e.freq).collect();
        let expected: Vec<f64> = [60, 64, 67].into_iter().map(midi_to_freq).collect();
        assert_eq!(freqs, expected);
    }

    #[test]
    fn tempo_scales_durations() {
        let tables = ChordTables::builtin();
        let chords = [ChordEvent::new(0, 4, 1, 4.0), ChordEvent::new(1, 0, 0, 4.0)];

        let timeline = Timeline::build(&chords, tempo(120.0), &tables).unwrap();

        assert_eq!(timeline.total_duration(), 4.0);
        assert_eq!(timeline.events().len(), 7);
        assert_eq!(timeline.events()[0].duration, 2.0);
        assert_eq!(timeline.events()[4].start_time, 2.0);
    }

    #[test]
    fn start_times_never_decrease() {
        let tables = ChordTables::builtin();
        let chords: Vec<ChordEvent> = (0..12)
            .map(|i| {
                if i % 3 == 2 {
                    ChordEvent::rest(i, 0.5)
                } else {
                    ChordEvent::new(i, (i % 7) as i32, i % 2, 1.5)
                }
            })
            .collect();

        let timeline = Timeline::build(&chords, tempo(97.0), &tables).unwrap();

        assert!(
            timeline
                .events()
                .windows(2)
                .all(|w| w[0].start_time <= w[1].start_time)
        );
    }

    #[test]
    fn rebuilding_is_bit_identical() {
        let tables = ChordTables::builtin();
        let chords = [
            ChordEvent::new(0, 1, 1, 1.0 / 3.0),
            ChordEvent::rest(1, 0.7),
            ChordEvent::new(2, 4, 0, 2.25),
        ];

        let a = Timeline::build(&chords, tempo(133.0), &tables).unwrap();
        let b = Timeline::build(&chords, tempo(133.0), &tables).unwrap();

        assert_eq!(a.total_duration().to_bits(), b.total_duration().to_bits());
        assert_eq!(a.events().len(), b.events().len());
        for (x, y) in a.events().iter().zip(b.events()) {
            assert_eq!(x.start_time.to_bits(), y.start_time.to_bits());
            assert_eq!(x.freq.to_bits(), y.freq.to_bits());
            assert_eq!(x.duration.to_bits(), y.duration.to_bits());
        }
    }

    #[test]
    fn unknown_token_fails_the_build() {
        let tables = ChordTables::builtin();
        let chords = [ChordEvent::new(0, 42, 0, 1.0)];

        assert_eq!(
            Timeline::build(&chords, tempo(120.0), &tables),
            Err(PlayerError::UnknownToken {
                token: 42,
                variant: 0
            })
        );
    }

    #[test]
    fn non_finite_or_negative_duration_fails_the_build() {
        let tables = ChordTables::builtin();

        let chords = [ChordEvent::new(0, 0, 0, 1.0), ChordEvent::rest(1, f64::INFINITY)];
        assert_eq!(
            Timeline::build(&chords, tempo(120.0), &tables),
            Err(PlayerError::InvalidDuration {
                index: 1,
                duration: f64::INFINITY
            })
        );

        let chords = [ChordEvent::new(3, 0, 0, -1.0)];
        assert!(matches!(
            Timeline::build(&chords, tempo(120.0), &tables),
            Err(PlayerError::InvalidDuration { index: 3, .. })
        ));

        let chords = [ChordEvent::new(0, 0, 0, f64::NAN)];
        assert!(Timeline::build(&chords, tempo(120.0), &tables).is_err());
    }

    #[test]
    fn sounding_at_excludes_edges() {
        let event = NoteEvent {
            start_time: 0.0,
            freq: 440.0,
            duration: 2.0,
        };
        assert_eq!(event.remaining_at(1.0), Some(1.0));
        assert_eq!(event.remaining_at(0.0), None);
        assert_eq!(event.remaining_at(2.0), None);
        assert_eq!(event.remaining_at(3.0), None);
    }

    #[test]
    fn a4_is_440() {
        assert_eq!(midi_to_freq(69), 440.0);
        assert!((midi_to_freq(60) - 261.6256).abs() < 1e-3);
    }
}
