use chordplay::{
    ChordEvent, ChordTables, Clock, ManualClock, Player, PlayerConfig, RecordingCallbacks,
    RecordingSoundEngine, SessionState, SoundCall, Tempo, Timeline, UiCall, midi_to_freq,
};
use std::sync::Arc;

fn player_at(bpm: f64) -> (ManualClock, RecordingSoundEngine, RecordingCallbacks, Player) {
    let clock = ManualClock::new();
    clock.set(50.0);
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    let sound = RecordingSoundEngine::new(shared.clone());
    let ui = RecordingCallbacks::new();

    let config = PlayerConfig {
        tempo_bpm: Tempo::new(bpm).unwrap(),
        ..PlayerConfig::default()
    };
    let player = Player::new(
        config,
        shared,
        Box::new(sound.clone()),
        Box::new(ui.clone()),
        Arc::new(ChordTables::builtin()),
    );
    (clock, sound, ui, player)
}

fn catch_up_durations(calls: &[SoundCall]) -> Vec<f64> {
    calls
        .iter()
        .filter_map(|call| match call {
            SoundCall::AttackRelease { duration, .. } => Some(*duration),
            _ => None,
        })
        .collect()
}

#[test]
fn rest_advances_time_before_chord() {
    let tables = ChordTables::builtin();
    let chords = [ChordEvent::rest(0, 1.0), ChordEvent::new(1, 0, 0, 2.0)];

    let timeline = Timeline::build(&chords, Tempo::new(60.0).unwrap(), &tables).unwrap();

    assert_eq!(timeline.total_duration(), 3.0);
    let voicing = [60u8, 64, 67];
    assert_eq!(timeline.events().len(), voicing.len());
    for (event, pitch) in timeline.events().iter().zip(voicing) {
        assert_eq!(event.start_time, 1.0);
        assert_eq!(event.duration, 2.0);
        assert_eq!(event.freq, midi_to_freq(pitch));
    }
}

#[test]
fn identical_input_builds_identical_timeline() {
    let tables = ChordTables::builtin();
    let tempo = Tempo::new(111.0).unwrap();
    let chords: Vec<ChordEvent> = (0..16)
        .map(|i| ChordEvent::new(i, (i % 7) as i32, i % 2, 0.75))
        .collect();

    let first = Timeline::build(&chords, tempo, &tables).unwrap();
    let second = Timeline::build(&chords, tempo, &tables).unwrap();

    assert_eq!(first, second);
}

#[test]
fn note_preview_is_rate_limited() {
    let (clock, sound, _ui, mut player) = player_at(120.0);

    player.play_preview_notes(&[60, 64, 67]);
    clock.advance_ms(99.0);
    player.play_preview_notes(&[60, 64, 67]);

    let releases = sound
        .calls()
        .iter()
        .filter(|call| matches!(call, SoundCall::Release { .. }))
        .count();
    assert_eq!(releases, 1);
}

#[test]
fn seek_catch_up_covers_only_unfinished_notes() {
    let (clock, sound, _ui, mut player) = player_at(60.0);
    player
        .play_sequence(&[ChordEvent::new(0, 0, 0, 2.0)], 0.0, false)
        .unwrap();
    sound.clear();

    player.on_playhead_position_change(1.0);
    assert_eq!(catch_up_durations(&sound.calls()), vec![1.0; 3]);

    sound.clear();
    clock.advance(1.0);
    player.on_playhead_position_change(2.0);
    assert!(catch_up_durations(&sound.calls()).is_empty());
}

#[test]
fn seek_after_stop_does_nothing() {
    let (_clock, sound, ui, mut player) = player_at(60.0);
    player
        .play_sequence(&[ChordEvent::new(0, 0, 0, 2.0)], 0.0, false)
        .unwrap();
    player.stop();
    sound.clear();
    ui.clear();

    player.on_playhead_position_change(1.0);

    assert!(sound.calls().is_empty());
    assert!(ui.calls().is_empty());
    assert_eq!(player.state(), SessionState::Stopped);
}

#[test]
fn end_of_sequence_is_reported_once() {
    let (clock, _sound, ui, mut player) = player_at(120.0);
    player
        .play_sequence(&[ChordEvent::new(0, 4, 0, 4.0)], 0.0, true)
        .unwrap();

    for _ in 0..300 {
        clock.advance_ms(10.0);
        player.tick();
    }

    let calls = ui.calls();
    let ended: Vec<usize> = calls
        .iter()
        .enumerate()
        .filter(|(_, call)| **call == UiCall::Playing(false))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(ended.len(), 1);
    assert_eq!(calls[ended[0] + 1], UiCall::PlayheadPosition(0.0));
    assert_eq!(calls.len(), ended[0] + 2);
    assert!(!player.is_playing());
}

#[test]
fn tempo_change_stops_whole_session() {
    let (clock, sound, _ui, mut player) = player_at(120.0);
    let chords: Vec<ChordEvent> = (0..32).map(|i| ChordEvent::new(i, 2, 0, 1.0)).collect();
    player.play_sequence(&chords, 0.0, true).unwrap();
    clock.advance(3.0);
    player.tick();
    assert!(player.pending_triggers() > 0);

    player.set_tempo(140.0).unwrap();

    assert_eq!(player.state(), SessionState::Stopped);
    assert_eq!(player.pending_triggers(), 0);

    sound.clear();
    clock.advance(5.0);
    player.tick();
    assert!(sound.calls().is_empty());
}
