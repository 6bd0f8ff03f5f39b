use chordplay::{
    ChordEvent, ChordTables, EngineUpdate, PlayerConfig, SystemClock, TracingSoundEngine,
    spawn_engine,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chordplay=info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => match PlayerConfig::load(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                error!("failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => PlayerConfig::default(),
    };
    let tables = match args.next() {
        Some(path) => match ChordTables::load(Path::new(&path)) {
            Ok(tables) => tables,
            Err(e) => {
                error!("failed to load chord tables {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => ChordTables::builtin(),
    };

    let sound = TracingSoundEngine::new(Arc::new(SystemClock::new()));
    let engine = spawn_engine(config, Box::new(sound), Arc::new(tables));

    // I - vi - IV - V7, with a rest before the turnaround
    let progression = [
        ChordEvent::new(0, 0, 0, 2.0),
        ChordEvent::new(1, 5, 1, 2.0),
        ChordEvent::new(2, 3, 0, 2.0),
        ChordEvent::rest(3, 1.0),
        ChordEvent::new(4, 4, 1, 1.0),
    ];

    if let Err(e) = engine.play_sequence(&progression, 0.0, true) {
        error!("{}", e);
        std::process::exit(1);
    }

    let mut last_beat = -1;
    while let Ok(update) = engine.update_rx.recv() {
        match update {
            EngineUpdate::PlayheadPosition { position } => {
                let beat = position.floor() as i64;
                if beat != last_beat {
                    info!(beat, "playhead");
                    last_beat = beat;
                }
            }
            EngineUpdate::PlaybackState { playing: true } => info!("playing"),
            EngineUpdate::PlaybackState { playing: false } => {
                info!("finished");
                break;
            }
            EngineUpdate::Error { message } => {
                error!("{}", message);
                break;
            }
        }
    }

    engine.shutdown();
}
