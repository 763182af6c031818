pub mod beacon;
pub mod class;
pub mod config;
pub mod group;
pub mod race;
pub mod run;

use orienteering_core::{
    Config, GameState, GameStore, MemorySink, PersistenceSink, SqliteSink, SyncStatus, SystemClock,
};
use serde::Serialize;
use tracing::{debug, warn};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Store backed by whichever sink the config selects.
pub type CliStore = GameStore<Box<dyn PersistenceSink>>;

/// Open the race store described by the on-disk config.
///
/// With `sync.offline` set the race lives in memory for this invocation only.
pub fn open_store() -> Result<(CliStore, Config), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    if config.sync.offline {
        warn!("sync.offline is set, changes are not saved");
        let sink: Box<dyn PersistenceSink> = Box::new(MemorySink::new());
        let store = GameStore::offline(sink, config.race, SystemClock, GameState::seeded());
        return Ok((store, config));
    }

    let path = config.database_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    debug!(path = %path.display(), session = %config.session_id, "opening race database");
    let sink: Box<dyn PersistenceSink> = Box::new(SqliteSink::open(&path, &config.session_id)?);
    let store = GameStore::connect(sink, config.race);
    Ok((store, config))
}

/// Log what an action did and flag a change that did not reach the race
/// database.
pub fn finish(store: &mut CliStore, config: &Config) {
    for event in store.drain_events() {
        match serde_json::to_string(&event) {
            Ok(json) => debug!(event = %json, "store event"),
            Err(_) => debug!(?event, "store event"),
        }
    }
    if !config.sync.offline && store.status() == SyncStatus::Offline {
        eprintln!("warning: change kept locally, race database not updated");
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
