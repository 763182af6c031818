//! Aggregate store and its persistence boundary.

mod game_store;
pub mod sink;

#[cfg(test)]
mod game_store_tests;

pub use game_store::{GameStore, NewBeacon};
pub use sink::{MemorySink, PersistenceSink, SinkUpdate, SyncStatus};
