//! # Orienteering Core Library
//!
//! Business logic for running a school orienteering race: groups of students
//! are sent after checkpoints ("beacons") against a clock, staff tick off
//! what was found, and completed runs are scored into a live leaderboard.
//! The CLI binary is a thin layer over this library.
//!
//! ## Architecture
//!
//! - **Race engine**: time-limit policy, run state machine and scoring, all
//!   pure functions over a [`GameState`]
//! - **Store**: [`GameStore`] owns the state, applies actions atomically and
//!   mirrors the whole document to a [`PersistenceSink`]
//! - **Storage**: SQLite document sink and TOML configuration
//! - **Standings / roster**: leaderboard, race statistics, name import and
//!   group formation
//!
//! ## Key Components
//!
//! - [`GameStore`]: action API and sync status
//! - [`StartRun`]: parameters of a new run
//! - [`RunClock`]: countdown view for the display tick
//! - [`SqliteSink`]: on-disk race document
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod model;
pub mod race;
pub mod roster;
pub mod standings;
pub mod storage;
pub mod store;

pub use error::{CoreError, ConfigError, DatabaseError, EntityKind, Result, SinkError, ValidationError};
pub use events::Event;
pub use model::{Beacon, BeaconPatch, ClassRoom, GameState, Group, Level, PunchCode, Run, RunKind, RunMode, RunStatus};
pub use race::{time_limit_seconds, Clock, ManualClock, RaceRules, RunClock, ScoreBreakdown, StartRun, SystemClock};
pub use roster::GroupSplit;
pub use standings::{race_stats, standings, RaceStats, StandingRow};
pub use storage::{Config, SqliteSink};
pub use store::{GameStore, MemorySink, NewBeacon, PersistenceSink, SinkUpdate, SyncStatus};
