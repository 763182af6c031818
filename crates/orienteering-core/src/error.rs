//! Core error types for orienteering-core.
//!
//! Every mutating store operation returns [`Result`]. A rejected operation
//! leaves the race state untouched and writes nothing to the sink.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::model::RunStatus;

/// Kind of entity an id failed to resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Beacon,
    Group,
    Class,
    Run,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Beacon => "beacon",
            EntityKind::Group => "group",
            EntityKind::Class => "class",
            EntityKind::Run => "run",
        };
        f.write_str(name)
    }
}

/// Core error type for orienteering-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// An id did not resolve to an existing entity
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// The run already reached a terminal status
    #[error("run {run_id} is already {status}")]
    RunFinished { run_id: String, status: RunStatus },

    /// The beacon is still referenced by a run in progress
    #[error("beacon {beacon_id} is used by run {run_id} in progress")]
    BeaconInUse { beacon_id: String, run_id: String },

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn not_found(kind: EntityKind, id: &str) -> Self {
        CoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Punch code is not a 5x5 binary grid
    #[error("Invalid punch code '{0}': expected 25 characters of '0' or '1'")]
    PunchCode(String),

    /// Unknown beacon level
    #[error("Invalid level '{0}': expected N1, N2 or N3")]
    Level(String),

    /// Unknown run mode
    #[error("Invalid run mode '{0}': expected star or score")]
    Mode(String),

    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors raised at the persistence boundary.
///
/// These never escape a mutating store action; they only move the
/// [`SyncStatus`](crate::store::SyncStatus).
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Persistence unavailable: {0}")]
    Unavailable(String),

    #[error("Write rejected: {0}")]
    WriteFailed(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for SinkError {
    fn from(err: rusqlite::Error) -> Self {
        SinkError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
