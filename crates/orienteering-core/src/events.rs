use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{RunMode, RunStatus};
use crate::race::ScoreBreakdown;
use crate::store::SyncStatus;

/// Every state change in the store produces an Event.
///
/// Events queue up inside the store until `GameStore::drain_events` is
/// called; a long-lived caller should drain after each action. The CLI
/// logs them at debug level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    RunStarted {
        run_id: String,
        group_id: String,
        mode: RunMode,
        duration_limit_secs: u32,
        at: DateTime<Utc>,
    },
    /// An unfinished run was dropped because its group started again.
    RunDiscarded {
        run_id: String,
        group_id: String,
        at: DateTime<Utc>,
    },
    BeaconToggled {
        run_id: String,
        beacon_id: String,
        validated: bool,
        at: DateTime<Utc>,
    },
    RunTimerStopped {
        run_id: String,
        elapsed_secs: i64,
        at: DateTime<Utc>,
    },
    RunCompleted {
        run_id: String,
        group_id: String,
        status: RunStatus,
        score: ScoreBreakdown,
        at: DateTime<Utc>,
    },
    /// Roster or course edited (beacons, groups, classes).
    CourseChanged {
        summary: String,
        at: DateTime<Utc>,
    },
    /// A snapshot from the sink replaced local state.
    RemoteSnapshotApplied {
        at: DateTime<Utc>,
    },
    SyncStatusChanged {
        status: SyncStatus,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// When the event happened, read from the store's clock.
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::RunStarted { at, .. }
            | Event::RunDiscarded { at, .. }
            | Event::BeaconToggled { at, .. }
            | Event::RunTimerStopped { at, .. }
            | Event::RunCompleted { at, .. }
            | Event::CourseChanged { at, .. }
            | Event::RemoteSnapshotApplied { at }
            | Event::SyncStatusChanged { at, .. } => *at,
        }
    }
}
