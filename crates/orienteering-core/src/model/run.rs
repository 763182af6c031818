//! One timed attempt by one group.
//!
//! In memory a run carries a tagged [`RunKind`]; the persisted document keeps
//! the flat shape (`mode`, `beaconIds`, `validatedBeaconIds`) so documents
//! written by older clients still load. Missing `mode` means star, missing
//! `validatedBeaconIds` means no finds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Fixed list of targets chosen at start.
    #[default]
    Star,
    /// Open-ended: collect as many beacons as possible before the limit.
    Score,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunMode::Star => "star",
            RunMode::Score => "score",
        })
    }
}

impl FromStr for RunMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "star" => Ok(RunMode::Star),
            "score" => Ok(RunMode::Score),
            other => Err(ValidationError::Mode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    /// Clock frozen, finds under review.
    Checking,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunStatus::Running => "running",
            RunStatus::Checking => "checking",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunKind {
    Star { beacon_ids: Vec<String> },
    Score,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RunRecord", into = "RunRecord")]
pub struct Run {
    pub id: String,
    pub group_id: String,
    pub kind: RunKind,
    pub validated_beacon_ids: Vec<String>,
    /// Epoch milliseconds.
    pub start_time: i64,
    /// Allowed duration in seconds.
    pub duration_limit: u32,
    pub status: RunStatus,
    /// Epoch milliseconds; set when the clock is frozen or the run ends.
    pub end_time: Option<i64>,
}

impl Run {
    pub fn mode(&self) -> RunMode {
        match self.kind {
            RunKind::Star { .. } => RunMode::Star,
            RunKind::Score => RunMode::Score,
        }
    }

    /// Beacons shown for this run: the targets of a star run, the finds of a
    /// score run.
    pub fn beacon_ids(&self) -> &[String] {
        match &self.kind {
            RunKind::Star { beacon_ids } => beacon_ids,
            RunKind::Score => &self.validated_beacon_ids,
        }
    }

    /// Beacons whose points are awarded when the run succeeds.
    pub fn counted_beacon_ids(&self) -> &[String] {
        match &self.kind {
            RunKind::Star { beacon_ids } => beacon_ids,
            RunKind::Score => &self.validated_beacon_ids,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn is_validated(&self, beacon_id: &str) -> bool {
        self.validated_beacon_ids.iter().any(|id| id == beacon_id)
    }

    pub fn references(&self, beacon_id: &str) -> bool {
        self.is_validated(beacon_id) || self.beacon_ids().iter().any(|id| id == beacon_id)
    }

    /// Flip `beacon_id` in the validated list. Returns whether it is now validated.
    pub fn toggle_validated(&mut self, beacon_id: &str) -> bool {
        if let Some(pos) = self.validated_beacon_ids.iter().position(|id| id == beacon_id) {
            self.validated_beacon_ids.remove(pos);
            false
        } else {
            self.validated_beacon_ids.push(beacon_id.to_string());
            true
        }
    }
}

/// Flat persisted shape of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunRecord {
    id: String,
    group_id: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    mode: RunMode,
    #[serde(default, deserialize_with = "super::null_as_default")]
    beacon_ids: Vec<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    validated_beacon_ids: Vec<String>,
    start_time: i64,
    duration_limit: u32,
    status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_time: Option<i64>,
}

impl From<RunRecord> for Run {
    fn from(record: RunRecord) -> Self {
        let kind = match record.mode {
            RunMode::Star => RunKind::Star {
                beacon_ids: record.beacon_ids,
            },
            RunMode::Score => RunKind::Score,
        };
        Run {
            id: record.id,
            group_id: record.group_id,
            kind,
            validated_beacon_ids: record.validated_beacon_ids,
            start_time: record.start_time,
            duration_limit: record.duration_limit,
            status: record.status,
            end_time: record.end_time,
        }
    }
}

impl From<Run> for RunRecord {
    fn from(run: Run) -> Self {
        let mode = run.mode();
        let beacon_ids = run.beacon_ids().to_vec();
        RunRecord {
            id: run.id,
            group_id: run.group_id,
            mode,
            beacon_ids,
            validated_beacon_ids: run.validated_beacon_ids,
            start_time: run.start_time,
            duration_limit: run.duration_limit,
            status: run.status,
            end_time: run.end_time,
        }
    }
}
