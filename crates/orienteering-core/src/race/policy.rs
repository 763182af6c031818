use serde::{Deserialize, Serialize};

/// Allowed duration for a run targeting `beacon_count` beacons.
///
/// One beacon (or none) gets 6 minutes, two get 8, three or more get 10.
pub fn time_limit_seconds(beacon_count: usize) -> u32 {
    match beacon_count {
        0 | 1 => 360,
        2 => 480,
        _ => 600,
    }
}

/// How a run's limit is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeLimit {
    ByBeaconCount { count: usize },
    Minutes { minutes: u32 },
}

impl TimeLimit {
    pub fn seconds(self) -> u32 {
        match self {
            TimeLimit::ByBeaconCount { count } => time_limit_seconds(count),
            TimeLimit::Minutes { minutes } => minutes.saturating_mul(60),
        }
    }
}
