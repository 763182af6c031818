//! Points awarded when a run completes.
//!
//! Awarding happens once, at completion, against the beacon collection as it
//! is at that instant. Later edits to beacon points never touch stored totals.

use serde::{Deserialize, Serialize};

use crate::model::{Beacon, Run, RunKind};

const MINUTE_MS: i64 = 60_000;

/// Tunable race rules, loaded from the `[race]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceRules {
    /// Points removed per started minute of overtime in score mode.
    #[serde(default = "default_penalty_per_minute")]
    pub penalty_per_minute: u32,
    /// Limit for score runs started without an explicit duration.
    #[serde(default = "default_score_minutes")]
    pub default_score_minutes: u32,
}

fn default_penalty_per_minute() -> u32 {
    5
}
fn default_score_minutes() -> u32 {
    10
}

impl Default for RaceRules {
    fn default() -> Self {
        Self {
            penalty_per_minute: default_penalty_per_minute(),
            default_score_minutes: default_score_minutes(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Sum of beacon points for the counted beacons.
    pub base: u32,
    /// Time past the limit, zero when on time or not penalised.
    pub overtime_ms: u64,
    pub penalty: u32,
    pub awarded: u32,
}

/// Sum the points of every beacon whose id is in `ids`.
pub fn base_points(ids: &[String], beacons: &[Beacon]) -> u32 {
    beacons
        .iter()
        .filter(|b| ids.contains(&b.id))
        .fold(0u32, |acc, b| acc.saturating_add(b.points))
}

/// Penalty for `overtime_ms` past the limit: a full rate per started minute.
pub fn overtime_penalty(overtime_ms: i64, rules: &RaceRules) -> u32 {
    if overtime_ms <= 0 {
        return 0;
    }
    let started_minutes = (overtime_ms + MINUTE_MS - 1) / MINUTE_MS;
    u32::try_from(started_minutes)
        .unwrap_or(u32::MAX)
        .saturating_mul(rules.penalty_per_minute)
}

/// Score a run being completed at `now_ms`.
///
/// A frozen `end_time` takes precedence over `now_ms`. Star runs are never
/// penalised for time.
pub fn score_run(
    run: &Run,
    beacons: &[Beacon],
    success: bool,
    now_ms: i64,
    rules: &RaceRules,
) -> ScoreBreakdown {
    if !success {
        return ScoreBreakdown::default();
    }

    let base = base_points(run.counted_beacon_ids(), beacons);
    match run.kind {
        RunKind::Star { .. } => ScoreBreakdown {
            base,
            awarded: base,
            ..ScoreBreakdown::default()
        },
        RunKind::Score => {
            let end = run.end_time.unwrap_or(now_ms);
            let overtime_ms = (end - run.start_time) - i64::from(run.duration_limit) * 1000;
            let penalty = overtime_penalty(overtime_ms, rules);
            ScoreBreakdown {
                base,
                overtime_ms: overtime_ms.max(0) as u64,
                penalty,
                awarded: base.saturating_sub(penalty),
            }
        }
    }
}
