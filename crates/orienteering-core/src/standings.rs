//! Leaderboard and race statistics, computed from a [`GameState`].

use serde::{Deserialize, Serialize};

use crate::model::{GameState, Level, RunStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingRow {
    /// Competition ranking: tied groups share a rank, the next rank skips.
    pub rank: usize,
    pub group_id: String,
    pub name: String,
    pub total_points: u32,
    pub completed_runs: usize,
    pub failed_runs: usize,
    pub active_run_id: Option<String>,
}

/// Groups ordered by points, then by name.
pub fn standings(state: &GameState) -> Vec<StandingRow> {
    let mut rows: Vec<StandingRow> = state
        .groups
        .iter()
        .map(|g| {
            let runs = state.runs.iter().filter(|r| r.group_id == g.id);
            let (mut completed, mut failed) = (0, 0);
            for run in runs {
                match run.status {
                    RunStatus::Completed => completed += 1,
                    RunStatus::Failed => failed += 1,
                    _ => {}
                }
            }
            StandingRow {
                rank: 0,
                group_id: g.id.clone(),
                name: g.name.clone(),
                total_points: g.total_points,
                completed_runs: completed,
                failed_runs: failed,
                active_run_id: state.active_run_for_group(&g.id).map(|r| r.id.clone()),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut previous: Option<u32> = None;
    let mut rank = 0;
    for (i, row) in rows.iter_mut().enumerate() {
        if previous != Some(row.total_points) {
            rank = i + 1;
            previous = Some(row.total_points);
        }
        row.rank = rank;
    }
    rows
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTally {
    pub level: Level,
    /// Beacons of this level on the course.
    pub beacons: usize,
    /// Times a beacon of this level was counted in a completed run.
    pub found: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceStats {
    pub completed_runs: usize,
    pub failed_runs: usize,
    pub active_runs: usize,
    /// Sum of every group's total.
    pub total_points: u64,
    /// Mean duration of completed runs, in whole seconds.
    pub average_completed_secs: Option<u64>,
    pub by_level: Vec<LevelTally>,
}

pub fn race_stats(state: &GameState) -> RaceStats {
    let completed: Vec<_> = state
        .runs
        .iter()
        .filter(|r| r.status == RunStatus::Completed)
        .collect();
    let failed_runs = state
        .runs
        .iter()
        .filter(|r| r.status == RunStatus::Failed)
        .count();

    let durations: Vec<u64> = completed
        .iter()
        .filter_map(|r| r.end_time.map(|end| ((end - r.start_time).max(0) / 1000) as u64))
        .collect();
    let average_completed_secs = if durations.is_empty() {
        None
    } else {
        Some(durations.iter().sum::<u64>() / durations.len() as u64)
    };

    let by_level = Level::ALL
        .iter()
        .map(|&level| {
            let beacons = state.beacons.iter().filter(|b| b.level == level).count();
            let found = completed
                .iter()
                .flat_map(|r| r.counted_beacon_ids())
                .filter(|id| state.beacon(id).is_some_and(|b| b.level == level))
                .count();
            LevelTally {
                level,
                beacons,
                found,
            }
        })
        .collect();

    RaceStats {
        completed_runs: completed.len(),
        failed_runs,
        active_runs: state.active_runs().count(),
        total_points: state.groups.iter().map(|g| u64::from(g.total_points)).sum(),
        average_completed_secs,
        by_level,
    }
}
