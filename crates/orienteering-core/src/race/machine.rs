//! Run lifecycle transitions.
//!
//! ## State Transitions
//!
//! ```text
//! (start) -> Running -> [Checking] -> Completed | Failed
//! ```
//!
//! Each transition edits a working copy of the [`GameState`]. On error the
//! copy is dropped, so a rejected transition never leaks a partial edit.

use serde::{Deserialize, Serialize};

use super::policy::{time_limit_seconds, TimeLimit};
use super::scoring::{score_run, RaceRules, ScoreBreakdown};
use crate::error::{CoreError, EntityKind, Result, ValidationError};
use crate::model::{GameState, Run, RunKind, RunMode, RunStatus};

/// Parameters of a new run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRun {
    pub group_id: String,
    /// Targets of a star run. Ignored in score mode.
    #[serde(default)]
    pub beacon_ids: Vec<String>,
    #[serde(default)]
    pub mode: RunMode,
    /// Explicit limit for score runs.
    #[serde(default)]
    pub custom_duration_minutes: Option<u32>,
}

impl StartRun {
    pub fn star(group_id: impl Into<String>, beacon_ids: Vec<String>) -> Self {
        Self {
            group_id: group_id.into(),
            beacon_ids,
            mode: RunMode::Star,
            custom_duration_minutes: None,
        }
    }

    pub fn score(group_id: impl Into<String>, minutes: Option<u32>) -> Self {
        Self {
            group_id: group_id.into(),
            beacon_ids: Vec::new(),
            mode: RunMode::Score,
            custom_duration_minutes: minutes,
        }
    }

    /// The limit this request resolves to.
    pub fn time_limit(&self, rules: &RaceRules) -> TimeLimit {
        match self.mode {
            RunMode::Star => TimeLimit::ByBeaconCount {
                count: self.beacon_ids.len(),
            },
            RunMode::Score => TimeLimit::Minutes {
                minutes: self
                    .custom_duration_minutes
                    .unwrap_or(rules.default_score_minutes),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Started {
    pub run: Run,
    /// Ids of the group's previous unfinished runs, now dropped.
    pub discarded: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stopped {
    pub end_time: i64,
    /// The clock was already frozen; nothing changed.
    pub already_stopped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    pub group_id: String,
    pub status: RunStatus,
    pub score: ScoreBreakdown,
    /// False when the group no longer exists and no total was credited.
    pub credited: bool,
}

pub fn start_run(
    state: &mut GameState,
    request: &StartRun,
    run_id: String,
    now_ms: i64,
    rules: &RaceRules,
) -> Result<Started> {
    if state.group(&request.group_id).is_none() {
        return Err(CoreError::not_found(EntityKind::Group, &request.group_id));
    }

    let kind = match request.mode {
        RunMode::Star => {
            if request.beacon_ids.is_empty() {
                return Err(ValidationError::EmptyCollection("star run targets".into()).into());
            }
            if let Some(missing) = request.beacon_ids.iter().find(|id| state.beacon(id).is_none()) {
                return Err(CoreError::not_found(EntityKind::Beacon, missing));
            }
            let mut targets: Vec<String> = Vec::with_capacity(request.beacon_ids.len());
            for id in &request.beacon_ids {
                if !targets.contains(id) {
                    targets.push(id.clone());
                }
            }
            RunKind::Star { beacon_ids: targets }
        }
        RunMode::Score => {
            if request.custom_duration_minutes == Some(0) {
                return Err(ValidationError::InvalidValue {
                    field: "custom_duration_minutes".into(),
                    message: "must be at least one minute".into(),
                }
                .into());
            }
            RunKind::Score
        }
    };

    let duration_limit = match &kind {
        RunKind::Star { beacon_ids } => time_limit_seconds(beacon_ids.len()),
        RunKind::Score => request.time_limit(rules).seconds(),
    };

    let mut discarded = Vec::new();
    state.runs.retain(|r| {
        let drop = r.group_id == request.group_id && r.is_active();
        if drop {
            discarded.push(r.id.clone());
        }
        !drop
    });

    let run = Run {
        id: run_id,
        group_id: request.group_id.clone(),
        kind,
        validated_beacon_ids: Vec::new(),
        start_time: now_ms,
        duration_limit,
        status: RunStatus::Running,
        end_time: None,
    };
    state.runs.push(run.clone());
    Ok(Started { run, discarded })
}

/// Flip a beacon in the run's validated list. Returns whether it is now validated.
pub fn toggle_beacon(state: &mut GameState, run_id: &str, beacon_id: &str) -> Result<bool> {
    if state.beacon(beacon_id).is_none() {
        return Err(CoreError::not_found(EntityKind::Beacon, beacon_id));
    }
    let run = active_run_mut(state, run_id)?;
    Ok(run.toggle_validated(beacon_id))
}

/// Freeze the run's clock for review.
pub fn stop_timer(state: &mut GameState, run_id: &str, now_ms: i64) -> Result<Stopped> {
    let run = active_run_mut(state, run_id)?;
    if let (RunStatus::Checking, Some(end_time)) = (run.status, run.end_time) {
        return Ok(Stopped {
            end_time,
            already_stopped: true,
        });
    }
    run.status = RunStatus::Checking;
    run.end_time = Some(now_ms);
    Ok(Stopped {
        end_time: now_ms,
        already_stopped: false,
    })
}

/// Close the run and credit its group. Rejected once the run is terminal.
pub fn complete_run(
    state: &mut GameState,
    run_id: &str,
    success: bool,
    now_ms: i64,
    rules: &RaceRules,
) -> Result<Completed> {
    let run = active_run_mut(state, run_id)?;
    if run.end_time.is_none() {
        run.end_time = Some(now_ms);
    }
    run.status = if success {
        RunStatus::Completed
    } else {
        RunStatus::Failed
    };
    let finished = run.clone();

    let score = score_run(&finished, &state.beacons, success, now_ms, rules);
    let credited = match state.groups.iter_mut().find(|g| g.id == finished.group_id) {
        Some(group) => {
            group.total_points = group.total_points.saturating_add(score.awarded);
            true
        }
        None => false,
    };

    Ok(Completed {
        group_id: finished.group_id,
        status: finished.status,
        score,
        credited,
    })
}

fn active_run_mut<'a>(state: &'a mut GameState, run_id: &str) -> Result<&'a mut Run> {
    let run = state
        .runs
        .iter_mut()
        .find(|r| r.id == run_id)
        .ok_or_else(|| CoreError::not_found(EntityKind::Run, run_id))?;
    if run.status.is_terminal() {
        return Err(CoreError::RunFinished {
            run_id: run_id.to_string(),
            status: run.status,
        });
    }
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Group;

    fn state() -> GameState {
        let mut state = GameState::seeded();
        state.groups.push(Group {
            id: "g1".into(),
            name: "Alpha".into(),
            members: vec!["Léo".into(), "Tom".into()],
            total_points: 0,
        });
        state
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn star_limit_follows_target_count() {
        let mut s = state();
        let rules = RaceRules::default();
        let started = start_run(&mut s, &StartRun::star("g1", ids(&["b1", "b3"])), "r1".into(), 0, &rules).unwrap();
        assert_eq!(started.run.duration_limit, 480);
        assert_eq!(started.run.status, RunStatus::Running);
        assert!(started.run.validated_beacon_ids.is_empty());
    }

    #[test]
    fn score_limit_uses_custom_or_default_minutes() {
        let mut s = state();
        let rules = RaceRules {
            default_score_minutes: 15,
            ..RaceRules::default()
        };
        let a = start_run(&mut s, &StartRun::score("g1", Some(12)), "r1".into(), 0, &rules).unwrap();
        assert_eq!(a.run.duration_limit, 720);
        let b = start_run(&mut s, &StartRun::score("g1", None), "r2".into(), 0, &rules).unwrap();
        assert_eq!(b.run.duration_limit, 900);
        assert_eq!(b.discarded, vec!["r1".to_string()]);
    }

    #[test]
    fn restart_discards_only_unfinished_runs() {
        let mut s = state();
        let rules = RaceRules::default();
        start_run(&mut s, &StartRun::star("g1", ids(&["b1"])), "old".into(), 0, &rules).unwrap();
        complete_run(&mut s, "old", true, 1_000, &rules).unwrap();
        start_run(&mut s, &StartRun::star("g1", ids(&["b2"])), "mid".into(), 2_000, &rules).unwrap();
        stop_timer(&mut s, "mid", 3_000).unwrap();
        let started = start_run(&mut s, &StartRun::star("g1", ids(&["b3"])), "new".into(), 4_000, &rules).unwrap();

        assert_eq!(started.discarded, vec!["mid".to_string()]);
        let kept: Vec<&str> = s.runs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(kept, vec!["old", "new"]);
        assert_eq!(s.runs.iter().filter(|r| r.group_id == "g1" && r.is_active()).count(), 1);
    }

    #[test]
    fn start_rejects_unknown_group_and_beacons() {
        let mut s = state();
        let rules = RaceRules::default();
        let err = start_run(&mut s, &StartRun::star("nope", ids(&["b1"])), "r".into(), 0, &rules).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { kind: EntityKind::Group, .. }));
        let err = start_run(&mut s, &StartRun::star("g1", ids(&["zz"])), "r".into(), 0, &rules).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { kind: EntityKind::Beacon, .. }));
        let err = start_run(&mut s, &StartRun::star("g1", vec![]), "r".into(), 0, &rules).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(s.runs.is_empty());
    }

    #[test]
    fn stop_twice_keeps_first_end_time() {
        let mut s = state();
        let rules = RaceRules::default();
        start_run(&mut s, &StartRun::score("g1", Some(10)), "r1".into(), 0, &rules).unwrap();
        let first = stop_timer(&mut s, "r1", 650_000).unwrap();
        let second = stop_timer(&mut s, "r1", 700_000).unwrap();
        assert!(!first.already_stopped);
        assert!(second.already_stopped);
        assert_eq!(s.run("r1").unwrap().end_time, Some(650_000));
    }

    #[test]
    fn terminal_runs_reject_every_transition() {
        let mut s = state();
        let rules = RaceRules::default();
        start_run(&mut s, &StartRun::star("g1", ids(&["b1"])), "r1".into(), 0, &rules).unwrap();
        complete_run(&mut s, "r1", false, 10, &rules).unwrap();

        assert!(matches!(complete_run(&mut s, "r1", true, 20, &rules), Err(CoreError::RunFinished { .. })));
        assert!(matches!(stop_timer(&mut s, "r1", 20), Err(CoreError::RunFinished { .. })));
        assert!(matches!(toggle_beacon(&mut s, "r1", "b1"), Err(CoreError::RunFinished { .. })));
        assert_eq!(s.group("g1").unwrap().total_points, 0);
        assert_eq!(s.run("r1").unwrap().status, RunStatus::Failed);
    }

    #[test]
    fn completion_without_group_still_closes_run() {
        let mut s = state();
        let rules = RaceRules::default();
        start_run(&mut s, &StartRun::star("g1", ids(&["b1"])), "r1".into(), 0, &rules).unwrap();
        s.groups.clear();
        let done = complete_run(&mut s, "r1", true, 1_000, &rules).unwrap();
        assert!(!done.credited);
        assert_eq!(done.score.awarded, 10);
        assert_eq!(s.run("r1").unwrap().status, RunStatus::Completed);
    }
}
