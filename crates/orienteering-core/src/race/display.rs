//! Read-only countdown view of a run.
//!
//! Nothing here is persisted; views are recomputed from the run and the
//! current time on every display tick.

use serde::{Deserialize, Serialize};

use crate::model::{Run, RunMode, RunStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunClock {
    pub run_id: String,
    pub group_id: String,
    pub mode: RunMode,
    pub status: RunStatus,
    pub limit_secs: i64,
    pub elapsed_secs: i64,
    /// Negative once the limit has passed.
    pub remaining_secs: i64,
    pub overtime: bool,
    /// 0.0 .. 100.0 of the limit consumed.
    pub progress_pct: f64,
    /// `m:ss`, prefixed with `-` in overtime.
    pub countdown: String,
}

impl RunClock {
    /// Build the view at `now_ms`. Runs with a frozen clock use their `end_time`.
    pub fn for_run(run: &Run, now_ms: i64) -> Self {
        let elapsed_secs = elapsed_secs(run, now_ms);
        let limit_secs = i64::from(run.duration_limit);
        let remaining_secs = limit_secs - elapsed_secs;
        let progress_pct = if limit_secs == 0 {
            100.0
        } else {
            (elapsed_secs as f64 / limit_secs as f64 * 100.0).min(100.0)
        };
        Self {
            run_id: run.id.clone(),
            group_id: run.group_id.clone(),
            mode: run.mode(),
            status: run.status,
            limit_secs,
            elapsed_secs,
            remaining_secs,
            overtime: remaining_secs < 0,
            progress_pct,
            countdown: format_clock(remaining_secs),
        }
    }
}

/// Whole seconds since the run started, frozen at `end_time` once stopped.
pub fn elapsed_secs(run: &Run, now_ms: i64) -> i64 {
    let reference = match (run.status, run.end_time) {
        (RunStatus::Running, _) | (_, None) => now_ms,
        (_, Some(end)) => end,
    };
    (reference - run.start_time).max(0) / 1000
}

/// Format seconds as `m:ss`, sign-prefixed when negative: `-90` is `-1:30`.
pub fn format_clock(secs: i64) -> String {
    let sign = if secs < 0 { "-" } else { "" };
    let abs = secs.unsigned_abs();
    format!("{sign}{}:{:02}", abs / 60, abs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RunKind;

    fn run(status: RunStatus, end_time: Option<i64>) -> Run {
        Run {
            id: "r1".into(),
            group_id: "g1".into(),
            kind: RunKind::Score,
            validated_beacon_ids: vec![],
            start_time: 10_000,
            duration_limit: 360,
            status,
            end_time,
        }
    }

    #[test]
    fn formats_overtime_with_sign() {
        assert_eq!(format_clock(-90), "-1:30");
        assert_eq!(format_clock(600), "10:00");
        assert_eq!(format_clock(5), "0:05");
        assert_eq!(format_clock(0), "0:00");
    }

    #[test]
    fn running_clock_follows_now() {
        let clock = RunClock::for_run(&run(RunStatus::Running, None), 10_000 + 60_500);
        assert_eq!(clock.elapsed_secs, 60);
        assert_eq!(clock.remaining_secs, 300);
        assert_eq!(clock.countdown, "5:00");
        assert!(!clock.overtime);
    }

    #[test]
    fn checking_clock_is_frozen_at_end_time() {
        let r = run(RunStatus::Checking, Some(10_000 + 450_000));
        let early = RunClock::for_run(&r, 10_000 + 500_000);
        let late = RunClock::for_run(&r, 10_000 + 9_000_000);
        assert_eq!(early, late);
        assert_eq!(early.remaining_secs, -90);
        assert_eq!(early.countdown, "-1:30");
        assert!(early.overtime);
        assert_eq!(early.progress_pct, 100.0);
    }

    #[test]
    fn clock_skew_never_yields_negative_elapsed() {
        assert_eq!(elapsed_secs(&run(RunStatus::Running, None), 0), 0);
    }
}
