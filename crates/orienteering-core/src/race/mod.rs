//! Run timing and scoring engine.

pub mod clock;
pub mod display;
pub mod machine;
pub mod policy;
pub mod scoring;

pub use clock::{Clock, ManualClock, SystemClock};
pub use display::{elapsed_secs, format_clock, RunClock};
pub use machine::{Completed, StartRun, Started, Stopped};
pub use policy::{time_limit_seconds, TimeLimit};
pub use scoring::{base_points, overtime_penalty, score_run, RaceRules, ScoreBreakdown};
