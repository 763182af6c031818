use std::thread;
use std::time::Duration;

use clap::Subcommand;
use orienteering_core::{Run, RunMode, StartRun};
use serde_json::json;

use super::{finish, open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum RunAction {
    /// Start a run for a group, replacing its unfinished one
    Start {
        group_id: String,
        /// star: fixed targets, score: collect freely
        #[arg(long, default_value = "star")]
        mode: RunMode,
        /// Target beacon id for a star run (repeatable)
        #[arg(long = "beacon")]
        beacons: Vec<String>,
        /// Duration of a score run in minutes
        #[arg(long)]
        minutes: Option<u32>,
    },
    /// Mark a beacon found, or unmark it
    Toggle { run_id: String, beacon_id: String },
    /// Freeze the clock while finds are checked
    Stop { run_id: String },
    /// Close a run and credit the group
    Complete {
        run_id: String,
        /// Record the run as failed (no points)
        #[arg(long)]
        failed: bool,
    },
    /// Print countdowns of unfinished runs, or of one run
    Status {
        run_id: Option<String>,
        /// Reprint every `display.tick_interval_ms` until nothing is left running
        #[arg(long)]
        watch: bool,
    },
    /// List runs as JSON
    List {
        /// Only unfinished runs
        #[arg(long)]
        active: bool,
    },
}

pub fn run(action: RunAction) -> CliResult {
    let (mut store, config) = open_store()?;

    match action {
        RunAction::Start {
            group_id,
            mode,
            beacons,
            minutes,
        } => {
            let request = StartRun {
                group_id,
                beacon_ids: beacons,
                mode,
                custom_duration_minutes: minutes,
            };
            let run = store.start_run(request)?;
            finish(&mut store, &config);
            print_json(&run)?;
        }
        RunAction::Toggle { run_id, beacon_id } => {
            let validated = store.toggle_beacon_status(&run_id, &beacon_id)?;
            finish(&mut store, &config);
            print_json(&json!({
                "runId": run_id,
                "beaconId": beacon_id,
                "validated": validated,
            }))?;
        }
        RunAction::Stop { run_id } => {
            let stopped = store.stop_run_timer(&run_id)?;
            finish(&mut store, &config);
            print_json(&stopped)?;
        }
        RunAction::Complete { run_id, failed } => {
            let score = store.complete_run(&run_id, !failed)?;
            finish(&mut store, &config);
            print_json(&score)?;
        }
        RunAction::Status { run_id, watch } => {
            let interval = Duration::from_millis(config.display.tick_interval_ms);
            loop {
                let finished = match &run_id {
                    Some(id) => {
                        let clock = store.run_clock(id)?;
                        print_json(&clock)?;
                        clock.status.is_terminal()
                    }
                    None => {
                        let clocks = store.tick();
                        print_json(&clocks)?;
                        clocks.is_empty()
                    }
                };
                if !watch || finished {
                    break;
                }
                thread::sleep(interval);
                // Other devices write to the same database; re-read it.
                if !config.sync.offline {
                    store.reconnect();
                }
                finish(&mut store, &config);
            }
        }
        RunAction::List { active } => {
            let runs: Vec<&Run> = store
                .state()
                .runs
                .iter()
                .filter(|r| !active || r.is_active())
                .collect();
            print_json(&runs)?;
        }
    }
    Ok(())
}
