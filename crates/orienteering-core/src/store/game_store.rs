//! The aggregate store: sole owner of the race state.
//!
//! Every action computes a new [`GameState`] from a copy of the current one,
//! swaps it in, then writes the whole document to the sink. Local state
//! always wins; the write is best effort and only moves [`SyncStatus`].
//! Snapshots coming back from the sink replace local state wholesale
//! (last snapshot wins, no merge).
//!
//! A stored document that cannot be decoded is never overwritten: the store
//! stays offline until the sink delivers a readable one.

use std::sync::mpsc::{Receiver, TryRecvError};

use rand::Rng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::sink::{MemorySink, PersistenceSink, SinkUpdate, SyncStatus};
use crate::error::{CoreError, EntityKind, Result, ValidationError};
use crate::events::Event;
use crate::model::{
    Beacon, BeaconPatch, ClassRoom, GameState, Group, Level, PunchCode, Run, RunStatus,
};
use crate::race::machine::{self, StartRun, Stopped};
use crate::race::{Clock, RaceRules, RunClock, ScoreBreakdown, SystemClock};
use crate::roster::{split_into_groups, GroupSplit};

/// Fields for a new beacon.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBeacon {
    pub code: String,
    pub level: Level,
    /// Defaults to the level's conventional value.
    pub points: Option<u32>,
    pub punch_code: PunchCode,
    pub distance: f64,
}

impl NewBeacon {
    pub fn new(code: impl Into<String>, level: Level) -> Self {
        Self {
            code: code.into(),
            level,
            points: None,
            punch_code: PunchCode::default(),
            distance: 0.0,
        }
    }
}

pub struct GameStore<S: PersistenceSink = MemorySink> {
    state: GameState,
    sink: S,
    updates: Option<Receiver<SinkUpdate>>,
    status: SyncStatus,
    /// The sink holds a document this store could not decode.
    remote_unreadable: bool,
    rules: RaceRules,
    clock: Box<dyn Clock>,
    events: Vec<Event>,
}

impl<S: PersistenceSink> GameStore<S> {
    /// Subscribe to `sink` and adopt its document.
    ///
    /// If the sink cannot be reached the store starts offline on the seeded
    /// course and keeps working locally.
    pub fn connect(sink: S, rules: RaceRules) -> Self {
        Self::connect_with_clock(sink, rules, SystemClock)
    }

    pub fn connect_with_clock(sink: S, rules: RaceRules, clock: impl Clock + 'static) -> Self {
        let mut store = Self::detached(sink, rules, clock, GameState::seeded());
        store.reconnect();
        store
    }

    /// Local-only demo store: never subscribes, never writes.
    pub fn offline(sink: S, rules: RaceRules, clock: impl Clock + 'static, state: GameState) -> Self {
        let mut store = Self::detached(sink, rules, clock, state);
        store.status = SyncStatus::Offline;
        store
    }

    fn detached(sink: S, rules: RaceRules, clock: impl Clock + 'static, state: GameState) -> Self {
        Self {
            state,
            sink,
            updates: None,
            status: SyncStatus::Connecting,
            remote_unreadable: false,
            rules,
            clock: Box::new(clock),
            events: Vec::new(),
        }
    }

    /// (Re)subscribe to the sink and apply whatever it delivers right away.
    pub fn reconnect(&mut self) {
        self.set_status(SyncStatus::Connecting);
        match self.sink.subscribe() {
            Ok(rx) => {
                self.updates = Some(rx);
                self.pump();
            }
            Err(e) => {
                warn!(error = %e, "sink unavailable, running offline");
                self.updates = None;
                self.set_status(SyncStatus::Offline);
            }
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    pub fn rules(&self) -> &RaceRules {
        &self.rules
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Take the events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Countdown views for every unfinished run. Read-only.
    pub fn tick(&self) -> Vec<RunClock> {
        let now = self.clock.now_ms();
        self.state
            .active_runs()
            .map(|run| RunClock::for_run(run, now))
            .collect()
    }

    pub fn run_clock(&self, run_id: &str) -> Result<RunClock> {
        let run = self
            .state
            .run(run_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Run, run_id))?;
        Ok(RunClock::for_run(run, self.clock.now_ms()))
    }

    // ── Sync ─────────────────────────────────────────────────────────

    /// Apply pending sink notifications. Returns true if local state changed.
    pub fn pump(&mut self) -> bool {
        let Some(rx) = &self.updates else {
            return false;
        };

        let mut latest = None;
        let mut disconnected = false;
        loop {
            match rx.try_recv() {
                Ok(update) => latest = Some(update),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        let changed = match latest {
            Some(SinkUpdate::Snapshot(document)) => self.apply_snapshot(document),
            Some(SinkUpdate::Missing) => {
                info!("no race document yet, publishing local state");
                self.remote_unreadable = false;
                self.publish();
                false
            }
            Some(SinkUpdate::Failed(reason)) => {
                warn!(%reason, "sink subscription failed");
                self.set_status(SyncStatus::Offline);
                false
            }
            None => false,
        };

        if disconnected {
            warn!("sink subscription closed, running offline");
            self.updates = None;
            self.set_status(SyncStatus::Offline);
        }
        changed
    }

    fn apply_snapshot(&mut self, document: serde_json::Value) -> bool {
        let remote = match GameState::from_document(document) {
            Ok(remote) => remote,
            Err(e) => {
                warn!(error = %e, "stored race document is unreadable, not overwriting it");
                self.remote_unreadable = true;
                self.set_status(SyncStatus::Offline);
                return false;
            }
        };
        self.remote_unreadable = false;
        self.set_status(SyncStatus::Connected);
        if remote == self.state {
            return false;
        }
        debug!(runs = remote.runs.len(), "remote snapshot replaces local state");
        self.state = remote;
        let at = self.clock.now();
        self.push(Event::RemoteSnapshotApplied { at });
        true
    }

    /// True while the stored document could not be decoded. Local edits are
    /// kept but not written until a readable document arrives.
    pub fn remote_unreadable(&self) -> bool {
        self.remote_unreadable
    }

    fn publish(&mut self) {
        if self.updates.is_none() {
            return;
        }
        if self.remote_unreadable {
            debug!("stored document unreadable, local change not written");
            self.set_status(SyncStatus::Offline);
            return;
        }
        let document = match self.state.to_document() {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, "could not encode race document");
                self.set_status(SyncStatus::Offline);
                return;
            }
        };
        self.set_status(SyncStatus::Saving);
        match self.sink.write_full(&document) {
            Ok(()) => self.set_status(SyncStatus::Connected),
            Err(e) => {
                warn!(error = %e, "write failed, keeping local state");
                self.set_status(SyncStatus::Offline);
            }
        }
    }

    fn set_status(&mut self, status: SyncStatus) {
        if self.status != status {
            debug!(from = ?self.status, to = ?status, "sync status");
            self.status = status;
            let at = self.clock.now();
            self.push(Event::SyncStatusChanged { status, at });
        }
    }

    fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Run `f` on a copy of the state; swap it in and publish only on success.
    fn mutate<T>(&mut self, f: impl FnOnce(&mut GameState) -> Result<T>) -> Result<T> {
        let mut next = self.state.clone();
        let out = f(&mut next)?;
        self.state = next;
        self.publish();
        Ok(out)
    }

    fn course_changed(&mut self, summary: String) {
        debug!(%summary, "course changed");
        let at = self.clock.now();
        self.push(Event::CourseChanged { summary, at });
    }

    // ── Roster ───────────────────────────────────────────────────────

    pub fn add_class(&mut self, name: &str, students: Vec<String>) -> Result<ClassRoom> {
        let name = required("class name", name)?;
        let class = ClassRoom {
            id: new_id(),
            name,
            students: students
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        };
        let added = class.clone();
        self.mutate(|state| {
            state.classes.push(added);
            Ok(())
        })?;
        self.course_changed(format!("class {} added", class.name));
        Ok(class)
    }

    pub fn remove_class(&mut self, class_id: &str) -> Result<()> {
        self.mutate(|state| {
            let before = state.classes.len();
            state.classes.retain(|c| c.id != class_id);
            if state.classes.len() == before {
                return Err(CoreError::not_found(EntityKind::Class, class_id));
            }
            Ok(())
        })?;
        self.course_changed(format!("class {class_id} removed"));
        Ok(())
    }

    pub fn add_group(&mut self, name: &str, members: Vec<String>) -> Result<Group> {
        let group = Group {
            id: new_id(),
            name: required("group name", name)?,
            members,
            total_points: 0,
        };
        let added = group.clone();
        self.mutate(|state| {
            state.groups.push(added);
            Ok(())
        })?;
        self.course_changed(format!("group {} added", group.name));
        Ok(group)
    }

    pub fn rename_group(&mut self, group_id: &str, name: &str) -> Result<()> {
        let name = required("group name", name)?;
        self.mutate(|state| {
            let group = state
                .groups
                .iter_mut()
                .find(|g| g.id == group_id)
                .ok_or_else(|| CoreError::not_found(EntityKind::Group, group_id))?;
            group.name = name;
            Ok(())
        })?;
        self.course_changed(format!("group {group_id} renamed"));
        Ok(())
    }

    /// Remove a group along with its unfinished runs. Finished runs stay as history.
    pub fn remove_group(&mut self, group_id: &str) -> Result<()> {
        self.mutate(|state| {
            if state.group(group_id).is_none() {
                return Err(CoreError::not_found(EntityKind::Group, group_id));
            }
            state.groups.retain(|g| g.id != group_id);
            state
                .runs
                .retain(|r| r.group_id != group_id || r.status.is_terminal());
            Ok(())
        })?;
        self.course_changed(format!("group {group_id} removed"));
        Ok(())
    }

    /// Deal a saved class into new groups named after the current group count.
    pub fn create_groups_from_class<R: Rng + ?Sized>(
        &mut self,
        class_id: &str,
        split: GroupSplit,
        rng: &mut R,
    ) -> Result<Vec<Group>> {
        let class = self
            .state
            .class(class_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Class, class_id))?;
        let teams = split_into_groups(&class.students, split, rng)?;
        let offset = self.state.groups.len();
        let groups: Vec<Group> = teams
            .into_iter()
            .enumerate()
            .map(|(i, members)| Group {
                id: new_id(),
                name: format!("Group {}", offset + i + 1),
                members,
                total_points: 0,
            })
            .collect();

        let added = groups.clone();
        self.mutate(|state| {
            state.groups.extend(added);
            Ok(())
        })?;
        self.course_changed(format!("{} groups created from class {class_id}", groups.len()));
        Ok(groups)
    }

    // ── Course ───────────────────────────────────────────────────────

    pub fn add_beacon(&mut self, new: NewBeacon) -> Result<Beacon> {
        let beacon = Beacon {
            id: new_id(),
            code: required("beacon code", &new.code)?,
            level: new.level,
            points: new.points.unwrap_or_else(|| new.level.default_points()),
            punch_code: new.punch_code,
            distance: new.distance,
        };
        let added = beacon.clone();
        self.mutate(|state| {
            state.beacons.push(added);
            Ok(())
        })?;
        self.course_changed(format!("beacon {} added", beacon.code));
        Ok(beacon)
    }

    /// Edit a beacon. Totals already awarded are not recomputed.
    pub fn update_beacon(&mut self, beacon_id: &str, patch: BeaconPatch) -> Result<Beacon> {
        if let Some(code) = &patch.code {
            required("beacon code", code)?;
        }
        let updated = self.mutate(|state| {
            let beacon = state
                .beacons
                .iter_mut()
                .find(|b| b.id == beacon_id)
                .ok_or_else(|| CoreError::not_found(EntityKind::Beacon, beacon_id))?;
            patch.apply_to(beacon);
            Ok(beacon.clone())
        })?;
        self.course_changed(format!("beacon {} updated", updated.code));
        Ok(updated)
    }

    /// Remove a beacon no unfinished run depends on.
    pub fn remove_beacon(&mut self, beacon_id: &str) -> Result<()> {
        self.mutate(|state| {
            if state.beacon(beacon_id).is_none() {
                return Err(CoreError::not_found(EntityKind::Beacon, beacon_id));
            }
            if let Some(run) = state.active_runs().find(|r| r.references(beacon_id)) {
                return Err(CoreError::BeaconInUse {
                    beacon_id: beacon_id.to_string(),
                    run_id: run.id.clone(),
                });
            }
            state.beacons.retain(|b| b.id != beacon_id);
            Ok(())
        })?;
        self.course_changed(format!("beacon {beacon_id} removed"));
        Ok(())
    }

    /// Start a new race day: drop every run and zero every total.
    /// Course and roster are kept.
    pub fn reset_race(&mut self) -> Result<()> {
        self.mutate(|state| {
            state.runs.clear();
            for group in &mut state.groups {
                group.total_points = 0;
            }
            Ok(())
        })?;
        info!("race reset");
        self.course_changed("race reset".into());
        Ok(())
    }

    // ── Runs ─────────────────────────────────────────────────────────

    /// Start a run, discarding the group's previous unfinished one.
    pub fn start_run(&mut self, request: StartRun) -> Result<Run> {
        let now = self.clock.now_ms();
        let rules = self.rules;
        let started = self.mutate(|state| machine::start_run(state, &request, new_id(), now, &rules))?;

        let at = self.clock.now();
        for run_id in &started.discarded {
            info!(%run_id, group_id = %request.group_id, "unfinished run discarded");
            self.push(Event::RunDiscarded {
                run_id: run_id.clone(),
                group_id: request.group_id.clone(),
                at,
            });
        }
        info!(
            run_id = %started.run.id,
            group_id = %started.run.group_id,
            mode = %started.run.mode(),
            limit_secs = started.run.duration_limit,
            "run started"
        );
        self.push(Event::RunStarted {
            run_id: started.run.id.clone(),
            group_id: started.run.group_id.clone(),
            mode: started.run.mode(),
            duration_limit_secs: started.run.duration_limit,
            at,
        });
        Ok(started.run)
    }

    /// Mark a beacon found, or unmark it. Returns whether it is now found.
    pub fn toggle_beacon_status(&mut self, run_id: &str, beacon_id: &str) -> Result<bool> {
        let validated = self.mutate(|state| machine::toggle_beacon(state, run_id, beacon_id))?;
        debug!(%run_id, %beacon_id, validated, "beacon toggled");
        let at = self.clock.now();
        self.push(Event::BeaconToggled {
            run_id: run_id.to_string(),
            beacon_id: beacon_id.to_string(),
            validated,
            at,
        });
        Ok(validated)
    }

    /// Freeze the clock while finds are checked.
    pub fn stop_run_timer(&mut self, run_id: &str) -> Result<Stopped> {
        let now = self.clock.now_ms();
        if let Some(run) = self.state.run(run_id) {
            if let (RunStatus::Checking, Some(end_time)) = (run.status, run.end_time) {
                return Ok(Stopped {
                    end_time,
                    already_stopped: true,
                });
            }
        }

        let stopped = self.mutate(|state| machine::stop_timer(state, run_id, now))?;
        let elapsed_secs = self.run_clock(run_id).map(|c| c.elapsed_secs).unwrap_or_default();
        info!(%run_id, elapsed_secs, "run timer stopped");
        let at = self.clock.now();
        self.push(Event::RunTimerStopped {
            run_id: run_id.to_string(),
            elapsed_secs,
            at,
        });
        Ok(stopped)
    }

    /// Close a run and credit its group. A finished run is rejected with
    /// [`CoreError::RunFinished`] and awards nothing.
    pub fn complete_run(&mut self, run_id: &str, success: bool) -> Result<ScoreBreakdown> {
        let now = self.clock.now_ms();
        let rules = self.rules;
        let done = self.mutate(|state| machine::complete_run(state, run_id, success, now, &rules))?;

        if !done.credited {
            warn!(%run_id, group_id = %done.group_id, "group missing, points not credited");
        }
        info!(
            %run_id,
            group_id = %done.group_id,
            status = %done.status,
            awarded = done.score.awarded,
            penalty = done.score.penalty,
            "run completed"
        );
        let at = self.clock.now();
        self.push(Event::RunCompleted {
            run_id: run_id.to_string(),
            group_id: done.group_id,
            status: done.status,
            score: done.score,
            at,
        });
        Ok(done.score)
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn required(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: "must not be empty".into(),
        });
    }
    Ok(trimmed.to_string())
}
