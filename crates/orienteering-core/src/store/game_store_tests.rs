use rand::rngs::StdRng;
use rand::SeedableRng;

use super::game_store::{GameStore, NewBeacon};
use super::sink::{MemorySink, SyncStatus};
use crate::error::{CoreError, EntityKind};
use crate::events::Event;
use crate::model::{BeaconPatch, GameState, Level};
use crate::race::{ManualClock, RaceRules, StartRun};
use crate::roster::GroupSplit;

fn store() -> GameStore {
    GameStore::connect_with_clock(MemorySink::new(), RaceRules::default(), ManualClock::new(0))
}

#[test]
fn connect_to_empty_sink_publishes_seeded_course() {
    let sink = MemorySink::new();
    let store = GameStore::connect_with_clock(sink.clone(), RaceRules::default(), ManualClock::new(0));
    assert_eq!(store.status(), SyncStatus::Connected);
    let doc = sink.document().expect("seeded document written");
    assert_eq!(GameState::from_document(doc).unwrap(), GameState::seeded());
}

#[test]
fn add_beacon_uses_level_points_by_default() {
    let mut store = store();
    let b = store.add_beacon(NewBeacon::new("70", Level::N2)).unwrap();
    assert_eq!(b.points, 20);
    let custom = store
        .add_beacon(NewBeacon {
            points: Some(25),
            ..NewBeacon::new("71", Level::N2)
        })
        .unwrap();
    assert_eq!(custom.points, 25);
    assert_eq!(store.state().beacons.len(), 7);
}

#[test]
fn blank_names_are_rejected_without_writing() {
    let sink = MemorySink::new();
    let mut store = GameStore::connect_with_clock(sink.clone(), RaceRules::default(), ManualClock::new(0));
    let writes = sink.write_count();
    assert!(matches!(store.add_group("  ", vec![]), Err(CoreError::Validation(_))));
    assert!(store.add_beacon(NewBeacon::new("", Level::N1)).is_err());
    assert_eq!(sink.write_count(), writes);
}

#[test]
fn update_beacon_patches_only_given_fields() {
    let mut store = store();
    let updated = store
        .update_beacon(
            "b1",
            BeaconPatch {
                points: Some(15),
                distance: Some(120.0),
                ..BeaconPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.points, 15);
    assert_eq!(updated.code, "31");
    assert_eq!(updated.distance, 120.0);

    let err = store.update_beacon("nope", BeaconPatch::default()).unwrap_err();
    assert!(matches!(err, CoreError::NotFound { kind: EntityKind::Beacon, .. }));
}

#[test]
fn beacon_in_use_cannot_be_removed_until_run_ends() {
    let mut store = store();
    let group = store.add_group("Alpha", vec![]).unwrap();
    let run = store
        .start_run(StartRun::star(&group.id, vec!["b1".into()]))
        .unwrap();

    let err = store.remove_beacon("b1").unwrap_err();
    assert!(matches!(err, CoreError::BeaconInUse { .. }));

    store.complete_run(&run.id, true).unwrap();
    store.remove_beacon("b1").unwrap();
    assert!(store.state().beacon("b1").is_none());
    assert_eq!(store.state().group(&group.id).unwrap().total_points, 10);
}

#[test]
fn remove_group_keeps_finished_history() {
    let mut store = store();
    let group = store.add_group("Alpha", vec![]).unwrap();
    let done = store.start_run(StartRun::star(&group.id, vec!["b1".into()])).unwrap();
    store.complete_run(&done.id, false).unwrap();
    store.start_run(StartRun::score(&group.id, None)).unwrap();

    store.remove_group(&group.id).unwrap();
    assert!(store.state().group(&group.id).is_none());
    let ids: Vec<&str> = store.state().runs.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec![done.id.as_str()]);
}

#[test]
fn class_roster_deals_into_numbered_groups() {
    let mut store = store();
    store.add_group("Existing", vec![]).unwrap();
    let students: Vec<String> = (1..=7).map(|i| format!("Student {i}")).collect();
    let class = store.add_class("6B", students).unwrap();

    let mut rng = StdRng::seed_from_u64(3);
    let groups = store
        .create_groups_from_class(&class.id, GroupSplit::Size(3), &mut rng)
        .unwrap();
    assert_eq!(groups.len(), 3);
    assert_eq!(groups[0].name, "Group 2");
    assert_eq!(store.state().groups.len(), 4);

    store.remove_class(&class.id).unwrap();
    assert!(store.state().classes.is_empty());
    assert!(store.remove_class(&class.id).is_err());
}

#[test]
fn rename_and_reset_race() {
    let mut store = store();
    let group = store.add_group("Alpha", vec![]).unwrap();
    store.rename_group(&group.id, "Les Renards").unwrap();
    let run = store.start_run(StartRun::star(&group.id, vec!["b5".into()])).unwrap();
    store.complete_run(&run.id, true).unwrap();
    assert_eq!(store.state().group(&group.id).unwrap().total_points, 30);

    store.reset_race().unwrap();
    let g = store.state().group(&group.id).unwrap();
    assert_eq!(g.name, "Les Renards");
    assert_eq!(g.total_points, 0);
    assert!(store.state().runs.is_empty());
}

#[test]
fn actions_emit_events_in_order() {
    let mut store = store();
    let group = store.add_group("Alpha", vec![]).unwrap();
    store.drain_events();

    let run = store.start_run(StartRun::score(&group.id, Some(10))).unwrap();
    store.toggle_beacon_status(&run.id, "b1").unwrap();
    store.stop_run_timer(&run.id).unwrap();
    store.complete_run(&run.id, true).unwrap();

    let kinds: Vec<&str> = store
        .drain_events()
        .iter()
        .filter_map(|e| match e {
            Event::RunStarted { .. } => Some("started"),
            Event::BeaconToggled { .. } => Some("toggled"),
            Event::RunTimerStopped { .. } => Some("stopped"),
            Event::RunCompleted { .. } => Some("completed"),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec!["started", "toggled", "stopped", "completed"]);
    assert!(store.drain_events().is_empty());
}

#[test]
fn tick_lists_only_unfinished_runs() {
    let clock = ManualClock::new(0);
    let mut store = GameStore::connect_with_clock(MemorySink::new(), RaceRules::default(), clock.clone());
    let a = store.add_group("A", vec![]).unwrap();
    let b = store.add_group("B", vec![]).unwrap();
    let ra = store.start_run(StartRun::star(&a.id, vec!["b1".into()])).unwrap();
    store.start_run(StartRun::star(&b.id, vec!["b2".into(), "b3".into()])).unwrap();
    store.complete_run(&ra.id, true).unwrap();

    clock.advance(chrono::Duration::seconds(30));
    let before = store.state().clone();
    let views = store.tick();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].group_id, b.id);
    assert_eq!(views[0].remaining_secs, 450);
    assert_eq!(store.state(), &before);
}

#[test]
fn event_times_follow_the_store_clock() {
    let clock = ManualClock::new(1_700_000_000_000);
    let mut store = GameStore::connect_with_clock(MemorySink::new(), RaceRules::default(), clock.clone());
    store.drain_events();

    clock.advance(chrono::Duration::seconds(42));
    let group = store.add_group("Alpha", vec![]).unwrap();
    store.start_run(StartRun::star(&group.id, vec!["b1".into()])).unwrap();

    let events = store.drain_events();
    assert!(events.iter().any(|e| matches!(e, Event::RunStarted { .. })));
    for event in &events {
        assert_eq!(event.at().timestamp_millis(), 1_700_000_042_000);
    }
}
