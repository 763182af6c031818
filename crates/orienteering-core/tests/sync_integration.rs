//! Store behaviour against shared and failing sinks.

use serde_json::json;
use tempfile::TempDir;

use orienteering_core::{
    GameState, GameStore, ManualClock, MemorySink, PersistenceSink, RaceRules, RunMode, RunStatus,
    SqliteSink, StartRun, SyncStatus,
};

fn connect(sink: MemorySink) -> GameStore {
    GameStore::connect_with_clock(sink, RaceRules::default(), ManualClock::new(1_000))
}

#[test]
fn unreachable_sink_still_allows_local_play() {
    let sink = MemorySink::new();
    sink.set_unavailable(true);
    let mut store = connect(sink.clone());
    assert_eq!(store.status(), SyncStatus::Offline);

    let group = store.add_group("Alpha", vec![]).unwrap();
    let run = store.start_run(StartRun::star(&group.id, vec!["b1".into()])).unwrap();
    store.complete_run(&run.id, true).unwrap();

    assert_eq!(store.state().group(&group.id).unwrap().total_points, 10);
    assert_eq!(sink.write_count(), 0);
    assert!(sink.document().is_none());
}

#[test]
fn rejected_write_keeps_local_state_and_goes_offline() {
    let sink = MemorySink::new();
    let mut store = connect(sink.clone());
    assert_eq!(store.status(), SyncStatus::Connected);

    sink.set_reject_writes(true);
    let group = store.add_group("Alpha", vec![]).unwrap();
    assert_eq!(store.status(), SyncStatus::Offline);
    assert!(store.state().group(&group.id).is_some());

    sink.set_reject_writes(false);
    store.rename_group(&group.id, "Alpha 2").unwrap();
    assert_eq!(store.status(), SyncStatus::Connected);
    let remote = GameState::from_document(sink.document().unwrap()).unwrap();
    assert_eq!(remote.group(&group.id).unwrap().name, "Alpha 2");
}

#[test]
fn lost_subscription_is_reported_on_pump() {
    let sink = MemorySink::new();
    let mut store = connect(sink.clone());
    sink.set_unavailable(true);
    assert!(!store.pump());
    assert_eq!(store.status(), SyncStatus::Offline);
}

#[test]
fn two_devices_converge_after_pump() {
    let sink = MemorySink::new();
    let mut desk = connect(sink.clone());
    let mut phone = connect(sink.clone());

    let group = desk.add_group("Alpha", vec!["Léo".into()]).unwrap();
    assert!(phone.state().group(&group.id).is_none());

    assert!(phone.pump());
    assert_eq!(phone.state(), desk.state());

    let run = phone
        .start_run(StartRun::score(&group.id, Some(8)))
        .unwrap();
    phone.toggle_beacon_status(&run.id, "b3").unwrap();
    desk.pump();
    let seen = desk.state().run(&run.id).unwrap();
    assert_eq!(seen.mode(), RunMode::Score);
    assert_eq!(seen.validated_beacon_ids, vec!["b3".to_string()]);

    // The echo of a store's own write changes nothing.
    assert!(!phone.pump());
}

#[test]
fn concurrent_starts_resolve_to_the_last_write() {
    let sink = MemorySink::new();
    let mut desk = connect(sink.clone());
    let mut phone = connect(sink.clone());
    let group = desk.add_group("Alpha", vec![]).unwrap();
    phone.pump();

    let from_desk = desk.start_run(StartRun::star(&group.id, vec!["b1".into()])).unwrap();
    // Phone has not seen the desk's run yet.
    let from_phone = phone.start_run(StartRun::star(&group.id, vec!["b2".into()])).unwrap();

    desk.pump();
    phone.pump();
    assert_eq!(desk.state(), phone.state());
    assert!(desk.state().run(&from_desk.id).is_none());
    let kept = desk.state().run(&from_phone.id).unwrap();
    assert_eq!(kept.status, RunStatus::Running);
    assert_eq!(desk.state().active_runs().count(), 1);
}

#[test]
fn demo_store_never_writes() {
    let sink = MemorySink::new();
    let mut store = GameStore::offline(
        sink.clone(),
        RaceRules::default(),
        ManualClock::new(0),
        GameState::seeded(),
    );
    let group = store.add_group("Demo", vec![]).unwrap();
    store.start_run(StartRun::score(&group.id, None)).unwrap();

    assert_eq!(store.status(), SyncStatus::Offline);
    assert_eq!(sink.write_count(), 0);
}

#[test]
fn legacy_document_is_adopted_on_connect() {
    let sink = MemorySink::with_document(json!({
        "beacons": [{ "id": "b1", "code": "31", "level": "N1", "points": 10 }],
        "groups": [{ "id": "g1", "name": "Alpha", "members": [], "totalPoints": 10 }],
        "runs": [{
            "id": "r1", "groupId": "g1", "beaconIds": ["b1"],
            "startTime": 0, "durationLimit": 240, "status": "running"
        }]
    }));
    let mut store = connect(sink);

    assert!(store.state().classes.is_empty());
    let beacon = store.state().beacon("b1").unwrap();
    assert!(beacon.punch_code.is_blank());
    assert_eq!(beacon.distance, 0.0);

    let run = store.state().run("r1").unwrap();
    assert_eq!(run.mode(), RunMode::Star);
    assert!(run.validated_beacon_ids.is_empty());

    let score = store.complete_run("r1", true).unwrap();
    assert_eq!(score.awarded, 10);
    assert_eq!(store.state().group("g1").unwrap().total_points, 20);
}

#[test]
fn sqlite_document_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("race.db");

    let group_id = {
        let sink = SqliteSink::open(&path, "current-race").unwrap();
        let mut store = GameStore::connect_with_clock(sink, RaceRules::default(), ManualClock::new(0));
        let group = store.add_group("Alpha", vec![]).unwrap();
        let run = store.start_run(StartRun::star(&group.id, vec!["b3".into()])).unwrap();
        store.complete_run(&run.id, true).unwrap();
        group.id
    };

    let sink = SqliteSink::open(&path, "current-race").unwrap();
    let store = GameStore::connect_with_clock(sink, RaceRules::default(), ManualClock::new(0));
    assert_eq!(store.status(), SyncStatus::Connected);
    assert_eq!(store.state().group(&group_id).unwrap().total_points, 20);
    assert_eq!(store.state().runs.len(), 1);

    let other = SqliteSink::open(&path, "rehearsal").unwrap();
    let store = GameStore::connect_with_clock(other, RaceRules::default(), ManualClock::new(0));
    assert!(store.state().groups.is_empty());
    assert_eq!(store.sink().sessions().unwrap().len(), 2);
}

#[test]
fn unreadable_document_is_never_overwritten() {
    let stored = json!({
        "beacons": [{ "id": "b1", "code": "31", "level": "N9", "points": 10 }],
        "groups": [{ "id": "g1", "name": "Alpha", "members": [], "totalPoints": 70 }],
        "runs": []
    });
    let sink = MemorySink::with_document(stored.clone());
    let mut store = connect(sink.clone());
    assert_eq!(store.status(), SyncStatus::Offline);
    assert!(store.remote_unreadable());

    let beta = store.add_group("Beta", vec![]).unwrap();
    assert!(store.state().group(&beta.id).is_some());
    assert_eq!(store.status(), SyncStatus::Offline);
    assert_eq!(sink.write_count(), 0);
    assert_eq!(sink.document(), Some(stored));

    // Another writer repairs the document; it is adopted and writes resume.
    let mut repair = sink.clone();
    repair
        .write_full(&json!({
            "beacons": [{ "id": "b1", "code": "31", "level": "N1", "points": 10 }],
            "groups": [{ "id": "g1", "name": "Alpha", "members": [], "totalPoints": 70 }],
            "runs": []
        }))
        .unwrap();
    assert!(store.pump());
    assert!(!store.remote_unreadable());
    assert_eq!(store.state().group("g1").unwrap().total_points, 70);

    store.add_group("Gamma", vec![]).unwrap();
    assert_eq!(store.status(), SyncStatus::Connected);
    let remote = GameState::from_document(sink.document().unwrap()).unwrap();
    assert_eq!(remote.group("g1").unwrap().total_points, 70);
    assert_eq!(remote.groups.len(), 2);
}
