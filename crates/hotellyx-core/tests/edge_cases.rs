//! Store-level edge cases: legacy payloads, backend persistence, and
//! last-writer-wins between two engines sharing one store.

use chrono::{Duration, TimeZone, Utc};
use hotellyx_core::catalog::ServiceCatalog;
use hotellyx_core::clock::FixedClock;
use hotellyx_core::lifecycle::{DetailsUpdate, NewRequest, RequestEngine};
use hotellyx_core::model::{Priority, RequestStatus, RoomStatus};
use hotellyx_core::rooms::RoomEngine;
use hotellyx_core::store::{self, MemoryStore, REQUESTS_KEY, ROOMS_KEY, RecordStore, SqliteStore};

fn clock() -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(2026, 2, 7, 12, 0, 0).unwrap())
}

#[test]
fn legacy_payload_with_aliases_and_junk_loads() {
    let store = MemoryStore::new();
    store
        .set(
            REQUESTS_KEY,
            r#"[
                {"id":"a","roomToken":"demo-101","type":"water","status":"accepted",
                 "createdAt":"2026-02-07T11:00:00.000Z","acceptedAt":"2026-02-07T11:04:00.000Z",
                 "message":"  two bottles ","priority":"urgent","etaMinutes":"soon"},
                {"id":"b","roomToken":"101","type":"towels","status":"new","createdAt":"yesterday"},
                null,
                {"id":"c","roomToken":"102","type":"issue","status":"done",
                 "createdAt":"2026-02-07T10:00:00.000Z","doneAt":"garbage"}
            ]"#,
        )
        .unwrap();
    store
        .set(
            ROOMS_KEY,
            r#"[{"roomToken":"101","roomStatus":"do_not_disturb","updatedAt":"2026-02-06T09:00:00.000Z"}]"#,
        )
        .unwrap();

    let clock = clock();
    let requests = RequestEngine::new(&store, &clock);
    let all = requests.all();
    assert_eq!(all.len(), 2);

    let a = &all[0];
    assert_eq!(a.note.as_deref(), Some("two bottles"));
    assert_eq!(a.priority, Priority::Normal);
    assert_eq!(a.eta_minutes, None);
    assert!(a.stamps.accepted_at.is_some());
    assert_eq!(all[1].stamps.done_at, None);

    let rooms = RoomEngine::new(&store, &clock);
    let room = rooms.find("101").unwrap();
    assert_eq!(room.room_number, "101");
    assert_eq!(room.room_status, RoomStatus::Dnd);
    assert_eq!(requests.room_requests("101").len(), 1);
}

#[test]
fn later_write_wins_for_whole_collection() {
    let store = MemoryStore::new();
    let clock = clock();
    let staff = RequestEngine::new(&store, &clock);
    let guest = RequestEngine::new(&store, &clock);

    let created = guest.create("305", "towels", NewRequest::default()).unwrap();
    let stale_snapshot = guest.all();

    staff.set_status(&created.id, RequestStatus::Accepted).unwrap();
    assert!(staff.by_id(&created.id).unwrap().stamps.accepted_at.is_some());

    // A second context writing back what it read earlier replaces the
    // staff update in full.
    store::save(&store, &stale_snapshot).unwrap();
    let current = staff.by_id(&created.id).unwrap();
    assert_eq!(current.status, RequestStatus::New);
    assert_eq!(current.stamps.accepted_at, None);
}

#[test]
fn sqlite_backend_persists_across_sessions() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join(".hotellyx/hotellyx.db");
    let clock = clock();

    let id = {
        let store = SqliteStore::open(&path).expect("open");
        let room = RoomEngine::new(&store, &clock).add("410").unwrap().unwrap();
        let engine = RequestEngine::new(&store, &clock);
        let created = engine
            .create(
                &room.token,
                "cleaning",
                NewRequest {
                    note: Some("after 2pm".into()),
                    priority: Some(Priority::Low),
                    ..NewRequest::default()
                },
            )
            .unwrap();
        clock.advance(Duration::minutes(7));
        engine.set_status(&created.id, RequestStatus::Accepted).unwrap();
        engine
            .set_details(
                &created.id,
                DetailsUpdate {
                    assigned_team: Some("Housekeeping".into()),
                    eta_minutes: Some(20.0),
                    ..DetailsUpdate::default()
                },
            )
            .unwrap();
        ServiceCatalog::new(&store, &clock)
            .increment_view("svc_breakfast")
            .unwrap();
        created.id
    };

    let store = SqliteStore::open(&path).expect("reopen");
    let engine = RequestEngine::new(&store, &clock);
    let request = engine.by_id(&id).expect("request persisted");
    assert_eq!(request.room_number.as_deref(), Some("410"));
    assert_eq!(request.note.as_deref(), Some("after 2pm"));
    assert_eq!(request.priority, Priority::Low);
    assert_eq!(request.status, RequestStatus::Accepted);
    assert_eq!(
        request.stamps.accepted_at,
        Some(Utc.with_ymd_and_hms(2026, 2, 7, 12, 7, 0).unwrap())
    );
    assert_eq!(request.assigned_team.as_deref(), Some("Housekeeping"));
    assert_eq!(request.eta_minutes, Some(20));

    let views = ServiceCatalog::new(&store, &clock).views();
    assert_eq!(views.get("svc_breakfast"), Some(&1));
}

#[test]
fn empty_store_is_quiet() {
    let store = MemoryStore::new();
    let clock = clock();
    let engine = RequestEngine::new(&store, &clock);
    assert!(engine.all().is_empty());
    assert!(engine.all_room_tokens().is_empty());
    assert!(engine.room_requests("").is_empty());
    assert_eq!(engine.count_new_for_room("305"), 0);
    assert!(RoomEngine::new(&store, &clock).list().is_empty());
    assert!(store.is_empty());
}
