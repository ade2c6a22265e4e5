//! Request lifecycle through the `hx` binary: rooms, guest requests, staff
//! moves, and the error contract.
//!
//! Each test runs `hx` as a subprocess in an isolated temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

fn hx_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("hx"));
    cmd.current_dir(dir);
    cmd.env("HOTELLYX_LOG", "error");
    cmd.env_remove("HOTELLYX_FORMAT");
    cmd.env_remove("HOTELLYX_SLA_MINUTES");
    cmd.env_remove("HOTELLYX_STORE");
    cmd
}

fn hx_json(dir: &Path, args: &[&str]) -> Value {
    let output = hx_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("hx should not crash");
    assert!(
        output.status.success(),
        "hx {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("--json should produce valid JSON")
}

fn setup() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    hx_cmd(dir.path()).arg("init").assert().success();
    dir
}

fn create_request(dir: &Path, room: &str, kind: &str) -> String {
    let json = hx_json(dir, &["request", "create", room, kind]);
    json["id"].as_str().expect("request id").to_string()
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn staff_walk_request_from_new_to_done() {
    let dir = setup();
    let room = hx_json(dir.path(), &["room", "add", "305"]);
    let token = room["token"].as_str().unwrap().to_string();

    let id = create_request(dir.path(), &token, "towels");

    let detail = hx_json(dir.path(), &["request", "show", &id]);
    assert_eq!(detail["status"], "new");
    assert_eq!(detail["roomNumber"], "305");
    assert_eq!(detail["staffAction"]["label"], "Accept");

    for expected in ["accepted", "in_progress", "done"] {
        let moved = hx_json(dir.path(), &["request", "advance", &id]);
        assert_eq!(moved["status"], expected);
    }

    let detail = hx_json(dir.path(), &["request", "show", &id]);
    assert!(detail["acceptedAt"].is_string());
    assert!(detail["inProgressAt"].is_string());
    assert!(detail["doneAt"].is_string());
    assert!(detail["staffAction"].is_null());

    hx_cmd(dir.path())
        .args(["request", "advance", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2005"));
}

#[test]
fn guest_link_lists_only_that_room() {
    let dir = setup();
    create_request(dir.path(), "305", "water");
    create_request(dir.path(), "305", "cleaning");
    create_request(dir.path(), "412", "towels");

    let view = hx_json(dir.path(), &["request", "list", "--link", "305"]);
    assert_eq!(view["new_count"], 2);
    let requests = view["requests"].as_array().unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r["roomToken"] == "305"));
}

#[test]
fn staff_queue_filters_by_tab() {
    let dir = setup();
    let first = create_request(dir.path(), "305", "water");
    create_request(dir.path(), "412", "towels");
    hx_json(dir.path(), &["request", "advance", &first]);

    let queue = hx_json(dir.path(), &["request", "list", "--tab", "accepted"]);
    let rows = queue["requests"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], first.as_str());

    let counts = queue["counts"].as_array().unwrap();
    assert_eq!(counts[0]["count"], 2);
}

#[test]
fn guest_cancel_only_from_new() {
    let dir = setup();
    let id = create_request(dir.path(), "305", "issue");
    hx_json(dir.path(), &["request", "advance", &id]);

    hx_cmd(dir.path())
        .args(["request", "cancel", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2005"));

    let forced = hx_json(dir.path(), &["request", "cancel", &id, "--force"]);
    assert_eq!(forced["status"], "cancelled");
    assert!(forced["cancelledAt"].is_string());
}

#[test]
fn assign_records_team_and_rounds_eta() {
    let dir = setup();
    let id = create_request(dir.path(), "305", "issue");
    let json = hx_json(
        dir.path(),
        &[
            "request",
            "assign",
            &id,
            "--team",
            "Maintenance",
            "--eta",
            "14.6",
        ],
    );
    assert_eq!(json["assignedTeam"], "Maintenance");
    assert_eq!(json["etaMinutes"], 15);
}

#[test]
fn staff_note_is_saved() {
    let dir = setup();
    let id = create_request(dir.path(), "305", "water");
    let json = hx_json(dir.path(), &["request", "note", &id, "Left at door"]);
    assert_eq!(json["staffNote"], "Left at door");
}

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

#[test]
fn regenerated_link_replaces_token() {
    let dir = setup();
    let room = hx_json(dir.path(), &["room", "add", "305"]);
    let old = room["token"].as_str().unwrap().to_string();

    let regen = hx_json(dir.path(), &["room", "regen", &old]);
    assert_ne!(regen["token"], old.as_str());
    assert_eq!(regen["roomNumber"], "305");

    let status = hx_json(dir.path(), &["room", "status", "305", "--set", "please_clean"]);
    assert_eq!(status["room_status"], "please_clean");
}

// ---------------------------------------------------------------------------
// Error contract
// ---------------------------------------------------------------------------

#[test]
fn invalid_room_link_is_rejected() {
    let dir = setup();
    let output = hx_cmd(dir.path())
        .args(["request", "create", "room 305!", "water", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(err["error"]["error_code"], "E2004");
}

#[test]
fn unknown_request_exits_nonzero() {
    let dir = setup();
    hx_cmd(dir.path())
        .args(["request", "show", "no-such-id"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"));
}

#[test]
fn bad_sla_override_is_reported() {
    let dir = setup();
    hx_cmd(dir.path())
        .env("HOTELLYX_SLA_MINUTES", "soon")
        .args(["dashboard"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1002"));
}

#[test]
fn init_twice_requires_force() {
    let dir = setup();
    hx_cmd(dir.path()).arg("init").assert().failure();
    hx_cmd(dir.path()).args(["init", "--force"]).assert().success();
}
