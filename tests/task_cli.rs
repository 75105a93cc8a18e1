mod support;

use predicates::prelude::*;
use predicates::str::contains;
use serde_json::json;

use support::{mock_tasks, parse_json, TestDeck};

#[test]
fn init_creates_config_and_store() {
    let deck = TestDeck::empty();

    deck.cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(contains("taskdeck init: initialized deck"));

    assert!(deck.path().join(".taskdeck.toml").is_file());
    assert!(deck.store_file().is_file());
    assert!(deck.read_store().is_empty());

    deck.cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(contains("nothing to do"));
}

#[test]
fn commands_require_initialized_deck() {
    let deck = TestDeck::empty();

    deck.cmd()
        .args(["task", "list"])
        .assert()
        .code(2)
        .stderr(contains("Not a taskdeck directory"))
        .stderr(contains("hint: taskdeck init"));
}

#[test]
fn list_filters_by_status_and_search() {
    let deck = TestDeck::init();
    deck.seed_tasks(&mock_tasks());

    deck.cmd()
        .args(["task", "list"])
        .assert()
        .success()
        .stdout(contains("Showing 3 of 3 tasks"));

    deck.cmd()
        .args(["task", "list", "--status", "incomplete"])
        .assert()
        .success()
        .stdout(contains("Showing 2 of 3 tasks"))
        .stdout(contains("Incomplete (2)"));

    let output = deck
        .cmd()
        .args(["task", "list", "--search", "another", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let value = parse_json(&output.stdout);
    assert_eq!(value["command"], "task list");
    assert_eq!(value["status"], "success");
    let tasks = value["data"]["tasks"].as_array().expect("tasks");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "Another open task");
    assert_eq!(value["data"]["counts"], json!({ "all": 3, "complete": 1, "incomplete": 2 }));
}

#[test]
fn list_rejects_unknown_status() {
    let deck = TestDeck::init();

    deck.cmd()
        .args(["task", "list", "--status", "done"])
        .assert()
        .code(2)
        .stderr(contains("invalid status filter"));
}

#[test]
fn add_appends_normalized_task() {
    let deck = TestDeck::init();
    deck.seed_tasks(&json!([{ "name": "legacy" }]));

    deck.cmd()
        .args([
            "task",
            "add",
            "Ship it",
            "--description",
            "release notes",
            "--progress",
            "100",
            "--deadline",
            "2026-12-31",
        ])
        .assert()
        .success()
        .stdout(contains("taskdeck task add: Ship it"));

    let stored = deck.json_key("tasks").expect("tasks stored");
    let stored = stored.as_array().expect("array");
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0]["title"], "legacy");
    assert_eq!(stored[1]["title"], "Ship it");
    assert_eq!(stored[1]["status"], "complete");
    assert_eq!(stored[1]["deadline"], "2026-12-31");

    deck.cmd()
        .args(["task", "add", "   "])
        .assert()
        .code(2)
        .stderr(contains("title cannot be empty"));
}

#[test]
fn counts_and_board_views() {
    let deck = TestDeck::init();
    deck.seed_tasks(&json!([
        { "title": "fresh", "status": "incomplete" },
        { "title": "halfway", "progress": 60 },
        { "title": "nearly", "progress": 95, "status": "incomplete" }
    ]));

    deck.cmd()
        .args(["task", "counts"])
        .assert()
        .success()
        .stdout(contains("All Tasks (3)"))
        .stdout(contains("Complete (0)"))
        .stdout(contains("Incomplete (3)"));

    let output = deck
        .cmd()
        .args(["task", "board", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let value = parse_json(&output.stdout);
    assert_eq!(
        value["data"]["counts"],
        json!({ "todo": 1, "in_progress": 1, "completed": 1 })
    );
    assert_eq!(value["data"]["columns"]["Completed"][0]["title"], "nearly");
}

#[test]
fn board_thresholds_follow_config() {
    let deck = TestDeck::init();
    deck.write_config("[board]\ntodo_max = 10\nin_progress_max = 50\n");
    deck.seed_tasks(&json!([{ "title": "halfway", "progress": 60 }]));

    deck.cmd()
        .args(["task", "board"])
        .assert()
        .success()
        .stdout(contains("[Completed] halfway"));
}

#[test]
fn due_reports_today_and_tomorrow() {
    let deck = TestDeck::init();
    deck.seed_tasks(&json!([
        { "title": "tax return", "deadline": "2026-04-15" },
        { "title": "dentist", "deadline": "2026-04-16" },
        { "title": "holiday", "deadline": "2026-08-01" }
    ]));

    deck.cmd()
        .args(["task", "due", "--today", "2026-04-15"])
        .assert()
        .success()
        .stdout(contains("Task Due Today: \"tax return\""))
        .stdout(contains("Task Due Tomorrow: \"dentist\""))
        .stdout(contains("holiday").not());
}

#[test]
fn normalize_write_persists_canonical_form() {
    let deck = TestDeck::init();
    deck.seed_tasks(&json!([{ "id": 3, "name": "legacy", "completed": true }]));

    deck.cmd()
        .args(["task", "normalize"])
        .assert()
        .success()
        .stdout(contains("taskdeck task normalize --write"));
    let before = deck.json_key("tasks").expect("tasks");
    assert!(before[0].get("_id").is_none());

    deck.cmd()
        .args(["task", "normalize", "--write"])
        .assert()
        .success();
    let after = deck.json_key("tasks").expect("tasks");
    assert_eq!(after[0]["_id"], "3");
    assert_eq!(after[0]["title"], "legacy");
    assert_eq!(after[0]["status"], "complete");
    assert_eq!(after[0]["name"], "legacy");
}

#[test]
fn notes_round_trip_as_plain_text() {
    let deck = TestDeck::init();

    deck.cmd()
        .args(["notes", "set", "buy milk"])
        .assert()
        .success();
    assert_eq!(deck.raw_key("notes").as_deref(), Some("buy milk"));

    deck.cmd()
        .args(["notes", "show"])
        .assert()
        .success()
        .stdout(contains("buy milk"));
}

#[test]
fn root_flag_targets_another_directory() {
    let deck = TestDeck::init();
    deck.seed_tasks(&mock_tasks());
    let elsewhere = TestDeck::empty();

    elsewhere
        .cmd()
        .args(["task", "counts", "--root"])
        .arg(deck.path())
        .assert()
        .success()
        .stdout(contains("All Tasks (3)"));
}

#[test]
fn error_envelope_names_command_after_root_flag() {
    let deck = TestDeck::empty();

    let output = deck
        .cmd()
        .arg("--root")
        .arg(deck.path())
        .args(["task", "list", "--json"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(2));
    let value = parse_json(&output.stdout);
    assert_eq!(value["command"], "task list");
    assert_eq!(value["status"], "error");
    assert_eq!(value["error"]["kind"], "user_error");
    assert_eq!(value["next_steps"][0], "taskdeck init");
    assert!(value.get("data").is_none());
}
