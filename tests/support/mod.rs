#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::{Map, Value};
use tempfile::TempDir;

pub struct TestDeck {
    dir: TempDir,
}

impl TestDeck {
    /// Empty directory; `taskdeck init` has not run
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    /// Directory initialized with `taskdeck init`
    pub fn init() -> Self {
        let deck = Self::empty();
        deck.cmd().arg("init").assert().success();
        deck
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `taskdeck` running inside the deck, isolated from the caller's env
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("taskdeck").expect("binary");
        cmd.current_dir(self.dir.path())
            .env_remove("TASKDECK_ROOT")
            .env_remove("TASKDECK_PASSWORD")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn write_config(&self, contents: &str) -> PathBuf {
        let path = self.dir.path().join(".taskdeck.toml");
        fs::write(&path, contents).expect("write config");
        path
    }

    pub fn store_file(&self) -> PathBuf {
        self.dir.path().join(".taskdeck").join("store.json")
    }

    pub fn read_store(&self) -> Map<String, Value> {
        let content = fs::read_to_string(self.store_file()).expect("read store");
        serde_json::from_str(&content).expect("store is a JSON object")
    }

    /// Raw string stored under `key`
    pub fn raw_key(&self, key: &str) -> Option<String> {
        self.read_store()
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// JSON value stored under `key`
    pub fn json_key(&self, key: &str) -> Option<Value> {
        self.raw_key(key)
            .map(|raw| serde_json::from_str(&raw).expect("stored value is JSON"))
    }

    /// Store `value` under `key`, as another client of the store would
    pub fn seed_key(&self, key: &str, value: &str) {
        let mut map = self.read_store();
        map.insert(key.to_string(), Value::String(value.to_string()));
        let json = serde_json::to_string_pretty(&map).expect("encode store");
        fs::write(self.store_file(), json).expect("write store");
    }

    pub fn seed_tasks(&self, tasks: &Value) {
        self.seed_key("tasks", &tasks.to_string());
    }

    pub fn login(&self, email: &str) {
        self.cmd()
            .args(["login", "--email", email, "--password", "secret"])
            .assert()
            .success();
    }
}

/// The three records used by the filter scenarios
pub fn mock_tasks() -> Value {
    serde_json::json!([
        { "_id": "1", "title": "A done task", "description": "finished work", "status": "complete" },
        { "_id": "2", "title": "An open task", "description": "still to do", "status": "incomplete" },
        { "_id": "3", "title": "Another open task", "description": "later", "status": "incomplete" }
    ])
}

pub fn parse_json(stdout: &[u8]) -> Value {
    serde_json::from_slice(stdout).expect("stdout is JSON")
}
