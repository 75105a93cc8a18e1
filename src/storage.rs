//! Storage port for taskdeck
//!
//! All persisted state is a flat map of string keys to string values, the
//! values being JSON documents (except `notes`, which is plain text). The
//! `KvStore` trait is the seam the normalizer, filter, session log and user
//! directory are written against, so they run the same over the in-memory
//! store used in tests and the file-backed store used by the CLI.
//!
//! # Directory Structure
//!
//! ```text
//! <root>/
//!   .taskdeck.toml              # Optional configuration
//!   .taskdeck/                  # Store directory (name configurable)
//!     store.json                # { "<key>": "<value>", ... }
//!     store.json.lock           # Advisory lock for read-modify-write
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};

/// Storage keys shared by every component
pub mod keys {
    pub const TASKS: &str = "tasks";
    pub const USER_LOGS: &str = "userLogs";
    pub const NOTES: &str = "notes";
    pub const USERS: &str = "users";
    pub const TOKEN: &str = "token";
    pub const USER_ROLE: &str = "userRole";
    pub const USER_ID: &str = "userId";
    pub const EMAIL: &str = "email";
}

/// Default name of the store directory under the deck root
pub const STORE_DIR: &str = ".taskdeck";

/// File holding the key-value map inside the store directory
pub const STORE_FILE: &str = "store.json";

/// A synchronous string key-value store.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: KvStore + ?Sized> KvStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// In-memory store, used by tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
    writes: RefCell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set`/`remove` calls served so far
    pub fn write_count(&self) -> usize {
        *self.writes.borrow()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        *self.writes.borrow_mut() += 1;
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        *self.writes.borrow_mut() += 1;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// File-backed store: one JSON object in `<dir>/store.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open an existing store directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(Error::NotInitialized(dir));
        }
        Ok(Self { dir })
    }

    /// Create the store directory and an empty store file if missing
    pub fn init(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let store = Self { dir };
        let file = store.file();
        if !file.exists() {
            lock::write_atomic(&file, b"{}")?;
        }
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path to `store.json`
    pub fn file(&self) -> PathBuf {
        self.dir.join(STORE_FILE)
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        let path = self.file();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn update<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let path = self.file();
        let _lock = FileLock::acquire(lock::lock_path_for(&path), DEFAULT_LOCK_TIMEOUT_MS)?;

        let mut map = self.read_map()?;
        mutate(&mut map);

        let json = serde_json::to_string_pretty(&map)?;
        lock::write_atomic(&path, json.as_bytes())
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|map| {
            map.remove(key);
        })
    }
}

/// Walk up from `start` looking for a directory holding any of `markers`
/// (the config file or the default store directory).
///
/// Returns the deck root.
pub fn discover_root(start: &Path, markers: &[&str]) -> Result<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if markers.iter().any(|marker| current.join(marker).exists()) {
            return Ok(current);
        }
        if !current.pop() {
            return Err(Error::NotInitialized(start.to_path_buf()));
        }
    }
}

/// Read and decode a JSON value, falling back when the key is missing,
/// unreadable or malformed. Failures are logged, never returned.
pub fn read_json_or<S, T, F>(store: &S, key: &str, fallback: F) -> T
where
    S: KvStore + ?Sized,
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    match store.get(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "malformed stored value; using default");
                fallback()
            }
        },
        Ok(None) => {
            debug!(key, "no stored value; using default");
            fallback()
        }
        Err(err) => {
            warn!(key, error = %err, "failed to read stored value; using default");
            fallback()
        }
    }
}

/// Read a JSON value, treating missing and malformed data as `T::default()`
pub fn read_json_or_default<S, T>(store: &S, key: &str) -> T
where
    S: KvStore + ?Sized,
    T: DeserializeOwned + Default,
{
    read_json_or(store, key, T::default)
}

/// Encode `value` as JSON and store it under `key` with a single write
pub fn write_json<S, T>(store: &S, key: &str, value: &T) -> Result<()>
where
    S: KvStore + ?Sized,
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string(value)?;
    store.set(key, &json)
}

/// Read a plain string value, treating a missing key as empty
pub fn read_string<S: KvStore + ?Sized>(store: &S, key: &str) -> String {
    match store.get(key) {
        Ok(value) => value.unwrap_or_default(),
        Err(err) => {
            warn!(key, error = %err, "failed to read stored value; using empty string");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip_and_write_count() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").expect("get"), None);
        store.set("a", "1").expect("set");
        store.set("b", "2").expect("set");
        store.remove("a").expect("remove");
        assert_eq!(store.get("a").expect("get"), None);
        assert_eq!(store.get("b").expect("get"), Some("2".to_string()));
        assert_eq!(store.write_count(), 3);
        assert_eq!(store.keys(), vec!["b".to_string()]);
    }

    #[test]
    fn file_store_persists_across_handles() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store_dir = dir.path().join(STORE_DIR);
        let store = FileStore::init(&store_dir).expect("init");
        store.set(keys::NOTES, "remember the milk").expect("set");
        store.set(keys::TOKEN, "abc").expect("set");
        store.remove(keys::TOKEN).expect("remove");

        let reopened = FileStore::open(&store_dir).expect("open");
        assert_eq!(
            reopened.get(keys::NOTES).expect("get"),
            Some("remember the milk".to_string())
        );
        assert_eq!(reopened.get(keys::TOKEN).expect("get"), None);
    }

    #[test]
    fn file_store_open_requires_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = FileStore::open(dir.path().join("missing")).expect_err("missing dir");
        assert!(matches!(err, Error::NotInitialized(_)));
    }

    #[test]
    fn discover_root_walks_up() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join(STORE_DIR)).expect("store dir");
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).expect("nested");

        let root = discover_root(&nested, &[STORE_DIR]).expect("discover");
        assert_eq!(root, dir.path());

        let elsewhere = tempfile::tempdir().expect("tempdir");
        let err = discover_root(elsewhere.path(), &[STORE_DIR]).expect_err("no deck");
        assert!(matches!(err, Error::NotInitialized(_)));
    }

    #[test]
    fn read_json_or_default_tolerates_garbage() {
        let store = MemoryStore::new();
        store.set(keys::TASKS, "{not json").expect("set");
        let tasks: Vec<serde_json::Value> = read_json_or_default(&store, keys::TASKS);
        assert!(tasks.is_empty());
    }

    #[test]
    fn write_json_is_a_single_write() {
        let store = MemoryStore::new();
        write_json(&store, keys::USERS, &vec!["a", "b"]).expect("write");
        assert_eq!(store.write_count(), 1);
        assert_eq!(
            store.get(keys::USERS).expect("get"),
            Some("[\"a\",\"b\"]".to_string())
        );
    }
}
