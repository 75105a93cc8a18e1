use std::fs;
use std::sync::Arc;
use std::thread;

use taskdeck::error::Error;
use taskdeck::lock::{lock_path_for, FileLock};
use taskdeck::storage::{FileStore, KvStore};

#[test]
fn concurrent_writers_keep_every_key() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(FileStore::init(dir.path().join(".taskdeck")).expect("init"));

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for n in 0..10 {
                    store
                        .set(&format!("w{worker}-{n}"), "x")
                        .expect("set under lock");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer thread");
    }

    let reopened = FileStore::open(dir.path().join(".taskdeck")).expect("open");
    for worker in 0..4 {
        for n in 0..10 {
            assert_eq!(
                reopened.get(&format!("w{worker}-{n}")).expect("get").as_deref(),
                Some("x")
            );
        }
    }
}

#[test]
fn held_lock_times_out_writers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStore::init(dir.path().join(".taskdeck")).expect("init");

    let _held = FileLock::acquire(lock_path_for(&store.file()), 0).expect("first lock");
    let err = FileLock::acquire(lock_path_for(&store.file()), 100).expect_err("contended");
    assert!(matches!(err, Error::LockFailed(_)));
}

#[test]
fn corrupt_store_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStore::init(dir.path().join(".taskdeck")).expect("init");
    fs::write(store.file(), "[not, an, object").expect("corrupt");

    assert!(matches!(store.get("tasks"), Err(Error::Json(_))));
    assert!(matches!(store.set("tasks", "[]"), Err(Error::Json(_))));
}

#[test]
fn remove_drops_only_that_key() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStore::init(dir.path().join(".taskdeck")).expect("init");
    store.set("token", "tdk_1").expect("set");
    store.set("notes", "hello").expect("set");

    store.remove("token").expect("remove");
    store.remove("never-set").expect("remove missing");

    assert!(store.get("token").expect("get").is_none());
    assert_eq!(store.get("notes").expect("get").as_deref(), Some("hello"));
}
