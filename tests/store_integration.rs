//! Integration tests for the transactional store.
//!
//! These tests exercise Store, Committer and DirLock through the public API
//! against real directories created with tempfile.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use coffer::core::lock::{DirLock, RetryPolicy};
use coffer::core::store::fault_injection::{self, FaultPoint};
use coffer::core::store::{self as store, ErrorCategory, Store, StoreError};

// =============================================================================
// Test Helpers
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Course {
    students: Vec<String>,
    #[serde(default)]
    grades: BTreeMap<String, BTreeMap<String, u32>>,
}

fn course(students: &[&str]) -> Course {
    Course {
        students: students.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

fn new_store(initial: &Course) -> (TempDir, Store) {
    let temp = TempDir::new().expect("create temp dir");
    let store = Store::new(temp.path()).expect("absolute path");
    store.init(initial).expect("init");
    (temp, store)
}

fn can_open(dir: &Path) -> bool {
    match store::open::<Course>(dir) {
        Ok((_, committer)) => {
            committer.abandon().expect("abandon");
            true
        }
        Err(StoreError::LockUnavailable(_)) => false,
        Err(e) => panic!("unexpected open error: {}", e),
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn concurrent_open_sees_contention_then_committed_state() {
    let (temp, _store) = new_store(&course(&[]));
    let dir = temp.path().to_path_buf();

    let (locked_tx, locked_rx) = mpsc::channel();
    let (go_tx, go_rx) = mpsc::channel::<()>();

    let writer_dir = dir.clone();
    let writer = thread::spawn(move || {
        let (mut value, committer) = store::open::<Course>(&writer_dir).expect("A opens");
        locked_tx.send(()).expect("signal locked");
        value.students.push("u1".to_string());
        go_rx.recv().expect("wait for B");
        committer.commit(Some(&value)).expect("A commits");
    });

    locked_rx.recv().expect("A holds the lock");
    let err = store::open::<Course>(&dir).expect_err("B must not get the lock");
    assert!(matches!(err, StoreError::LockUnavailable(_)));
    assert_eq!(err.category(), ErrorCategory::Contention);

    go_tx.send(()).expect("release A");
    writer.join().expect("writer thread");

    let (value, committer) = store::open::<Course>(&dir).expect("B opens after commit");
    assert_eq!(value, course(&["u1"]));
    committer.abandon().expect("abandon");
}

#[test]
fn serialized_writers_never_lose_updates() {
    let (temp, _store) = new_store(&course(&[]));
    let dir = temp.path().to_path_buf();

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let dir = dir.clone();
            thread::spawn(move || {
                let store = Store::new(&dir)
                    .expect("absolute")
                    .with_retry_policy(RetryPolicy::new(200, Duration::from_millis(5)));
                for i in 0..5 {
                    let (mut value, committer) = store.open::<Course>().expect("open");
                    value.students.push(format!("w{}-{}", worker, i));
                    committer.commit(Some(&value)).expect("commit");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker");
    }

    let final_state: Course = store::read(&dir).expect("read");
    assert_eq!(final_state.students.len(), 20);
}

#[test]
fn lock_free_read_ignores_held_lock() {
    let (temp, store) = new_store(&course(&["u1"]));
    let (_value, committer) = store.open::<Course>().expect("open");

    let seen: Course = store::read(temp.path()).expect("read while locked");
    assert_eq!(seen, course(&["u1"]));

    committer.abandon().expect("abandon");
}

#[test]
fn relative_paths_rejected_without_mutation() {
    let temp = TempDir::new().expect("create temp dir");
    let before: Vec<_> = fs::read_dir(temp.path()).expect("list").collect();
    assert!(before.is_empty());

    let err = store::init(&course(&[]), "relative/dir").expect_err("init");
    assert!(matches!(err, StoreError::NeedAbsolutePath(_)));

    let err = store::open::<Course>("relative/dir").expect_err("open");
    assert!(matches!(err, StoreError::NeedAbsolutePath(_)));

    assert!(!Path::new("relative/dir").exists());
}

// =============================================================================
// Failure injection
// =============================================================================

#[test]
fn crash_before_rename_keeps_live_document() {
    let (temp, store) = new_store(&course(&["u1"]));
    let before = fs::read(store.paths().data_path()).expect("read live");

    let (mut value, committer) = store.open::<Course>().expect("open");
    value.students.clear();

    fault_injection::arm(FaultPoint::Rename);
    let err = committer.commit(Some(&value)).expect_err("rename fails");
    assert_eq!(err.category(), ErrorCategory::Io);

    assert_eq!(fs::read(store.paths().data_path()).expect("read live"), before);
    assert!(store.paths().temp_path().exists());
    assert!(can_open(temp.path()));
}

#[test]
fn every_failure_point_releases_lock() {
    for point in [
        FaultPoint::Read,
        FaultPoint::Write,
        FaultPoint::Sync,
        FaultPoint::Rename,
        FaultPoint::SyncDir,
    ] {
        let (temp, store) = new_store(&course(&["u1"]));
        fault_injection::arm(point);

        let outcome = store
            .open::<Course>()
            .and_then(|(value, committer)| committer.commit(Some(&value)));
        assert!(outcome.is_err(), "{:?} should fail the transaction", point);

        fault_injection::reset();
        assert!(can_open(temp.path()), "{:?} leaked the lock", point);
        assert_eq!(store.read::<Course>().expect("read"), course(&["u1"]));
    }
}

#[test]
fn unsynced_directory_still_shows_new_document() {
    let (temp, store) = new_store(&course(&["u1"]));
    let (mut value, committer) = store.open::<Course>().expect("open");
    value.students.push("u2".to_string());

    fault_injection::arm(FaultPoint::SyncDir);
    let err = committer.commit(Some(&value)).expect_err("directory sync fails");
    assert!(matches!(err, StoreError::NotDurable { .. }));
    assert!(err.is_committed());
    assert_eq!(err.category(), ErrorCategory::Io);

    let seen: Course = store::read(temp.path()).expect("read");
    assert_eq!(seen, course(&["u1", "u2"]));
    assert!(can_open(temp.path()));
}

#[test]
fn rename_over_directory_fails_cleanly() {
    let temp = TempDir::new().expect("create temp dir");
    let store = Store::new(temp.path()).expect("absolute");
    store.init(&course(&[])).expect("init");
    let (value, committer) = store.open::<Course>().expect("open");

    // Swap the live document for a non-empty directory so the rename fails
    fs::remove_file(store.paths().data_path()).expect("remove data");
    fs::create_dir(store.paths().data_path()).expect("mkdir data");
    fs::write(store.paths().data_path().join("keep"), b"x").expect("fill dir");

    let err = committer.commit(Some(&value)).expect_err("rename fails");
    assert!(matches!(err, StoreError::Io { op: "atomically update", .. }));

    let lock = DirLock::try_acquire(&store.paths().lock_path()).expect("probe");
    assert!(lock.is_some(), "lock must be released after failed rename");
}

#[test]
fn unknown_envelope_fields_are_ignored() {
    let (_temp, store) = new_store(&course(&[]));
    fs::write(
        store.paths().data_path(),
        r#"{"version":"99.0","schema":"v7","payload":{"students":["u9"]}}"#,
    )
    .expect("write newer document");

    assert_eq!(store.read::<Course>().expect("read"), course(&["u9"]));
    let meta = store.inspect().expect("inspect");
    assert_eq!(meta.version.as_deref(), Some("99.0"));
    assert!(meta.time.is_none());
}

// =============================================================================
// Properties
// =============================================================================

fn grades() -> impl Strategy<Value = BTreeMap<String, BTreeMap<String, u32>>> {
    prop::collection::btree_map(
        "[a-z]{1,6}",
        prop::collection::btree_map("u[0-9]{1,4}", 0u32..1000, 0..5),
        0..4,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn init_then_read_round_trips(
        students in prop::collection::vec("\\PC{0,12}", 0..8),
        grades in grades(),
    ) {
        let value = Course { students, grades };
        let temp = TempDir::new().expect("create temp dir");

        store::init(&value, temp.path()).expect("init");
        let loaded: Course = store::read(temp.path()).expect("read");

        prop_assert_eq!(loaded, value);
    }
}
