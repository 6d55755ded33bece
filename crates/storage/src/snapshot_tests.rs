// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;
use zpm_core::WorkerConfig;

#[test]
fn missing_file_loads_as_none() {
    let dir = tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("snapshot.json"));
    assert!(store.load().unwrap().is_none());
}

#[test]
fn round_trips_worker_configs() {
    let dir = tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("snapshot.json"));
    let workers = vec![
        WorkerConfig::builder().name("api").build(),
        WorkerConfig::builder().name("worker").build(),
    ];
    store.save(&workers).unwrap();

    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded.workers.len(), 2);
    assert_eq!(loaded.workers[0].name.as_str(), "api");
}

#[test]
fn save_rotates_previous_file_into_backup() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    let store = SnapshotStore::new(&path);

    store
        .save(&[WorkerConfig::builder().name("one").build()])
        .unwrap();
    store
        .save(&[WorkerConfig::builder().name("two").build()])
        .unwrap();

    assert!(path.with_extension("bak").exists());
    let current = store.load().unwrap().unwrap();
    assert_eq!(current.workers[0].name.as_str(), "two");
}

#[test]
fn save_does_not_leave_a_tmp_file_behind() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    let store = SnapshotStore::new(&path);
    store
        .save(&[WorkerConfig::builder().name("one").build()])
        .unwrap();
    assert!(!path.with_extension("tmp").exists());
}
