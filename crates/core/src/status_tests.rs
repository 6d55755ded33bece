// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn running_and_stopping_expect_children() {
    assert!(WorkerStatus::Running.expects_children());
    assert!(WorkerStatus::Stopping.expects_children());
    assert!(!WorkerStatus::Starting.expects_children());
    assert!(!WorkerStatus::Stopped.expects_children());
}

#[test]
fn terminal_states() {
    assert!(WorkerStatus::Stopped.is_terminal());
    assert!(WorkerStatus::Crashed.is_terminal());
    assert!(WorkerStatus::Errored.is_terminal());
    assert!(!WorkerStatus::Running.is_terminal());
    assert!(!WorkerStatus::Starting.is_terminal());
    assert!(!WorkerStatus::Stopping.is_terminal());
}

#[test]
fn display_matches_serde_rename() {
    assert_eq!(WorkerStatus::Running.to_string(), "running");
    let json = serde_json::to_string(&WorkerStatus::Crashed).unwrap();
    assert_eq!(json, "\"crashed\"");
}
