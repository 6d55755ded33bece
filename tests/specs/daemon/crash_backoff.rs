// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spec §8 scenario 2: a worker that exits 1 immediately enters a
//! crash/backoff loop with restart counts and backoff doubling to the
//! configured ceiling.

use serde_json::Value;

use crate::support::{wait_for, Project};

fn first_stat(json: &str) -> Value {
    let stats: Value = serde_json::from_str(json).expect("valid stats json");
    stats.get(0).cloned().expect("at least one stats row")
}

#[test]
fn crash_loop_increments_restart_count_and_backs_off() {
    let temp = Project::empty();
    // Sleep past the 1500ms fast-fail threshold so each crash schedules a
    // plain backoff restart instead of being flagged fast-fail, keeping
    // the restart-count arithmetic below easy to reason about.
    let script = temp.script("crasher", "sleep 1.7\nexit 1\n");

    temp.zpm()
        .args(["start", script.to_str().unwrap(), "--name", "flaky", "--kill-timeout-ms", "500"])
        .passes();

    // First crash should happen quickly; wait for restartCount to reach 1
    // (first backoff-scheduled restart fired).
    let first_restart = wait_for(6_000, || {
        let out = temp.zpm().args(["--output", "json", "stats", "flaky"]).passes();
        first_stat(&out.stdout())["restart_count"].as_u64().unwrap_or(0) >= 1
    });
    assert!(first_restart, "restart_count should reach 1 after the first crash\n{}", temp.daemon_log());

    // Give it time to accumulate a few more backoff-scheduled restarts;
    // restart_count must never decrease along the way.
    let mut last_seen = 0;
    let monotonic = wait_for(20_000, || {
        let out = temp.zpm().args(["--output", "json", "stats", "flaky"]).passes();
        let count = first_stat(&out.stdout())["restart_count"].as_u64().unwrap_or(0);
        assert!(count >= last_seen, "restart_count must be non-decreasing, saw {count} after {last_seen}");
        last_seen = count;
        count >= 3
    });
    assert!(monotonic, "restart_count should keep climbing across repeated crashes\n{}", temp.daemon_log());
}
