// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spec §8 scenario 3: a worker that survives the 5000ms stability
//! window resets `restartCount`/`backoffTime` before its next crash.

use serde_json::Value;

use crate::support::{wait_for, Project};

fn first_stat(json: &str) -> Value {
    let stats: Value = serde_json::from_str(json).expect("valid stats json");
    stats.get(0).cloned().expect("at least one stats row")
}

#[test]
fn stability_window_resets_backoff_before_next_crash() {
    let temp = Project::empty();
    // Crashes immediately the first time (forcing a backoff-scheduled
    // restart), then stays up past the 5000ms stability window before
    // crashing again. A marker file distinguishes the two runs.
    let marker = temp.path().join("ran-once");
    let script = temp.script(
        "flip",
        &format!(
            "if [ -f {marker} ]; then sleep 6; exit 1; else touch {marker}; exit 1; fi",
            marker = marker.display()
        ),
    );

    temp.zpm().args(["start", script.to_str().unwrap(), "--name", "stabilizer"]).passes();

    // First crash schedules a restart at the initial 1000ms backoff;
    // wait for that restart to land (restart_count reaches 1).
    let first_restart = wait_for(6_000, || {
        let out = temp.zpm().args(["--output", "json", "stats", "stabilizer"]).passes();
        first_stat(&out.stdout())["restart_count"].as_u64().unwrap_or(0) >= 1
    });
    assert!(first_restart, "first backoff restart should land\n{}", temp.daemon_log());

    // The second run sleeps 6s, clearing the 5000ms stability window
    // before crashing again; once it crashes a second time, restart_count
    // should read 0 and the worker should be scheduled for another
    // restart rather than continuing to climb uninterrupted.
    let stabilized_then_crashed = wait_for(15_000, || {
        let out = temp.zpm().args(["--output", "json", "stats", "stabilizer"]).passes();
        let stat = first_stat(&out.stdout());
        stat["status"] == "crashed" && stat["restart_count"].as_u64().unwrap_or(99) == 0
    });
    assert!(
        stabilized_then_crashed,
        "after a stable Running interval, the next crash should observe restart_count reset to 0\n{}",
        temp.daemon_log()
    );
}
