// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spec §8 scenario 6: on daemon restart, workers that were running are
//! resurrected from the persisted snapshot.

use serde_json::Value;

use crate::support::{wait_for, Project};

fn names_in(list_json: &str) -> Vec<String> {
    let list: Value = serde_json::from_str(list_json).expect("valid list json");
    list.as_array()
        .expect("list is an array")
        .iter()
        .filter_map(|row| row.as_str().map(str::to_owned))
        .collect()
}

#[test]
fn workers_are_resurrected_after_daemon_restart() {
    let temp = Project::empty();
    let script_a = temp.script("alpha", "sleep 60\n");
    let script_b = temp.script("beta", "sleep 60\n");

    temp.zpm().args(["start", script_a.to_str().unwrap(), "--name", "alpha"]).passes();
    temp.zpm().args(["start", script_b.to_str().unwrap(), "--name", "beta"]).passes();

    let both_running = wait_for(3_000, || {
        let out = temp.zpm().args(["--output", "json", "stats"]).passes();
        let stats: Value = serde_json::from_str(&out.stdout()).unwrap();
        stats.as_array().unwrap().iter().all(|s| s["status"] == "running")
            && stats.as_array().unwrap().len() == 2
    });
    assert!(both_running, "both workers should be running before the restart\n{}", temp.daemon_log());

    assert!(temp.snapshot_path().exists(), "a snapshot should have been written on start");

    temp.zpm().args(["kill-daemon"]).passes();

    // kill-daemon only signals the process; give it a moment to write its
    // final snapshot and exit before the next command respawns it.
    let daemon_gone = wait_for(4_000, || !temp.socket_path().exists());
    assert!(daemon_gone, "daemon socket should be removed after shutdown");

    // Only `start` auto-spawns a fresh daemon (`connect_or_start`); every
    // other command expects one already running. A throwaway third worker
    // forces the respawn, which restores alpha/beta from the snapshot
    // written before the kill as part of its own boot sequence.
    let script_c = temp.script("gamma", "sleep 60\n");
    temp.zpm().args(["start", script_c.to_str().unwrap(), "--name", "gamma"]).passes();

    let resurrected = wait_for(6_000, || {
        let out = temp.zpm().args(["--output", "json", "list"]).passes();
        let names = names_in(&out.stdout());
        names.contains(&"alpha".to_string()) && names.contains(&"beta".to_string())
    });
    assert!(resurrected, "both workers should reappear after the daemon restarts\n{}", temp.daemon_log());

    let both_running_again = wait_for(6_000, || {
        let out = temp.zpm().args(["--output", "json", "stats"]).passes();
        let stats: Value = serde_json::from_str(&out.stdout()).unwrap();
        let arr = stats.as_array().unwrap();
        let running = |name: &str| {
            arr.iter().any(|s| s["name"] == name && s["status"] == "running")
        };
        arr.len() == 3 && running("alpha") && running("beta") && running("gamma")
    });
    assert!(
        both_running_again,
        "resurrected workers should be spawned back into Running\n{}",
        temp.daemon_log()
    );
}
