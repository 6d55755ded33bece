// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spec §8 scenario 1 ("happy path") plus the stop/restart idempotence
//! laws.

use std::path::PathBuf;

use serde_json::Value;

use crate::support::{wait_for, Project};

fn sleepy_script(temp: &Project) -> PathBuf {
    temp.script("sleepy", "echo ready\nsleep 60\n")
}

fn first_stat(json: &str) -> Value {
    let stats: Value = serde_json::from_str(json).expect("valid stats json");
    stats.get(0).cloned().expect("at least one stats row")
}

#[test]
fn happy_path_reaches_running_then_stops() {
    let temp = Project::empty();
    let script = sleepy_script(&temp);

    temp.zpm()
        .args(["start", script.to_str().unwrap(), "--name", "api"])
        .passes()
        .stdout_has("started");

    let reached_running = wait_for(2_000, || {
        let out = temp.zpm().args(["--output", "json", "stats", "api"]).passes();
        let stat = first_stat(&out.stdout());
        stat["status"] == "running" && stat["pids"][0].as_u64().unwrap_or(0) > 0
    });
    assert!(reached_running, "worker should reach Running quickly\n{}", temp.daemon_log());

    let out = temp.zpm().args(["--output", "json", "stats", "api"]).passes();
    let stat = first_stat(&out.stdout());
    assert!(stat["uptime_ms"].as_u64().unwrap() > 0, "uptime should be positive once running");
    assert_eq!(stat["restart_count"].as_u64().unwrap(), 0);

    temp.zpm().args(["stop", "api"]).passes().stdout_has("stopped");

    let reached_stopped = wait_for(6_000, || {
        let out = temp.zpm().args(["--output", "json", "stats", "api"]).passes();
        first_stat(&out.stdout())["status"] == "stopped"
    });
    assert!(reached_stopped, "worker should be Stopped within killTimeout\n{}", temp.daemon_log());
}

#[test]
fn stop_is_idempotent() {
    let temp = Project::empty();
    let script = sleepy_script(&temp);

    temp.zpm().args(["start", script.to_str().unwrap(), "--name", "api"]).passes();
    wait_for(2_000, || {
        let out = temp.zpm().args(["--output", "json", "stats", "api"]).passes();
        first_stat(&out.stdout())["status"] == "running"
    });

    temp.zpm().args(["stop", "api"]).passes();
    wait_for(6_000, || {
        let out = temp.zpm().args(["--output", "json", "stats", "api"]).passes();
        first_stat(&out.stdout())["status"] == "stopped"
    });

    // A second stop on an already-stopped worker is a no-op, not an error.
    temp.zpm().args(["stop", "api"]).passes();
}

#[test]
fn restart_changes_pid_and_returns_to_running() {
    let temp = Project::empty();
    let script = sleepy_script(&temp);

    temp.zpm().args(["start", script.to_str().unwrap(), "--name", "api"]).passes();
    let running = wait_for(2_000, || {
        let out = temp.zpm().args(["--output", "json", "stats", "api"]).passes();
        first_stat(&out.stdout())["status"] == "running"
    });
    assert!(running, "worker should reach Running\n{}", temp.daemon_log());

    let before = first_stat(
        &temp.zpm().args(["--output", "json", "stats", "api"]).passes().stdout(),
    )["pids"][0]
        .as_u64()
        .unwrap();

    temp.zpm().args(["restart", "api"]).passes().stdout_has("restarted");

    let restarted = wait_for(6_000, || {
        let out = temp.zpm().args(["--output", "json", "stats", "api"]).passes();
        let stat = first_stat(&out.stdout());
        stat["status"] == "running" && stat["pids"][0].as_u64().unwrap_or(0) != before
    });
    assert!(restarted, "worker should come back Running with a new pid\n{}", temp.daemon_log());
}

#[test]
fn start_delete_start_matches_start_alone() {
    let temp = Project::empty();
    let script = sleepy_script(&temp);

    temp.zpm().args(["start", script.to_str().unwrap(), "--name", "api"]).passes();
    wait_for(2_000, || {
        let out = temp.zpm().args(["--output", "json", "stats", "api"]).passes();
        first_stat(&out.stdout())["status"] == "running"
    });

    temp.zpm().args(["delete", "api"]).passes();
    temp.zpm().args(["--output", "json", "list"]).passes().stdout_has("[]");

    temp.zpm().args(["start", script.to_str().unwrap(), "--name", "api"]).passes();
    let running_again = wait_for(2_000, || {
        let out = temp.zpm().args(["--output", "json", "stats", "api"]).passes();
        first_stat(&out.stdout())["status"] == "running"
    });
    assert!(running_again, "worker should be registered and running again\n{}", temp.daemon_log());
}

#[test]
fn duplicate_start_is_rejected_while_active() {
    let temp = Project::empty();
    let script = sleepy_script(&temp);

    temp.zpm().args(["start", script.to_str().unwrap(), "--name", "api"]).passes();
    wait_for(2_000, || {
        let out = temp.zpm().args(["--output", "json", "stats", "api"]).passes();
        first_stat(&out.stdout())["status"] == "running"
    });

    temp.zpm()
        .args(["start", script.to_str().unwrap(), "--name", "api"])
        .fails()
        .stderr_has("already exists");
}
