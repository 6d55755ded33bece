// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI-surface coverage not already exercised by the daemon scenario
//! specs: output-format toggling, the store dump, and commands that
//! expect a daemon to already be running.

use serde_json::Value;

use crate::support::{wait_for, Project};

#[test]
fn commands_against_a_cold_daemon_report_not_running() {
    let temp = Project::empty();

    // `list`/`stats`/`store` connect to an existing daemon rather than
    // starting one; with nothing ever started, there is no daemon yet.
    temp.zpm().args(["list"]).fails().stderr_has("daemon is not running");
}

#[test]
fn list_and_store_reflect_registered_workers_in_both_formats() {
    let temp = Project::empty();
    let script = temp.script("server", "sleep 60\n");

    temp.zpm().args(["start", script.to_str().unwrap(), "--name", "api"]).passes();
    let running = wait_for(2_000, || {
        let out = temp.zpm().args(["--output", "json", "stats", "api"]).passes();
        let stats: Value = serde_json::from_str(&out.stdout()).unwrap();
        stats[0]["status"] == "running"
    });
    assert!(running, "worker should reach Running\n{}", temp.daemon_log());

    temp.zpm().args(["list"]).passes().stdout_has("api");

    let json_list = temp.zpm().args(["--output", "json", "list"]).passes();
    let names: Value = serde_json::from_str(&json_list.stdout()).expect("valid json");
    assert_eq!(names, serde_json::json!(["api"]));

    let text_store = temp.zpm().args(["store"]).passes();
    assert!(text_store.stdout().contains("api"), "text store output should name the worker");
    assert!(text_store.stdout().contains("restarts="), "text store output should show a restart count");

    let json_store = temp.zpm().args(["--output", "json", "store"]).passes();
    let records: Value = serde_json::from_str(&json_store.stdout()).expect("valid json");
    let record = &records.as_array().expect("store is an array")[0];
    assert_eq!(record["config"]["name"], "api");
    assert_eq!(record["status"], "running");
}

#[test]
fn delete_removes_worker_from_list_and_store() {
    let temp = Project::empty();
    let script = temp.script("server", "sleep 60\n");

    temp.zpm().args(["start", script.to_str().unwrap(), "--name", "api"]).passes();
    wait_for(2_000, || {
        let out = temp.zpm().args(["--output", "json", "list"]).passes();
        out.stdout().contains("api")
    });

    temp.zpm().args(["delete", "api"]).passes();

    let gone = wait_for(6_000, || {
        let out = temp.zpm().args(["--output", "json", "list"]).passes();
        out.stdout().trim() == "[]"
    });
    assert!(gone, "deleted worker should no longer be listed\n{}", temp.daemon_log());

    let json_store = temp.zpm().args(["--output", "json", "store"]).passes();
    let records: Value = serde_json::from_str(&json_store.stdout()).expect("valid json");
    assert!(records.as_array().unwrap().is_empty(), "store should also drop the deleted worker");
}

#[test]
fn kill_daemon_reports_success_and_removes_pid_file() {
    let temp = Project::empty();
    let script = temp.script("server", "sleep 60\n");

    temp.zpm().args(["start", script.to_str().unwrap(), "--name", "api"]).passes();
    wait_for(2_000, || {
        let out = temp.zpm().args(["--output", "json", "list"]).passes();
        out.stdout().contains("api")
    });

    temp.zpm().args(["kill-daemon"]).passes().stdout_has("Daemon stopped");

    let pid_gone = wait_for(4_000, || !temp.state_path().join("zuz-pm.pid").exists());
    assert!(pid_gone, "pid file should be removed once the daemon is killed");
}
