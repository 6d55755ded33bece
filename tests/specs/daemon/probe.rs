// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spec §8 scenario 4: a liveness probe against an unreachable target
//! restarts the worker once it crosses the failure threshold.

use serde_json::Value;

use crate::support::{wait_for, Project};

fn first_stat(json: &str) -> Value {
    let stats: Value = serde_json::from_str(json).expect("valid stats json");
    stats.get(0).cloned().expect("at least one stats row")
}

#[test]
fn failing_http_probe_restarts_worker_after_threshold() {
    let temp = Project::empty();
    let script = temp.script("server", "sleep 60\n");

    temp.zpm()
        .args([
            "start",
            script.to_str().unwrap(),
            "--name",
            "probed",
            "--probe-type",
            "http",
            "--probe-target",
            "http://127.0.0.1:65000/health",
            "--probe-interval",
            "1",
            "--probe-timeout",
            "1",
            "--probe-failure-threshold",
            "3",
        ])
        .passes();

    let running = wait_for(2_000, || {
        let out = temp.zpm().args(["--output", "json", "stats", "probed"]).passes();
        first_stat(&out.stdout())["status"] == "running"
    });
    assert!(running, "worker should reach Running before the probe starts failing it\n{}", temp.daemon_log());

    // Three consecutive 1s-interval failures should cross the threshold
    // and force a restart; give it generous headroom for scheduling jitter.
    let restarted = wait_for(12_000, || {
        let out = temp.zpm().args(["--output", "json", "stats", "probed"]).passes();
        first_stat(&out.stdout())["restart_count"].as_u64().unwrap_or(0) >= 1
    });
    assert!(
        restarted,
        "an unreachable probe target should trigger a restart once failures cross the threshold\n{}",
        temp.daemon_log()
    );
}
