// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spec §8 scenario 5: with `--dev`, touching a file under the project's
//! `src/` directory reloads the worker (new pid) without a `reload-cmd`.

use serde_json::Value;

use crate::support::{wait_for, Project};

fn first_stat(json: &str) -> Value {
    let stats: Value = serde_json::from_str(json).expect("valid stats json");
    stats.get(0).cloned().expect("at least one stats row")
}

#[test]
fn touching_src_reloads_dev_mode_worker() {
    let temp = Project::empty();

    // A discoverable project root (package.json) with the worker's
    // script living under its `src/` directory, matching what
    // `discover_project_root` + the dev-mode watcher expect.
    let project_root = temp.path().join("app");
    let src = project_root.join("src");
    std::fs::create_dir_all(&src).unwrap();
    std::fs::write(project_root.join("package.json"), "{}\n").unwrap();

    let script_path = src.join("server");
    std::fs::write(&script_path, "#!/bin/sh\nsleep 60\n").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&script_path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script_path, perms).unwrap();
    }

    temp.zpm()
        .args(["start", script_path.to_str().unwrap(), "--name", "web", "--dev"])
        .passes();

    let running = wait_for(2_000, || {
        let out = temp.zpm().args(["--output", "json", "stats", "web"]).passes();
        first_stat(&out.stdout())["status"] == "running"
    });
    assert!(running, "worker should reach Running before we touch files\n{}", temp.daemon_log());

    let before_pid = first_stat(
        &temp.zpm().args(["--output", "json", "stats", "web"]).passes().stdout(),
    )["pids"][0]
        .as_u64()
        .unwrap();

    // Give the watcher a moment to finish its initial scan before we
    // perturb the tree, then touch a file under src/ to trigger a reload.
    std::thread::sleep(std::time::Duration::from_millis(300));
    std::fs::write(src.join("extra.txt"), "changed\n").unwrap();

    let reloaded = wait_for(8_000, || {
        let out = temp.zpm().args(["--output", "json", "stats", "web"]).passes();
        let stat = first_stat(&out.stdout());
        stat["status"] == "running" && stat["pids"][0].as_u64().unwrap_or(0) != before_pid
    });
    assert!(
        reloaded,
        "editing a file under src/ should reload the dev-mode worker with a new pid\n{}",
        temp.daemon_log()
    );
}
