// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[cfg(unix)]
#[tokio::test]
async fn terminate_stops_a_real_child_process() {
    let mut child = tokio::process::Command::new("sleep")
        .arg("30")
        .spawn()
        .expect("spawn sleep");
    let pid = child.id().expect("child has a pid");

    let terminator = SystemTerminator;
    assert!(terminator.is_alive(pid));

    terminator
        .terminate(pid, Duration::from_millis(500))
        .await;

    let _ = child.wait().await;
    assert!(!terminator.is_alive(pid));
}

#[cfg(unix)]
#[test]
fn is_alive_is_false_for_an_unused_pid() {
    // Pid 1 belongs to init/launchd; a very large unused pid is a safer bet
    // for "definitely not alive" across sandboxes.
    let terminator = SystemTerminator;
    assert!(!terminator.is_alive(u32::MAX - 1));
}
