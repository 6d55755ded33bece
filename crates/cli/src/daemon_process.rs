// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Starting, stopping, and probing the `zpmd` daemon process from the CLI
//! side of the control socket.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::client::ClientError;
use crate::env;

/// Spawn `zpmd` detached. In dev mode stdio is inherited so the operator
/// sees startup output directly; in production it's redirected to the log
/// file so the parent terminal can close without taking the daemon with it.
pub fn start_daemon_background() -> Result<std::process::Child, ClientError> {
    let binary = find_daemon_binary()?;
    let dev_mode = env::is_dev_mode();

    let mut command = Command::new(&binary);
    command.stdin(Stdio::null());

    if dev_mode {
        command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    } else {
        std::fs::create_dir_all(env::log_dir()).map_err(ClientError::Io)?;
        let log = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(env::daemon_log_path())
            .map_err(ClientError::Io)?;
        let log_err = log.try_clone().map_err(ClientError::Io)?;
        command.stdout(log).stderr(log_err);
    }

    command.spawn().map_err(|err| ClientError::DaemonStartFailed(err.to_string()))
}

/// Locate the `zpmd` binary: an explicit override, then a sibling of the
/// running `zpm` executable, then fall back to `$PATH` lookup.
fn find_daemon_binary() -> Result<PathBuf, ClientError> {
    if let Some(path) = env::daemon_binary_override() {
        return Ok(PathBuf::from(path));
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("zpmd");
            if sibling.exists() {
                return Ok(sibling);
            }
        }
    }

    Ok(PathBuf::from("zpmd"))
}

/// Wait for the daemon's control socket to start accepting connections,
/// bailing out early if the child process exits first (startup failure).
pub async fn connect_with_retry(
    timeout: Duration,
    mut child: std::process::Child,
) -> Result<(), ClientError> {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if let Ok(Some(status)) = child.try_wait() {
            return Err(ClientError::DaemonStartFailed(format!("zpmd exited with {status}")));
        }
        if probe_socket() {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    Err(ClientError::DaemonStartTimeout)
}

/// Probe whether the control socket is accepting connections.
pub fn probe_socket() -> bool {
    std::os::unix::net::UnixStream::connect(env::socket_path()).is_ok()
}

/// Remove a stale socket/pid pair left behind by a daemon that exited
/// without cleaning up after itself.
pub fn cleanup_stale_socket() {
    let socket_path = env::socket_path();
    let pid_path = env::pid_path();

    let stale = match read_daemon_pid() {
        Some(pid) => !process_exists(pid),
        None => true,
    };

    if stale {
        let _ = std::fs::remove_file(&socket_path);
        let _ = std::fs::remove_file(&pid_path);
    }
}

/// Read the daemon's PID from its PID file, if present and parseable.
pub fn read_daemon_pid() -> Option<u32> {
    std::fs::read_to_string(env::pid_path()).ok()?.trim().parse().ok()
}

#[cfg(unix)]
pub fn process_exists(pid: u32) -> bool {
    use nix::sys::signal;
    use nix::unistd::Pid;

    signal::kill(Pid::from_raw(pid as i32), None).is_ok()
}

#[cfg(not(unix))]
pub fn process_exists(_pid: u32) -> bool {
    false
}

/// Send the daemon a soft-terminate signal and remove its PID file. Does
/// not wait for the process to actually exit.
#[cfg(unix)]
pub fn kill_daemon(pid: u32) -> Result<(), ClientError> {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM).map_err(|err| ClientError::Io(err.into()))?;
    let _ = std::fs::remove_file(env::pid_path());
    Ok(())
}

#[cfg(not(unix))]
pub fn kill_daemon(_pid: u32) -> Result<(), ClientError> {
    Err(ClientError::DaemonNotRunning)
}
