// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolves the same paths `zpmd` resolves from the environment, without
//! linking against its `config` module (which isn't part of the daemon
//! crate's public surface — only `protocol` is).

use std::path::PathBuf;

const DEFAULT_NAMESPACE: &str = "zuz-pm";

fn namespace() -> String {
    std::env::var("ZPM_NAMESPACE").unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string())
}

fn state_root() -> PathBuf {
    if let Ok(dir) = std::env::var("ZPM_STATE_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir().unwrap_or_else(std::env::temp_dir).join(".zpm")
}

fn tmp_root() -> PathBuf {
    if let Ok(dir) = std::env::var("ZPM_STATE_DIR") {
        return PathBuf::from(dir);
    }
    std::env::temp_dir()
}

pub fn socket_path() -> PathBuf {
    tmp_root().join(format!("{}.sock", namespace()))
}

pub fn pid_path() -> PathBuf {
    tmp_root().join(format!("{}.pid", namespace()))
}

pub fn log_dir() -> PathBuf {
    state_root().join("logs")
}

pub fn daemon_log_path() -> PathBuf {
    log_dir().join("zpmd.log")
}

/// Override for the `zpmd` binary path, for tests and packaging layouts
/// where it isn't a sibling of `zpm`.
pub fn daemon_binary_override() -> Option<String> {
    std::env::var("ZPM_DAEMON_BIN").ok()
}

/// Whether the daemon should be started in dev mode (inherited stdio) or
/// production mode (stdio discarded, stdout/stderr logged to a file).
pub fn is_dev_mode() -> bool {
    std::env::var("NODE_ENV").map(|v| v != "production").unwrap_or(true)
}
