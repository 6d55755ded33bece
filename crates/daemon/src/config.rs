// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-wide configuration: where the socket, pid file, snapshot, and
//! log directory live. Resolved once at startup from the environment.

use std::path::PathBuf;

pub const DEFAULT_NAMESPACE: &str = "zuz-pm";

/// Paths and knobs the daemon needs before it can bind anything.
#[derive(Debug, Clone)]
pub struct Config {
    pub namespace: String,
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub pid_path: PathBuf,
    pub snapshot_path: PathBuf,
    pub log_dir: PathBuf,
    /// Mirrors `zpm-cli`'s `env::is_dev_mode()`: `NODE_ENV != "production"`
    /// is development. Selects between console logging and the rotating
    /// file log in `main::init_tracing`.
    pub dev_mode: bool,
}

impl Config {
    /// Resolve from the environment: `ZPM_STATE_DIR` overrides everything
    /// (used by tests for filesystem isolation); otherwise paths are
    /// derived from `HOME` and the platform temp directory.
    pub fn from_env() -> Self {
        let namespace = std::env::var("ZPM_NAMESPACE").unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string());
        let dev_mode = is_dev_mode();

        if let Ok(state_dir) = std::env::var("ZPM_STATE_DIR") {
            return Self::rooted_at(namespace, PathBuf::from(state_dir)).with_dev_mode(dev_mode);
        }

        let home = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
        let state_dir = home.join(".zpm");
        let tmp = std::env::temp_dir();

        Self {
            socket_path: tmp.join(format!("{namespace}.sock")),
            pid_path: tmp.join(format!("{namespace}.pid")),
            snapshot_path: state_dir.join("snapshot.json"),
            log_dir: state_dir.join("logs"),
            namespace,
            state_dir,
            dev_mode,
        }
    }

    /// Build every path under a single directory; used by `ZPM_STATE_DIR`
    /// overrides and by tests.
    pub fn rooted_at(namespace: String, dir: PathBuf) -> Self {
        Self {
            socket_path: dir.join(format!("{namespace}.sock")),
            pid_path: dir.join(format!("{namespace}.pid")),
            snapshot_path: dir.join("snapshot.json"),
            log_dir: dir.join("logs"),
            namespace,
            state_dir: dir,
            dev_mode: is_dev_mode(),
        }
    }

    fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }
}

/// Whether the daemon should log to the console (development) or to the
/// rotating file log (production). Same `NODE_ENV` convention `zpm-cli`'s
/// `env::is_dev_mode()` uses, since the CLI spawns `zpmd` inheriting its
/// own environment rather than setting a daemon-specific variable.
fn is_dev_mode() -> bool {
    std::env::var("NODE_ENV").map(|v| v != "production").unwrap_or(true)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
