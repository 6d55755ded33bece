// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker configuration: the immutable part of a worker's definition.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::worker_name::WorkerName;

pub const DEFAULT_KILL_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 16_000;
pub const INITIAL_BACKOFF_MS: u64 = 1_000;
pub const STABILITY_WINDOW_MS: u64 = 5_000;
pub const FAST_FAIL_THRESHOLD_MS: u64 = 1_500;
/// Hard upper bound on how long a worker may sit in `Stopping` before it is
/// forced to `Stopped` regardless of whether its children have actually
/// exited.
pub const STOP_SAFETY_TIMEOUT_MS: u64 = 10_000;

/// How many OS processes back one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Fork,
    Cluster,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Fork
    }
}

/// The kind of liveness check to run against a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProbeKind {
    Http { url: String },
    Tcp { host: String, port: u16 },
    Exec { command: String },
}

/// A liveness probe attached to a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeConfig {
    #[serde(flatten)]
    pub kind: ProbeKind,
    #[serde(default = "default_probe_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_probe_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
}

fn default_probe_interval_secs() -> u64 {
    10
}

fn default_probe_timeout_secs() -> u64 {
    3
}

fn default_failure_threshold() -> u32 {
    3
}

impl ProbeConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Where a worker's stdout/stderr should additionally be forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LogSink {
    File { path: PathBuf },
    Tcp { target: String },
}

/// The immutable definition of a worker, as accepted by `start()` and
/// persisted verbatim in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerConfig {
    pub name: WorkerName,
    pub script_path: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub instances: Option<u32>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub dev_mode: bool,
    #[serde(default = "default_kill_timeout_ms")]
    pub kill_timeout_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default)]
    pub probe: Option<ProbeConfig>,
    #[serde(default)]
    pub reload_command: Option<String>,
    #[serde(default)]
    pub log_sink: Option<LogSink>,
}

fn default_kill_timeout_ms() -> u64 {
    DEFAULT_KILL_TIMEOUT_MS
}

fn default_max_backoff_ms() -> u64 {
    DEFAULT_MAX_BACKOFF_MS
}

impl WorkerConfig {
    /// Number of OS processes this worker should run. Fork mode always
    /// forces a single instance regardless of what was requested.
    pub fn instance_count(&self) -> u32 {
        match self.mode {
            Mode::Fork => 1,
            Mode::Cluster => self.instances.unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get() as u32)
                    .unwrap_or(1)
            }),
        }
    }

    pub fn kill_timeout(&self) -> Duration {
        Duration::from_millis(self.kill_timeout_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    crate::setters! {
        into { script_path: PathBuf }
        set { dev_mode: bool, instances: Option<u32>, port: Option<u16> }
        option { reload_command: String }
    }
}

crate::builder! {
    pub struct WorkerConfigBuilder => WorkerConfig {
        into { name: WorkerName = "test-worker", script_path: PathBuf = PathBuf::from("./app.js") }
        set {
            args: Vec<String> = Vec::new(),
            env: BTreeMap<String, String> = BTreeMap::new(),
            mode: Mode = Mode::Fork,
            instances: Option<u32> = None,
            port: Option<u16> = None,
            dev_mode: bool = false,
            kill_timeout_ms: u64 = DEFAULT_KILL_TIMEOUT_MS,
            max_backoff_ms: u64 = DEFAULT_MAX_BACKOFF_MS
        }
        option {
            probe: ProbeConfig = None,
            reload_command: String = None,
            log_sink: LogSink = None
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
