// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use zpm_core::{WorkerConfig, WorkerName};

/// Request from CLI to daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "kebab-case")]
pub enum Request {
    /// Health check.
    Ping,

    /// Register and start a new worker.
    Start { name: WorkerName, config: WorkerConfig },

    /// Stop a running worker (its config is retained).
    Stop { name: WorkerName },

    /// Stop then start a worker.
    Restart { name: WorkerName },

    /// Stop (if running) and forget a worker entirely.
    Delete { name: WorkerName },

    /// One stats record per worker, or just `name`'s if given.
    Stats {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<WorkerName>,
    },

    /// Every known worker name.
    List,

    /// Subscribe to stdout/stderr of `name`'s children, or every worker's
    /// if omitted. Streams `{ok:true, data}` lines until disconnect.
    Logs {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<WorkerName>,
    },

    /// Every worker's persisted config plus current status.
    GetStore,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
