// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The observable status of a worker.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The six states a worker's lifecycle machine can be in. See the
/// transition table owned by the daemon's decision module for the legal
/// moves between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Stopped,
    Starting,
    Running,
    Stopping,
    Crashed,
    Errored,
}

impl WorkerStatus {
    /// Whether the worker is expected to own at least one live child while
    /// in this status.
    pub fn expects_children(self) -> bool {
        matches!(self, WorkerStatus::Running | WorkerStatus::Stopping)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            WorkerStatus::Stopped | WorkerStatus::Crashed | WorkerStatus::Errored
        )
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WorkerStatus::Stopped => "stopped",
            WorkerStatus::Starting => "starting",
            WorkerStatus::Running => "running",
            WorkerStatus::Stopping => "stopping",
            WorkerStatus::Crashed => "crashed",
            WorkerStatus::Errored => "errored",
        })
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
