// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain notifications broadcast by the `ProcessStore` and logged by the
//! `Emit` effect. Observers (the control server's `logs`/`get-store`
//! handlers, and the daemon's own tracing output) receive owned clones.

use serde::{Deserialize, Serialize};

use crate::status::WorkerStatus;
use crate::worker_name::WorkerName;

/// A change worth telling observers about.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    StatusChanged {
        name: WorkerName,
        from: WorkerStatus,
        to: WorkerStatus,
    },
    Spawned {
        name: WorkerName,
        pid: u32,
        index: u32,
    },
    Exited {
        name: WorkerName,
        pid: u32,
        code: Option<i32>,
        signal: Option<i32>,
    },
    RestartScheduled {
        name: WorkerName,
        delay_ms: u64,
        restart_count: u32,
    },
    ProbeFailed {
        name: WorkerName,
        consecutive_failures: u32,
    },
    ReloadFailed {
        name: WorkerName,
        reason: String,
    },
    Deleted {
        name: WorkerName,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::StatusChanged { .. } => "status_changed",
            Event::Spawned { .. } => "spawned",
            Event::Exited { .. } => "exited",
            Event::RestartScheduled { .. } => "restart_scheduled",
            Event::ProbeFailed { .. } => "probe_failed",
            Event::ReloadFailed { .. } => "reload_failed",
            Event::Deleted { .. } => "deleted",
        }
    }

    pub fn worker_name(&self) -> &WorkerName {
        match self {
            Event::StatusChanged { name, .. }
            | Event::Spawned { name, .. }
            | Event::Exited { name, .. }
            | Event::RestartScheduled { name, .. }
            | Event::ProbeFailed { name, .. }
            | Event::ReloadFailed { name, .. }
            | Event::Deleted { name } => name,
        }
    }
}
