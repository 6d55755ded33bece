// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DTO structs for the IPC protocol.

use serde::{Deserialize, Serialize};
use zpm_core::{WorkerConfig, WorkerName, WorkerStatus};

/// One row of a `stats` reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerStats {
    pub name: WorkerName,
    pub status: WorkerStatus,
    pub pids: Vec<u32>,
    pub instances: u32,
    pub restart_count: u32,
    pub uptime_ms: Option<u64>,
    pub cpu_percent: f32,
    pub rss_bytes: u64,
    pub last_error: Option<String>,
}

/// One row of a `get-store` reply: the persisted configuration alongside
/// enough runtime state for a caller to reconstruct a picture of the
/// daemon without issuing a second `stats` round trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreRecord {
    pub config: WorkerConfig,
    pub status: WorkerStatus,
    pub restart_count: u32,
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
