// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lightweight description of one live child process, independent of the
//! async process handle that owns its I/O streams.

use serde::{Deserialize, Serialize};

/// How a child exited, as observed by the worker actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Identity of one child process, for reporting (`stats`, `list`) and for
/// the termination/port-freeing adapters. Does not own the process's
/// stdio handles; those live on the owning worker actor's task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildHandle {
    pub pid: u32,
    /// 0-based slot within the worker's instance set (always 0 in Fork mode).
    pub index: u32,
    pub started_at_epoch_ms: u64,
}
