// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-PID CPU% and RSS queries, used by `stats`. Not in the original
//! corpus's dependency set, but the ecosystem-standard way to query
//! process resource usage portably — see DESIGN.md.

use parking_lot::Mutex;
use sysinfo::{Pid, System};

/// A point-in-time resource reading for one child process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessUsage {
    pub cpu_percent: f32,
    pub rss_bytes: u64,
}

pub trait UsageReader: Send + Sync {
    /// `None` if the pid is no longer running or was never observed.
    /// CPU percentage requires two samples spaced apart to be meaningful;
    /// the first call for a given pid may read as `0.0`.
    fn usage(&self, pid: u32) -> Option<ProcessUsage>;
}

/// Wraps a single `sysinfo::System`, refreshed lazily on each query.
/// `sysinfo::System` is not `Sync` on its own, so access is serialized
/// behind a mutex; this is fine since `stats` calls are infrequent
/// relative to the supervision hot path.
pub struct SystemUsageReader {
    system: Mutex<System>,
}

impl SystemUsageReader {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SystemUsageReader {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageReader for SystemUsageReader {
    fn usage(&self, pid: u32) -> Option<ProcessUsage> {
        let mut system = self.system.lock();
        let sysinfo_pid = Pid::from_u32(pid);
        system.refresh_process(sysinfo_pid);
        let process = system.process(sysinfo_pid)?;
        Some(ProcessUsage {
            cpu_percent: process.cpu_usage(),
            rss_bytes: process.memory(),
        })
    }
}

#[cfg(test)]
#[path = "usage_tests.rs"]
mod tests;
