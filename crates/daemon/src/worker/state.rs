// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pure, in-memory runtime state of one worker. Timers are not part
//! of this struct — they are `CancellationToken`s owned by the worker
//! actor task, outside the pure decision function's view (see
//! `decision.rs` for why).

use zpm_core::{ChildHandle, WorkerConfig, WorkerStatus};

use zpm_core::config::{FAST_FAIL_THRESHOLD_MS, INITIAL_BACKOFF_MS};

/// Everything the decision function needs to know about one worker,
/// besides its immutable [`WorkerConfig`].
#[derive(Debug, Clone)]
pub struct WorkerRuntime {
    pub config: WorkerConfig,
    pub status: WorkerStatus,
    pub children: Vec<ChildHandle>,
    pub start_time_epoch_ms: Option<u64>,
    pub restart_count: u32,
    pub backoff_ms: u64,
    pub probe_failures: u32,
    pub is_restarting: bool,
    /// Set when a crash left surviving siblings (cluster mode) that must be
    /// drained before the backoff restart proceeds; distinct from
    /// `is_restarting`, which respawns immediately with no backoff.
    pub draining_after_crash: bool,
    pub last_error: Option<String>,
}

impl WorkerRuntime {
    pub fn new(config: WorkerConfig) -> Self {
        Self {
            config,
            status: WorkerStatus::Stopped,
            children: Vec::new(),
            start_time_epoch_ms: None,
            restart_count: 0,
            backoff_ms: INITIAL_BACKOFF_MS,
            probe_failures: 0,
            is_restarting: false,
            draining_after_crash: false,
            last_error: None,
        }
    }

    pub fn reset_backoff(&mut self) {
        self.restart_count = 0;
        self.backoff_ms = INITIAL_BACKOFF_MS;
    }

    pub fn next_backoff(&self) -> u64 {
        (self.backoff_ms.saturating_mul(2)).min(self.config.max_backoff_ms)
    }

    pub fn is_fast_fail(uptime_ms: u64) -> bool {
        uptime_ms < FAST_FAIL_THRESHOLD_MS
    }
}
