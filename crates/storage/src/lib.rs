// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence: the on-disk record of worker *configurations*
//! used to resurrect workers across daemon restarts. Runtime state
//! (pids, restart counters, timers) is never persisted — the daemon
//! Non-goals explicitly exclude live-telemetry persistence.

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)
)]

pub mod snapshot;

pub use snapshot::{Snapshot, SnapshotError, SnapshotStore};
