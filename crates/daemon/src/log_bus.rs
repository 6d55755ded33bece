// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out of child stdout/stderr lines to any number of live `logs`
//! subscribers. Deliberately separate from [`crate::store::ProcessStore`]'s
//! event stream: log lines aren't state, so a subscriber that falls behind
//! only misses lines, it never corrupts a worker's record.

use tokio::sync::broadcast;

use zpm_core::WorkerName;

/// How many lines a lagging subscriber can fall behind before older ones
/// are dropped out from under it.
const CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone)]
pub struct LogLine {
    pub worker: WorkerName,
    pub stream: LogStream,
    pub line: String,
}

impl LogLine {
    /// Render the way a `logs` subscriber sees it: prefixed with the
    /// worker's name so a multi-worker stream stays attributable.
    pub fn formatted(&self) -> String {
        format!("[{}] {}", self.worker, self.line)
    }
}

pub fn channel() -> (broadcast::Sender<LogLine>, broadcast::Receiver<LogLine>) {
    broadcast::channel(CHANNEL_CAPACITY)
}
