// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory fakes for the adapter traits, gated behind `test-support` so
//! the daemon crate can exercise its engine without a real OS process.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::port::PortFreer;
use crate::terminate::Terminator;
use crate::usage::{ProcessUsage, UsageReader};
use crate::watch::{FileWatchEvent, FileWatcher};

/// Records every call made against it, for assertions in decision tests.
#[derive(Default, Clone)]
pub struct FakeTerminator {
    pub terminated: Arc<Mutex<Vec<u32>>>,
    alive: Arc<Mutex<std::collections::HashSet<u32>>>,
}

impl FakeTerminator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_alive(&self, pid: u32) {
        self.alive.lock().insert(pid);
    }
}

#[async_trait]
impl Terminator for FakeTerminator {
    async fn terminate(&self, pid: u32, _timeout: Duration) {
        self.terminated.lock().push(pid);
        self.alive.lock().remove(&pid);
    }

    fn is_alive(&self, pid: u32) -> bool {
        self.alive.lock().contains(&pid)
    }
}

#[derive(Default, Clone)]
pub struct FakePortFreer {
    pub freed: Arc<Mutex<Vec<u16>>>,
}

#[async_trait]
impl PortFreer for FakePortFreer {
    async fn free_port(&self, port: u16) {
        self.freed.lock().push(port);
    }
}

#[derive(Default, Clone)]
pub struct FakeUsageReader {
    readings: Arc<Mutex<std::collections::HashMap<u32, ProcessUsage>>>,
}

impl FakeUsageReader {
    pub fn set(&self, pid: u32, usage: ProcessUsage) {
        self.readings.lock().insert(pid, usage);
    }
}

impl UsageReader for FakeUsageReader {
    fn usage(&self, pid: u32) -> Option<ProcessUsage> {
        self.readings.lock().get(&pid).copied()
    }
}

/// Hands back a channel the test can push [`FileWatchEvent`]s into
/// directly, bypassing the filesystem entirely.
#[derive(Default, Clone)]
pub struct FakeFileWatcher {
    sender: Arc<Mutex<Option<mpsc::Sender<FileWatchEvent>>>>,
}

impl FakeFileWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a change notification to whichever watch is currently active.
    /// A no-op if nothing has called `watch` yet.
    pub fn trigger(&self, path: impl Into<std::path::PathBuf>) {
        if let Some(tx) = self.sender.lock().as_ref() {
            let _ = tx.try_send(FileWatchEvent { path: path.into() });
        }
    }
}

#[async_trait]
impl FileWatcher for FakeFileWatcher {
    fn watch(
        &self,
        _root: &Path,
        _ignore: &[&str],
        _stability: Duration,
        _poll_interval: Duration,
    ) -> notify::Result<mpsc::Receiver<FileWatchEvent>> {
        let (tx, rx) = mpsc::channel(16);
        *self.sender.lock() = Some(tx);
        Ok(rx)
    }
}
