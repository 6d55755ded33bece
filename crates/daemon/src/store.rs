// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The append-only-by-key, last-writer-wins read model rebuilt from the
//! event stream every worker actor emits. This is the only state shared
//! across workers; nothing here drives behavior, it only answers queries.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use zpm_core::{Event, WorkerConfig, WorkerName, WorkerStatus};

/// What the store remembers about one worker, rebuilt purely from events.
#[derive(Debug, Clone)]
pub struct WorkerRecord {
    pub config: WorkerConfig,
    pub status: WorkerStatus,
    pub pids: Vec<u32>,
    pub restart_count: u32,
    pub last_error: Option<String>,
    pub running_since_epoch_ms: Option<u64>,
}

impl WorkerRecord {
    fn new(config: WorkerConfig) -> Self {
        Self {
            config,
            status: WorkerStatus::Stopped,
            pids: Vec::new(),
            restart_count: 0,
            last_error: None,
            running_since_epoch_ms: None,
        }
    }
}

fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub struct ProcessStore {
    records: Mutex<HashMap<WorkerName, WorkerRecord>>,
    events_tx: broadcast::Sender<Event>,
}

impl ProcessStore {
    pub fn new() -> Arc<Self> {
        let (events_tx, _) = broadcast::channel(1024);
        Arc::new(Self { records: Mutex::new(HashMap::new()), events_tx })
    }

    /// A sender clone handed to each worker actor's [`crate::worker::WorkerDeps`].
    pub fn events(&self) -> broadcast::Sender<Event> {
        self.events_tx.clone()
    }

    /// Called by the Supervisor before spawning a worker's actor, so the
    /// store has a record even before the first event arrives.
    pub fn register(&self, config: WorkerConfig) {
        let name = config.name.clone();
        self.records.lock().insert(name, WorkerRecord::new(config));
    }

    pub fn forget(&self, name: &WorkerName) {
        self.records.lock().remove(name);
    }

    pub fn list(&self) -> Vec<WorkerName> {
        self.records.lock().keys().cloned().collect()
    }

    pub fn get(&self, name: &WorkerName) -> Option<WorkerRecord> {
        self.records.lock().get(name).cloned()
    }

    pub fn all(&self) -> Vec<WorkerRecord> {
        self.records.lock().values().cloned().collect()
    }

    pub fn configs(&self) -> Vec<WorkerConfig> {
        self.records.lock().values().map(|r| r.config.clone()).collect()
    }

    fn apply(&self, event: &Event) {
        let mut records = self.records.lock();
        let Some(record) = records.get_mut(event.worker_name()) else {
            debug!(worker = %event.worker_name(), "event for unregistered worker, dropping");
            return;
        };

        match event {
            Event::StatusChanged { to, .. } => {
                record.status = *to;
                record.running_since_epoch_ms =
                    if *to == WorkerStatus::Running { Some(epoch_ms()) } else { None };
            }
            Event::Spawned { pid, .. } => record.pids.push(*pid),
            Event::Exited { pid, .. } => record.pids.retain(|p| p != pid),
            Event::RestartScheduled { restart_count, .. } => record.restart_count = *restart_count,
            Event::ProbeFailed { .. } => {}
            Event::ReloadFailed { reason, .. } => record.last_error = Some(reason.clone()),
            Event::Deleted { .. } => {}
        }
    }

    /// Spawn the task that keeps this store's records in sync with the
    /// broadcast event stream. Returned handle is cooperatively cancelled
    /// by dropping the store (all senders go away, `recv` returns `Closed`).
    pub fn spawn_apply_loop(self: &Arc<Self>) -> JoinHandle<()> {
        let store = Arc::clone(self);
        let mut rx = store.events_tx.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => store.apply(&event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "process store lagged behind event stream");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
