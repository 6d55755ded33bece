// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level registry of workers. Operator commands land here, get
//! serialized per worker name, and are forwarded to the worker's actor.
//! Owns snapshot persistence: every mutation that changes the set of
//! registered workers requests a snapshot write.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex as SyncMutex;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

use zpm_adapters::{FileWatcher, PortFreer, Terminator, UsageReader};
use zpm_core::{WorkerConfig, WorkerName};
use zpm_storage::SnapshotStore;

use crate::log_bus::{self, LogLine};
use crate::protocol::{StoreRecord, WorkerStats};
use crate::store::ProcessStore;
use crate::worker::{spawn_worker_actor, WorkerDeps, WorkerHandle, WorkerMsg};

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("worker {0:?} already exists")]
    AlreadyExists(WorkerName),
    #[error("worker {0:?} not found")]
    NotFound(WorkerName),
}

pub struct Supervisor {
    handles: SyncMutex<HashMap<WorkerName, WorkerHandle>>,
    store: Arc<ProcessStore>,
    snapshot: Arc<SnapshotStore>,
    usage: Arc<dyn UsageReader>,
    terminator: Arc<dyn Terminator>,
    port_freer: Arc<dyn PortFreer>,
    file_watcher: Arc<dyn FileWatcher>,
    snapshot_tx: mpsc::Sender<()>,
    log_tx: broadcast::Sender<LogLine>,
}

impl Supervisor {
    pub fn new(
        snapshot: SnapshotStore,
        terminator: Arc<dyn Terminator>,
        port_freer: Arc<dyn PortFreer>,
        file_watcher: Arc<dyn FileWatcher>,
        usage: Arc<dyn UsageReader>,
    ) -> Arc<Self> {
        let store = ProcessStore::new();
        store.spawn_apply_loop();

        let snapshot = Arc::new(snapshot);
        let (snapshot_tx, mut snapshot_rx) = mpsc::channel::<()>(32);
        let supervisor_store = Arc::clone(&store);
        let supervisor_snapshot = Arc::clone(&snapshot);
        tokio::spawn(async move {
            while snapshot_rx.recv().await.is_some() {
                let configs = supervisor_store.configs();
                if let Err(err) = supervisor_snapshot.save(&configs) {
                    error!(%err, "failed to persist snapshot");
                }
            }
        });

        let (log_tx, _) = log_bus::channel();

        Arc::new(Self {
            handles: SyncMutex::new(HashMap::new()),
            store,
            snapshot,
            usage,
            terminator,
            port_freer,
            file_watcher,
            snapshot_tx,
            log_tx,
        })
    }

    fn deps(&self) -> WorkerDeps {
        WorkerDeps {
            terminator: Arc::clone(&self.terminator),
            port_freer: Arc::clone(&self.port_freer),
            file_watcher: Arc::clone(&self.file_watcher),
            events: self.store.events(),
            request_snapshot: self.snapshot_tx.clone(),
            log_tx: self.log_tx.clone(),
        }
    }

    /// Subscribe to the live stdout/stderr fan-out, for a `logs` request.
    pub fn subscribe_logs(&self) -> broadcast::Receiver<LogLine> {
        self.log_tx.subscribe()
    }

    /// Start a worker under `config.name`. If a worker by that name already
    /// exists and is sitting in a terminal state (stopped, crashed,
    /// errored), its actor is reused and sent `Start` rather than rejected
    /// -- the same name can be `start()`ed again after it has fully wound
    /// down, matching what `stop()` followed by `start()` does for an
    /// operator driving the CLI.
    pub async fn start(&self, config: WorkerConfig) -> Result<(), SupervisorError> {
        let name = config.name.clone();
        let existing = self.handles.lock().get(&name).cloned();

        if let Some(handle) = existing {
            let is_terminal = self
                .store
                .get(&name)
                .map(|record| record.status.is_terminal())
                .unwrap_or(true);
            if !is_terminal {
                return Err(SupervisorError::AlreadyExists(name));
            }
            self.store.register(config);
            handle.send(WorkerMsg::Start).await;
            return Ok(());
        }

        self.store.register(config.clone());
        let handle = spawn_worker_actor(config, self.deps());
        handle.send(WorkerMsg::Start).await;
        self.handles.lock().insert(name, handle);
        Ok(())
    }

    pub async fn stop(&self, name: &WorkerName) -> Result<(), SupervisorError> {
        let handle = self.handle(name)?;
        handle.send(WorkerMsg::Stop).await;
        Ok(())
    }

    pub async fn restart(&self, name: &WorkerName) -> Result<(), SupervisorError> {
        let handle = self.handle(name)?;
        handle.send(WorkerMsg::Restart).await;
        Ok(())
    }

    pub async fn delete(&self, name: &WorkerName) -> Result<(), SupervisorError> {
        let handle = self.handle(name)?;
        handle.send(WorkerMsg::Stop).await;
        self.handles.lock().remove(name);
        self.store.forget(name);
        let _ = self.snapshot_tx.send(()).await;
        Ok(())
    }

    pub fn list(&self) -> Vec<WorkerName> {
        self.store.list()
    }

    pub fn get_store(&self) -> Vec<StoreRecord> {
        self.store
            .all()
            .into_iter()
            .map(|r| StoreRecord { config: r.config, status: r.status, restart_count: r.restart_count })
            .collect()
    }

    pub async fn stats(&self, name: Option<&WorkerName>) -> Vec<WorkerStats> {
        let records = match name {
            Some(name) => self.store.get(name).into_iter().collect(),
            None => self.store.all(),
        };

        let mut out = Vec::with_capacity(records.len());
        for record in records {
            let mut cpu_percent = 0.0;
            let mut rss_bytes = 0;
            for pid in &record.pids {
                if let Some(usage) = self.usage.usage(*pid) {
                    cpu_percent += usage.cpu_percent;
                    rss_bytes += usage.rss_bytes;
                }
            }
            out.push(WorkerStats {
                name: record.config.name.clone(),
                status: record.status,
                pids: record.pids,
                instances: record.config.instance_count(),
                restart_count: record.restart_count,
                uptime_ms: record.running_since_epoch_ms.map(|since| now_epoch_ms().saturating_sub(since)),
                cpu_percent,
                rss_bytes,
                last_error: record.last_error,
            });
        }
        out
    }

    /// Load the snapshot (if any) and start every worker it names, logging
    /// and skipping any single worker's restore failure rather than
    /// aborting the whole boot sequence.
    pub async fn restore_from_snapshot(&self) -> Result<usize, zpm_storage::SnapshotError> {
        let Some(snapshot) = self.snapshot.load()? else {
            return Ok(0);
        };

        let mut restored = 0;
        for config in snapshot.workers {
            let name = config.name.clone();
            match self.start(config).await {
                Ok(()) => restored += 1,
                Err(err) => warn!(worker = %name, %err, "failed to restore worker from snapshot"),
            }
        }
        info!(restored, "restored workers from snapshot");
        Ok(restored)
    }

    /// Stop every worker concurrently and wait for each to reach a
    /// terminal state, up to `timeout` in aggregate, for use on daemon
    /// shutdown. A worker that hasn't settled by the deadline is left
    /// stopping in the background rather than blocking shutdown forever.
    pub async fn stop_all(&self, timeout: Duration) {
        let names: Vec<WorkerName> = self.handles.lock().keys().cloned().collect();
        for name in &names {
            if let Ok(handle) = self.handle(name) {
                handle.send(WorkerMsg::Stop).await;
            }
        }

        let mut waits = tokio::task::JoinSet::new();
        for name in names {
            let store = Arc::clone(&self.store);
            waits.spawn(async move {
                loop {
                    let settled = store.get(&name).map(|r| r.status.is_terminal()).unwrap_or(true);
                    if settled {
                        return;
                    }
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
            });
        }

        if tokio::time::timeout(timeout, waits.join_all()).await.is_err() {
            warn!("timed out waiting for all workers to stop");
        }
    }

    fn handle(&self, name: &WorkerName) -> Result<WorkerHandle, SupervisorError> {
        self.handles.lock().get(name).cloned().ok_or_else(|| SupervisorError::NotFound(name.clone()))
    }
}

fn now_epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
