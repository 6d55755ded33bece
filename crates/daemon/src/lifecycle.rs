// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and shutdown: lock acquisition, adapter wiring, snapshot
//! restore, and the matching teardown on the way out.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use fs2::FileExt;
use thiserror::Error;
use tracing::{info, warn};

use zpm_adapters::{RecommendedFileWatcher, SystemPortFreer, SystemTerminator, SystemUsageReader};
use zpm_storage::SnapshotStore;

use crate::config::Config;
use crate::control_server::ControlServer;
use crate::supervisor::Supervisor;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to acquire lock at {0}: is another zpmd already running?")]
    LockFailed(PathBuf),
    #[error("failed to bind control socket at {0}: {1}")]
    BindFailed(PathBuf, #[source] std::io::Error),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] zpm_storage::SnapshotError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything kept alive for the lifetime of the process. The lock file
/// handle is never read after startup; it exists purely to hold the
/// exclusive lock until drop.
pub struct DaemonState {
    pub config: Config,
    #[allow(dead_code)]
    lock_file: std::fs::File,
    pub supervisor: Arc<Supervisor>,
}

/// Acquire the lock, wire the adapters, restore any snapshot, and bind the
/// control socket. On any failure after the lock is held, known-created
/// files are removed so the next attempt starts clean; a lock failure
/// itself leaves everything alone, since those files belong to whichever
/// daemon is still running.
pub async fn startup(config: Config) -> Result<(DaemonState, ControlServer), LifecycleError> {
    match startup_inner(config.clone()).await {
        Ok(result) => Ok(result),
        Err(err) => {
            if !matches!(err, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(&config);
            }
            Err(err)
        }
    }
}

async fn startup_inner(config: Config) -> Result<(DaemonState, ControlServer), LifecycleError> {
    fs::create_dir_all(&config.state_dir)?;
    fs::create_dir_all(&config.log_dir)?;
    if let Some(parent) = config.socket_path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Open (not truncate) so a losing contender never wipes the winner's
    // pid before discovering the lock is held.
    let lock_file = OpenOptions::new().write(true).create(true).truncate(false).open(&config.pid_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(|_| LifecycleError::LockFailed(config.pid_path.clone()))?;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    let snapshot = SnapshotStore::new(config.snapshot_path.clone());
    let supervisor = Supervisor::new(
        snapshot,
        Arc::new(SystemTerminator),
        Arc::new(SystemPortFreer),
        Arc::new(RecommendedFileWatcher),
        Arc::new(SystemUsageReader::new()),
    );

    let restored = supervisor.restore_from_snapshot().await?;
    info!(restored, "restored workers from snapshot");

    let control_server = ControlServer::bind(&config.socket_path, Arc::clone(&supervisor))
        .map_err(|err| LifecycleError::BindFailed(config.socket_path.clone(), err))?;

    Ok((DaemonState { config, lock_file, supervisor }, control_server))
}

impl DaemonState {
    /// Stop every worker, persist a final snapshot, and remove the files
    /// this process owns. The lock itself is released when `lock_file`
    /// drops at the end of `main`.
    pub async fn shutdown(&self, stop_timeout: std::time::Duration) {
        info!("shutting down");
        self.supervisor.stop_all(stop_timeout).await;

        let configs = self.supervisor.get_store().into_iter().map(|r| r.config).collect::<Vec<_>>();
        let snapshot = SnapshotStore::new(self.config.snapshot_path.clone());
        if let Err(err) = snapshot.save(&configs) {
            warn!(%err, "failed to save final snapshot on shutdown");
        }

        if self.config.socket_path.exists() {
            if let Err(err) = fs::remove_file(&self.config.socket_path) {
                warn!(%err, "failed to remove control socket on shutdown");
            }
        }
        if self.config.pid_path.exists() {
            if let Err(err) = fs::remove_file(&self.config.pid_path) {
                warn!(%err, "failed to remove pid file on shutdown");
            }
        }
        info!("shutdown complete");
    }
}

fn cleanup_on_failure(config: &Config) {
    if config.socket_path.exists() {
        let _ = fs::remove_file(&config.socket_path);
    }
    if config.pid_path.exists() {
        let _ = fs::remove_file(&config.pid_path);
    }
}
