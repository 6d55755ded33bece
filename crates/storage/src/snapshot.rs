// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic read/write of the worker-configuration snapshot file.
//!
//! Writes go to a `.tmp` sibling and are renamed into place so a reader
//! never observes a partially written file; the previous snapshot is
//! rotated into `.bak` / `.bak.2` / `.bak.3` before being overwritten.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zpm_core::WorkerConfig;

/// Current snapshot schema version. Bump when `WorkerConfig`'s shape
/// changes in a way readers need to branch on; today every field is
/// `#[serde(default)]` so old and new snapshots both deserialize.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The full on-disk contents of the snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "v")]
    pub version: u32,
    pub workers: Vec<WorkerConfig>,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(workers: Vec<WorkerConfig>) -> Self {
        Self {
            version: CURRENT_SNAPSHOT_VERSION,
            workers,
            created_at: Utc::now(),
        }
    }
}

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups: `.bak`, `.bak.2`, `.bak.3`.
/// The oldest backup is removed when the limit is reached.
fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }

    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

/// Owns the snapshot file path and serializes concurrent writers.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `workers` to the snapshot file, rotating any existing file
    /// into the backup chain first. Uses a temp-file-then-rename so a
    /// crash mid-write never leaves a truncated snapshot on disk.
    pub fn save(&self, workers: &[WorkerConfig]) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let snapshot = Snapshot::new(workers.to_vec());
        let body = serde_json::to_vec_pretty(&snapshot)?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, &body)?;

        if self.path.exists() {
            let bak_path = rotate_bak_path(&self.path);
            fs::rename(&self.path, bak_path)?;
        }

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Load the snapshot file, if it exists. A missing file is not an
    /// error — a fresh daemon has no prior state to restore.
    pub fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let body = fs::read(&self.path)?;
        let snapshot: Snapshot = serde_json::from_slice(&body)?;
        Ok(Some(snapshot))
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
