// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dev-mode reload: recursively watch a directory and debounce bursts of
//! filesystem events into a single "something changed" notification.
//!
//! Grounded on the `notify::recommended_watcher` + channel-forwarding
//! pattern used for log tailing elsewhere in this workspace, generalized
//! to recursive watches and an explicit await-write-finish debounce
//! (the `notify` crate's own debouncer is a separate crate we don't
//! depend on; the debounce here is simple enough to own directly).

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::debug;

/// A directory's worth of filesystem activity settled into one event.
#[derive(Debug, Clone)]
pub struct FileWatchEvent {
    pub path: PathBuf,
}

#[async_trait]
pub trait FileWatcher: Send + Sync {
    /// Watch `root` recursively, debounced by `stability` with events
    /// polled at `poll_interval`, ignoring any path containing one of
    /// `ignore`. Returns a receiver that yields one [`FileWatchEvent`]
    /// per settled burst of changes; dropping the receiver stops the watch.
    fn watch(
        &self,
        root: &Path,
        ignore: &[&str],
        stability: Duration,
        poll_interval: Duration,
    ) -> notify::Result<mpsc::Receiver<FileWatchEvent>>;
}

pub struct RecommendedFileWatcher;

#[async_trait]
impl FileWatcher for RecommendedFileWatcher {
    fn watch(
        &self,
        root: &Path,
        ignore: &[&str],
        stability: Duration,
        poll_interval: Duration,
    ) -> notify::Result<mpsc::Receiver<FileWatchEvent>> {
        let (raw_tx, mut raw_rx) = mpsc::channel::<PathBuf>(256);
        let ignore: Vec<String> = ignore.iter().map(|s| s.to_string()).collect();

        let mut watcher = notify::recommended_watcher(move |res: Result<NotifyEvent, _>| {
            let Ok(event) = res else { return };
            if !matches!(
                event.kind,
                EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
            ) {
                return;
            }
            for path in event.paths {
                if ignore
                    .iter()
                    .any(|pat| path.components().any(|c| c.as_os_str() == pat.as_str()))
                {
                    continue;
                }
                let _ = raw_tx.blocking_send(path);
            }
        })?;
        watcher.watch(root, RecursiveMode::Recursive)?;

        let (settled_tx, settled_rx) = mpsc::channel::<FileWatchEvent>(16);
        tokio::spawn(async move {
            // Keep the watcher alive for the lifetime of the forwarding task;
            // it is dropped (and stops watching) when this task ends.
            let _watcher = watcher;
            let mut pending: Option<PathBuf> = None;
            loop {
                let recv = if pending.is_some() {
                    tokio::time::timeout(poll_interval, raw_rx.recv()).await
                } else {
                    Ok(raw_rx.recv().await)
                };

                match recv {
                    Ok(Some(path)) => pending = Some(path),
                    Ok(None) => break, // channel closed, watcher dropped
                    Err(_) => {
                        // No new events within poll_interval; if we've been
                        // quiet for `stability` since the last one, settle.
                        if let Some(path) = pending.take() {
                            tokio::time::sleep(stability.saturating_sub(poll_interval)).await;
                            if raw_rx.is_empty() {
                                if settled_tx
                                    .send(FileWatchEvent { path: path.clone() })
                                    .await
                                    .is_err()
                                {
                                    break;
                                }
                            } else {
                                pending = Some(path);
                            }
                        }
                    }
                }
            }
            debug!("file watcher forwarding task exiting");
        });

        Ok(settled_rx)
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
