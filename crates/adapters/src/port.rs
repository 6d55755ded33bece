// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort freeing of a TCP port before spawning a worker, so a
//! leftover listener from a previous crash doesn't make the new spawn
//! fail with `EADDRINUSE`.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

#[async_trait]
pub trait PortFreer: Send + Sync {
    /// Attempt to kill whatever is listening on `port`. Never fails the
    /// caller — if nothing is listening, or the platform command isn't
    /// available, this is a no-op.
    async fn free_port(&self, port: u16);
}

/// `lsof` on Darwin, `fuser` on Linux, each best-effort. After killing a
/// listener, callers should wait a short settle period before spawning
/// (handled by the worker's spawn effect, not this adapter).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPortFreer;

#[async_trait]
impl PortFreer for SystemPortFreer {
    async fn free_port(&self, port: u16) {
        if cfg!(target_os = "macos") {
            free_port_darwin(port).await;
        } else if cfg!(target_os = "linux") {
            free_port_linux(port).await;
        } else {
            debug!(port, "port freeing is not implemented on this platform");
        }
    }
}

async fn free_port_darwin(port: u16) {
    let Ok(output) = tokio::process::Command::new("lsof")
        .args(["-ti", &format!(":{port}")])
        .output()
        .await
    else {
        return;
    };

    for pid in String::from_utf8_lossy(&output.stdout).lines() {
        let _ = tokio::process::Command::new("kill")
            .args(["-9", pid])
            .status()
            .await;
    }
}

async fn free_port_linux(port: u16) {
    let _ = tokio::process::Command::new("fuser")
        .args(["-k", &format!("{port}/tcp")])
        .status()
        .await;
}

/// Suggested settle time between killing a port's listener and spawning
/// the new child, matching the supervision engine's spawn sequencing.
pub const PORT_FREE_SETTLE: Duration = Duration::from_millis(800);

#[cfg(test)]
#[path = "port_tests.rs"]
mod tests;
