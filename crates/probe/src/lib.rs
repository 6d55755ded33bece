// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A stateless liveness check: HTTP, TCP, or exec, each bounded by the
//! probe's configured timeout. Any error or timeout is reported as dead;
//! the caller (the worker's probe timer) accumulates consecutive
//! failures and decides when to restart.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::process::Command;
use tracing::debug;
use zpm_core::{ProbeConfig, ProbeKind};

/// Run one probe attempt and report alive/dead. Never returns an error —
/// any failure mode (connection refused, non-2xx/3xx/4xx status, process
/// exiting non-zero, or exceeding the timeout) simply yields `false`.
pub async fn check(probe: &ProbeConfig) -> bool {
    let timeout = probe.timeout();
    let outcome = tokio::time::timeout(timeout, run(&probe.kind)).await;
    match outcome {
        Ok(alive) => alive,
        Err(_) => {
            debug!(timeout_ms = timeout.as_millis() as u64, "probe timed out");
            false
        }
    }
}

async fn run(kind: &ProbeKind) -> bool {
    match kind {
        ProbeKind::Http { url } => check_http(url).await,
        ProbeKind::Tcp { host, port } => check_tcp(host, *port).await,
        ProbeKind::Exec { command } => check_exec(command).await,
    }
}

async fn check_http(url: &str) -> bool {
    match reqwest::get(url).await {
        Ok(response) => response.status().as_u16() < 500,
        Err(err) => {
            debug!(%err, url, "http probe failed");
            false
        }
    }
}

async fn check_tcp(host: &str, port: u16) -> bool {
    match TcpStream::connect((host, port)).await {
        Ok(mut stream) => {
            // Dropping immediately can race a half-open FIN on some
            // platforms; an explicit shutdown keeps the probe connection
            // well-behaved from the target's point of view.
            let _ = stream.shutdown().await;
            true
        }
        Err(err) => {
            debug!(%err, host, port, "tcp probe failed");
            false
        }
    }
}

async fn check_exec(command: &str) -> bool {
    let status = if cfg!(windows) {
        Command::new("cmd").args(["/C", command]).status().await
    } else {
        Command::new("sh").args(["-c", command]).status().await
    };
    match status {
        Ok(status) => status.success(),
        Err(err) => {
            debug!(%err, command, "exec probe failed to launch");
            false
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
