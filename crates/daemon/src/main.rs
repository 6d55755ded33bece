// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `zpmd` — the supervisor daemon. Binds the control socket, restores any
//! prior snapshot, and runs until SIGTERM/SIGINT, at which point it stops
//! every worker, writes a final snapshot, and removes its own socket and
//! pid files before exiting.

mod config;
mod control_server;
mod lifecycle;
mod log_bus;
mod protocol;
mod store;
mod supervisor;
mod worker;

use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Upper bound on how long shutdown waits for workers to settle before
/// giving up and exiting anyway.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    let config = config::Config::from_env();
    let _log_guard = init_tracing(&config);

    info!(socket = %config.socket_path.display(), "starting zpmd");

    let (daemon, control_server) = match lifecycle::startup(config).await {
        Ok(started) => started,
        Err(err) => {
            error!(%err, "failed to start daemon");
            std::process::exit(1);
        }
    };

    tokio::spawn(control_server.run());

    wait_for_shutdown_signal().await;

    daemon.shutdown(SHUTDOWN_TIMEOUT).await;
}

/// Holds the non-blocking file writer's flush guard alive for the process
/// lifetime in production mode; dev mode logs straight to the console and
/// needs nothing kept around.
enum LogGuard {
    Console,
    File(tracing_appender::non_blocking::WorkerGuard),
}

/// Dev mode logs to the console, matching the teacher's default. Production
/// mode writes to a daily-rotating file under `config.log_dir` instead, so
/// a daemon launched detached (stdio discarded, see `zpm-cli`'s
/// `daemon_process::start_daemon_background`) still has somewhere for its
/// structured logs to land.
fn init_tracing(config: &config::Config) -> LogGuard {
    let filter = EnvFilter::try_from_env("ZPM_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    if config.dev_mode {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return LogGuard::Console;
    }

    if let Err(err) = std::fs::create_dir_all(&config.log_dir) {
        eprintln!("failed to create log directory {}: {err}", config.log_dir.display());
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return LogGuard::Console;
    }

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "zpmd.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    LogGuard::File(guard)
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let term = signal(SignalKind::terminate());
    let int = signal(SignalKind::interrupt());
    let (mut term, mut int) = match (term, int) {
        (Ok(term), Ok(int)) => (term, int),
        (res_term, res_int) => {
            error!("failed to install signal handlers, falling back to ctrl-c only");
            let _ = (res_term, res_int);
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = term.recv() => info!("received SIGTERM"),
        _ = int.recv() => info!("received SIGINT"),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("received ctrl-c");
}
