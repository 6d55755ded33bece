// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The vocabulary of side effects a worker's pure decision function can
//! request. The decision function itself never performs I/O; it returns
//! a `Vec<Effect>` that an async executor carries out and traces.

use std::time::Duration;

use crate::child::ExitStatus;
use crate::config::WorkerConfig;
use crate::event::Event;
use crate::timer::TimerKind;
use crate::worker_name::WorkerName;

fn millis(d: &Duration) -> u64 {
    d.as_millis() as u64
}

/// A side effect requested by the worker decision function.
///
/// Each variant names (via [`Effect::name`]) and fields (via
/// [`Effect::fields`]) itself for structured tracing, and marks (via
/// [`Effect::verbose`]) whether it is frequent enough that it should only
/// be logged at `debug` rather than `info`.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Spawn `config.instance_count()` child processes.
    SpawnChildren { config: WorkerConfig },
    /// Terminate all live children, softly first, then hard after `config.kill_timeout()`.
    TerminateChildren { name: WorkerName, timeout: Duration },
    /// Best-effort free the configured port before spawning.
    FreePort { port: u16 },
    /// Arm a named timer; any existing timer of the same kind is replaced.
    SetTimer {
        name: WorkerName,
        kind: TimerKind,
        delay: Duration,
    },
    /// Cancel a previously armed timer, if any.
    CancelTimer { name: WorkerName, kind: TimerKind },
    /// Run the configured reload command before a dev-mode restart.
    RunReloadCommand { name: WorkerName, command: String },
    /// Persist the current set of worker configurations.
    WriteSnapshot,
    /// Publish a domain event (log line + ProcessStore broadcast).
    Emit { event: Event },
}

impl Effect {
    /// A stable, lowercase identifier used as the tracing span/event name.
    pub fn name(&self) -> &'static str {
        match self {
            Effect::SpawnChildren { .. } => "spawn_children",
            Effect::TerminateChildren { .. } => "terminate_children",
            Effect::FreePort { .. } => "free_port",
            Effect::SetTimer { .. } => "set_timer",
            Effect::CancelTimer { .. } => "cancel_timer",
            Effect::RunReloadCommand { .. } => "run_reload_command",
            Effect::WriteSnapshot => "write_snapshot",
            Effect::Emit { .. } => "emit",
        }
    }

    /// Key/value pairs suitable for a `tracing` span, without requiring
    /// every caller to know the variant's shape.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Effect::SpawnChildren { config } => vec![
                ("worker", config.name.to_string()),
                ("instances", config.instance_count().to_string()),
            ],
            Effect::TerminateChildren { name, timeout } => vec![
                ("worker", name.to_string()),
                ("timeout_ms", millis(timeout).to_string()),
            ],
            Effect::FreePort { port } => vec![("port", port.to_string())],
            Effect::SetTimer { name, kind, delay } => vec![
                ("worker", name.to_string()),
                ("kind", kind.to_string()),
                ("delay_ms", millis(delay).to_string()),
            ],
            Effect::CancelTimer { name, kind } => {
                vec![("worker", name.to_string()), ("kind", kind.to_string())]
            }
            Effect::RunReloadCommand { name, command } => vec![
                ("worker", name.to_string()),
                ("command", command.clone()),
            ],
            Effect::WriteSnapshot => vec![],
            Effect::Emit { event } => vec![("event", event.name().to_string())],
        }
    }

    /// Whether this effect fires often enough that it belongs at `debug`
    /// rather than `info`. Snapshot writes happen on every mutation;
    /// everything else is a meaningful lifecycle transition.
    pub fn verbose(&self) -> bool {
        matches!(self, Effect::WriteSnapshot)
    }
}

/// The outcome of a crashed/exited child, fed back into the decision
/// function as a [`crate::WorkerMsg`]-shaped payload by the daemon.
#[derive(Debug, Clone, Copy)]
pub struct ChildExited {
    pub index: u32,
    pub uptime: Duration,
    pub status: ExitStatus,
}
