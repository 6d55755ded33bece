// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task that owns one worker's mutable state, its real child process
//! handles, and its timers. Everything here is the async shell around the
//! pure [`decide`] function: receive a message, call `decide`, execute the
//! resulting effects, repeat.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};

use zpm_adapters::{FileWatcher, PortFreer, Terminator};
use zpm_core::{
    ChildExited, ChildHandle, Effect, Event, ExitStatus, TimerKind, WorkerConfig, WorkerName, WorkerStatus,
};
use zpm_probe as probe;

use crate::log_bus::{LogLine, LogStream};

use super::decision::{decide, WorkerMsg};
use super::spawn::spawn_one;
use super::state::WorkerRuntime;

/// Shared collaborators every worker actor needs, owned by the Supervisor
/// and cloned (cheaply, behind `Arc`) into each actor it spawns.
#[derive(Clone)]
pub struct WorkerDeps {
    pub terminator: Arc<dyn Terminator>,
    pub port_freer: Arc<dyn PortFreer>,
    pub file_watcher: Arc<dyn FileWatcher>,
    pub events: broadcast::Sender<Event>,
    /// Invoked after every effect batch that mutates persisted state;
    /// writes the full worker-config snapshot (owned by the Supervisor,
    /// since one worker's actor doesn't know about its siblings).
    pub request_snapshot: mpsc::Sender<()>,
    /// Fan-out for child stdout/stderr lines, read by `logs` subscribers
    /// on the control socket.
    pub log_tx: broadcast::Sender<LogLine>,
}

/// A handle the Supervisor keeps to talk to a running worker actor.
#[derive(Clone)]
pub struct WorkerHandle {
    pub name: WorkerName,
    tx: mpsc::Sender<WorkerMsg>,
}

impl WorkerHandle {
    pub async fn send(&self, msg: WorkerMsg) {
        if self.tx.send(msg).await.is_err() {
            error!(worker = %self.name, "worker actor inbox closed");
        }
    }
}

/// How long the dev-mode file watcher waits for a burst of edits to settle
/// before firing a single reload, and how often it polls for quiet (spec
/// §4.1 "await-write-finish" debounce).
const DEV_RELOAD_STABILITY: Duration = Duration::from_millis(1500);
const DEV_RELOAD_POLL: Duration = Duration::from_millis(500);

/// Spawn the actor task and return a handle to it.
pub fn spawn_worker_actor(config: WorkerConfig, deps: WorkerDeps) -> WorkerHandle {
    let name = config.name.clone();
    let (tx, rx) = mpsc::channel(64);

    if config.dev_mode {
        spawn_dev_watch(&config, deps.file_watcher.clone(), tx.clone());
    }

    let (timer_tx, timer_rx) = mpsc::channel(8);
    let actor = WorkerActor {
        state: WorkerRuntime::new(config),
        children: HashMap::new(),
        timers: HashMap::new(),
        timer_tx,
        timer_rx,
        inbox: rx,
        deps,
    };
    tokio::spawn(actor.run());
    WorkerHandle { name, tx }
}

/// Watch the worker's project directory and forward settled changes as
/// `ReloadTriggered` messages for as long as the actor's inbox is alive.
fn spawn_dev_watch(config: &WorkerConfig, watcher: Arc<dyn FileWatcher>, tx: mpsc::Sender<WorkerMsg>) {
    let project_root = super::spawn::discover_project_root(&config.script_path);
    let src_root = project_root.join("src");
    let root = if src_root.is_dir() { src_root } else { project_root };
    let ignore = ["node_modules", ".git", "target"];
    let watch_result = watcher.watch(&root, &ignore, DEV_RELOAD_STABILITY, DEV_RELOAD_POLL);

    match watch_result {
        Ok(mut events) => {
            tokio::spawn(async move {
                while events.recv().await.is_some() {
                    if tx.send(WorkerMsg::ReloadTriggered).await.is_err() {
                        break;
                    }
                }
            });
        }
        Err(err) => error!(worker = %config.name, %err, "failed to start dev-mode file watcher"),
    }
}

struct WorkerActor {
    state: WorkerRuntime,
    /// Instance slot -> pid of the live child there. Just enough identity
    /// to ask a `Terminator` to end it; the owning `Child` itself lives on
    /// the `exits` JoinSet's future until it's reaped.
    children: HashMap<u32, u32>,
    timers: HashMap<TimerKind, CancellationToken>,
    /// Fires when an armed timer's delay elapses without being cancelled
    /// first. A second channel rather than re-using `inbox` keeps the
    /// mapping from `TimerKind` to `WorkerMsg` (and the probe tick's
    /// self-rearming) out of the pure decision function.
    timer_tx: mpsc::Sender<TimerKind>,
    timer_rx: mpsc::Receiver<TimerKind>,
    inbox: mpsc::Receiver<WorkerMsg>,
    deps: WorkerDeps,
}

impl WorkerActor {
    async fn run(mut self) {
        let mut exits: JoinSet<(u32, Duration, ExitStatus)> = JoinSet::new();

        loop {
            tokio::select! {
                msg = self.inbox.recv() => {
                    match msg {
                        Some(msg) => self.step(msg, &mut exits).await,
                        None => break,
                    }
                }
                Some(result) = exits.join_next() => {
                    if let Ok((index, uptime, status)) = result {
                        // `None` means the stop-safety timeout already force-cleared
                        // this index; the child finally exiting now is stale news
                        // about a generation the decision function has moved past.
                        if self.children.remove(&index).is_none() {
                            warn!(worker = %self.state.config.name, index, "ignoring exit for already-cleared child");
                            continue;
                        }
                        self.step(
                            WorkerMsg::ChildExited {
                                exited: ChildExited { index, uptime, status },
                                now_epoch_ms: epoch_ms(),
                            },
                            &mut exits,
                        )
                        .await;
                    }
                }
                Some(kind) = self.timer_rx.recv() => {
                    self.timer_fired(kind, &mut exits).await;
                }
            }
        }
    }

    async fn step(&mut self, msg: WorkerMsg, exits: &mut JoinSet<(u32, Duration, ExitStatus)>) {
        let (next, effects) = decide(&self.state, msg, epoch_ms());
        self.state = next;
        for effect in effects {
            self.apply(effect, exits).await;
        }
    }

    /// A previously armed timer elapsed. Translate it into the matching
    /// `WorkerMsg` for the decision function, except the probe tick, which
    /// runs the probe itself (an I/O effect the decision function never
    /// performs) and re-arms its own next tick on completion.
    async fn timer_fired(&mut self, kind: TimerKind, exits: &mut JoinSet<(u32, Duration, ExitStatus)>) {
        self.timers.remove(&kind);
        match kind {
            TimerKind::Restart => self.step(WorkerMsg::RestartTimerFired, exits).await,
            TimerKind::Stability => self.step(WorkerMsg::StabilityElapsed, exits).await,
            TimerKind::Probe => self.run_probe(exits).await,
            TimerKind::ReloadDebounce => {
                // The file watcher adapter owns its own await-write-finish
                // debounce; the worker never arms this kind itself.
            }
            TimerKind::StopSafety => {
                // Children never delivered their exit events in time (e.g.
                // wedged in uninterruptible sleep, surviving SIGKILL).
                // Forget about them locally too, so a late exit for one of
                // these indices is recognized as stale rather than routed
                // into the next generation's state.
                self.children.clear();
                self.step(WorkerMsg::StopSafetyElapsed, exits).await;
            }
        }
    }

    async fn apply(&mut self, effect: Effect, exits: &mut JoinSet<(u32, Duration, ExitStatus)>) {
        let span = info_span!("effect", name = effect.name());
        for (key, value) in effect.fields() {
            span.record(key, tracing::field::display(value));
        }
        let verbose = effect.verbose();

        async {
            if verbose {
                tracing::debug!("applying effect");
            } else {
                info!("applying effect");
            }
            self.apply_inner(effect, exits).await;
        }
        .instrument(span)
        .await;
    }

    async fn apply_inner(&mut self, effect: Effect, exits: &mut JoinSet<(u32, Duration, ExitStatus)>) {
        match effect {
            Effect::SpawnChildren { config } => self.spawn_children(config, exits).await,
            Effect::TerminateChildren { timeout, .. } => self.terminate_children(timeout).await,
            Effect::FreePort { port } => {
                self.deps.port_freer.free_port(port).await;
                tokio::time::sleep(zpm_adapters::port::PORT_FREE_SETTLE).await;
            }
            Effect::SetTimer { kind, delay, .. } => self.set_timer(kind, delay),
            Effect::CancelTimer { kind, .. } => {
                if let Some(token) = self.timers.remove(&kind) {
                    token.cancel();
                }
            }
            Effect::RunReloadCommand { command, .. } => self.run_reload_command(command, exits).await,
            Effect::WriteSnapshot => {
                let _ = self.deps.request_snapshot.send(()).await;
            }
            Effect::Emit { event } => {
                let _ = self.deps.events.send(event);
            }
        }
    }

    async fn spawn_children(&mut self, config: WorkerConfig, exits: &mut JoinSet<(u32, Duration, ExitStatus)>) {
        if let Some(port) = config.port {
            self.deps.port_freer.free_port(port).await;
            tokio::time::sleep(zpm_adapters::port::PORT_FREE_SETTLE).await;
        }

        let instance_count = config.instance_count();
        let mut spawned_any = false;
        let mut last_error = None;

        for index in 0..instance_count {
            match spawn_one(&config, index) {
                Ok(mut child) => {
                    spawned_any = true;
                    let pid = child.id().unwrap_or(0);
                    self.children.insert(index, pid);
                    forward_stdio(&mut child, config.name.clone(), self.deps.log_tx.clone());

                    let name = config.name.clone();
                    exits.spawn(async move {
                        let started = tokio::time::Instant::now();
                        let status = child.wait().await;
                        let uptime = started.elapsed();
                        let status = match status {
                            Ok(status) => ExitStatus {
                                code: status.code(),
                                #[cfg(unix)]
                                signal: std::os::unix::process::ExitStatusExt::signal(&status),
                                #[cfg(not(unix))]
                                signal: None,
                            },
                            Err(err) => {
                                error!(worker = %name, %err, "failed to wait on child");
                                ExitStatus { code: None, signal: None }
                            }
                        };
                        (index, uptime, status)
                    });

                    self.step(
                        WorkerMsg::ChildSpawned {
                            handle: ChildHandle {
                                pid,
                                index,
                                started_at_epoch_ms: epoch_ms(),
                            },
                        },
                        exits,
                    )
                    .await;
                }
                Err(err) => last_error = Some(err.to_string()),
            }
        }

        if !spawned_any {
            self.step(
                WorkerMsg::SpawnFailed {
                    reason: last_error.unwrap_or_else(|| "no instances spawned".to_string()),
                },
                exits,
            )
            .await;
        }
    }

    async fn terminate_children(&mut self, timeout: Duration) {
        let pids: Vec<u32> = self.children.values().copied().collect();
        let terminator = self.deps.terminator.clone();
        let hard_deadline = tokio::time::Instant::now() + Duration::from_secs(10);

        for pid in pids {
            let terminator = terminator.clone();
            let remaining = hard_deadline.saturating_duration_since(tokio::time::Instant::now());
            let bounded = remaining.min(timeout);
            terminator.terminate(pid, bounded).await;
        }
    }

    /// Cancel whatever was previously armed for `kind`, then spawn a task
    /// that races the replacement token's cancellation against `delay` and
    /// reports back over `timer_tx` if the sleep wins.
    fn set_timer(&mut self, kind: TimerKind, delay: Duration) {
        if let Some(existing) = self.timers.remove(&kind) {
            existing.cancel();
        }
        let token = CancellationToken::new();
        self.timers.insert(kind, token.clone());

        let timer_tx = self.timer_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = timer_tx.send(kind).await;
                }
            }
        });
    }

    async fn run_probe(&mut self, exits: &mut JoinSet<(u32, Duration, ExitStatus)>) {
        let Some(probe_config) = self.state.config.probe.clone() else {
            return;
        };
        let alive = probe::check(&probe_config).await;
        self.step(WorkerMsg::ProbeResult { alive }, exits).await;

        if self.state.status == WorkerStatus::Running {
            self.set_timer(TimerKind::Probe, probe_config.interval());
        }
    }

    async fn run_reload_command(&mut self, command: String, exits: &mut JoinSet<(u32, Duration, ExitStatus)>) {
        let status = tokio::process::Command::new("sh")
            .args(["-c", &command])
            .status()
            .await;
        let success = status.map(|s| s.success()).unwrap_or(false);
        self.step(WorkerMsg::ReloadCommandFinished { success }, exits).await;
    }
}

fn forward_stdio(child: &mut Child, name: WorkerName, log_tx: broadcast::Sender<LogLine>) {
    if let Some(stdout) = child.stdout.take() {
        let name = name.clone();
        let log_tx = log_tx.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(worker = %name, stream = "stdout", "{line}");
                let _ = log_tx.send(LogLine { worker: name.clone(), stream: LogStream::Stdout, line });
            }
        });
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                warn!(worker = %name, stream = "stderr", "{line}");
                let _ = log_tx.send(LogLine { worker: name.clone(), stream: LogStream::Stderr, line });
            }
        });
    }
}

fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
