// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pure worker transition function. `decide` takes the current
//! runtime state and an input message and returns the next state plus
//! the effects an executor should carry out — no I/O happens here, which
//! is what makes the whole lifecycle table unit-testable without a real
//! child process, socket, or clock.

use zpm_core::config::{STABILITY_WINDOW_MS, STOP_SAFETY_TIMEOUT_MS};
use zpm_core::{ChildExited, ChildHandle, Effect, Event, TimerKind, WorkerName, WorkerStatus};

use super::state::WorkerRuntime;

/// Inputs the worker actor feeds into [`decide`]. Everything that isn't a
/// pure function of prior state (wall-clock reads, pids, whether a probe
/// succeeded) arrives here as a value rather than being looked up inside
/// the decision function.
#[derive(Debug, Clone)]
pub enum WorkerMsg {
    /// Operator requested `start()`.
    Start,
    /// Operator requested `stop()`.
    Stop,
    /// Operator requested `restart()`.
    Restart,
    /// A child finished spawning successfully.
    ChildSpawned { handle: ChildHandle },
    /// Every requested child failed to spawn (e.g. script missing).
    SpawnFailed { reason: String },
    /// One child exited.
    ChildExited { exited: ChildExited, now_epoch_ms: u64 },
    /// The backoff timer fired; time to respawn.
    RestartTimerFired,
    /// The stability window elapsed while still `Running`.
    StabilityElapsed,
    /// A liveness probe attempt completed.
    ProbeResult { alive: bool },
    /// The dev-mode file watcher observed a settled change.
    ReloadTriggered,
    /// The configured reload command finished.
    ReloadCommandFinished { success: bool },
    /// The hard stop-safety timeout elapsed while still `Stopping`.
    StopSafetyElapsed,
}

/// Advance `state` by one message, returning the new state and the
/// effects the executor must perform. `now_epoch_ms` is the wall-clock
/// reading to stamp `start_time_epoch_ms` with on a transition into
/// `Running`; it is unused for messages that don't need it.
pub fn decide(state: &WorkerRuntime, msg: WorkerMsg, now_epoch_ms: u64) -> (WorkerRuntime, Vec<Effect>) {
    let mut next = state.clone();
    let name = next.config.name.clone();

    match msg {
        WorkerMsg::Start => start(&mut next, name),
        WorkerMsg::Stop => stop(&mut next, name),
        WorkerMsg::Restart => restart(&mut next, name),
        WorkerMsg::ChildSpawned { handle } => child_spawned(&mut next, name, handle, now_epoch_ms),
        WorkerMsg::SpawnFailed { reason } => spawn_failed(&mut next, name, reason),
        WorkerMsg::ChildExited { exited, now_epoch_ms } => {
            child_exited(&mut next, name, exited, now_epoch_ms)
        }
        WorkerMsg::RestartTimerFired => restart_timer_fired(&mut next, name),
        WorkerMsg::StabilityElapsed => stability_elapsed(&mut next),
        WorkerMsg::ProbeResult { alive } => probe_result(&mut next, name, alive),
        WorkerMsg::ReloadTriggered => reload_triggered(&mut next, name),
        WorkerMsg::ReloadCommandFinished { success } => {
            reload_command_finished(&mut next, name, success)
        }
        WorkerMsg::StopSafetyElapsed => stop_safety_elapsed(&mut next, name),
    }
}

fn transition(state: &mut WorkerRuntime, name: WorkerName, to: WorkerStatus) -> Effect {
    let from = state.status;
    state.status = to;
    Effect::Emit {
        event: Event::StatusChanged { name, from, to },
    }
}

fn start(state: &mut WorkerRuntime, name: WorkerName) -> (WorkerRuntime, Vec<Effect>) {
    if !matches!(
        state.status,
        WorkerStatus::Stopped | WorkerStatus::Crashed | WorkerStatus::Errored
    ) {
        // Already active; caller (`Supervisor::start`) is responsible for
        // rejecting this before it ever reaches the decision function, but
        // decide stays defensive and is a no-op rather than asserting.
        return (state.clone(), vec![]);
    }

    state.reset_backoff();
    state.last_error = None;
    let status_effect = transition(state, name.clone(), WorkerStatus::Starting);

    (
        state.clone(),
        vec![
            status_effect,
            Effect::SpawnChildren {
                config: state.config.clone(),
            },
            Effect::WriteSnapshot,
        ],
    )
}

fn stop(state: &mut WorkerRuntime, name: WorkerName) -> (WorkerRuntime, Vec<Effect>) {
    if state.status == WorkerStatus::Stopped {
        return (state.clone(), vec![]);
    }

    let status_effect = transition(state, name.clone(), WorkerStatus::Stopping);
    let mut effects = vec![
        status_effect,
        Effect::CancelTimer { name: name.clone(), kind: TimerKind::Restart },
        Effect::CancelTimer { name: name.clone(), kind: TimerKind::Stability },
        Effect::CancelTimer { name: name.clone(), kind: TimerKind::Probe },
    ];
    if !state.children.is_empty() {
        effects.push(Effect::SetTimer {
            name: name.clone(),
            kind: TimerKind::StopSafety,
            delay: std::time::Duration::from_millis(STOP_SAFETY_TIMEOUT_MS),
        });
        effects.push(Effect::TerminateChildren {
            name,
            timeout: state.config.kill_timeout(),
        });
    } else {
        state.status = WorkerStatus::Stopped;
    }
    (state.clone(), effects)
}

fn restart(state: &mut WorkerRuntime, name: WorkerName) -> (WorkerRuntime, Vec<Effect>) {
    state.is_restarting = true;
    let status_effect = transition(state, name.clone(), WorkerStatus::Stopping);
    let mut effects = vec![
        status_effect,
        Effect::CancelTimer { name: name.clone(), kind: TimerKind::Restart },
        Effect::CancelTimer { name: name.clone(), kind: TimerKind::Stability },
    ];
    if state.children.is_empty() {
        // Nothing to drain; re-enter the spawn path immediately.
        state.is_restarting = false;
        let starting_effect = transition(state, name.clone(), WorkerStatus::Starting);
        effects.push(starting_effect);
        effects.push(Effect::SpawnChildren {
            config: state.config.clone(),
        });
    } else {
        effects.push(Effect::SetTimer {
            name: name.clone(),
            kind: TimerKind::StopSafety,
            delay: std::time::Duration::from_millis(STOP_SAFETY_TIMEOUT_MS),
        });
        effects.push(Effect::TerminateChildren {
            name,
            timeout: state.config.kill_timeout(),
        });
    }
    (state.clone(), effects)
}

fn child_spawned(
    state: &mut WorkerRuntime,
    name: WorkerName,
    handle: ChildHandle,
    now_epoch_ms: u64,
) -> (RuntimeAndEffects) {
    state.children.push(handle);
    let mut effects = vec![Effect::Emit {
        event: Event::Spawned {
            name: name.clone(),
            pid: handle.pid,
            index: handle.index,
        },
    }];

    let expected = state.config.instance_count() as usize;
    if state.status == WorkerStatus::Starting && state.children.len() >= expected {
        state.start_time_epoch_ms = Some(now_epoch_ms);
        effects.push(transition(state, name.clone(), WorkerStatus::Running));
        effects.push(Effect::SetTimer {
            name: name.clone(),
            kind: TimerKind::Stability,
            delay: std::time::Duration::from_millis(STABILITY_WINDOW_MS),
        });
        if let Some(probe) = state.config.probe.clone() {
            effects.push(Effect::SetTimer {
                name,
                kind: TimerKind::Probe,
                delay: probe.interval(),
            });
        }
    }

    (state.clone(), effects)
}

fn spawn_failed(state: &mut WorkerRuntime, name: WorkerName, reason: String) -> (RuntimeAndEffects) {
    state.last_error = Some(reason);
    let is_missing_script = !state.config.script_path.exists();
    let to = if is_missing_script {
        WorkerStatus::Errored
    } else {
        WorkerStatus::Stopped
    };
    let effect = transition(state, name, to);
    (state.clone(), vec![effect])
}

fn child_exited(
    state: &mut WorkerRuntime,
    name: WorkerName,
    exited: ChildExited,
    now_epoch_ms: u64,
) -> (RuntimeAndEffects) {
    let exited_pid = state
        .children
        .iter()
        .find(|c| c.index == exited.index)
        .map(|c| c.pid)
        .unwrap_or(0);
    state.children.retain(|c| c.index != exited.index);

    let mut effects = vec![Effect::Emit {
        event: Event::Exited {
            name: name.clone(),
            pid: exited_pid,
            code: exited.status.code,
            signal: exited.status.signal,
        },
    }];

    if state.status == WorkerStatus::Stopping {
        if state.children.is_empty() {
            effects.push(Effect::CancelTimer { name: name.clone(), kind: TimerKind::StopSafety });
            if state.is_restarting {
                state.is_restarting = false;
                effects.push(transition(state, name.clone(), WorkerStatus::Starting));
                effects.push(Effect::SpawnChildren {
                    config: state.config.clone(),
                });
            } else if state.draining_after_crash {
                state.draining_after_crash = false;
                effects.extend(schedule_crash_restart(state, name));
            } else {
                effects.push(transition(state, name, WorkerStatus::Stopped));
            }
        }
        return (state.clone(), effects);
    }

    if exited.status.success() {
        // Intentional single-instance exit outside of an operator stop is
        // not modeled as a crash; treat it the same as a clean stop of
        // that instance. If it was the last child, the worker is done.
        if state.children.is_empty() {
            effects.push(transition(state, name, WorkerStatus::Stopped));
        }
        return (state.clone(), effects);
    }

    if WorkerRuntime::is_fast_fail(exited.uptime.as_millis() as u64) {
        state.last_error = Some("fast-fail".to_string());
    }

    if !state.children.is_empty() {
        // Cluster mode: surviving siblings must be drained before the
        // backoff restart respawns every instance, or `restart_timer_fired`
        // would overwrite their tracked pids with the new generation's and
        // orphan them (they'd never be terminated).
        state.draining_after_crash = true;
        effects.push(transition(state, name.clone(), WorkerStatus::Stopping));
        effects.push(Effect::SetTimer {
            name: name.clone(),
            kind: TimerKind::StopSafety,
            delay: std::time::Duration::from_millis(STOP_SAFETY_TIMEOUT_MS),
        });
        effects.push(Effect::TerminateChildren {
            name,
            timeout: state.config.kill_timeout(),
        });
        return (state.clone(), effects);
    }

    effects.extend(schedule_crash_restart(state, name));
    (state.clone(), effects)
}

/// Transition to `Crashed` and arm the backoff restart timer. Shared by the
/// single-instance crash path and the cluster-mode path once every
/// surviving sibling has been drained.
fn schedule_crash_restart(state: &mut WorkerRuntime, name: WorkerName) -> Vec<Effect> {
    let status_effect = transition(state, name.clone(), WorkerStatus::Crashed);
    vec![
        status_effect,
        Effect::SetTimer {
            name: name.clone(),
            kind: TimerKind::Restart,
            delay: std::time::Duration::from_millis(state.backoff_ms),
        },
        Effect::Emit {
            event: Event::RestartScheduled {
                name,
                delay_ms: state.backoff_ms,
                restart_count: state.restart_count,
            },
        },
    ]
}

/// The hard stop-safety timeout elapsed: force `Stopped` and forget about
/// whatever children are still tracked, regardless of whether they've
/// actually exited. Only meaningful while `Stopping`; a no-op otherwise
/// (the timer is cancelled on every other path out of `Stopping`).
fn stop_safety_elapsed(state: &mut WorkerRuntime, name: WorkerName) -> (RuntimeAndEffects) {
    if state.status != WorkerStatus::Stopping {
        return (state.clone(), vec![]);
    }

    state.children.clear();
    state.is_restarting = false;
    state.draining_after_crash = false;
    state.last_error = Some("forced to Stopped after the stop-safety timeout".to_string());

    let status_effect = transition(state, name, WorkerStatus::Stopped);
    (state.clone(), vec![status_effect])
}

fn restart_timer_fired(state: &mut WorkerRuntime, name: WorkerName) -> (RuntimeAndEffects) {
    state.restart_count += 1;
    state.backoff_ms = state.next_backoff();
    let status_effect = transition(state, name, WorkerStatus::Starting);
    (
        state.clone(),
        vec![
            status_effect,
            Effect::SpawnChildren {
                config: state.config.clone(),
            },
        ],
    )
}

fn stability_elapsed(state: &mut WorkerRuntime) -> (RuntimeAndEffects) {
    if state.status == WorkerStatus::Running {
        state.reset_backoff();
    }
    (state.clone(), vec![])
}

fn probe_result(state: &mut WorkerRuntime, name: WorkerName, alive: bool) -> (RuntimeAndEffects) {
    if state.status != WorkerStatus::Running {
        return (state.clone(), vec![]);
    }

    if alive {
        state.probe_failures = 0;
        return (state.clone(), vec![]);
    }

    state.probe_failures += 1;
    let threshold = state
        .config
        .probe
        .as_ref()
        .map(|p| p.failure_threshold)
        .unwrap_or(u32::MAX);

    let mut effects = vec![Effect::Emit {
        event: Event::ProbeFailed {
            name: name.clone(),
            consecutive_failures: state.probe_failures,
        },
    }];

    if state.probe_failures >= threshold {
        state.probe_failures = 0;
        let (next, mut restart_effects) = restart(state, name);
        *state = next;
        effects.append(&mut restart_effects);
    }

    (state.clone(), effects)
}

fn reload_triggered(state: &mut WorkerRuntime, name: WorkerName) -> (RuntimeAndEffects) {
    if !state.config.dev_mode {
        return (state.clone(), vec![]);
    }
    match state.config.reload_command.clone() {
        Some(command) => (
            state.clone(),
            vec![Effect::RunReloadCommand { name, command }],
        ),
        None => restart(state, name),
    }
}

fn reload_command_finished(
    state: &mut WorkerRuntime,
    name: WorkerName,
    success: bool,
) -> (RuntimeAndEffects) {
    if !success {
        return (
            state.clone(),
            vec![Effect::Emit {
                event: Event::ReloadFailed {
                    name,
                    reason: "reload command exited non-zero".to_string(),
                },
            }],
        );
    }
    restart(state, name)
}

type RuntimeAndEffects = (WorkerRuntime, Vec<Effect>);

#[cfg(test)]
#[path = "decision_tests.rs"]
mod tests;
