// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifiers for the at-most-one-of-each timers a worker owns.
//!
//! The worker actor keeps these as `tokio_util::sync::CancellationToken`s;
//! this module only names the kinds so decision and executor code can
//! refer to "the restart timer" without each owning a separate enum.

use std::fmt;

/// Which per-worker timer a [`crate::effect::Effect::SetTimer`] or
/// [`crate::effect::Effect::CancelTimer`] refers to. At most one timer of
/// each kind is armed per worker at any moment; arming a kind cancels
/// whichever timer of that kind was previously armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Backoff delay before respawning a crashed worker.
    Restart,
    /// Window a worker must stay `Running` before backoff resets.
    Stability,
    /// Periodic liveness probe tick.
    Probe,
    /// Debounce before acting on a dev-mode file-watch event.
    ReloadDebounce,
    /// Hard upper bound on time spent in `Stopping`. Forces the worker to
    /// `Stopped` if children never deliver an exit event (e.g. wedged in
    /// uninterruptible sleep, surviving a `SIGKILL`).
    StopSafety,
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimerKind::Restart => "restart",
            TimerKind::Stability => "stability",
            TimerKind::Probe => "probe",
            TimerKind::ReloadDebounce => "reload_debounce",
            TimerKind::StopSafety => "stop_safety",
        })
    }
}
