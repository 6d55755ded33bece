// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Graceful-then-forced process termination.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

/// Send a soft terminate signal, then escalate to a forced kill if the
/// process is still alive once `timeout` has elapsed. Implementations
/// only need to guarantee the process is gone (or was already gone) by
/// the time the returned future resolves.
#[async_trait]
pub trait Terminator: Send + Sync {
    async fn terminate(&self, pid: u32, timeout: Duration);

    /// A cheap existence check (POSIX signal 0), used by the worker as a
    /// safety net for processes that exit without the OS delivering a
    /// wait-visible event.
    fn is_alive(&self, pid: u32) -> bool;
}

/// Real termination via POSIX signals on Unix; a best-effort
/// `taskkill`-based implementation on Windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTerminator;

#[cfg(unix)]
mod unix_impl {
    use super::*;
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    impl SystemTerminator {
        fn signal(&self, pid: u32, sig: Signal) -> nix::Result<()> {
            signal::kill(Pid::from_raw(pid as i32), sig)
        }
    }

    #[async_trait]
    impl Terminator for SystemTerminator {
        async fn terminate(&self, pid: u32, timeout: Duration) {
            if self.signal(pid, Signal::SIGTERM).is_err() {
                // Already gone, or we never had permission in the first place.
                return;
            }

            let deadline = tokio::time::Instant::now() + timeout;
            loop {
                if !self.is_alive(pid) {
                    return;
                }
                if tokio::time::Instant::now() >= deadline {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }

            warn!(pid, "graceful terminate timed out, sending SIGKILL");
            let _ = self.signal(pid, Signal::SIGKILL);
        }

        fn is_alive(&self, pid: u32) -> bool {
            // Passing `None` sends the null signal: existence check only,
            // no signal actually delivered.
            signal::kill(Pid::from_raw(pid as i32), None).is_ok()
        }
    }
}

#[cfg(not(unix))]
mod windows_impl {
    use super::*;

    #[async_trait]
    impl Terminator for SystemTerminator {
        async fn terminate(&self, pid: u32, timeout: Duration) {
            let _ = tokio::process::Command::new("taskkill")
                .args(["/PID", &pid.to_string()])
                .status()
                .await;

            let deadline = tokio::time::Instant::now() + timeout;
            while self.is_alive(pid) && tokio::time::Instant::now() < deadline {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }

            if self.is_alive(pid) {
                warn!(pid, "graceful terminate timed out, forcing kill");
                let _ = tokio::process::Command::new("taskkill")
                    .args(["/PID", &pid.to_string(), "/F"])
                    .status()
                    .await;
            }
        }

        fn is_alive(&self, pid: u32) -> bool {
            debug!(pid, "existence check is approximate on windows");
            true
        }
    }
}

#[cfg(test)]
#[path = "terminate_tests.rs"]
mod tests;
