// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for the end-to-end specs: spawns the real `zpmd`/`zpm`
//! binaries against an isolated `ZPM_STATE_DIR`, with small shell-script
//! fixtures standing in for "applications."

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::{Duration, Instant};

use assert_cmd::Command;
use tempfile::TempDir;

/// Poll `cond` until it returns true or `timeout_ms` elapses.
pub fn wait_for(timeout_ms: u64, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        if cond() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

/// Locate (building if necessary) the `zpmd` binary, independent of
/// whatever package the integration-test binary itself belongs to.
fn zpmd_binary() -> PathBuf {
    let cmd = Command::cargo_bin("zpmd").expect("build zpmd");
    PathBuf::from(cmd.get_program())
}

/// An isolated daemon/CLI sandbox: its own state dir, its daemon killed on
/// drop so leftover processes never linger between tests.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        let dir = TempDir::new().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("state")).unwrap();
        Project { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.path().join("state")
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.state_path().join("snapshot.json")
    }

    /// Path to the daemon's control socket, namespaced the same way
    /// `Config::rooted_at` builds it.
    pub fn socket_path(&self) -> PathBuf {
        self.state_path().join("zuz-pm.sock")
    }

    /// Write an executable shell-script fixture under the sandbox and
    /// return its path. Extension-less, so `worker::spawn` launches it
    /// directly rather than handing it to an interpreter.
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script fixture");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&path, perms).unwrap();
        }
        path
    }

    /// Start building a `zpm <args...>` invocation against this sandbox.
    pub fn zpm(&self) -> ZpmCommand {
        let mut cmd = Command::cargo_bin("zpm").expect("zpm binary");
        cmd.env("ZPM_STATE_DIR", self.state_path());
        cmd.env("ZPM_DAEMON_BIN", zpmd_binary());
        cmd.env("NO_COLOR", "1");
        // Force production mode so a background-started daemon redirects its
        // stdio to zpmd.log instead of inheriting the test process's, which
        // would otherwise be lost — `daemon_log()` relies on this.
        cmd.env("NODE_ENV", "production");
        ZpmCommand(cmd)
    }

    /// Contents of the daemon's log file, if any — useful to dump when an
    /// assertion fails so a flaky timing window is debuggable.
    pub fn daemon_log(&self) -> String {
        std::fs::read_to_string(self.state_path().join("logs").join("zpmd.log")).unwrap_or_default()
    }
}

impl Drop for Project {
    fn drop(&mut self) {
        let _ = self.zpm().args(["kill-daemon"]).output();
    }
}

/// A `zpm` invocation under construction.
pub struct ZpmCommand(Command);

impl ZpmCommand {
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.0.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<OsStr>) -> Self {
        self.0.env(key, value);
        self
    }

    /// Run and assert the process exited successfully.
    pub fn passes(mut self) -> Ran {
        let output = self.0.output().expect("spawn zpm");
        assert!(
            output.status.success(),
            "expected success, got {:?}\nstdout: {}\nstderr: {}",
            output.status,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        Ran(output)
    }

    /// Run and assert the process exited with a non-zero status.
    pub fn fails(mut self) -> Ran {
        let output = self.0.output().expect("spawn zpm");
        assert!(
            !output.status.success(),
            "expected failure, got success\nstdout: {}",
            String::from_utf8_lossy(&output.stdout),
        );
        Ran(output)
    }

    /// Run without asserting on the exit status.
    pub fn output(mut self) -> Ran {
        Ran(self.0.output().expect("spawn zpm"))
    }
}

/// The result of a completed `zpm` invocation.
pub struct Ran(Output);

impl Ran {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.0.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.0.stderr).into_owned()
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(
            self.stdout().contains(needle),
            "expected stdout to contain {needle:?}, got: {}",
            self.stdout()
        );
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(
            self.stderr().contains(needle),
            "expected stderr to contain {needle:?}, got: {}",
            self.stderr()
        );
        self
    }
}
