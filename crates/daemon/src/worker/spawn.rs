// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turning a [`WorkerConfig`] into `instance_count()` live child processes:
//! interpreter detection, project-root discovery, and environment merging.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::process::{Child, Command};
use zpm_core::{Mode, WorkerConfig};

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("script path does not exist: {0}")]
    ScriptMissing(PathBuf),
    #[error("failed to launch child process: {0}")]
    Io(#[from] std::io::Error),
}

const PROJECT_MANIFESTS: &[&str] = &["package.json", "Cargo.toml", ".git"];

/// Walk upward from `script_path` looking for a recognizable project
/// manifest. Falls back to the script's own parent directory.
pub fn discover_project_root(script_path: &Path) -> PathBuf {
    let start = script_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut dir = start.as_path();
    loop {
        if PROJECT_MANIFESTS.iter().any(|m| dir.join(m).exists()) {
            return dir.to_path_buf();
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => return start,
        }
    }
}

/// Recognized interpreted-script extensions and the interpreter that runs
/// them. `scriptPath`s without a recognized extension are launched
/// directly as the executable.
fn interpreter_for(script_path: &Path) -> Option<&'static str> {
    match script_path.extension().and_then(|e| e.to_str()) {
        Some("js") | Some("mjs") | Some("cjs") => Some("node"),
        Some("py") => Some("python3"),
        Some("rb") => Some("ruby"),
        _ => None,
    }
}

/// `node_modules/.bin` (or any future per-language equivalent) relative to
/// the project root, prepended to PATH if it exists.
fn tool_bin_dir(project_root: &Path) -> Option<PathBuf> {
    let candidate = project_root.join("node_modules").join(".bin");
    candidate.is_dir().then_some(candidate)
}

fn build_env(config: &WorkerConfig, project_root: &Path) -> BTreeMap<String, String> {
    let mut env: BTreeMap<String, String> = std::env::vars().collect();
    env.extend(config.env.clone());
    env.insert(
        "NODE_ENV".to_string(),
        if config.dev_mode { "development" } else { "production" }.to_string(),
    );
    env.insert(
        "ZPM_ENV".to_string(),
        if config.dev_mode { "development" } else { "production" }.to_string(),
    );

    if let Some(bin_dir) = tool_bin_dir(project_root) {
        let existing = env.get("PATH").cloned().unwrap_or_default();
        let joined = std::env::join_paths([bin_dir].into_iter().chain(
            std::env::split_paths(&existing).collect::<Vec<_>>(),
        ))
        .ok()
        .and_then(|p| p.into_string().ok())
        .unwrap_or(existing);
        env.insert("PATH".to_string(), joined);
    }

    env
}

/// Spawn one child process for instance slot `index`. Standard input is
/// closed; stdout/stderr are piped so the actor can forward them.
pub fn spawn_one(config: &WorkerConfig, index: u32) -> Result<Child, SpawnError> {
    if !config.script_path.exists() {
        return Err(SpawnError::ScriptMissing(config.script_path.clone()));
    }

    let project_root = discover_project_root(&config.script_path);
    let env = build_env(config, &project_root);

    let mut command = match interpreter_for(&config.script_path) {
        Some(interpreter) => {
            let mut cmd = Command::new(interpreter);
            cmd.arg(&config.script_path);
            cmd
        }
        None => Command::new(&config.script_path),
    };

    command
        .args(&config.args)
        .current_dir(&project_root)
        .env_clear()
        .envs(env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    if config.mode == Mode::Cluster {
        command.env("ZPM_INSTANCE_INDEX", index.to_string());
    }

    command.spawn().map_err(SpawnError::from)
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
