// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `zpm` — the operator front-end for `zpmd`. Every subcommand opens one
//! connection to the control socket, sends a request, prints the reply,
//! and exits.

mod client;
mod color;
mod daemon_process;
mod env;
mod output;

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use zpm_core::{LogSink, Mode, ProbeConfig, ProbeKind, WorkerConfig, WorkerName};

use client::{ClientError, DaemonClient};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "zpm", version, about = "Process supervisor", styles = color::styles())]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Render machine-readable output where the command supports it.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Command {
    /// Register and start a worker.
    Start {
        /// Path to the script or executable to run.
        script: PathBuf,
        /// Worker name; derived from the script's file stem if omitted.
        #[arg(long)]
        name: Option<String>,
        /// Port to make available to the worker via `PORT`.
        #[arg(long)]
        port: Option<u16>,
        /// Number of instances to run in cluster mode.
        #[arg(long)]
        instances: Option<u32>,
        /// Run in cluster mode (N independent instances instead of one).
        #[arg(long)]
        cluster: bool,
        /// Watch the script's directory and reload on change.
        #[arg(long)]
        dev: bool,
        /// Arguments passed through to the script.
        #[arg(long = "args", value_delimiter = ' ')]
        args: Vec<String>,
        /// Environment variables as `KEY=VALUE`, may be repeated.
        #[arg(long = "env", value_name = "KEY=VALUE")]
        env: Vec<String>,
        /// Probe kind: http, tcp, or exec.
        #[arg(long = "probe-type", requires = "probe_target")]
        probe_type: Option<String>,
        /// Probe target: a URL for http, `host:port` for tcp, a shell command for exec.
        #[arg(long = "probe-target", requires = "probe_type")]
        probe_target: Option<String>,
        #[arg(long = "probe-interval", default_value_t = 10)]
        probe_interval: u64,
        #[arg(long = "probe-timeout", default_value_t = 3)]
        probe_timeout: u64,
        #[arg(long = "probe-failure-threshold", default_value_t = 3)]
        probe_failure_threshold: u32,
        /// Shell command run in place of a restart when dev-mode reload fires.
        #[arg(long = "reload-cmd")]
        reload_cmd: Option<String>,
        /// Kill timeout in milliseconds before escalating to SIGKILL.
        #[arg(long = "kill-timeout-ms")]
        kill_timeout_ms: Option<u64>,
        /// Forward logs to a file in addition to the daemon's own stream.
        #[arg(long = "log-file")]
        log_file: Option<PathBuf>,
    },
    /// Stop a worker, retaining its configuration.
    Stop { name: String },
    /// Stop then start a worker.
    Restart { name: String },
    /// Stop (if running) and forget a worker.
    Delete { name: String },
    /// List every registered worker.
    List,
    /// Show stats for one worker, or every worker if omitted.
    Stats { name: Option<String> },
    /// Stream stdout/stderr for one worker, or every worker if omitted.
    Logs { name: Option<String> },
    /// Terminate the daemon process itself.
    KillDaemon,
    /// Dump the daemon's raw per-worker state records.
    Store,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Start {
            script,
            name,
            port,
            instances,
            cluster,
            dev,
            args,
            env,
            probe_type,
            probe_target,
            probe_interval,
            probe_timeout,
            probe_failure_threshold,
            reload_cmd,
            kill_timeout_ms,
            log_file,
        } => {
            let name = resolve_name(name, &script)?;
            let probe = build_probe(probe_type, probe_target, probe_interval, probe_timeout, probe_failure_threshold)?;
            let config = WorkerConfig {
                name: name.clone(),
                script_path: script,
                args,
                env: parse_env(&env)?,
                mode: if cluster { Mode::Cluster } else { Mode::Fork },
                instances,
                port,
                dev_mode: dev,
                kill_timeout_ms: kill_timeout_ms.unwrap_or(zpm_core::config::DEFAULT_KILL_TIMEOUT_MS),
                max_backoff_ms: zpm_core::config::DEFAULT_MAX_BACKOFF_MS,
                probe,
                reload_command: reload_cmd,
                log_sink: log_file.map(|path| LogSink::File { path }),
            };

            let client = DaemonClient::connect_or_start().await?;
            client.start(config).await?;
            output::print_started(&name);
        }
        Command::Stop { name } => {
            let client = DaemonClient::connect()?;
            client.stop(parse_name(&name)?).await?;
            println!("Worker '{name}' stopped");
        }
        Command::Restart { name } => {
            let client = DaemonClient::connect()?;
            client.restart(parse_name(&name)?).await?;
            println!("Worker '{name}' restarted");
        }
        Command::Delete { name } => {
            let client = DaemonClient::connect()?;
            client.delete(parse_name(&name)?).await?;
            println!("Worker '{name}' deleted");
        }
        Command::List => {
            let client = DaemonClient::connect()?;
            let names = client.list().await?;
            output::print_list(&names, cli.output);
        }
        Command::Stats { name } => {
            let client = DaemonClient::connect()?;
            let name = name.map(|n| parse_name(&n)).transpose()?;
            let stats = client.stats(name).await?;
            output::print_stats(&stats, cli.output);
        }
        Command::Logs { name } => {
            let client = DaemonClient::connect()?;
            let name = name.map(|n| parse_name(&n)).transpose()?;
            client.logs(name).await?;
        }
        Command::KillDaemon => {
            DaemonClient::kill_daemon()?;
            println!("Daemon stopped");
        }
        Command::Store => {
            let client = DaemonClient::connect()?;
            let records = client.get_store().await?;
            output::print_store(&records, cli.output);
        }
    }
    Ok(())
}

fn parse_name(name: &str) -> Result<WorkerName, ClientError> {
    WorkerName::new(name).map_err(|err| ClientError::Rejected(err.to_string()))
}

fn resolve_name(name: Option<String>, script: &PathBuf) -> anyhow::Result<WorkerName> {
    let name = name.unwrap_or_else(|| {
        script
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("worker")
            .to_string()
    });
    Ok(WorkerName::new(name)?)
}

fn parse_env(entries: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    let mut env = BTreeMap::new();
    for entry in entries {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("invalid --env entry {entry:?}, expected KEY=VALUE"))?;
        env.insert(key.to_string(), value.to_string());
    }
    Ok(env)
}

fn build_probe(
    kind: Option<String>,
    target: Option<String>,
    interval_secs: u64,
    timeout_secs: u64,
    failure_threshold: u32,
) -> anyhow::Result<Option<ProbeConfig>> {
    let (Some(kind), Some(target)) = (kind, target) else {
        return Ok(None);
    };

    let kind = match kind.as_str() {
        "http" => ProbeKind::Http { url: target },
        "tcp" => {
            let (host, port) = target
                .split_once(':')
                .ok_or_else(|| anyhow::anyhow!("--probe-target for tcp must be host:port"))?;
            ProbeKind::Tcp { host: host.to_string(), port: port.parse()? }
        }
        "exec" => ProbeKind::Exec { command: target },
        other => anyhow::bail!("unknown --probe-type {other:?}, expected http, tcp, or exec"),
    };

    Ok(Some(ProbeConfig { kind, interval_secs, timeout_secs, failure_threshold }))
}
