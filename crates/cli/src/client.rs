// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-socket client used by every CLI command.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tokio::io::BufReader;
use tokio::net::UnixStream;

use zpm_core::{WorkerConfig, WorkerName};
use zpm_daemon::protocol::{self, ProtocolError, Request, Response, StoreRecord, WorkerStats};

use crate::daemon_process;
use crate::env;

const IPC_TIMEOUT: Duration = Duration::from_secs(10);
const DAEMON_START_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon is not running")]
    DaemonNotRunning,
    #[error("failed to start daemon: {0}")]
    DaemonStartFailed(String),
    #[error("timed out waiting for daemon to start")]
    DaemonStartTimeout,
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("daemon rejected request: {0}")]
    Rejected(String),
    #[error("unexpected response from daemon")]
    UnexpectedResponse,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Connect to an already-running daemon; fails if there isn't one.
    pub fn connect() -> Result<Self, ClientError> {
        let socket_path = env::socket_path();
        if !socket_path.exists() || !daemon_process::probe_socket() {
            return Err(ClientError::DaemonNotRunning);
        }
        Ok(Self { socket_path })
    }

    /// Connect, starting the daemon detached if it isn't already running.
    /// Mirrors the client-side half of §4.5: ping, and on failure spawn and
    /// poll until the socket accepts connections or the deadline passes.
    pub async fn connect_or_start() -> Result<Self, ClientError> {
        match Self::connect() {
            Ok(client) => Ok(client),
            Err(ClientError::DaemonNotRunning) => {
                daemon_process::cleanup_stale_socket();
                let child = daemon_process::start_daemon_background()?;
                daemon_process::connect_with_retry(DAEMON_START_TIMEOUT, child).await?;
                Self::connect()
            }
            Err(err) => Err(err),
        }
    }

    async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        protocol::write_request(&mut writer, request, IPC_TIMEOUT).await?;
        let response = protocol::read_response(&mut reader, IPC_TIMEOUT).await?;
        Ok(response)
    }

    async fn send_simple(&self, request: &Request) -> Result<(), ClientError> {
        match self.send(request).await? {
            Response { ok: true, .. } => Ok(()),
            Response { error: Some(message), .. } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        match response {
            Response { ok: true, data: Some(data), .. } => {
                serde_json::from_value(data).map_err(|err| ClientError::Protocol(err.into()))
            }
            Response { ok: true, data: None, .. } => Err(ClientError::UnexpectedResponse),
            Response { error: Some(message), .. } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn ping(&self) -> Result<(), ClientError> {
        self.send_simple(&Request::Ping).await
    }

    pub async fn start(&self, config: WorkerConfig) -> Result<(), ClientError> {
        let name = config.name.clone();
        self.send_simple(&Request::Start { name, config }).await
    }

    pub async fn stop(&self, name: WorkerName) -> Result<(), ClientError> {
        self.send_simple(&Request::Stop { name }).await
    }

    pub async fn restart(&self, name: WorkerName) -> Result<(), ClientError> {
        self.send_simple(&Request::Restart { name }).await
    }

    pub async fn delete(&self, name: WorkerName) -> Result<(), ClientError> {
        self.send_simple(&Request::Delete { name }).await
    }

    pub async fn list(&self) -> Result<Vec<WorkerName>, ClientError> {
        let response = self.send(&Request::List).await?;
        Self::decode(response)
    }

    pub async fn stats(&self, name: Option<WorkerName>) -> Result<Vec<WorkerStats>, ClientError> {
        let response = self.send(&Request::Stats { name }).await?;
        Self::decode(response)
    }

    pub async fn get_store(&self) -> Result<Vec<StoreRecord>, ClientError> {
        let response = self.send(&Request::GetStore).await?;
        Self::decode(response)
    }

    /// Open a `logs` subscription and print each line as it arrives, until
    /// the daemon closes the stream or the caller is interrupted.
    pub async fn logs(&self, name: Option<WorkerName>) -> Result<(), ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        protocol::write_request(&mut writer, &Request::Logs { name }, IPC_TIMEOUT).await?;

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                response = protocol::read_response(&mut reader, Duration::from_secs(3600)) => {
                    match response {
                        Ok(Response { ok: true, data: Some(line), .. }) => {
                            if let Ok(line) = serde_json::from_value::<String>(line) {
                                println!("{line}");
                            }
                        }
                        Ok(Response { error: Some(message), .. }) => return Err(ClientError::Rejected(message)),
                        Ok(_) => return Err(ClientError::UnexpectedResponse),
                        Err(err) => return Err(err.into()),
                    }
                }
                _ = &mut ctrl_c => return Ok(()),
            }
        }
    }

    /// Read the daemon PID and request a soft shutdown via signal rather
    /// than the control socket, matching §4.5's "daemon kill" path.
    pub fn kill_daemon() -> Result<(), ClientError> {
        let Some(pid) = daemon_process::read_daemon_pid() else {
            return Err(ClientError::DaemonNotRunning);
        };
        if !daemon_process::process_exists(pid) {
            let _ = std::fs::remove_file(env::pid_path());
            return Err(ClientError::DaemonNotRunning);
        }
        daemon_process::kill_daemon(pid)
    }
}
