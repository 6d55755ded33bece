// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Accept loop for the control socket. One task per connection: each
//! connection sends exactly one [`Request`] and gets back either a single
//! [`Response`] or, for `logs`, a sequence of them until it disconnects.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use zpm_core::WorkerName;

use crate::protocol::{self, ProtocolError, Request, Response};
use crate::supervisor::{Supervisor, SupervisorError};

const IPC_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ControlServer {
    listener: UnixListener,
    supervisor: Arc<Supervisor>,
}

impl ControlServer {
    /// Bind the control socket, removing a stale one left behind by a
    /// previous run that didn't shut down cleanly.
    pub fn bind(socket_path: &Path, supervisor: Arc<Supervisor>) -> std::io::Result<Self> {
        if socket_path.exists() {
            let _ = std::fs::remove_file(socket_path);
        }
        let listener = UnixListener::bind(socket_path)?;
        Ok(Self { listener, supervisor })
    }

    /// Accept connections until the process is killed. Each connection runs
    /// in its own task so one slow or stuck client (a `logs` subscriber)
    /// never blocks another.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    let supervisor = Arc::clone(&self.supervisor);
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(stream, &supervisor).await {
                            log_connection_error(err);
                        }
                    });
                }
                Err(err) => error!(%err, "control socket accept error"),
            }
        }
    }
}

fn log_connection_error(err: ProtocolError) {
    match err {
        ProtocolError::ConnectionClosed => debug!("client disconnected before sending a request"),
        ProtocolError::Timeout => debug!("client timed out"),
        other => error!(%other, "control connection error"),
    }
}

async fn handle_connection(stream: UnixStream, supervisor: &Supervisor) -> Result<(), ProtocolError> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let request = protocol::read_request(&mut reader, IPC_TIMEOUT).await?;

    if let Request::Logs { name } = request {
        info!(?name, "logs subscription opened");
        return stream_logs(&mut reader, &mut writer, supervisor, name).await;
    }

    info!(?request, "control request");
    let response = handle_request(request, supervisor).await;
    protocol::write_response(&mut writer, &response, IPC_TIMEOUT).await
}

async fn handle_request(request: Request, supervisor: &Supervisor) -> Response {
    match request {
        Request::Ping => Response::ok_empty(),
        Request::Start { config, .. } => reply(supervisor.start(config).await),
        Request::Stop { name } => reply(supervisor.stop(&name).await),
        Request::Restart { name } => reply(supervisor.restart(&name).await),
        Request::Delete { name } => reply(supervisor.delete(&name).await),
        Request::Stats { name } => Response::ok(supervisor.stats(name.as_ref()).await),
        Request::List => Response::ok(supervisor.list()),
        Request::GetStore => Response::ok(supervisor.get_store()),
        Request::Logs { .. } => unreachable!("intercepted in handle_connection before dispatch"),
    }
}

fn reply(result: Result<(), SupervisorError>) -> Response {
    match result {
        Ok(()) => Response::ok_empty(),
        Err(err) => Response::err(err.to_string()),
    }
}

/// Attach to the log fan-out and forward lines until the client goes away.
/// Racing the forward loop against a read on the client's half is how we
/// notice the disconnect promptly instead of only on the next `send` error
/// -- the client never writes anything more on this connection, so any
/// successful read (including EOF) means it's gone.
async fn stream_logs<R, W>(
    reader: &mut R,
    writer: &mut W,
    supervisor: &Supervisor,
    name: Option<WorkerName>,
) -> Result<(), ProtocolError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = supervisor.subscribe_logs();
    let mut eof_probe = [0u8; 1];

    loop {
        tokio::select! {
            _ = reader.read(&mut eof_probe) => {
                debug!("logs subscriber disconnected");
                return Ok(());
            }
            received = lines.recv() => {
                match received {
                    Ok(line) => {
                        if name.as_ref().is_some_and(|n| *n != line.worker) {
                            continue;
                        }
                        let rendered = if name.is_some() { line.line.clone() } else { line.formatted() };
                        let response = Response::ok(rendered);
                        if protocol::write_response(writer, &response, IPC_TIMEOUT).await.is_err() {
                            return Ok(());
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "logs subscriber lagged behind the fan-out");
                    }
                    Err(broadcast::error::RecvError::Closed) => return Ok(()),
                }
            }
        }
    }
}
