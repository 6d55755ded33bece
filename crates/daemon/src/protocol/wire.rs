// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Newline-delimited JSON framing for the control socket. Deliberately not
//! the length-prefixed framing used elsewhere in this workspace: every
//! message here is small and line-oriented tooling (`nc`, manual testing)
//! benefits from being able to read it directly.

use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use super::{Request, Response};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("timed out waiting for peer")]
    Timeout,
    #[error("connection closed")]
    ConnectionClosed,
}

/// Read one line and parse it as a [`Request`]. Returns
/// [`ProtocolError::ConnectionClosed`] on EOF before any bytes arrive.
pub async fn read_request<R>(reader: &mut R, timeout: Duration) -> Result<Request, ProtocolError>
where
    R: AsyncBufRead + Unpin,
{
    let line = read_line(reader, timeout).await?;
    Ok(serde_json::from_str(line.trim_end())?)
}

/// Read one raw newline-delimited JSON line without decoding it as a
/// particular type, for callers (malformed-input handling, `logs`
/// request peeking) that need the bytes before deciding how to parse them.
pub async fn read_line<R>(reader: &mut R, timeout: Duration) -> Result<String, ProtocolError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let n = tokio::time::timeout(timeout, reader.read_line(&mut line))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    if n == 0 {
        return Err(ProtocolError::ConnectionClosed);
    }
    Ok(line)
}

/// Write a [`Response`] as one newline-terminated JSON line.
pub async fn write_response<W>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    write_line(writer, response, timeout).await
}

/// Write a [`Request`] as one newline-terminated JSON line; the client
/// side's mirror of [`write_response`].
pub async fn write_request<W>(writer: &mut W, request: &Request, timeout: Duration) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    write_line(writer, request, timeout).await
}

/// Read one line and parse it as a [`Response`]; the client side's mirror
/// of [`read_request`].
pub async fn read_response<R>(reader: &mut R, timeout: Duration) -> Result<Response, ProtocolError>
where
    R: AsyncBufRead + Unpin,
{
    let line = read_line(reader, timeout).await?;
    Ok(serde_json::from_str(line.trim_end())?)
}

async fn write_line<W>(writer: &mut W, value: &impl serde::Serialize, timeout: Duration) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let mut payload = serde_json::to_vec(value)?;
    payload.push(b'\n');
    tokio::time::timeout(timeout, writer.write_all(&payload))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    Ok(())
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
