// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol for daemon communication.
//!
//! Wire format: newline-delimited JSON.

mod request;
mod response;
mod types;
mod wire;

pub use request::Request;
pub use response::Response;
pub use types::{StoreRecord, WorkerStats};
pub use wire::{read_line, read_request, read_response, write_request, write_response, ProtocolError};
