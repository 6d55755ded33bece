// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Exactly one of `{ok:true, data}` or `{ok:false, error}` per reply line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok(data: impl Serialize) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Response { ok: true, data: Some(data), error: None },
            Err(err) => Response::err(format!("failed to encode response: {err}")),
        }
    }

    pub fn ok_empty() -> Self {
        Response { ok: true, data: None, error: None }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Response { ok: false, data: None, error: Some(message.into()) }
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
