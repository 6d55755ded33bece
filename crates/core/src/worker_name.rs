// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The unique, user-chosen key identifying a worker.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A validated, non-empty worker name.
///
/// Unlike an internally generated id, a `WorkerName` is supplied by the
/// operator at registration time and doubles as the registry key, the
/// socket-path log prefix, and the snapshot identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkerName(String);

/// A name was empty or contained characters that would break the control
/// plane's log prefixing and snapshot keys.
#[derive(Debug, thiserror::Error)]
#[error("invalid worker name {0:?}: must be non-empty and contain no whitespace")]
pub struct InvalidWorkerName(String);

impl WorkerName {
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidWorkerName> {
        let name = name.into();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(InvalidWorkerName(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WorkerName {
    type Error = InvalidWorkerName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WorkerName> for String {
    fn from(value: WorkerName) -> Self {
        value.0
    }
}

impl fmt::Display for WorkerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for WorkerName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl Borrow<str> for WorkerName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Infallible conversion for tests and builders, where names are literals
/// known to be valid. Production call sites (config parsing, CLI args)
/// must go through [`WorkerName::new`] and handle the error.
#[cfg(any(test, feature = "test-support"))]
impl From<&str> for WorkerName {
    fn from(value: &str) -> Self {
        WorkerName::new(value).expect("literal worker name is valid")
    }
}

#[cfg(test)]
#[path = "worker_name_tests.rs"]
mod tests;
