// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform-capability adapters the worker engine consumes through narrow
//! traits, so decision logic stays testable against fakes while
//! production code talks to the real OS.

#![cfg_attr(
    any(test, feature = "test-support"),
    allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)
)]

pub mod port;
pub mod terminate;
pub mod usage;
pub mod watch;

pub use port::{PortFreer, SystemPortFreer};
pub use terminate::{SystemTerminator, Terminator};
pub use usage::{ProcessUsage, SystemUsageReader, UsageReader};
pub use watch::{FileWatchEvent, FileWatcher, RecommendedFileWatcher};

#[cfg(any(test, feature = "test-support"))]
pub mod fake;
