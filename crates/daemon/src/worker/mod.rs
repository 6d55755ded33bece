// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker lifecycle: pure decision function, spawn mechanics, and the
//! actor task that ties them to real child processes and timers.

pub mod actor;
pub mod decision;
pub mod spawn;
pub mod state;

pub use actor::{spawn_worker_actor, WorkerDeps, WorkerHandle};
pub use decision::{decide, WorkerMsg};
pub use spawn::{spawn_one, SpawnError};
pub use state::WorkerRuntime;
