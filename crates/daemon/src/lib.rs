// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! zpm daemon library surface.
//!
//! Only the wire protocol is public: the CLI links against this crate
//! purely to share `Request`/`Response` types with the running `zpmd`
//! binary, which declares the rest of this crate's modules itself.

pub mod protocol;
