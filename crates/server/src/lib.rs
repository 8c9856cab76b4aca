// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! drover-server: HTTP/WS surface for the drover orchestrator.
//!
//! Handlers are thin: reads reload the store first; writes persist the
//! initial record, commit, and fire-and-forget the owning engine onto
//! the runtime.

pub mod api;
pub mod auth;
pub mod env;
pub mod error;
pub mod handlers;
pub mod ws;

pub use api::{router, AppState};
pub use env::ServerConfig;
pub use error::ApiError;
