// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! drover-engine: per-job and per-run state machines.
//!
//! Engines own every mutation of their record after submission. They
//! never propagate errors to the HTTP surface; failures are persisted
//! on the record and surfaced to subscribers through the store.

mod error;
mod job;
mod pipeline;

pub use error::EngineError;
pub use job::{JobEngine, JobRequest, RetryPolicy};
pub use pipeline::{PipelineEngine, RunRequest, SKIPPED_STEP_ERROR};

use drover_adapters::{AgentRunner, Dispatcher};
use drover_storage::Store;
use std::sync::Arc;

/// Shared dependencies threaded through both engines.
#[derive(Clone)]
pub struct EngineDeps {
    pub store: Store,
    pub agent: Arc<dyn AgentRunner>,
    pub dispatcher: Arc<dyn Dispatcher>,
}

/// Truncate an error message for persistence.
pub(crate) fn truncate_error(message: &str, limit: usize) -> String {
    if message.chars().count() <= limit {
        message.to_string()
    } else {
        message.chars().take(limit).collect()
    }
}
