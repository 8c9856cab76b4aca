// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engines.

use drover_adapters::{AgentError, DispatchError};
use drover_dag::GraphError;
use drover_storage::StoreError;
use thiserror::Error;

/// Errors raised while driving a job or pipeline run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("job not found: {0}")]
    JobNotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// A step's job record read back as failed after dispatch.
    #[error("{0}")]
    StepFailed(String),
}
