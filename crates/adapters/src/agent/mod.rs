// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent runner adapter.
//!
//! The external coding agent is an opaque child process: it reads its
//! task from the environment, works inside the prepared workspace, and
//! may leave a structured result file behind. This module owns the
//! invocation contract and the output harvest; retry policy lives with
//! the callers in the engine crate.

mod harvest;
mod process;

pub use harvest::{extract_pr_url, tail_log_lines};
pub use process::ProcessAgent;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeAgent;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Fixed name of the structured result file the agent may write at the
/// workspace root. Deleted before every invocation so a stale file from
/// an earlier attempt is never harvested.
pub const STEP_RESULT_FILE: &str = "step_result.json";

/// Number of trailing meaningful output lines persisted to the job log.
pub const LOG_TAIL_LINES: usize = 150;

/// Hard wall-clock cap on one agent invocation.
pub const DEFAULT_AGENT_TIMEOUT: Duration = Duration::from_secs(3000);

/// Errors from an agent invocation.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("failed to launch agent: {0}")]
    Launch(String),
    #[error("agent timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("could not read agent result: {0}")]
    Harvest(#[from] std::io::Error),
}

/// Pipeline context passed to the agent via `STEP_CONTEXT`.
#[derive(Debug, Clone, Serialize)]
pub struct StepContext {
    pub pipeline_id: String,
    pub run_id: String,
    pub step_name: String,
    pub upstream_outputs: HashMap<String, Value>,
}

/// One agent invocation request.
#[derive(Debug, Clone)]
pub struct AgentInvocation {
    pub task: String,
    pub step_context: Option<StepContext>,
    pub workspace: PathBuf,
    pub timeout: Duration,
}

impl AgentInvocation {
    /// Invocation for a standalone job with the default timeout.
    pub fn new(task: impl Into<String>, workspace: impl Into<PathBuf>) -> Self {
        Self {
            task: task.into(),
            step_context: None,
            workspace: workspace.into(),
            timeout: DEFAULT_AGENT_TIMEOUT,
        }
    }

    pub fn with_step_context(mut self, context: StepContext) -> Self {
        self.step_context = Some(context);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Harvested result of one agent invocation.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub exit_code: i64,
    pub pr_url: Option<String>,
    /// Trailing meaningful output lines (at most [`LOG_TAIL_LINES`]).
    pub log_lines: Vec<String>,
    /// Parsed step-result file, or a synthesized `{pr_url, exit_code}`.
    pub output: Value,
    pub stdout: String,
    pub stderr: String,
}

/// Runs the external agent inside the current sandbox.
#[async_trait]
pub trait AgentRunner: Send + Sync + 'static {
    async fn run(&self, invocation: AgentInvocation) -> Result<AgentOutcome, AgentError>;
}
