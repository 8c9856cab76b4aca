// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child-process agent runner.

use super::harvest::{extract_pr_url, tail_log_lines};
use super::{AgentError, AgentInvocation, AgentOutcome, AgentRunner, LOG_TAIL_LINES, STEP_RESULT_FILE};
use crate::subprocess::SubprocessError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;
use tokio::process::Command;

/// Default agent engine command when none is configured.
pub const DEFAULT_AGENT_COMMAND: &str = "npm run dev";

/// Runs the configured agent command as a foreground child process.
///
/// The task reaches the child through `TASK_DESCRIPTION`, the workspace
/// path through `WORKSPACE`, and pipeline context (when present)
/// through `STEP_CONTEXT` as compact JSON.
#[derive(Debug, Clone)]
pub struct ProcessAgent {
    program: String,
    args: Vec<String>,
}

impl ProcessAgent {
    /// Build from a whitespace-separated command line, e.g. `npm run dev`.
    pub fn new(command: &str) -> Self {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_else(|| "npm".to_string());
        Self {
            program,
            args: parts.collect(),
        }
    }

    fn preflight(workspace: &Path) -> Result<(), AgentError> {
        match std::fs::remove_file(workspace.join(STEP_RESULT_FILE)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AgentError::Harvest(e)),
        }
    }

    fn read_step_result(workspace: &Path) -> Option<Value> {
        let raw = std::fs::read_to_string(workspace.join(STEP_RESULT_FILE)).ok()?;
        serde_json::from_str(&raw).ok()
    }
}

impl Default for ProcessAgent {
    fn default() -> Self {
        Self::new(DEFAULT_AGENT_COMMAND)
    }
}

#[async_trait]
impl AgentRunner for ProcessAgent {
    async fn run(&self, invocation: AgentInvocation) -> Result<AgentOutcome, AgentError> {
        Self::preflight(&invocation.workspace)?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(&invocation.workspace)
            .env("TASK_DESCRIPTION", &invocation.task)
            .env("WORKSPACE", &invocation.workspace);
        if let Some(context) = &invocation.step_context {
            let compact =
                serde_json::to_string(context).map_err(|e| AgentError::Launch(e.to_string()))?;
            cmd.env("STEP_CONTEXT", compact);
        }

        tracing::info!(
            program = %self.program,
            workspace = %invocation.workspace.display(),
            timeout_s = invocation.timeout.as_secs(),
            "starting agent engine"
        );

        let output =
            crate::subprocess::run_with_timeout(cmd, invocation.timeout, "agent engine")
                .await
                .map_err(|e| match e {
                    SubprocessError::Timeout { timeout, .. } => AgentError::Timeout(timeout),
                    other => AgentError::Launch(other.to_string()),
                })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let combined = format!("{stdout}\n{stderr}");

        let exit_code = i64::from(output.status.code().unwrap_or(-1));
        let pr_url = extract_pr_url(&combined);
        let log_lines = tail_log_lines(&combined, LOG_TAIL_LINES);
        let structured = Self::read_step_result(&invocation.workspace)
            .unwrap_or_else(|| json!({"pr_url": pr_url, "exit_code": exit_code}));

        Ok(AgentOutcome {
            exit_code,
            pr_url,
            log_lines,
            output: structured,
            stdout,
            stderr,
        })
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
