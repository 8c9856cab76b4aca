// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job engine: one job's state machine with bounded retry.

use crate::{truncate_error, EngineDeps, EngineError};
use drover_adapters::{AgentInvocation, StepContext, DEFAULT_AGENT_TIMEOUT};
use drover_core::{now_iso, JobResult, JobStatus, JobUpdate, DEFAULT_MAX_ATTEMPTS};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

/// Persisted error messages are capped at this many characters.
const ERROR_LIMIT: usize = 500;

/// Closed-form retry policy: `base · 2^(attempt-1)` between attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Backoff before the next attempt, given the 1-based attempt that
    /// just failed.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// One job dispatch.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub job_id: String,
    pub repo_url: String,
    pub task: String,
    pub token: String,
    pub workspace: PathBuf,
    /// Reuse an existing workspace tree instead of cloning fresh.
    pub skip_clone: bool,
    pub step_context: Option<StepContext>,
}

impl JobRequest {
    /// Standalone job dispatch into a private workspace.
    pub fn new(
        job_id: impl Into<String>,
        repo_url: impl Into<String>,
        task: impl Into<String>,
        token: impl Into<String>,
        workspace: impl Into<PathBuf>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            repo_url: repo_url.into(),
            task: task.into(),
            token: token.into(),
            workspace: workspace.into(),
            skip_clone: false,
            step_context: None,
        }
    }
}

/// Drives a single job from queued to a terminal state.
#[derive(Clone)]
pub struct JobEngine {
    deps: EngineDeps,
    policy: RetryPolicy,
    agent_timeout: Duration,
}

impl JobEngine {
    pub fn new(deps: EngineDeps) -> Self {
        Self {
            deps,
            policy: RetryPolicy::default(),
            agent_timeout: DEFAULT_AGENT_TIMEOUT,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout = timeout;
        self
    }

    pub(crate) fn deps(&self) -> &EngineDeps {
        &self.deps
    }

    /// Run the job to a terminal state.
    ///
    /// Returns the agent's structured output on success. After
    /// exhausting all attempts the aggregate error is persisted and the
    /// last attempt's error propagates to the caller.
    pub async fn run(&self, req: JobRequest) -> Result<Value, EngineError> {
        let store = &self.deps.store;
        store.reload().await?;
        let job = store
            .get_job(&req.job_id)
            .await?
            .ok_or_else(|| EngineError::JobNotFound(req.job_id.clone()))?;

        tracing::info!(job_id = %req.job_id, "job starting");
        let mut logs = job.logs;
        store
            .update_job(
                &req.job_id,
                JobUpdate::new()
                    .status(JobStatus::Running)
                    .started_at(now_iso()),
            )
            .await?;
        store.commit().await?;

        let max = self.policy.max_attempts.max(1);
        let mut attempt = 1u32;
        loop {
            match self.attempt(&req, &mut logs).await {
                Ok(output) => {
                    store.commit().await?;
                    tracing::info!(job_id = %req.job_id, attempt, "job completed");
                    return Ok(output);
                }
                Err(e) => {
                    let message = truncate_error(&e.to_string(), ERROR_LIMIT);
                    if attempt < max {
                        tracing::warn!(job_id = %req.job_id, attempt, error = %message, "attempt failed, retrying");
                        attempt += 1;
                        store
                            .update_job(
                                &req.job_id,
                                JobUpdate::new()
                                    .status(JobStatus::Retrying)
                                    .attempt(attempt)
                                    .error(message)
                                    .logs(logs.clone()),
                            )
                            .await?;
                        store.commit().await?;
                        tokio::time::sleep(self.policy.backoff(attempt - 1)).await;
                        store
                            .update_job(
                                &req.job_id,
                                JobUpdate::new().status(JobStatus::Running),
                            )
                            .await?;
                        store.commit().await?;
                    } else {
                        let aggregate = truncate_error(
                            &format!("All {max} attempts failed. Last error: {message}"),
                            ERROR_LIMIT,
                        );
                        tracing::error!(job_id = %req.job_id, error = %aggregate, "job failed");
                        store
                            .update_job(
                                &req.job_id,
                                JobUpdate::new()
                                    .status(JobStatus::Failed)
                                    .completed_at(now_iso())
                                    .error(aggregate)
                                    .logs(logs.clone()),
                            )
                            .await?;
                        store.commit().await?;
                        return Err(e);
                    }
                }
            }
        }
    }

    /// One attempt: authenticate, prepare the workspace, run the agent,
    /// and write the terminal record. Updates within the attempt batch
    /// into the caller's commit.
    async fn attempt(
        &self,
        req: &JobRequest,
        logs: &mut Vec<String>,
    ) -> Result<Value, EngineError> {
        let store = &self.deps.store;

        logs.push("Authenticating with GitHub...".to_string());
        store
            .update_job(&req.job_id, JobUpdate::new().logs(logs.clone()))
            .await?;
        self.deps.dispatcher.authenticate(&req.token).await?;

        logs.push(if req.skip_clone {
            "Refreshing workspace...".to_string()
        } else {
            "Cloning repository...".to_string()
        });
        store
            .update_job(&req.job_id, JobUpdate::new().logs(logs.clone()))
            .await?;
        self.deps
            .dispatcher
            .prepare(&req.repo_url, &req.workspace, req.skip_clone)
            .await?;

        logs.push("Agent engine starting...".to_string());
        store
            .update_job(&req.job_id, JobUpdate::new().logs(logs.clone()))
            .await?;

        let mut invocation = AgentInvocation::new(&req.task, &req.workspace)
            .with_timeout(self.agent_timeout);
        if let Some(context) = &req.step_context {
            invocation = invocation.with_step_context(context.clone());
        }
        let outcome = self.deps.agent.run(invocation).await?;
        logs.extend(outcome.log_lines.iter().cloned());

        let result = build_result(&outcome.output, outcome.pr_url.as_deref(), outcome.exit_code);
        let mut update = JobUpdate::new()
            .status(JobStatus::Completed)
            .completed_at(now_iso())
            .result(result)
            .logs(logs.clone());
        if req.step_context.is_some() {
            update = update.step_output(outcome.output.clone());
        }
        store.update_job(&req.job_id, update).await?;

        Ok(outcome.output)
    }
}

/// Fold the agent's structured output into the result column, filling
/// in the harvested PR URL, exit code, and a summary line.
fn build_result(output: &Value, pr_url: Option<&str>, exit_code: i64) -> JobResult {
    let mut result: JobResult = serde_json::from_value(output.clone()).unwrap_or_default();
    if result.pr_url.is_none() {
        result.pr_url = pr_url.map(str::to_string);
    }
    result.exit_code.get_or_insert(exit_code);
    if result.summary.is_none() {
        result.summary = Some(match &result.pr_url {
            Some(url) => format!("Agent finished. PR: {url}"),
            None => "Agent finished (no PR URL detected).".to_string(),
        });
    }
    result
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
