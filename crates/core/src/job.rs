// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job record and state machine.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Default number of attempts before a job is marked failed.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Lifecycle status of a job.
///
/// Transitions follow `queued → running → {retrying → running}* →
/// {completed | failed}`; the terminal states are sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Retrying,
    Completed,
    Failed,
}

impl JobStatus {
    /// Stable lowercase name, as stored in the `jobs.status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Retrying => "retrying",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Parse the stored column value back into a status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(JobStatus::Queued),
            "running" => Some(JobStatus::Running),
            "retrying" => Some(JobStatus::Retrying),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// Check if this status is terminal (completed or failed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured result of a completed job.
///
/// The agent may emit additional keys in its step-result file; those are
/// preserved through `extra` so downstream templates can reference them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_passed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtasks_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A persisted job record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub status: JobStatus,
    pub repo_url: String,
    pub task: String,
    #[serde(default)]
    pub submitted_by: String,
    pub submitted_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    /// Free-form output map emitted for pipeline steps; standalone jobs
    /// leave this unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_index: Option<i64>,
    pub attempt: u32,
    pub max_attempts: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl Job {
    /// Check if the job has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Fields for inserting a new job record.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub job_id: String,
    pub repo_url: String,
    pub task: String,
    pub submitted_by: String,
    pub pipeline_id: Option<String>,
    pub run_id: Option<String>,
    pub batch_id: Option<String>,
    pub step_name: Option<String>,
    pub step_index: Option<i64>,
}

impl NewJob {
    /// Create a standalone job insert with no pipeline linkage.
    pub fn new(
        job_id: impl Into<String>,
        repo_url: impl Into<String>,
        task: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            repo_url: repo_url.into(),
            task: task.into(),
            submitted_by: String::new(),
            pipeline_id: None,
            run_id: None,
            batch_id: None,
            step_name: None,
            step_index: None,
        }
    }

    /// Set the submitter tag.
    pub fn submitted_by(mut self, user: impl Into<String>) -> Self {
        self.submitted_by = user.into();
        self
    }

    /// Link this job to a pipeline run step.
    pub fn for_step(
        mut self,
        pipeline_id: impl Into<String>,
        run_id: impl Into<String>,
        step_name: impl Into<String>,
        step_index: i64,
    ) -> Self {
        self.pipeline_id = Some(pipeline_id.into());
        self.run_id = Some(run_id.into());
        self.step_name = Some(step_name.into());
        self.step_index = Some(step_index);
        self
    }
}

/// Partial update for a job record.
///
/// Only populated fields are rewritten; the store refreshes
/// `updated_at` on every call. Logs are written as the full extended
/// sequence (append-only by construction in the engines).
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub result: Option<JobResult>,
    pub step_output: Option<Value>,
    pub error: Option<String>,
    pub logs: Option<Vec<String>>,
    pub attempt: Option<u32>,
}

impl JobUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn started_at(mut self, ts: impl Into<String>) -> Self {
        self.started_at = Some(ts.into());
        self
    }

    pub fn completed_at(mut self, ts: impl Into<String>) -> Self {
        self.completed_at = Some(ts.into());
        self
    }

    pub fn result(mut self, result: JobResult) -> Self {
        self.result = Some(result);
        self
    }

    pub fn step_output(mut self, output: Value) -> Self {
        self.step_output = Some(output);
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn logs(mut self, logs: Vec<String>) -> Self {
        self.logs = Some(logs);
        self
    }

    pub fn attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    /// True when no field is populated.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.started_at.is_none()
            && self.completed_at.is_none()
            && self.result.is_none()
            && self.step_output.is_none()
            && self.error.is_none()
            && self.logs.is_none()
            && self.attempt.is_none()
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
