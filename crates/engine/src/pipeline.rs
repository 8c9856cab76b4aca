// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline engine: drives one run through its layered step graph.

use crate::{truncate_error, EngineError, JobEngine, JobRequest};
use drover_adapters::StepContext;
use drover_core::{
    new_id, now_iso, JobStatus, JobUpdate, NewJob, RunStatus, RunUpdate, StepDefinition,
};
use drover_dag::{layer_steps, resolve_templates};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;

/// Error recorded on jobs skipped because an upstream step failed.
pub const SKIPPED_STEP_ERROR: &str = "Skipped: upstream step failed";

const ERROR_LIMIT: usize = 500;

/// One pipeline run dispatch.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub run_id: String,
    pub pipeline_id: String,
    pub repo_url: String,
    pub steps: Vec<StepDefinition>,
    pub token: String,
}

/// Drives a single pipeline run: one job per step, layers in dependency
/// order, outputs threaded into downstream templates.
#[derive(Clone)]
pub struct PipelineEngine {
    jobs: JobEngine,
    workspace_root: PathBuf,
}

impl PipelineEngine {
    pub fn new(jobs: JobEngine, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            jobs,
            workspace_root: workspace_root.into(),
        }
    }

    /// Run to a terminal state.
    ///
    /// A catch-all guard marks the run failed on any unexpected error,
    /// so a crashed orchestration never strands in `running`.
    pub async fn run(&self, req: RunRequest) -> Result<(), EngineError> {
        let store = &self.jobs.deps().store;
        store.reload().await?;

        match self.execute(&req).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let message =
                    truncate_error(&format!("Pipeline crashed: {e}"), ERROR_LIMIT);
                tracing::error!(run_id = %req.run_id, error = %message, "pipeline crashed");
                store
                    .update_run(
                        &req.run_id,
                        RunUpdate::new()
                            .status(RunStatus::Failed)
                            .completed_at(now_iso())
                            .error(message),
                    )
                    .await?;
                store.commit().await?;
                Err(e)
            }
        }
    }

    async fn execute(&self, req: &RunRequest) -> Result<(), EngineError> {
        let store = &self.jobs.deps().store;

        store
            .update_run(
                &req.run_id,
                RunUpdate::new()
                    .status(RunStatus::Running)
                    .started_at(now_iso()),
            )
            .await?;

        let layers = layer_steps(&req.steps)?;
        let workspace = self.workspace_root.join(&req.run_id);
        tracing::info!(
            run_id = %req.run_id,
            layers = layers.len(),
            workspace = %workspace.display(),
            "pipeline starting"
        );

        let by_name: HashMap<&str, &StepDefinition> =
            req.steps.iter().map(|s| (s.name.as_str(), s)).collect();

        // One linked job per step, created up front so subscribers can
        // watch every step from the moment the run starts.
        let mut job_ids: HashMap<String, String> = HashMap::new();
        for (index, step) in req.steps.iter().enumerate() {
            let job_id = new_id();
            store
                .create_job(NewJob::new(&job_id, &req.repo_url, &step.task).for_step(
                    &req.pipeline_id,
                    &req.run_id,
                    &step.name,
                    index as i64,
                ))
                .await?;
            job_ids.insert(step.name.clone(), job_id);
        }
        store.commit().await?;

        let mut outputs: HashMap<String, Value> = HashMap::new();
        let mut failed = false;
        let mut run_error: Option<String> = None;
        let mut first = true;

        for layer in &layers {
            for name in layer {
                let Some(job_id) = job_ids.get(name) else {
                    continue;
                };
                if failed {
                    store
                        .update_job(
                            job_id,
                            JobUpdate::new()
                                .status(JobStatus::Failed)
                                .error(SKIPPED_STEP_ERROR)
                                .completed_at(now_iso()),
                        )
                        .await?;
                    continue;
                }
                let Some(step) = by_name.get(name.as_str()) else {
                    continue;
                };

                match self.dispatch_step(req, step, job_id, &workspace, &outputs, first).await {
                    Ok(output) => {
                        first = false;
                        outputs.insert(name.clone(), output);
                    }
                    Err(e) => {
                        let message = truncate_error(&e.to_string(), ERROR_LIMIT);
                        outputs.insert(name.clone(), json!({"error": message}));
                        if step.on_failure == drover_core::OnFailure::Stop {
                            failed = true;
                            run_error = Some(truncate_error(
                                &format!("Step '{name}' failed: {message}"),
                                ERROR_LIMIT,
                            ));
                            tracing::warn!(run_id = %req.run_id, step = %name, "step failed, stopping run");
                        } else {
                            tracing::warn!(run_id = %req.run_id, step = %name, "step failed, continuing");
                        }
                    }
                }
            }
            store.commit().await?;
        }

        let mut update = RunUpdate::new().completed_at(now_iso());
        update = if failed {
            let mut u = update.status(RunStatus::Failed);
            if let Some(message) = run_error {
                u = u.error(message);
            }
            u
        } else {
            update.status(RunStatus::Completed)
        };
        store.update_run(&req.run_id, update).await?;
        store.commit().await?;
        tracing::info!(run_id = %req.run_id, failed, "pipeline finished");
        Ok(())
    }

    /// Dispatch one step through the job engine and read back its row.
    async fn dispatch_step(
        &self,
        req: &RunRequest,
        step: &StepDefinition,
        job_id: &str,
        workspace: &std::path::Path,
        outputs: &HashMap<String, Value>,
        first: bool,
    ) -> Result<Value, EngineError> {
        let store = &self.jobs.deps().store;
        let resolved_task = resolve_templates(&step.task, outputs);
        let context = StepContext {
            pipeline_id: req.pipeline_id.clone(),
            run_id: req.run_id.clone(),
            step_name: step.name.clone(),
            upstream_outputs: outputs.clone(),
        };

        let output = self
            .jobs
            .run(JobRequest {
                job_id: job_id.to_string(),
                repo_url: req.repo_url.clone(),
                task: resolved_task,
                token: req.token.clone(),
                workspace: workspace.to_path_buf(),
                skip_clone: !first,
                step_context: Some(context),
            })
            .await?;

        // The record is authoritative: if the row reads as failed the
        // step failed regardless of what the invocation returned.
        store.reload().await?;
        if let Some(job) = store.get_job(job_id).await? {
            if job.status == JobStatus::Failed {
                let detail = job.error.unwrap_or_else(|| "step failed".to_string());
                return Err(EngineError::StepFailed(detail));
            }
        }

        if output.is_null() {
            Ok(json!({"exit_code": 0}))
        } else {
            Ok(output)
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
