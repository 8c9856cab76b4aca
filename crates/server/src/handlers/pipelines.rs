// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline CRUD and run endpoints.

use crate::api::AppState;
use crate::error::ApiError;
use axum::extract::{Path, State};
use axum::Json;
use drover_core::{new_id, Job, Pipeline, PipelineRun, StepDefinition};
use drover_dag::layer_steps;
use drover_engine::RunRequest;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct CreatePipelineBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
    #[serde(default)]
    pub repo_url: Option<String>,
}

/// Create a pipeline template. The graph is validated at admission so a
/// malformed pipeline can never be stored.
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreatePipelineBody>,
) -> Result<Json<Pipeline>, ApiError> {
    if body.name.is_empty() {
        return Err(ApiError::Validation("'name' is required.".to_string()));
    }
    if body.steps.is_empty() {
        return Err(ApiError::Validation(
            "'steps' must contain at least one step.".to_string(),
        ));
    }
    for step in &body.steps {
        if step.name.is_empty() || step.task.is_empty() {
            return Err(ApiError::Validation(
                "Every step needs a 'name' and a 'task'.".to_string(),
            ));
        }
    }
    layer_steps(&body.steps).map_err(|e| ApiError::Validation(e.to_string()))?;

    let pipeline = state
        .store
        .create_pipeline(&new_id(), &body.name, body.repo_url.as_deref(), &body.steps)
        .await?;
    state.store.commit().await?;
    Ok(Json(pipeline))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Pipeline>>, ApiError> {
    state.store.reload().await?;
    Ok(Json(state.store.list_pipelines().await?))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(pipeline_id): Path<String>,
) -> Result<Json<Pipeline>, ApiError> {
    state.store.reload().await?;
    let pipeline = state
        .store
        .get_pipeline(&pipeline_id)
        .await?
        .ok_or_else(|| ApiError::pipeline_not_found(&pipeline_id))?;
    Ok(Json(pipeline))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(pipeline_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !state.store.delete_pipeline(&pipeline_id).await? {
        return Err(ApiError::pipeline_not_found(&pipeline_id));
    }
    state.store.commit().await?;
    Ok(Json(json!({"deleted": true})))
}

#[derive(Debug, Deserialize, Default)]
pub struct RunPipelineBody {
    #[serde(default)]
    pub repo_url: Option<String>,
    #[serde(default)]
    pub github_token: String,
}

/// Start a run: persist it pending, commit, then fire-and-forget the
/// pipeline engine.
pub async fn run(
    State(state): State<AppState>,
    Path(pipeline_id): Path<String>,
    body: Option<Json<RunPipelineBody>>,
) -> Result<Json<Value>, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    state.store.reload().await?;
    let pipeline = state
        .store
        .get_pipeline(&pipeline_id)
        .await?
        .ok_or_else(|| ApiError::pipeline_not_found(&pipeline_id))?;

    // Re-validate at submission: the stored graph may predate stricter rules.
    layer_steps(&pipeline.steps).map_err(|e| ApiError::Validation(e.to_string()))?;

    let repo_url = body
        .repo_url
        .or(pipeline.repo_url)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| {
            ApiError::Validation(
                "No 'repo_url' provided and the pipeline has no default.".to_string(),
            )
        })?;

    let run_id = new_id();
    let run = state
        .store
        .create_run(&run_id, &pipeline_id, Some(&repo_url))
        .await?;
    state.store.commit().await?;

    let token = if body.github_token.is_empty() {
        state.config.github_token.clone()
    } else {
        body.github_token
    };
    let request = RunRequest {
        run_id: run_id.clone(),
        pipeline_id: pipeline_id.clone(),
        repo_url: repo_url.clone(),
        steps: pipeline.steps,
        token,
    };
    let engine = state.pipelines.clone();
    tokio::spawn(async move {
        // The crash guard inside the engine owns failure persistence.
        let _ = engine.run(request).await;
    });

    Ok(Json(json!({
        "run_id": run_id,
        "pipeline_id": pipeline_id,
        "status": run.status,
        "repo_url": repo_url,
    })))
}

pub async fn runs(
    State(state): State<AppState>,
    Path(pipeline_id): Path<String>,
) -> Result<Json<Vec<PipelineRun>>, ApiError> {
    state.store.reload().await?;
    Ok(Json(state.store.list_runs(Some(&pipeline_id)).await?))
}

/// Run detail with embedded step-job summaries.
pub async fn run_detail(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.store.reload().await?;
    let run = state
        .store
        .get_run(&run_id)
        .await?
        .ok_or_else(|| ApiError::run_not_found(&run_id))?;
    let jobs = state.store.jobs_for_run(&run_id).await?;
    let steps: Vec<Value> = jobs.iter().map(step_summary).collect();

    let mut view = serde_json::to_value(&run).map_err(|e| ApiError::Internal(e.to_string()))?;
    if let Some(object) = view.as_object_mut() {
        object.insert("jobs".to_string(), Value::Array(steps));
    }
    Ok(Json(view))
}

fn step_summary(job: &Job) -> Value {
    json!({
        "job_id": job.job_id,
        "step_name": job.step_name,
        "step_index": job.step_index,
        "status": job.status,
        "started_at": job.started_at,
        "completed_at": job.completed_at,
        "pr_url": job.result.as_ref().and_then(|r| r.pr_url.clone()),
        "error": job.error,
    })
}
