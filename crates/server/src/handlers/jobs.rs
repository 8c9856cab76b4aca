// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job submission and read endpoints.

use crate::api::AppState;
use crate::error::ApiError;
use axum::extract::{Path, State};
use axum::Json;
use drover_core::{new_id, now_iso, Job, NewJob};
use drover_engine::JobRequest;
use serde::Deserialize;
use serde_json::{json, Value};

/// Default page size for `/jobs`.
const LIST_LIMIT: i64 = 100;

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "timestamp": now_iso()}))
}

#[derive(Debug, Deserialize)]
pub struct SubmitBody {
    #[serde(default)]
    pub repo_url: String,
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub github_token: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Accept a job, persist it queued, and fire-and-forget the job engine.
pub async fn submit(
    State(state): State<AppState>,
    Json(body): Json<SubmitBody>,
) -> Result<Json<Value>, ApiError> {
    if body.repo_url.is_empty() || body.task.is_empty() {
        return Err(ApiError::Validation(
            "Both 'repo_url' and 'task' are required.".to_string(),
        ));
    }

    let job_id = new_id();
    let user = body.user_id.unwrap_or_else(|| "anonymous".to_string());
    let job = state
        .store
        .create_job(NewJob::new(&job_id, &body.repo_url, &body.task).submitted_by(user))
        .await?;
    state.store.commit().await?;

    let token = if body.github_token.is_empty() {
        state.config.github_token.clone()
    } else {
        body.github_token
    };
    let request = JobRequest::new(
        &job_id,
        &body.repo_url,
        &body.task,
        token,
        state.config.workspace_root.join(&job_id),
    );
    let engine = state.jobs.clone();
    tokio::spawn(async move {
        // The engine persists its own failures; nothing to surface here.
        let _ = engine.run(request).await;
    });

    Ok(Json(json!({
        "job_id": job_id,
        "status": "queued",
        "submitted_at": job.submitted_at,
    })))
}

/// Identifying and timestamp subset of one job.
pub async fn status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.store.reload().await?;
    let job = state
        .store
        .get_job(&job_id)
        .await?
        .ok_or_else(|| ApiError::job_not_found(&job_id))?;
    Ok(Json(json!({
        "job_id": job.job_id,
        "status": job.status,
        "submitted_at": job.submitted_at,
        "started_at": job.started_at,
        "completed_at": job.completed_at,
    })))
}

/// Full job view including logs.
pub async fn result(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    state.store.reload().await?;
    let job = state
        .store
        .get_job(&job_id)
        .await?
        .ok_or_else(|| ApiError::job_not_found(&job_id))?;
    Ok(Json(job))
}

/// Newest-first job summaries (task truncated, no logs).
pub async fn list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.store.reload().await?;
    let jobs = state.store.list_jobs(LIST_LIMIT, 0).await?;
    let summaries: Vec<Value> = jobs.iter().map(summarize).collect();
    Ok(Json(Value::Array(summaries)))
}

fn summarize(job: &Job) -> Value {
    let task: String = job.task.chars().take(100).collect();
    json!({
        "job_id": job.job_id,
        "status": job.status,
        "repo_url": job.repo_url,
        "task": task,
        "submitted_by": job.submitted_by,
        "submitted_at": job.submitted_at,
        "started_at": job.started_at,
        "completed_at": job.completed_at,
        "pr_url": job.result.as_ref().and_then(|r| r.pr_url.clone()),
    })
}
