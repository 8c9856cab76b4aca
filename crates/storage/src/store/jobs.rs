// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job CRUD.

use super::{decode_json, Store, StoreError};
use drover_core::{now_iso, Job, JobResult, JobStatus, JobUpdate, NewJob};
use sqlx::{FromRow, QueryBuilder, Sqlite};

#[derive(FromRow)]
struct JobRow {
    job_id: String,
    pipeline_id: Option<String>,
    run_id: Option<String>,
    batch_id: Option<String>,
    step_name: Option<String>,
    step_index: Option<i64>,
    status: String,
    repo_url: String,
    task: String,
    submitted_by: Option<String>,
    submitted_at: String,
    started_at: Option<String>,
    completed_at: Option<String>,
    result_json: Option<String>,
    step_output_json: Option<String>,
    error: Option<String>,
    logs_json: Option<String>,
    attempt: i64,
    max_attempts: i64,
    created_at: String,
    updated_at: String,
}

impl JobRow {
    fn into_job(self) -> Result<Job, StoreError> {
        let status = JobStatus::parse(&self.status).ok_or_else(|| StoreError::Decode {
            column: "status",
            id: self.job_id.clone(),
            message: format!("unknown status '{}'", self.status),
        })?;
        let result: Option<JobResult> = decode_json(self.result_json, "result_json", &self.job_id)?;
        let step_output =
            decode_json(self.step_output_json, "step_output_json", &self.job_id)?;
        let logs: Vec<String> =
            decode_json(self.logs_json, "logs_json", &self.job_id)?.unwrap_or_default();

        Ok(Job {
            job_id: self.job_id,
            status,
            repo_url: self.repo_url,
            task: self.task,
            submitted_by: self.submitted_by.unwrap_or_default(),
            submitted_at: self.submitted_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            result,
            step_output,
            error: self.error,
            logs,
            pipeline_id: self.pipeline_id,
            run_id: self.run_id,
            batch_id: self.batch_id,
            step_name: self.step_name,
            step_index: self.step_index,
            attempt: self.attempt.max(1) as u32,
            max_attempts: self.max_attempts.max(1) as u32,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_JOB: &str = "SELECT * FROM jobs WHERE job_id = ?";

impl Store {
    /// Insert a new job record and return it.
    pub async fn create_job(&self, new: NewJob) -> Result<Job, StoreError> {
        let submitted_at = now_iso();
        let mut tx = self.writer().begin().await?;
        sqlx::query(
            "INSERT INTO jobs \
             (job_id, repo_url, task, submitted_by, submitted_at, \
              pipeline_id, run_id, batch_id, step_name, step_index, logs_json) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, '[]')",
        )
        .bind(&new.job_id)
        .bind(&new.repo_url)
        .bind(&new.task)
        .bind(&new.submitted_by)
        .bind(&submitted_at)
        .bind(&new.pipeline_id)
        .bind(&new.run_id)
        .bind(&new.batch_id)
        .bind(&new.step_name)
        .bind(new.step_index)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        self.job_from_writer(&new.job_id)
            .await?
            .ok_or_else(|| sqlx::Error::RowNotFound.into())
    }

    /// Fetch a single job by id.
    pub async fn get_job(&self, job_id: &str) -> Result<Option<Job>, StoreError> {
        let row = sqlx::query_as::<_, JobRow>(SELECT_JOB)
            .bind(job_id)
            .fetch_optional(self.reader())
            .await?;
        row.map(JobRow::into_job).transpose()
    }

    /// Apply a partial update and return the refreshed record.
    ///
    /// Only populated fields are rewritten; `updated_at` is refreshed on
    /// every call. Returns `None` for an unknown id.
    pub async fn update_job(
        &self,
        job_id: &str,
        update: JobUpdate,
    ) -> Result<Option<Job>, StoreError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE jobs SET updated_at = ");
        qb.push_bind(now_iso());
        if let Some(status) = update.status {
            qb.push(", status = ").push_bind(status.as_str());
        }
        if let Some(started_at) = update.started_at {
            qb.push(", started_at = ").push_bind(started_at);
        }
        if let Some(completed_at) = update.completed_at {
            qb.push(", completed_at = ").push_bind(completed_at);
        }
        if let Some(result) = update.result {
            qb.push(", result_json = ")
                .push_bind(serde_json::to_string(&result)?);
        }
        if let Some(step_output) = update.step_output {
            qb.push(", step_output_json = ")
                .push_bind(serde_json::to_string(&step_output)?);
        }
        if let Some(error) = update.error {
            qb.push(", error = ").push_bind(error);
        }
        if let Some(logs) = update.logs {
            qb.push(", logs_json = ")
                .push_bind(serde_json::to_string(&logs)?);
        }
        if let Some(attempt) = update.attempt {
            qb.push(", attempt = ").push_bind(attempt as i64);
        }
        qb.push(" WHERE job_id = ").push_bind(job_id);

        let mut tx = self.writer().begin().await?;
        let affected = qb.build().execute(&mut *tx).await?.rows_affected();
        tx.commit().await?;

        if affected == 0 {
            return Ok(None);
        }
        self.job_from_writer(job_id).await
    }

    /// List jobs newest-first with pagination.
    pub async fn list_jobs(&self, limit: i64, offset: i64) -> Result<Vec<Job>, StoreError> {
        let rows = sqlx::query_as::<_, JobRow>(
            "SELECT * FROM jobs ORDER BY submitted_at DESC LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.reader())
        .await?;
        rows.into_iter().map(JobRow::into_job).collect()
    }

    /// All jobs belonging to a pipeline run, ordered by step index.
    pub async fn jobs_for_run(&self, run_id: &str) -> Result<Vec<Job>, StoreError> {
        let rows = sqlx::query_as::<_, JobRow>(
            "SELECT * FROM jobs WHERE run_id = ? ORDER BY step_index",
        )
        .bind(run_id)
        .fetch_all(self.reader())
        .await?;
        rows.into_iter().map(JobRow::into_job).collect()
    }

    /// Delete terminal jobs whose completion is older than `days`.
    ///
    /// Returns the number of rows deleted.
    pub async fn cleanup_old_jobs(&self, days: i64) -> Result<u64, StoreError> {
        let cutoff = (chrono::Utc::now() - chrono::Duration::days(days))
            .to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
        let mut tx = self.writer().begin().await?;
        let affected = sqlx::query(
            "DELETE FROM jobs \
             WHERE status IN ('completed', 'failed') AND completed_at < ?",
        )
        .bind(&cutoff)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        tx.commit().await?;
        if affected > 0 {
            tracing::info!(deleted = affected, days, "cleaned up old jobs");
        }
        Ok(affected)
    }

    // Read-your-writes fetch used right after an insert or update.
    async fn job_from_writer(&self, job_id: &str) -> Result<Option<Job>, StoreError> {
        let row = sqlx::query_as::<_, JobRow>(SELECT_JOB)
            .bind(job_id)
            .fetch_optional(self.writer())
            .await?;
        row.map(JobRow::into_job).transpose()
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
