// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline run CRUD.

use super::{Store, StoreError};
use drover_core::{now_iso, PipelineRun, RunStatus, RunUpdate};
use sqlx::{FromRow, QueryBuilder, Sqlite};

#[derive(FromRow)]
struct RunRow {
    run_id: String,
    pipeline_id: String,
    status: String,
    repo_url: Option<String>,
    started_at: Option<String>,
    completed_at: Option<String>,
    error: Option<String>,
    created_at: String,
    updated_at: String,
}

impl RunRow {
    fn into_run(self) -> Result<PipelineRun, StoreError> {
        let status = RunStatus::parse(&self.status).ok_or_else(|| StoreError::Decode {
            column: "status",
            id: self.run_id.clone(),
            message: format!("unknown status '{}'", self.status),
        })?;
        Ok(PipelineRun {
            run_id: self.run_id,
            pipeline_id: self.pipeline_id,
            status,
            repo_url: self.repo_url,
            started_at: self.started_at,
            completed_at: self.completed_at,
            error: self.error,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_RUN: &str = "SELECT * FROM pipeline_runs WHERE run_id = ?";

impl Store {
    /// Insert a new pipeline run record and return it.
    pub async fn create_run(
        &self,
        run_id: &str,
        pipeline_id: &str,
        repo_url: Option<&str>,
    ) -> Result<PipelineRun, StoreError> {
        let ts = now_iso();
        let mut tx = self.writer().begin().await?;
        sqlx::query(
            "INSERT INTO pipeline_runs (run_id, pipeline_id, repo_url, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(run_id)
        .bind(pipeline_id)
        .bind(repo_url)
        .bind(&ts)
        .bind(&ts)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        let row = sqlx::query_as::<_, RunRow>(SELECT_RUN)
            .bind(run_id)
            .fetch_one(self.writer())
            .await?;
        row.into_run()
    }

    /// Fetch a pipeline run by id.
    pub async fn get_run(&self, run_id: &str) -> Result<Option<PipelineRun>, StoreError> {
        let row = sqlx::query_as::<_, RunRow>(SELECT_RUN)
            .bind(run_id)
            .fetch_optional(self.reader())
            .await?;
        row.map(RunRow::into_run).transpose()
    }

    /// Apply a partial update and return the refreshed record.
    pub async fn update_run(
        &self,
        run_id: &str,
        update: RunUpdate,
    ) -> Result<Option<PipelineRun>, StoreError> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE pipeline_runs SET updated_at = ");
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
        if let Some(error) = update.error {
            qb.push(", error = ").push_bind(error);
        }
        qb.push(" WHERE run_id = ").push_bind(run_id);

        let mut tx = self.writer().begin().await?;
        let affected = qb.build().execute(&mut *tx).await?.rows_affected();
        tx.commit().await?;

        if affected == 0 {
            return Ok(None);
        }
        let row = sqlx::query_as::<_, RunRow>(SELECT_RUN)
            .bind(run_id)
            .fetch_optional(self.writer())
            .await?;
        row.map(RunRow::into_run).transpose()
    }

    /// Pipeline runs, optionally scoped to one pipeline, newest first.
    pub async fn list_runs(
        &self,
        pipeline_id: Option<&str>,
    ) -> Result<Vec<PipelineRun>, StoreError> {
        let rows = match pipeline_id {
            Some(id) => {
                sqlx::query_as::<_, RunRow>(
                    "SELECT * FROM pipeline_runs WHERE pipeline_id = ? ORDER BY created_at DESC",
                )
                .bind(id)
                .fetch_all(self.reader())
                .await?
            }
            None => {
                sqlx::query_as::<_, RunRow>(
                    "SELECT * FROM pipeline_runs ORDER BY created_at DESC",
                )
                .fetch_all(self.reader())
                .await?
            }
        };
        rows.into_iter().map(RunRow::into_run).collect()
    }
}

#[cfg(test)]
#[path = "runs_tests.rs"]
mod tests;
